//! Automation (n8n) HTTP adapter.

pub mod client;

pub use client::N8nClient;
