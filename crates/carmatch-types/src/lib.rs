//! Shared domain types for CarMatch.
//!
//! Wire and normalized shapes for the automation (n8n) integration, the
//! adapter's error type, and the configuration struct.
//!
//! No IO dependencies -- only serde, secrecy, thiserror.

pub mod automation;
pub mod config;
pub mod error;
