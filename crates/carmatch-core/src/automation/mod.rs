//! Automation (n8n) integration for CarMatch.
//!
//! - `AutomationApi`: RPITIT port implemented by the infra HTTP client
//! - `status`: execution status normalization across remote API versions
//! - `webhook`: webhook response body decoding
//! - `WorkflowService`: the operations exposed to the CLI and REST layers

pub mod api;
pub mod service;
pub mod status;
pub mod webhook;
