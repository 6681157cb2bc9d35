//! Business logic and port definitions for CarMatch.
//!
//! This crate defines the `AutomationApi` port that the infrastructure layer
//! implements. It depends only on `carmatch-types` -- never on
//! `carmatch-infra` or any HTTP crate.

pub mod automation;
