//! Infrastructure layer for CarMatch.
//!
//! Contains the reqwest implementation of the `AutomationApi` port defined in
//! `carmatch-core`, and the configuration loader (TOML file + environment).

pub mod automation;
pub mod config;
