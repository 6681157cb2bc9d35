//! REST API handlers, one module per resource.

pub mod flows;
pub mod health;
