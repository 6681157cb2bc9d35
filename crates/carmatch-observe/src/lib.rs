//! Observability setup for CarMatch: tracing subscriber with optional
//! OpenTelemetry export.

pub mod tracing_setup;
