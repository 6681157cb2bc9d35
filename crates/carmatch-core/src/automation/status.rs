//! Execution status normalization.
//!
//! Newer remote versions report a `status` token per execution; older ones
//! only report `finished: bool`. The variant is detected from the record
//! itself, so both deployments work without a flag.

use carmatch_types::automation::{ExecutionRecord, ExecutionSummary, NormalizedStatus, RunStatus};
use carmatch_types::error::AutomationError;

/// Resolve the uniform status of one execution record.
pub fn resolve_run_status(record: &ExecutionRecord) -> RunStatus {
    let token = record
        .status
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();

    if token.is_empty() {
        if record.finished == Some(true) {
            RunStatus::Success
        } else {
            RunStatus::Error
        }
    } else {
        RunStatus::from_token(&token)
    }
}

/// Normalize an execution record into the UI-facing status.
pub fn normalize_execution(record: &ExecutionRecord) -> NormalizedStatus {
    let status = resolve_run_status(record);
    NormalizedStatus::observed(
        status,
        ExecutionSummary {
            id: record.id.clone(),
            started_at: record.started_at.clone(),
            stopped_at: record.stopped_at.clone(),
            workflow_id: record.workflow_id.clone(),
            error: record.error.clone().unwrap_or_default(),
        },
    )
}

/// Normalize the outcome of a last-execution lookup.
///
/// Never fails: a failed lookup becomes `unknown` carrying the error text,
/// an empty history becomes `unknown` without one.
pub fn normalize_lookup(lookup: Result<Option<ExecutionRecord>, AutomationError>) -> NormalizedStatus {
    match lookup {
        Ok(Some(record)) => normalize_execution(&record),
        Ok(None) => NormalizedStatus::no_execution(),
        Err(e) => NormalizedStatus::lookup_failed(e.to_string()),
    }
}
