//! Managed-flow handlers for the REST API.
//!
//! Endpoints consumed by the admin UI: listing with last-run info, detail,
//! enable/disable toggle, "run now" through the mapped webhook, and the
//! normalized last-execution status.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use carmatch_types::automation::{
    NormalizedStatus, ToggleOutcome, TriggerOutcome, TriggerReport, WorkflowRecord,
    WorkflowSummary,
};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Body of `POST /flows/{id}/toggle`. Without `active` the flag is flipped.
#[derive(Debug, Default, Deserialize)]
pub struct ToggleRequest {
    #[serde(default)]
    pub active: Option<bool>,
}

/// Workflow detail with the links the UI needs.
#[derive(Debug, Serialize)]
pub struct FlowDetail {
    #[serde(flatten)]
    pub workflow: WorkflowRecord,
    pub n8n_url: String,
    pub has_webhook: bool,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the flow sub-router, mounted at `/api/v1`.
pub fn flow_routes() -> Router<AppState> {
    Router::new()
        .route("/flows", get(list_flows))
        .route("/flows/{id}", get(get_flow))
        .route("/flows/{id}/toggle", post(toggle_flow))
        .route("/flows/{id}/run", post(run_flow))
        .route("/flows/{id}/status", get(flow_status))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/flows - Summaries of every managed workflow.
///
/// Workflows that fail to load are left out of the list.
pub async fn list_flows(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<ApiResponse<Vec<WorkflowSummary>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let flows = state.workflow_service.list_flows().await;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(flows, request_id, elapsed).with_link("self", "/api/v1/flows"))
}

/// GET /api/v1/flows/{id} - Workflow metadata.
pub async fn get_flow(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<ApiResponse<FlowDetail>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let workflow = state.workflow_service.get_workflow(&id).await?;
    let detail = FlowDetail {
        n8n_url: state.automation_config.editor_url(&id).unwrap_or_default(),
        has_webhook: state.automation_config.has_webhook(&id),
        workflow,
    };

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(detail, request_id, elapsed)
        .with_link("self", &format!("/api/v1/flows/{id}"))
        .with_link("status", &format!("/api/v1/flows/{id}/status")))
}

/// POST /api/v1/flows/{id}/toggle - Enable, disable, or flip a workflow.
pub async fn toggle_flow(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<ApiResponse<ToggleOutcome>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let request = parse_toggle_request(&body)?;
    let outcome = state.workflow_service.toggle(&id, request.active).await?;

    tracing::info!(workflow_id = %id, active = outcome.active, "Workflow toggled via API");

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(outcome, request_id, elapsed))
}

/// POST /api/v1/flows/{id}/run - Trigger the workflow's webhook.
///
/// The body, when present, is forwarded as the webhook payload.
pub async fn run_flow(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<ApiResponse<TriggerReport>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let payload = parse_optional_json(&body)?;
    let outcome = state.workflow_service.run_now(&id, payload).await?;
    let status = trigger_http_status(&outcome);

    tracing::info!(workflow_id = %id, ok = outcome.ok, status = outcome.status, "Run-now requested via API");

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(outcome.into_report(), request_id, elapsed)
        .with_status(status)
        .with_link("status", &format!("/api/v1/flows/{id}/status")))
}

/// GET /api/v1/flows/{id}/status - Normalized last-execution status.
///
/// Lookup failures are reported inside the status, never as an HTTP error.
pub async fn flow_status(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<ApiResponse<NormalizedStatus>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let status = state.workflow_service.last_execution_status(&id).await;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(status, request_id, elapsed))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_toggle_request(body: &[u8]) -> Result<ToggleRequest, AppError> {
    match parse_optional_json(body)? {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| AppError::Validation(format!("Invalid toggle request: {e}"))),
        None => Ok(ToggleRequest::default()),
    }
}

/// Empty or whitespace-only bodies mean "no payload".
fn parse_optional_json(body: &[u8]) -> Result<Option<serde_json::Value>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| AppError::Validation(format!("Request body is not valid JSON: {e}")))
}

/// Refused triggers are client errors; webhook failures are gateway errors.
fn trigger_http_status(outcome: &TriggerOutcome) -> StatusCode {
    if outcome.ok {
        StatusCode::OK
    } else if outcome.error.is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carmatch_types::automation::WebhookBody;
    use carmatch_types::error::AutomationError;
    use serde_json::json;

    #[test]
    fn empty_toggle_body_flips() {
        assert_eq!(parse_toggle_request(b"").unwrap().active, None);
        assert_eq!(parse_toggle_request(b"  \n").unwrap().active, None);
        assert_eq!(parse_toggle_request(b"{}").unwrap().active, None);
    }

    #[test]
    fn explicit_toggle_body() {
        assert_eq!(
            parse_toggle_request(br#"{"active": false}"#).unwrap().active,
            Some(false)
        );
        assert!(parse_toggle_request(br#"{"active": "yes"}"#).is_err());
    }

    #[test]
    fn run_payload_must_be_json() {
        assert_eq!(
            parse_optional_json(br#"{"source": "admin"}"#).unwrap(),
            Some(json!({"source": "admin"}))
        );
        assert!(matches!(
            parse_optional_json(b"not json"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn trigger_status_mapping() {
        let delivered = TriggerOutcome::delivered(200, WebhookBody::Json(json!({"started": true})));
        assert_eq!(trigger_http_status(&delivered), StatusCode::OK);

        let failed = TriggerOutcome::delivered(500, WebhookBody::Text("boom".into()));
        assert_eq!(trigger_http_status(&failed), StatusCode::BAD_GATEWAY);

        let rejected = TriggerOutcome::rejected(&AutomationError::WebhookNotConfigured {
            workflow_id: "42".into(),
        });
        assert_eq!(trigger_http_status(&rejected), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn flow_detail_flattens_workflow() {
        let detail = FlowDetail {
            workflow: WorkflowRecord {
                id: "42".into(),
                name: Some("scraper".into()),
                active: true,
            },
            n8n_url: "http://n8n.local/workflow/42".into(),
            has_webhook: false,
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["id"], "42");
        assert_eq!(value["active"], true);
        assert_eq!(value["n8n_url"], "http://n8n.local/workflow/42");
    }
}
