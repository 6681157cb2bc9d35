//! Automation (n8n) domain types for CarMatch.
//!
//! Wire shapes returned by the automation tool's public REST API
//! (`WorkflowRecord`, `ExecutionRecord`, `ExecutionList`) and the normalized
//! shapes the adapter hands to the UI layer (`NormalizedStatus`,
//! `WorkflowSummary`, `TriggerOutcome`, `TriggerReport`).
//!
//! The remote API changed its response schema between versions, so the wire
//! types are lenient: ids may arrive as strings or numbers, the execution
//! status token may be missing, and error payloads may be strings or objects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AutomationError;

// ---------------------------------------------------------------------------
// Lenient field decoding
// ---------------------------------------------------------------------------

/// Accept an identifier sent either as a JSON string or a JSON number.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn opt_id_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Error payloads are plain strings on some versions and objects on others.
fn opt_text_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Object(obj)) => match obj.get("message") {
            Some(serde_json::Value::String(msg)) => Some(msg.clone()),
            _ => Some(serde_json::Value::Object(obj).to_string()),
        },
        Some(other) => Some(other.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// A workflow as returned by `GET /workflows/{id}` and `PATCH /workflows/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Absent on freshly imported workflows; treated as disabled.
    #[serde(default)]
    pub active: bool,
}

/// Result of an enable/disable toggle, as shown to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    pub id: String,
    pub active: bool,
}

impl From<WorkflowRecord> for ToggleOutcome {
    fn from(record: WorkflowRecord) -> Self {
        Self {
            id: record.id,
            active: record.active,
        }
    }
}

// ---------------------------------------------------------------------------
// Executions
// ---------------------------------------------------------------------------

/// One execution of a workflow.
///
/// Newer API versions carry a `status` token; older ones only a `finished`
/// flag. Timestamps are passed through exactly as the remote sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    #[serde(default, deserialize_with = "opt_id_from_string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "opt_id_from_string_or_number")]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub finished: Option<bool>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub stopped_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default, deserialize_with = "opt_text_from_any")]
    pub error: Option<String>,
}

impl ExecutionRecord {
    /// Timestamp shown as "last run": the start time, else the finish time.
    pub fn last_run(&self) -> Option<&str> {
        self.started_at
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.finished_at.as_deref())
    }
}

/// Response of `GET /executions`.
///
/// The list has been returned under `data` and under `items` depending on the
/// remote version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<ExecutionRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ExecutionRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl ExecutionList {
    /// The executions, from `data` when it is non-empty, otherwise `items`.
    pub fn executions(&self) -> &[ExecutionRecord] {
        match (&self.data, &self.items) {
            (Some(data), _) if !data.is_empty() => data,
            (_, Some(items)) => items,
            _ => &[],
        }
    }

    /// First execution of the list, if any.
    pub fn into_latest(self) -> Option<ExecutionRecord> {
        let ExecutionList { data, items, .. } = self;
        match data {
            Some(data) if !data.is_empty() => data.into_iter().next(),
            _ => items.and_then(|items| items.into_iter().next()),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized status
// ---------------------------------------------------------------------------

/// Uniform execution status exposed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
    Running,
    Canceled,
    Unknown,
}

impl RunStatus {
    /// Map a lower-cased remote status token onto the uniform vocabulary.
    pub fn from_token(token: &str) -> Self {
        match token {
            "success" => RunStatus::Success,
            "error" | "crashed" | "failed" => RunStatus::Error,
            "running" | "waiting" | "new" => RunStatus::Running,
            "canceled" | "cancelled" => RunStatus::Canceled,
            _ => RunStatus::Unknown,
        }
    }

    pub fn is_success(self) -> bool {
        self == RunStatus::Success
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Error => write!(f, "error"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Canceled => write!(f, "canceled"),
            RunStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(RunStatus::Success),
            "error" => Ok(RunStatus::Error),
            "running" => Ok(RunStatus::Running),
            "canceled" => Ok(RunStatus::Canceled),
            "unknown" => Ok(RunStatus::Unknown),
            other => Err(format!("invalid run status: '{other}'")),
        }
    }
}

/// Passthrough fields copied from the execution that was normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub id: Option<String>,
    pub started_at: Option<String>,
    pub stopped_at: Option<String>,
    pub workflow_id: Option<String>,
    /// Error text from the execution, empty when there is none.
    pub error: String,
}

/// Normalized status of a workflow's most recent execution.
///
/// `ok` is derived from `status` at construction and cannot drift from it.
/// When the lookup itself failed, `error` carries the failure text and there
/// is no execution summary; "no execution yet" has neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedStatus {
    ok: bool,
    status: RunStatus,
    #[serde(flatten)]
    execution: Option<ExecutionSummary>,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    lookup_error: Option<String>,
}

impl NormalizedStatus {
    /// Status derived from an execution record.
    pub fn observed(status: RunStatus, execution: ExecutionSummary) -> Self {
        Self {
            ok: status.is_success(),
            status,
            execution: Some(execution),
            lookup_error: None,
        }
    }

    /// The workflow has never run.
    pub fn no_execution() -> Self {
        Self {
            ok: false,
            status: RunStatus::Unknown,
            execution: None,
            lookup_error: None,
        }
    }

    /// The execution lookup failed.
    pub fn lookup_failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: RunStatus::Unknown,
            execution: None,
            lookup_error: Some(error.into()),
        }
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn execution(&self) -> Option<&ExecutionSummary> {
        self.execution.as_ref()
    }

    pub fn lookup_error(&self) -> Option<&str> {
        self.lookup_error.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// One row of the managed-workflows table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: String,
    pub name: Option<String>,
    pub enabled: bool,
    pub last_run: Option<String>,
    /// Editor link, empty when no editor base URL is configured.
    pub n8n_url: String,
    /// Placeholder until schedule nodes are parsed.
    pub schedule_time: String,
    /// Placeholder until schedule nodes are parsed.
    pub frequency: String,
    pub has_webhook: bool,
}

// ---------------------------------------------------------------------------
// Trigger ("run now")
// ---------------------------------------------------------------------------

/// Raw response of a webhook call, before body decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl WebhookResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Decoded webhook body: JSON when the remote declared JSON and it parsed,
/// otherwise the raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WebhookBody {
    Json(serde_json::Value),
    Text(String),
}

/// Outcome of a "run now" request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerOutcome {
    pub ok: bool,
    /// HTTP status of the webhook call, or 400 when no webhook is configured.
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<WebhookBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TriggerOutcome {
    /// The webhook was called; success follows the HTTP status.
    pub fn delivered(status: u16, body: WebhookBody) -> Self {
        Self {
            ok: (200..300).contains(&status),
            status,
            body: Some(body),
            error: None,
        }
    }

    /// The trigger was refused before any network call.
    pub fn rejected(error: &AutomationError) -> Self {
        Self {
            ok: false,
            status: error.http_status(),
            body: None,
            error: Some(error.to_string()),
        }
    }

    /// UI-facing `{ok, status, message, details}` shape.
    pub fn into_report(self) -> TriggerReport {
        let message = match (&self.error, self.ok) {
            (Some(error), _) => error.clone(),
            (None, true) => "Workflow triggered".to_string(),
            (None, false) => format!("Webhook returned HTTP {}", self.status),
        };
        let details = match self.body {
            Some(WebhookBody::Json(value)) => value,
            Some(WebhookBody::Text(text)) => serde_json::Value::String(text),
            None => serde_json::Value::Null,
        };
        TriggerReport {
            ok: self.ok,
            status: self.status,
            message,
            details,
        }
    }
}

/// Trigger result as rendered to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerReport {
    pub ok: bool,
    pub status: u16,
    pub message: String,
    pub details: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn workflow_record_accepts_numeric_id_and_missing_active() {
        let record: WorkflowRecord =
            serde_json::from_value(json!({"id": 7, "name": "scraper"})).unwrap();
        assert_eq!(record.id, "7");
        assert_eq!(record.name.as_deref(), Some("scraper"));
        assert!(!record.active);
    }

    #[test]
    fn execution_record_reads_camel_case_fields() {
        let record: ExecutionRecord = serde_json::from_value(json!({
            "id": 1001,
            "workflowId": "abc",
            "status": "error",
            "startedAt": "2024-01-01T00:00:00.000Z",
            "stoppedAt": "2024-01-01T00:01:00.000Z",
            "error": {"message": "node failed"}
        }))
        .unwrap();
        assert_eq!(record.id.as_deref(), Some("1001"));
        assert_eq!(record.workflow_id.as_deref(), Some("abc"));
        assert_eq!(record.status.as_deref(), Some("error"));
        assert_eq!(record.stopped_at.as_deref(), Some("2024-01-01T00:01:00.000Z"));
        assert_eq!(record.error.as_deref(), Some("node failed"));
    }

    #[test]
    fn last_run_falls_back_to_finished_at() {
        let record = ExecutionRecord {
            finished_at: Some("2024-02-02T10:00:00Z".to_string()),
            ..Default::default()
        };
        assert_eq!(record.last_run(), Some("2024-02-02T10:00:00Z"));
    }

    #[test]
    fn execution_list_prefers_data_over_items() {
        let list: ExecutionList = serde_json::from_value(json!({
            "data": [{"id": "from-data"}],
            "items": [{"id": "from-items"}]
        }))
        .unwrap();
        assert_eq!(list.executions().len(), 1);
        assert_eq!(list.into_latest().unwrap().id.as_deref(), Some("from-data"));
    }

    #[test]
    fn execution_list_reads_items_when_data_missing_or_empty() {
        let only_items: ExecutionList =
            serde_json::from_value(json!({"items": [{"id": "e1"}, {"id": "e0"}]})).unwrap();
        assert_eq!(only_items.into_latest().unwrap().id.as_deref(), Some("e1"));

        let empty_data: ExecutionList =
            serde_json::from_value(json!({"data": [], "items": [{"id": "e2"}]})).unwrap();
        assert_eq!(empty_data.into_latest().unwrap().id.as_deref(), Some("e2"));
    }

    #[test]
    fn execution_list_without_executions_is_empty() {
        let list: ExecutionList = serde_json::from_value(json!({"data": []})).unwrap();
        assert!(list.executions().is_empty());
        assert!(list.into_latest().is_none());
    }

    #[test]
    fn run_status_token_mapping() {
        assert_eq!(RunStatus::from_token("success"), RunStatus::Success);
        assert_eq!(RunStatus::from_token("crashed"), RunStatus::Error);
        assert_eq!(RunStatus::from_token("waiting"), RunStatus::Running);
        assert_eq!(RunStatus::from_token("cancelled"), RunStatus::Canceled);
        assert_eq!(RunStatus::from_token("something-new"), RunStatus::Unknown);
        assert_eq!("Canceled".parse::<RunStatus>().unwrap(), RunStatus::Canceled);
    }

    #[test]
    fn normalized_status_ok_tracks_status() {
        let summary = ExecutionSummary {
            id: Some("e1".to_string()),
            started_at: None,
            stopped_at: None,
            workflow_id: None,
            error: String::new(),
        };
        assert!(NormalizedStatus::observed(RunStatus::Success, summary.clone()).ok());
        assert!(!NormalizedStatus::observed(RunStatus::Running, summary).ok());
        assert!(!NormalizedStatus::no_execution().ok());
    }

    #[test]
    fn no_execution_serializes_without_error_field() {
        let value = serde_json::to_value(NormalizedStatus::no_execution()).unwrap();
        assert_eq!(value, json!({"ok": false, "status": "unknown"}));
    }

    #[test]
    fn lookup_failure_serializes_error_field() {
        let value = serde_json::to_value(NormalizedStatus::lookup_failed("HTTP 500")).unwrap();
        assert_eq!(
            value,
            json!({"ok": false, "status": "unknown", "error": "HTTP 500"})
        );
    }

    #[test]
    fn rejected_trigger_report() {
        let err = AutomationError::WebhookNotConfigured {
            workflow_id: "abc".to_string(),
        };
        let report = TriggerOutcome::rejected(&err).into_report();
        assert!(!report.ok);
        assert_eq!(report.status, 400);
        assert_eq!(report.message, "No webhook configured for this workflow");
        assert!(report.details.is_null());
    }

    #[test]
    fn delivered_trigger_report_carries_body() {
        let outcome = TriggerOutcome::delivered(200, WebhookBody::Json(json!({"rows": 3})));
        assert!(outcome.ok);
        let report = outcome.into_report();
        assert_eq!(report.message, "Workflow triggered");
        assert_eq!(report.details, json!({"rows": 3}));

        let failed = TriggerOutcome::delivered(500, WebhookBody::Text("boom".to_string()));
        assert!(!failed.ok);
        let report = failed.into_report();
        assert_eq!(report.message, "Webhook returned HTTP 500");
        assert_eq!(report.details, json!("boom"));
    }
}
