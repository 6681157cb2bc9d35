//! AutomationApi trait definition.
//!
//! The port through which the service talks to the automation tool. Each
//! method is exactly one outbound HTTP round trip; the infrastructure layer
//! (carmatch-infra) implements it with reqwest.
//!
//! Uses native async fn in traits (Rust 2024 edition, no async_trait macro).

use carmatch_types::automation::{ExecutionList, WebhookResponse, WorkflowRecord};
use carmatch_types::error::AutomationError;

/// Remote automation API (n8n public API plus webhook calls).
pub trait AutomationApi: Send + Sync {
    /// `GET /workflows/{id}`.
    fn get_workflow(
        &self,
        workflow_id: &str,
    ) -> impl std::future::Future<Output = Result<WorkflowRecord, AutomationError>> + Send;

    /// `PATCH /workflows/{id}` with `{"active": active}`.
    fn set_workflow_active(
        &self,
        workflow_id: &str,
        active: bool,
    ) -> impl std::future::Future<Output = Result<WorkflowRecord, AutomationError>> + Send;

    /// `PUT /workflows/{id}` replacing the whole definition.
    fn replace_workflow(
        &self,
        workflow_id: &str,
        definition: &serde_json::Value,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, AutomationError>> + Send;

    /// `GET /executions?workflowId={id}&limit={limit}`.
    fn list_executions(
        &self,
        workflow_id: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<ExecutionList, AutomationError>> + Send;

    /// `POST <url>` with a JSON payload. Any HTTP status is a response, not
    /// an error; only transport failures are `Err`.
    fn post_webhook(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> impl std::future::Future<Output = Result<WebhookResponse, AutomationError>> + Send;
}
