//! Workflow service: the operations the UI layer calls.
//!
//! `WorkflowService` is generic over [`AutomationApi`] and holds the shared,
//! read-only [`AutomationConfig`]. It owns no other state.
//!
//! Error policy: single-workflow operations return `Err` so callers learn
//! exactly what failed. The aggregate views (`last_execution_status`,
//! `list_flows`) are best-effort and never fail as a whole.

use std::sync::Arc;

use tracing::{debug, warn};

use carmatch_types::automation::{
    ExecutionList, ExecutionRecord, NormalizedStatus, ToggleOutcome, TriggerOutcome,
    WorkflowRecord, WorkflowSummary,
};
use carmatch_types::config::AutomationConfig;
use carmatch_types::error::AutomationError;

use super::api::AutomationApi;
use super::status::normalize_lookup;
use super::webhook::decode_webhook_body;

/// Default page size of the single-workflow execution listing.
pub const DEFAULT_EXECUTION_LIMIT: u32 = 20;

/// Outcome of summarizing one managed workflow.
#[derive(Debug)]
pub struct FlowAttempt {
    pub workflow_id: String,
    pub outcome: Result<WorkflowSummary, AutomationError>,
}

/// Service over the automation tool's workflows.
pub struct WorkflowService<A: AutomationApi> {
    api: A,
    config: Arc<AutomationConfig>,
}

impl<A: AutomationApi> WorkflowService<A> {
    pub fn new(api: A, config: Arc<AutomationConfig>) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &AutomationConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Per-workflow operations
    // -----------------------------------------------------------------------

    /// Fetch a workflow's metadata.
    pub async fn get_workflow(&self, workflow_id: &str) -> Result<WorkflowRecord, AutomationError> {
        self.api.get_workflow(workflow_id).await
    }

    /// Most recent execution, or `None` if the workflow has never run.
    ///
    /// Relies on the remote listing executions newest first.
    pub async fn last_execution(
        &self,
        workflow_id: &str,
    ) -> Result<Option<ExecutionRecord>, AutomationError> {
        let list = self.api.list_executions(workflow_id, 1).await?;
        Ok(list.into_latest())
    }

    /// Normalized status of the most recent execution. Never fails.
    pub async fn last_execution_status(&self, workflow_id: &str) -> NormalizedStatus {
        let lookup = self.last_execution(workflow_id).await;
        if let Err(e) = &lookup {
            debug!(workflow_id, error = %e, "Last execution lookup failed");
        }
        normalize_lookup(lookup)
    }

    /// Enable or disable a workflow. Last writer wins.
    pub async fn set_active(
        &self,
        workflow_id: &str,
        active: bool,
    ) -> Result<WorkflowRecord, AutomationError> {
        debug!(workflow_id, active, "Setting workflow active flag");
        self.api.set_workflow_active(workflow_id, active).await
    }

    /// Set the active flag, or flip the current one when `desired` is `None`.
    pub async fn toggle(
        &self,
        workflow_id: &str,
        desired: Option<bool>,
    ) -> Result<ToggleOutcome, AutomationError> {
        let active = match desired {
            Some(active) => active,
            None => !self.api.get_workflow(workflow_id).await?.active,
        };
        let updated = self.set_active(workflow_id, active).await?;
        Ok(updated.into())
    }

    /// Trigger a workflow through its mapped webhook.
    ///
    /// An unmapped workflow yields a rejected outcome (400) without any
    /// network call. Transport failures are returned as `Err`; HTTP error
    /// statuses from the webhook are reported in the outcome.
    pub async fn run_now(
        &self,
        workflow_id: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<TriggerOutcome, AutomationError> {
        match self.config.webhook_for(workflow_id) {
            Some(url) => self.post_to_webhook(url, payload).await,
            None => Ok(TriggerOutcome::rejected(&AutomationError::WebhookNotConfigured {
                workflow_id: workflow_id.to_string(),
            })),
        }
    }

    async fn post_to_webhook(
        &self,
        url: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<TriggerOutcome, AutomationError> {
        let payload = payload.unwrap_or_else(|| serde_json::json!({}));
        let response = self.api.post_webhook(url, &payload).await?;
        let body = decode_webhook_body(&response);
        Ok(TriggerOutcome::delivered(response.status, body))
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    /// Summarize every managed workflow, one attempt per configured id.
    ///
    /// Ids are processed sequentially in configuration order.
    pub async fn summarize_flows(&self) -> Vec<FlowAttempt> {
        let mut attempts = Vec::new();
        for workflow_id in self.config.managed_flow_ids() {
            let outcome = self.summarize_flow(workflow_id).await;
            attempts.push(FlowAttempt {
                workflow_id: workflow_id.to_string(),
                outcome,
            });
        }
        attempts
    }

    async fn summarize_flow(&self, workflow_id: &str) -> Result<WorkflowSummary, AutomationError> {
        let workflow = self.api.get_workflow(workflow_id).await?;
        let last = self.last_execution(workflow_id).await?;

        Ok(WorkflowSummary {
            n8n_url: self.config.editor_url(&workflow.id).unwrap_or_default(),
            has_webhook: self.config.has_webhook(&workflow.id),
            last_run: last.as_ref().and_then(|e| e.last_run()).map(str::to_string),
            id: workflow.id,
            name: workflow.name,
            enabled: workflow.active,
            schedule_time: String::new(),
            frequency: String::new(),
        })
    }

    /// Best-effort listing: workflows that could not be fetched are skipped.
    pub async fn list_flows(&self) -> Vec<WorkflowSummary> {
        self.summarize_flows()
            .await
            .into_iter()
            .filter_map(|attempt| match attempt.outcome {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!(
                        workflow_id = %attempt.workflow_id,
                        error = %e,
                        "Skipping workflow in listing"
                    );
                    None
                }
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Legacy single-workflow mode
    // -----------------------------------------------------------------------

    pub async fn get_workflow_single(&self) -> Result<WorkflowRecord, AutomationError> {
        let workflow_id = self.config.single_workflow_id()?;
        self.api.get_workflow(workflow_id).await
    }

    pub async fn set_active_single(&self, active: bool) -> Result<WorkflowRecord, AutomationError> {
        let workflow_id = self.config.single_workflow_id()?;
        self.set_active(workflow_id, active).await
    }

    pub async fn list_executions_single(&self, limit: u32) -> Result<ExecutionList, AutomationError> {
        let workflow_id = self.config.single_workflow_id()?;
        self.api.list_executions(workflow_id, limit).await
    }

    pub fn editor_url_single(&self) -> Result<String, AutomationError> {
        let workflow_id = self.config.single_workflow_id()?;
        self.config
            .editor_url(workflow_id)
            .ok_or(AutomationError::MissingSetting("N8N_BASE_URL"))
    }

    /// Replace the whole workflow definition. The remote keeps no history.
    pub async fn replace_workflow_single(
        &self,
        definition: &serde_json::Value,
    ) -> Result<serde_json::Value, AutomationError> {
        let workflow_id = self.config.single_workflow_id()?;
        warn!(workflow_id, "Replacing full workflow definition");
        self.api.replace_workflow(workflow_id, definition).await
    }

    /// Trigger the single workflow: its mapped webhook, else the fallback URL.
    pub async fn run_now_single(
        &self,
        payload: Option<serde_json::Value>,
    ) -> Result<TriggerOutcome, AutomationError> {
        match self.config.single_webhook() {
            Some(url) => self.post_to_webhook(url, payload).await,
            None => Ok(TriggerOutcome::rejected(&AutomationError::WebhookNotConfigured {
                workflow_id: self.config.workflow_id.clone().unwrap_or_default(),
            })),
        }
    }
}
