//! N8nClient -- concrete [`AutomationApi`] implementation over reqwest.
//!
//! Talks to the n8n public REST API (`/workflows`, `/executions`) with the
//! `X-N8N-API-KEY` header, plus `n8n-project-id` when a project is
//! configured. Webhook calls are plain JSON POSTs without API credentials.
//!
//! Every API call checks its configuration before touching the network: a
//! missing API URL or key is a [`AutomationError::MissingSetting`], never a
//! transport error.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Url};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::debug;

use carmatch_core::automation::api::AutomationApi;
use carmatch_types::automation::{ExecutionList, WebhookResponse, WorkflowRecord};
use carmatch_types::config::AutomationConfig;
use carmatch_types::error::AutomationError;

/// HTTP client for the automation tool.
///
/// Holds one reqwest client for the process lifetime. The API key stays a
/// `SecretString` inside the shared config and is only exposed when a
/// request header is built.
pub struct N8nClient {
    http: reqwest::Client,
    config: Arc<AutomationConfig>,
}

impl N8nClient {
    const API_KEY_HEADER: &'static str = "X-N8N-API-KEY";
    const PROJECT_HEADER: &'static str = "n8n-project-id";

    pub fn new(config: Arc<AutomationConfig>) -> Result<Self, AutomationError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("carmatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AutomationError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Build an authenticated API request for the path `segments` below the
    /// API root. Each segment is percent-encoded as a single path segment.
    fn api_request(
        &self,
        method: Method,
        segments: &[&str],
        timeout_secs: u64,
    ) -> Result<RequestBuilder, AutomationError> {
        let api_url = self.config.api_url()?;
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or(AutomationError::MissingSetting("N8N_API_KEY"))?;

        let url = endpoint_url(api_url, segments)?;
        debug!(%method, %url, "Automation API request");

        let mut request = self
            .http
            .request(method, url)
            .header(Self::API_KEY_HEADER, api_key.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(Duration::from_secs(timeout_secs));

        if let Some(project_id) = self.config.project_id() {
            request = request.header(Self::PROJECT_HEADER, project_id);
        }
        Ok(request)
    }

    /// Send a request and decode a successful JSON response.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, AutomationError> {
        let response = request
            .send()
            .await
            .map_err(|e| AutomationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AutomationError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AutomationError::Decode(e.to_string()))
    }
}

/// Join `segments` onto the API root.
fn endpoint_url(api_url: &str, segments: &[&str]) -> Result<Url, AutomationError> {
    let invalid = |reason: String| {
        AutomationError::Transport(format!("invalid API URL '{api_url}': {reason}"))
    };

    let mut url = Url::parse(api_url).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Accept only ids that stay one path segment below `/workflows`.
///
/// n8n ids are alphanumeric (or numeric on older instances).
fn workflow_segment(workflow_id: &str) -> Result<&str, AutomationError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if workflow_id.is_empty()
        || workflow_id == "."
        || workflow_id == ".."
        || !workflow_id.chars().all(allowed)
    {
        return Err(AutomationError::InvalidWorkflowId(workflow_id.to_string()));
    }
    Ok(workflow_id)
}

impl AutomationApi for N8nClient {
    async fn get_workflow(&self, workflow_id: &str) -> Result<WorkflowRecord, AutomationError> {
        let request = self.api_request(
            Method::GET,
            &["workflows", workflow_segment(workflow_id)?],
            self.config.api_timeout_secs,
        )?;
        self.send_json(request).await
    }

    async fn set_workflow_active(
        &self,
        workflow_id: &str,
        active: bool,
    ) -> Result<WorkflowRecord, AutomationError> {
        let request = self
            .api_request(
                Method::PATCH,
                &["workflows", workflow_segment(workflow_id)?],
                self.config.api_timeout_secs,
            )?
            .json(&serde_json::json!({ "active": active }));
        self.send_json(request).await
    }

    async fn replace_workflow(
        &self,
        workflow_id: &str,
        definition: &serde_json::Value,
    ) -> Result<serde_json::Value, AutomationError> {
        let request = self
            .api_request(
                Method::PUT,
                &["workflows", workflow_segment(workflow_id)?],
                self.config.replace_timeout_secs,
            )?
            .json(definition);
        self.send_json(request).await
    }

    async fn list_executions(
        &self,
        workflow_id: &str,
        limit: u32,
    ) -> Result<ExecutionList, AutomationError> {
        let limit = limit.to_string();
        let request = self
            .api_request(Method::GET, &["executions"], self.config.api_timeout_secs)?
            .query(&[("workflowId", workflow_id), ("limit", limit.as_str())]);

        // A `null` body is treated as an empty list.
        let list: Option<ExecutionList> = self.send_json(request).await?;
        Ok(list.unwrap_or_default())
    }

    async fn post_webhook(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<WebhookResponse, AutomationError> {
        debug!(%url, "Calling workflow webhook");

        let response = self
            .http
            .post(url)
            .json(payload)
            .timeout(Duration::from_secs(self.config.webhook_timeout_secs))
            .send()
            .await
            .map_err(|e| AutomationError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| AutomationError::Transport(e.to_string()))?;

        debug!(status, content_type = ?content_type, "Webhook responded");
        Ok(WebhookResponse {
            status,
            content_type,
            body,
        })
    }
}
