//! Configuration types for CarMatch.
//!
//! `CarmatchConfig` mirrors the optional `carmatch.toml` file; every field can
//! also be supplied through the environment (see `carmatch-infra::config`).
//! It is built once at startup and shared read-only afterwards.

use std::collections::HashMap;
use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::error::AutomationError;

/// Top-level configuration file.
#[derive(Debug, Default, Deserialize)]
pub struct CarmatchConfig {
    #[serde(default)]
    pub automation: AutomationConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Connection settings for the automation tool (n8n) and its webhooks.
#[derive(Deserialize)]
pub struct AutomationConfig {
    /// Public API root, e.g. `http://localhost:5678/api/v1`.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Public API key, sent as `X-N8N-API-KEY`.
    #[serde(default, deserialize_with = "optional_secret")]
    pub api_key: Option<SecretString>,

    /// Editor root used to build links, e.g. `http://localhost:5678`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Project scope, sent as `n8n-project-id` when present.
    #[serde(default)]
    pub project_id: Option<String>,

    /// Legacy single-workflow mode target.
    #[serde(default)]
    pub workflow_id: Option<String>,

    /// Workflows shown in the admin listing.
    #[serde(default)]
    pub flow_ids: Vec<String>,

    /// Workflow id -> webhook URL used by "run now".
    #[serde(default)]
    pub webhooks: HashMap<String, String>,

    /// Fallback webhook for single-workflow mode.
    #[serde(default)]
    pub webhook_url: Option<String>,

    #[serde(default = "default_api_timeout_secs")]
    pub api_timeout_secs: u64,

    #[serde(default = "default_replace_timeout_secs")]
    pub replace_timeout_secs: u64,

    /// Synchronous webhooks wait for the whole workflow, hence the long default.
    #[serde(default = "default_webhook_timeout_secs")]
    pub webhook_timeout_secs: u64,
}

/// Settings for the exposed REST API.
#[derive(Default, Deserialize)]
pub struct ServerConfig {
    /// When set, REST calls must present this token.
    #[serde(default, deserialize_with = "optional_secret")]
    pub admin_token: Option<SecretString>,
}

fn default_api_timeout_secs() -> u64 {
    20
}

fn default_replace_timeout_secs() -> u64 {
    30
}

fn default_webhook_timeout_secs() -> u64 {
    90
}

fn optional_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(SecretString::from))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            base_url: None,
            project_id: None,
            workflow_id: None,
            flow_ids: Vec::new(),
            webhooks: HashMap::new(),
            webhook_url: None,
            api_timeout_secs: default_api_timeout_secs(),
            replace_timeout_secs: default_replace_timeout_secs(),
            webhook_timeout_secs: default_webhook_timeout_secs(),
        }
    }
}

// The API key is never printed.
impl fmt::Debug for AutomationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutomationConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "****"))
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("workflow_id", &self.workflow_id)
            .field("flow_ids", &self.flow_ids)
            .field("webhooks", &self.webhooks.keys().collect::<Vec<_>>())
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "****"))
            .finish()
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("admin_token", &self.admin_token.as_ref().map(|_| "****"))
            .finish()
    }
}

impl AutomationConfig {
    /// API root without a trailing slash.
    pub fn api_url(&self) -> Result<&str, AutomationError> {
        non_empty(&self.api_url)
            .map(|url| url.trim_end_matches('/'))
            .ok_or(AutomationError::MissingSetting("N8N_API_URL"))
    }

    pub fn project_id(&self) -> Option<&str> {
        non_empty(&self.project_id)
    }

    /// The single workflow id of legacy mode.
    pub fn single_workflow_id(&self) -> Result<&str, AutomationError> {
        non_empty(&self.workflow_id).ok_or(AutomationError::MissingSetting("N8N_WORKFLOW_ID"))
    }

    /// Ids shown in the listing: `flow_ids`, or the single workflow id when
    /// no list is configured. Blank entries are dropped.
    pub fn managed_flow_ids(&self) -> Vec<&str> {
        let listed: Vec<&str> = self
            .flow_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .collect();
        if listed.is_empty() {
            non_empty(&self.workflow_id).into_iter().collect()
        } else {
            listed
        }
    }

    /// Editor link for a workflow, `None` when no base URL is configured.
    pub fn editor_url(&self, workflow_id: &str) -> Option<String> {
        non_empty(&self.base_url)
            .map(|base| format!("{}/workflow/{workflow_id}", base.trim_end_matches('/')))
    }

    pub fn webhook_for(&self, workflow_id: &str) -> Option<&str> {
        self.webhooks
            .get(workflow_id)
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
    }

    pub fn has_webhook(&self, workflow_id: &str) -> bool {
        self.webhook_for(workflow_id).is_some()
    }

    /// Webhook for single-workflow mode: the mapped one, else the fallback.
    pub fn single_webhook(&self) -> Option<&str> {
        non_empty(&self.workflow_id)
            .and_then(|id| self.webhook_for(id))
            .or_else(|| non_empty(&self.webhook_url))
    }
}
