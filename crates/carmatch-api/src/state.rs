//! Application state wiring the service to its infrastructure.
//!
//! `WorkflowService` is generic over the `AutomationApi` port; AppState pins
//! it to the reqwest-backed `N8nClient`.

use std::path::Path;
use std::sync::Arc;

use secrecy::ExposeSecret;

use carmatch_core::automation::service::WorkflowService;
use carmatch_infra::automation::N8nClient;
use carmatch_infra::config::load_carmatch_config;
use carmatch_types::config::AutomationConfig;

use crate::http::extractors::auth::hash_api_key;

/// Concrete service type pinned to the infra HTTP client.
pub type ConcreteWorkflowService = WorkflowService<N8nClient>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers. Everything in it is
/// read-only after `init`.
#[derive(Clone)]
pub struct AppState {
    pub workflow_service: Arc<ConcreteWorkflowService>,
    pub automation_config: Arc<AutomationConfig>,
    /// SHA-256 (hex) of the admin token; `None` leaves the REST API open.
    pub admin_token_hash: Option<String>,
}

impl AppState {
    /// Load configuration once and wire the service.
    pub async fn init(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = load_carmatch_config(config_path).await;

        let admin_token_hash = config
            .server
            .admin_token
            .as_ref()
            .map(|token| hash_api_key(token.expose_secret()));

        let automation_config = Arc::new(config.automation);
        let client = N8nClient::new(Arc::clone(&automation_config))?;
        let workflow_service = WorkflowService::new(client, Arc::clone(&automation_config));

        tracing::debug!(
            flows = automation_config.managed_flow_ids().len(),
            webhooks = automation_config.webhooks.len(),
            "Automation adapter configured"
        );

        Ok(Self {
            workflow_service: Arc::new(workflow_service),
            automation_config,
            admin_token_hash,
        })
    }
}
