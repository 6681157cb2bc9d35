use thiserror::Error;

/// Errors from the automation (n8n) adapter.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// A setting required by the operation is not configured.
    #[error("missing configuration: {0}")]
    MissingSetting(&'static str),

    /// The remote API answered with a non-success status.
    #[error("remote API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (connect, timeout, TLS...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The workflow id cannot be used as a single URL path segment.
    #[error("invalid workflow id '{0}'")]
    InvalidWorkflowId(String),

    /// "Run now" requested for a workflow with no mapped webhook.
    #[error("No webhook configured for this workflow")]
    WebhookNotConfigured { workflow_id: String },
}

/// Coarse classification used by callers to decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomationErrorKind {
    Configuration,
    Remote,
    NotConfigured,
    InvalidInput,
}

impl AutomationError {
    pub fn kind(&self) -> AutomationErrorKind {
        match self {
            AutomationError::MissingSetting(_) => AutomationErrorKind::Configuration,
            AutomationError::Http { .. }
            | AutomationError::Transport(_)
            | AutomationError::Decode(_) => AutomationErrorKind::Remote,
            AutomationError::WebhookNotConfigured { .. } => AutomationErrorKind::NotConfigured,
            AutomationError::InvalidWorkflowId(_) => AutomationErrorKind::InvalidInput,
        }
    }

    /// HTTP-equivalent status code for reporting this error to a UI.
    pub fn http_status(&self) -> u16 {
        match self {
            AutomationError::MissingSetting(_) => 503,
            AutomationError::Http { status, .. } => *status,
            AutomationError::Transport(_) | AutomationError::Decode(_) => 502,
            AutomationError::WebhookNotConfigured { .. }
            | AutomationError::InvalidWorkflowId(_) => 400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_setting_display() {
        let err = AutomationError::MissingSetting("N8N_API_KEY");
        assert_eq!(err.to_string(), "missing configuration: N8N_API_KEY");
        assert_eq!(err.kind(), AutomationErrorKind::Configuration);
    }

    #[test]
    fn test_http_error_display() {
        let err = AutomationError::Http {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "remote API returned HTTP 404: not found");
        assert_eq!(err.kind(), AutomationErrorKind::Remote);
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn test_webhook_not_configured_is_bad_request() {
        let err = AutomationError::WebhookNotConfigured {
            workflow_id: "wf1".to_string(),
        };
        assert_eq!(err.kind(), AutomationErrorKind::NotConfigured);
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_invalid_workflow_id_is_bad_request() {
        let err = AutomationError::InvalidWorkflowId("../credentials".to_string());
        assert_eq!(err.to_string(), "invalid workflow id '../credentials'");
        assert_eq!(err.kind(), AutomationErrorKind::InvalidInput);
        assert_eq!(err.http_status(), 400);
    }
}
