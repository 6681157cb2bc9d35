//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use carmatch_types::error::AutomationError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Automation adapter errors.
    Automation(AutomationError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
}

impl From<AutomationError> for AppError {
    fn from(e: AutomationError) -> Self {
        AppError::Automation(e)
    }
}

impl AppError {
    /// HTTP status, machine-readable code and message for this error.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Automation(e @ AutomationError::MissingSetting(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "CONFIG_ERROR", e.to_string())
            }
            AppError::Automation(AutomationError::Http { status: 404, .. }) => {
                (StatusCode::NOT_FOUND, "FLOW_NOT_FOUND", "Workflow not found".to_string())
            }
            AppError::Automation(e @ AutomationError::WebhookNotConfigured { .. }) => {
                (StatusCode::BAD_REQUEST, "WEBHOOK_NOT_CONFIGURED", e.to_string())
            }
            AppError::Automation(e @ AutomationError::InvalidWorkflowId(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Automation(AutomationError::Http { status, body }) => {
                tracing::debug!(status, body = %body, "Automation API error body");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    format!("Automation API returned HTTP {status}"),
                )
            }
            AppError::Automation(e) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", e.to_string()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_setting_is_service_unavailable() {
        let (status, code, message) =
            AppError::from(AutomationError::MissingSetting("N8N_API_KEY")).parts();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "CONFIG_ERROR");
        assert!(message.contains("N8N_API_KEY"));
    }

    #[test]
    fn remote_not_found_maps_to_404() {
        let err = AppError::from(AutomationError::Http {
            status: 404,
            body: "{}".to_string(),
        });
        assert_eq!(err.parts().0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn other_remote_failures_are_bad_gateway() {
        let err = AppError::from(AutomationError::Http {
            status: 401,
            body: "unauthorized".to_string(),
        });
        assert_eq!(err.parts().0, StatusCode::BAD_GATEWAY);

        let err = AppError::from(AutomationError::Transport("timed out".to_string()));
        assert_eq!(err.parts().1, "UPSTREAM_ERROR");
    }

    #[test]
    fn upstream_body_is_not_echoed() {
        let err = AppError::from(AutomationError::Http {
            status: 500,
            body: r#"{"message":"SQLITE_ERROR: no such table: credentials_entity"}"#.to_string(),
        });
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "UPSTREAM_ERROR");
        assert_eq!(message, "Automation API returned HTTP 500");
    }

    #[test]
    fn invalid_workflow_id_is_validation_error() {
        let err = AppError::from(AutomationError::InvalidWorkflowId("../credentials".to_string()));
        let (status, code, _) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
    }

    #[test]
    fn into_response_uses_status() {
        let response = AppError::Validation("bad json".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
