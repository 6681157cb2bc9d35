//! Webhook response decoding.

use carmatch_types::automation::{WebhookBody, WebhookResponse};

/// Decode a webhook body: JSON when declared as JSON and parseable,
/// raw text in every other case.
pub fn decode_webhook_body(response: &WebhookResponse) -> WebhookBody {
    let declared_json = response
        .content_type
        .as_deref()
        .map(|ct| ct.trim().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false);

    if declared_json {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&response.body) {
            return WebhookBody::Json(value);
        }
    }
    WebhookBody::Text(response.body.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(content_type: Option<&str>, body: &str) -> WebhookResponse {
        WebhookResponse {
            status: 200,
            content_type: content_type.map(str::to_string),
            body: body.to_string(),
        }
    }

    #[test]
    fn json_content_type_is_parsed() {
        let body = decode_webhook_body(&response(
            Some("application/json; charset=utf-8"),
            r#"{"inserted": 12}"#,
        ));
        assert_eq!(body, WebhookBody::Json(json!({"inserted": 12})));
    }

    #[test]
    fn text_content_type_is_kept_raw() {
        let body = decode_webhook_body(&response(Some("text/plain"), r#"{"looks": "json"}"#));
        assert_eq!(body, WebhookBody::Text(r#"{"looks": "json"}"#.to_string()));
    }

    #[test]
    fn invalid_json_falls_back_to_text() {
        let body = decode_webhook_body(&response(Some("application/json"), "Workflow was started"));
        assert_eq!(body, WebhookBody::Text("Workflow was started".to_string()));
    }

    #[test]
    fn missing_content_type_is_text() {
        let body = decode_webhook_body(&response(None, ""));
        assert_eq!(body, WebhookBody::Text(String::new()));
    }
}
