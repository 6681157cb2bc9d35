use axum::Json;
use serde_json::json;

/// GET /health - liveness probe, no authentication.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
