//! Axum router configuration with middleware.
//!
//! API routes live under `/api/v1/`; `/health` sits at the root.
//! Middleware: CORS, tracing.

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api/v1", handlers::flows::flow_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
