use crate::AppState;
use axum::{Router, routing::get};

/// Public Router Module
///
/// Defines the endpoints that are **unauthenticated** and accessible to any
/// client. Everything else in this API requires a resolved principal, so the
/// public surface is deliberately tiny.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load
        // balancer checks. Returns "ok" immediately to verify the service is
        // running and responsive.
        .route("/health", get(|| async { "ok" }))
}
