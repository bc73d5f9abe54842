// src/routes/health.rs
//! API health check endpoint.
//!
//! `/health` is used by container orchestrators and CI to verify the service
//! answers HTTP requests. It does not touch the model artifacts.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
pub(super) struct HealthResponse {
    status: &'static str,
}

/// Handle `GET /health` and its aliases.
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create a subrouter containing the `/health` and root `/` routes.
///
/// Generic over the application state so it merges cleanly with the gateway
/// router regardless of the state type.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
}
