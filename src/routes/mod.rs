use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::inference::{ArtifactLoader, Predictor};
use crate::Config;

mod error;
mod health;
mod predict;

pub use error::ApiError;

// ---

/// State shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
}

impl AppState {
    pub fn new(loader: Arc<dyn ArtifactLoader>) -> Self {
        Self {
            predictor: Arc::new(Predictor::new(loader)),
        }
    }
}

pub fn router(state: AppState, config: &Config) -> Router {
    // ---
    Router::new()
        .merge(predict::router())
        .merge(health::router())
        .with_state(state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    // ---
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin '{}': {}", o, e);
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(allowed)
    }
}
