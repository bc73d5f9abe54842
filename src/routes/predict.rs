//! `POST /predict`: seismic prediction for an impact.
//!
//! `GET /predict` and `GET /predict/` answer like `/health` so clients can
//! probe the router.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, info};

use super::{error::ApiError, health::health, AppState};
use crate::{ImpactRequest, PredictionResponse};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/predict", get(health).post(handler))
        .route("/predict/", get(health))
        .route("/predict/predict", post(handler))
}

async fn handler(
    State(state): State<AppState>,
    Json(request): Json<ImpactRequest>,
) -> Result<Json<PredictionResponse>, ApiError> {
    // ---
    info!(
        mass_kg = request.mass_kg,
        velocity_ms = request.velocity_ms,
        latitude = request.latitude,
        longitude = request.longitude,
        "POST /predict"
    );

    let prediction = state.predictor.predict(&request).await?;
    let response = prediction.to_response(&request);

    debug!(
        cluster = response.cluster,
        alert = %response.alert_level,
        "POST /predict - Returning OK"
    );
    Ok(Json(response))
}
