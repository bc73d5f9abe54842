//! Mapping of prediction failures onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::PredictionError;

// ---

/// Error returned by route handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        // ---
        match err {
            PredictionError::InvalidInput(message) => Self::new(StatusCode::BAD_REQUEST, message),
            PredictionError::Domain(message) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            PredictionError::ModelLoad(e) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "Prediction model failed to load or execute",
            )
            .with_details(e.to_string()),
        }
    }
}
