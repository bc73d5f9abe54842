//! Error types for the acquisition, join and inference subsystems.

use thiserror::Error;

// ---

/// Failures while counting or downloading catalog events.
///
/// Every variant is fatal to an acquisition run; nothing is retried.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid response from count endpoint: {body}")]
    InvalidCountResponse { body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while reading a single chunk file.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing key '{0}'")]
    MissingKey(&'static str),
}

/// An artifact needed for inference could not be loaded.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("failed to parse dataset {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),
}

/// Why a single prediction could not be produced.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Domain(String),

    #[error("model load error: {0}")]
    ModelLoad(#[from] ModelError),
}
