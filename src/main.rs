//! Application entry point for the `seismic-impact` prediction service.
//!
//! This binary orchestrates the startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Pointing the predictor at the model artifact directory
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `PORT` (optional) – listen port (default: 8080)
//! - `BIND_HOST` (optional) – listen interface (default: `0.0.0.0`)
//! - `ARTIFACT_DIR` (optional) – model artifacts (default: `./artifacts`)
//! - `CORS_ALLOWED_ORIGINS` (optional) – comma separated origins
//! - `LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `LOG_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! Artifacts are loaded on the first prediction, so the service starts even
//! when they are missing; predictions then fail with a 503 until they appear.
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;

use seismic_impact::inference::FsArtifactLoader;
use seismic_impact::routes::{self, AppState};
use seismic_impact::{config, telemetry};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    telemetry::init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    if !cfg.artifact_dir.is_dir() {
        tracing::warn!(
            "Artifact directory {} does not exist; predictions will fail until it does",
            cfg.artifact_dir.display()
        );
    }

    let loader = Arc::new(FsArtifactLoader::new(cfg.artifact_dir.clone()));
    let app: Router = routes::router(AppState::new(loader), &cfg);

    let addr = cfg.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind '{}': {}", addr, e))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
