//! Configuration for the `seismic-impact` service and the offline tools.
//!
//! The service loads from environment variables (with optional `.env` file
//! support provided by the caller). The acquisition driver and the joiner
//! receive an explicit config struct at construction instead of reading
//! globals, so tests can hand them temporary directories and zero delays.
use std::{env, path::PathBuf, time::Duration};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u16 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u16>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read an optional string environment variable with a default value.
macro_rules! env_or {
    ($var_name:expr, $default:expr) => {
        env::var($var_name).unwrap_or_else(|_| $default.to_string())
    };
}

/// USGS FDSN count endpoint.
pub const DEFAULT_COUNT_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/count";

/// USGS FDSN query endpoint.
pub const DEFAULT_QUERY_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

// ---

/// Strongly typed service configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Interface the HTTP listener binds to.
    pub bind_host: String,

    /// Port the HTTP listener binds to.
    pub port: u16,

    /// Directory holding the model artifacts.
    pub artifact_dir: PathBuf,

    /// Allowed CORS origins. Empty means permissive.
    pub cors_origins: Vec<String>,
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `BIND_HOST` – listen interface (default: `0.0.0.0`)
/// - `PORT` – listen port (default: 8080)
/// - `ARTIFACT_DIR` – model artifact directory (default: `./artifacts`)
/// - `CORS_ALLOWED_ORIGINS` – comma separated origins, `*` or unset for any
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let bind_host = env_or!("BIND_HOST", "0.0.0.0");
    let port = parse_env_u16!("PORT", 8080);
    let artifact_dir = PathBuf::from(env_or!("ARTIFACT_DIR", "./artifacts"));
    let cors_origins = parse_origins(&env_or!("CORS_ALLOWED_ORIGINS", "*"));

    Ok(Config {
        bind_host,
        port,
        artifact_dir,
        cors_origins,
    })
}

fn parse_origins(raw: &str) -> Vec<String> {
    // ---
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty() && *o != "*")
        .map(String::from)
        .collect()
}

impl Config {
    /// Socket address string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        let cors = if self.cors_origins.is_empty() {
            "*".to_string()
        } else {
            self.cors_origins.join(",")
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  BIND_HOST            : {}", self.bind_host);
        tracing::info!("  PORT                 : {}", self.port);
        tracing::info!("  ARTIFACT_DIR         : {}", self.artifact_dir.display());
        tracing::info!("  CORS_ALLOWED_ORIGINS : {}", cors);
    }
}

// ---

/// Settings for one acquisition run.
#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    // ---
    /// First day of the requested span.
    pub start_date: NaiveDate,

    /// Last day of the requested span.
    pub end_date: NaiveDate,

    /// Stop once this many events are collected. `None` runs the full span.
    pub sample_target: Option<u64>,

    /// Where chunk files are written.
    pub output_dir: PathBuf,

    /// Remove any previous chunk files before starting.
    pub fresh_output: bool,

    pub count_url: String,
    pub query_url: String,

    /// Hard per-query ceiling of the catalog service.
    pub max_events: u64,

    /// Preferred chunk size; counts reaching `good_enough_ratio` of it end the search.
    pub target_events: u64,
    pub good_enough_ratio: f64,

    /// Pause between consecutive count queries.
    pub query_delay: Duration,

    /// Pause between chunks.
    pub chunk_delay: Duration,

    /// Total timeout for each catalog request.
    pub request_timeout: Duration,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        // ---
        Self {
            start_date: NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or(NaiveDate::MAX),
            sample_target: None,
            output_dir: PathBuf::from("./raw_data"),
            fresh_output: true,
            count_url: DEFAULT_COUNT_URL.to_string(),
            query_url: DEFAULT_QUERY_URL.to_string(),
            max_events: 20_000,
            target_events: 15_000,
            good_enough_ratio: 0.8,
            query_delay: Duration::from_millis(500),
            chunk_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(300),
        }
    }
}

impl AcquisitionConfig {
    /// Count at or above which a candidate chunk is accepted without further search.
    pub fn good_enough_count(&self) -> f64 {
        self.target_events as f64 * self.good_enough_ratio
    }

    pub fn log_config(&self) {
        // ---
        let target = self
            .sample_target
            .map_or_else(|| "unbounded".to_string(), |t| t.to_string());

        tracing::info!("Acquisition configuration:");
        tracing::info!("  span          : {} .. {}", self.start_date, self.end_date);
        tracing::info!("  sample target : {}", target);
        tracing::info!("  output dir    : {}", self.output_dir.display());
        tracing::info!("  count url     : {}", self.count_url);
        tracing::info!("  query url     : {}", self.query_url);
        tracing::info!(
            "  chunk sizing  : max {} / target {} ({:.0}%)",
            self.max_events,
            self.target_events,
            self.good_enough_ratio * 100.0
        );
    }
}
