//! Download the earthquake catalog in count-bounded chunks.
//!
//! Every flag falls back to an environment variable, and `.env` is honoured.
//! A failed request ends the run; rerunning starts over from `--start`.
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use dotenvy::dotenv;

use seismic_impact::acquisition::{AcquisitionDriver, CatalogClient, ChunkStore};
use seismic_impact::config::{DEFAULT_COUNT_URL, DEFAULT_QUERY_URL};
use seismic_impact::{telemetry, AcquisitionConfig};

#[derive(Debug, Parser)]
#[command(name = "fetch-events", about = "Download the earthquake catalog in chunks")]
struct Args {
    /// First day to download (YYYY-MM-DD).
    #[arg(long, env = "FETCH_START", default_value = "1900-01-01")]
    start: NaiveDate,

    /// Last day to download (YYYY-MM-DD).
    #[arg(long, env = "FETCH_END", default_value = "2025-12-31")]
    end: NaiveDate,

    /// Stop after this many events. Unbounded when omitted.
    #[arg(long, env = "FETCH_SAMPLE_TARGET")]
    sample_target: Option<u64>,

    /// Directory chunk files are written to.
    #[arg(long, env = "FETCH_OUTPUT_DIR", default_value = "./raw_data")]
    output_dir: PathBuf,

    /// Keep existing chunk files instead of clearing the directory.
    #[arg(long)]
    keep_existing: bool,

    #[arg(long, env = "CATALOG_COUNT_URL", default_value = DEFAULT_COUNT_URL)]
    count_url: String,

    #[arg(long, env = "CATALOG_QUERY_URL", default_value = DEFAULT_QUERY_URL)]
    query_url: String,

    /// Milliseconds to wait between count queries.
    #[arg(long, env = "FETCH_QUERY_DELAY_MS", default_value_t = 500)]
    query_delay_ms: u64,

    /// Milliseconds to wait between chunks.
    #[arg(long, env = "FETCH_CHUNK_DELAY_MS", default_value_t = 1000)]
    chunk_delay_ms: u64,

    /// Total timeout per catalog request, in seconds.
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 300)]
    timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> AcquisitionConfig {
        // ---
        AcquisitionConfig {
            start_date: self.start,
            end_date: self.end,
            sample_target: self.sample_target,
            output_dir: self.output_dir,
            fresh_output: !self.keep_existing,
            count_url: self.count_url,
            query_url: self.query_url,
            query_delay: Duration::from_millis(self.query_delay_ms),
            chunk_delay: Duration::from_millis(self.chunk_delay_ms),
            request_timeout: Duration::from_secs(self.timeout_secs),
            ..AcquisitionConfig::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    telemetry::init_tracing();

    let args = Args::parse();
    anyhow::ensure!(args.start <= args.end, "--start must not be after --end");

    let cfg = args.into_config();
    cfg.log_config();

    let store = ChunkStore::prepare(&cfg.output_dir, cfg.fresh_output)
        .with_context(|| format!("preparing {}", cfg.output_dir.display()))?;
    let catalog = CatalogClient::new(&cfg)?;

    let summary = AcquisitionDriver::new(&catalog, &store, &cfg).run().await?;

    tracing::info!(
        "Downloaded {} chunks, {} events, into {}",
        summary.chunks.len(),
        summary.total_collected,
        store.dir().display()
    );
    Ok(())
}
