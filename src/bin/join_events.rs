//! Merge downloaded chunk files into one flattened JSON corpus.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;

use seismic_impact::join::FileJoiner;
use seismic_impact::telemetry;

#[derive(Debug, Parser)]
#[command(name = "join-events", about = "Join chunk files into a single event corpus")]
struct Args {
    /// Directory holding `earthquake_data_*.json` chunk files.
    #[arg(long, env = "JOIN_INPUT_DIR", default_value = "./raw_data")]
    input_dir: PathBuf,

    /// Corpus file to write. Replaced if it exists.
    #[arg(long, env = "JOIN_OUTPUT", default_value = "./data_earthquakes.json")]
    output: PathBuf,
}

fn main() -> Result<()> {
    // ---
    dotenv().ok();
    telemetry::init_tracing();

    let args = Args::parse();
    let summary = FileJoiner::default()
        .join_dir(&args.input_dir, &args.output)
        .with_context(|| format!("joining chunks from {}", args.input_dir.display()))?;

    if summary.files_skipped > 0 {
        tracing::warn!(
            "{} of {} files were skipped",
            summary.files_skipped,
            summary.files_found
        );
    }
    Ok(())
}
