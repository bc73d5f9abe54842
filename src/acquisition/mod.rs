//! Offline acquisition of the historical earthquake catalog.
//!
//! The catalog refuses queries above a fixed result count, so the requested
//! span is cut into chunks: [`ChunkPlanner`] binary-searches each chunk's end
//! date against the count endpoint, [`ChunkDownloader`] fetches and persists
//! it, and [`AcquisitionDriver`] walks the span one chunk at a time.

mod catalog;
mod downloader;
mod driver;
mod planner;

pub use catalog::{parse_count_body, CatalogClient, EventCounter, EventFetcher, ParsedCount};
pub use downloader::{chunk_file_name, ChunkDownloader, ChunkStore, CHUNK_FILE_PREFIX};
pub use driver::{AcquisitionDriver, AcquisitionSummary, Completion};
pub use planner::ChunkPlanner;
