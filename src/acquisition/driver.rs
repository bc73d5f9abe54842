//! Sequential acquisition run: plan, count, download, advance.

use chrono::NaiveDate;
use tracing::{info, warn};

use super::catalog::{EventCounter, EventFetcher};
use super::downloader::{ChunkDownloader, ChunkStore};
use super::planner::ChunkPlanner;
use crate::config::AcquisitionConfig;
use crate::error::AcquisitionError;
use crate::models::Chunk;

// ---

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    SampleTargetReached,
    TimespanFinished,
}

#[derive(Debug)]
pub struct AcquisitionSummary {
    pub chunks: Vec<Chunk>,
    pub total_collected: u64,
    pub completion: Completion,
}

/// Drives one acquisition run over the configured span.
///
/// One request is in flight at a time and chunks are processed strictly in
/// date order. Any error ends the run; a restart re-plans from the start date.
pub struct AcquisitionDriver<'a, S> {
    catalog: &'a S,
    store: &'a ChunkStore,
    config: &'a AcquisitionConfig,
}

impl<'a, S> AcquisitionDriver<'a, S>
where
    S: EventCounter + EventFetcher + Sync,
{
    pub fn new(catalog: &'a S, store: &'a ChunkStore, config: &'a AcquisitionConfig) -> Self {
        Self {
            catalog,
            store,
            config,
        }
    }

    fn target_reached(&self, total: u64) -> bool {
        self.config.sample_target.is_some_and(|t| total >= t)
    }

    pub async fn run(&self) -> Result<AcquisitionSummary, AcquisitionError> {
        // ---
        let planner = ChunkPlanner::new(self.catalog, self.config);
        let downloader = ChunkDownloader::new(self.catalog, self.store);
        let final_date: NaiveDate = self.config.end_date;

        let mut current_date = self.config.start_date;
        let mut total_collected: u64 = 0;
        let mut chunks = Vec::new();

        while current_date < final_date && !self.target_reached(total_collected) {
            let chunk_number = chunks.len() + 1;
            info!("Processing chunk {} starting from {}", chunk_number, current_date);
            match self.config.sample_target {
                Some(target) => info!(
                    "Progress: {}/{} samples collected ({:.1}%)",
                    total_collected,
                    target,
                    total_collected as f64 / target as f64 * 100.0
                ),
                None => info!("Progress: {} samples collected", total_collected),
            }

            let range = planner.plan_next_chunk(current_date, final_date).await?;
            let chunk_count = self.catalog.count(&range).await?;

            if range.start == range.end && chunk_count > self.config.max_events {
                warn!(
                    "Single day {} holds {} events, above the {} limit",
                    range.start, chunk_count, self.config.max_events
                );
            }

            let chunk = downloader.download(range, chunk_count).await?;
            total_collected += chunk.expected_count;
            current_date = chunk.range.next_start();
            chunks.push(chunk);

            if self.target_reached(total_collected) {
                break;
            }

            if !self.config.chunk_delay.is_zero() {
                tokio::time::sleep(self.config.chunk_delay).await;
            }
        }

        let completion = if self.target_reached(total_collected) {
            info!("Completion reason: sample target reached");
            Completion::SampleTargetReached
        } else {
            info!(
                "Completion reason: timespan finished ({} to {})",
                self.config.start_date, self.config.end_date
            );
            Completion::TimespanFinished
        };

        Ok(AcquisitionSummary {
            chunks,
            total_collected,
            completion,
        })
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::acquisition::planner::tests::test_config;
    use crate::models::DateRange;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Catalog with a fixed number of events per day.
    struct FakeCatalog {
        per_day: u64,
        fetched: Mutex<Vec<DateRange>>,
    }

    impl FakeCatalog {
        fn new(per_day: u64) -> Self {
            Self {
                per_day,
                fetched: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EventCounter for FakeCatalog {
        async fn count(&self, range: &DateRange) -> Result<u64, AcquisitionError> {
            Ok((range.days() as u64 + 1) * self.per_day)
        }
    }

    #[async_trait]
    impl EventFetcher for FakeCatalog {
        async fn fetch(&self, range: &DateRange) -> Result<String, AcquisitionError> {
            self.fetched.lock().unwrap().push(*range);
            Ok(format!(
                r#"{{"type":"FeatureCollection","metadata":{{"start":"{}"}},"features":[]}}"#,
                range.start
            ))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_run_covers_span_in_order() {
        // ---
        let tmp = tempfile::tempdir().unwrap();
        let config = AcquisitionConfig {
            start_date: date(2000, 1, 1),
            end_date: date(2004, 12, 31),
            output_dir: tmp.path().join("raw_data"),
            ..test_config()
        };
        let store = ChunkStore::prepare(&config.output_dir, true).unwrap();
        let catalog = FakeCatalog::new(40);

        let summary = AcquisitionDriver::new(&catalog, &store, &config)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.completion, Completion::TimespanFinished);
        assert!(summary.chunks.len() > 1);
        assert_eq!(summary.chunks[0].range.start, config.start_date);

        for pair in summary.chunks.windows(2) {
            assert_eq!(pair[1].range.start, pair[0].range.next_start());
        }
        for chunk in &summary.chunks {
            assert!(chunk.expected_count <= config.max_events);
            assert!(chunk.path.exists());
        }

        let expected_total: u64 = summary.chunks.iter().map(|c| c.expected_count).sum();
        assert_eq!(summary.total_collected, expected_total);
        assert_eq!(catalog.fetched.lock().unwrap().len(), summary.chunks.len());
    }

    #[tokio::test]
    async fn test_run_stops_at_sample_target() {
        // ---
        let tmp = tempfile::tempdir().unwrap();
        let config = AcquisitionConfig {
            start_date: date(1990, 1, 1),
            end_date: date(2020, 12, 31),
            sample_target: Some(30_000),
            output_dir: tmp.path().join("raw_data"),
            ..test_config()
        };
        let store = ChunkStore::prepare(&config.output_dir, true).unwrap();
        let catalog = FakeCatalog::new(100);

        let summary =
            tokio_test::assert_ok!(AcquisitionDriver::new(&catalog, &store, &config).run().await);

        assert_eq!(summary.completion, Completion::SampleTargetReached);
        assert!(summary.total_collected >= 30_000);
        assert!(summary.chunks.last().unwrap().range.end < config.end_date);
    }

    #[tokio::test]
    async fn test_run_advances_past_overfull_days() {
        // ---
        let tmp = tempfile::tempdir().unwrap();
        let config = AcquisitionConfig {
            start_date: date(2011, 3, 10),
            end_date: date(2011, 3, 14),
            output_dir: tmp.path().join("raw_data"),
            ..test_config()
        };
        let store = ChunkStore::prepare(&config.output_dir, true).unwrap();
        let catalog = FakeCatalog::new(25_000);

        let summary = AcquisitionDriver::new(&catalog, &store, &config)
            .run()
            .await
            .unwrap();

        // Every planned chunk collapses to a single day, and the run still ends.
        assert_eq!(summary.chunks.len(), 4);
        for chunk in &summary.chunks {
            assert_eq!(chunk.range.start, chunk.range.end);
        }
    }
}
