//! Chunk sizing: binary search over end dates against the count endpoint.

use std::time::Duration;

use chrono::{Days, NaiveDate};
use tracing::debug;

use super::catalog::EventCounter;
use crate::config::AcquisitionConfig;
use crate::error::AcquisitionError;
use crate::models::DateRange;

// ---

/// Finds the largest chunk starting at a given day that the catalog will serve.
pub struct ChunkPlanner<'a, C> {
    counter: &'a C,
    max_events: u64,
    good_enough: f64,
    delay: Duration,
}

impl<'a, C: EventCounter + Sync> ChunkPlanner<'a, C> {
    pub fn new(counter: &'a C, config: &AcquisitionConfig) -> Self {
        // ---
        Self {
            counter,
            max_events: config.max_events,
            good_enough: config.good_enough_count(),
            delay: config.query_delay,
        }
    }

    /// Plan the chunk that begins at `start` and ends no later than `max_end`.
    ///
    /// Returns the furthest end date whose count stays within `max_events`,
    /// stopping early once a candidate holds at least the good-enough count.
    /// When no candidate satisfies the cap the range collapses to
    /// `start..=start`; callers advance past it regardless.
    pub async fn plan_next_chunk(
        &self,
        start: NaiveDate,
        max_end: NaiveDate,
    ) -> Result<DateRange, AcquisitionError> {
        // ---
        let mut left = start;
        let mut right = max_end;
        let mut best_end = start;

        while left <= right {
            let half = (right - left).num_days() / 2;
            let Some(mid) = left.checked_add_days(Days::new(half as u64)) else {
                break;
            };

            if mid <= start {
                break;
            }

            let candidate = DateRange { start, end: mid };
            let count = self.counter.count(&candidate).await?;

            if count <= self.max_events {
                best_end = mid;
                if count as f64 >= self.good_enough {
                    debug!(count, end = %mid, "Chunk is large enough, stopping search");
                    break;
                }
                match mid.succ_opt() {
                    Some(next) => left = next,
                    None => break,
                }
            } else {
                match mid.pred_opt() {
                    Some(prev) => right = prev,
                    None => break,
                }
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        Ok(DateRange {
            start,
            end: best_end,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    // ---
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Count function backed by a closure, recording how often it was asked.
    pub(crate) struct SyntheticCounter<F> {
        pub count_fn: F,
        pub calls: AtomicUsize,
    }

    impl<F: Fn(&DateRange) -> u64> SyntheticCounter<F> {
        pub(crate) fn new(count_fn: F) -> Self {
            Self {
                count_fn,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl<F: Fn(&DateRange) -> u64 + Send + Sync> EventCounter for SyntheticCounter<F> {
        async fn count(&self, range: &DateRange) -> Result<u64, AcquisitionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((self.count_fn)(range))
        }
    }

    pub(crate) fn test_config() -> AcquisitionConfig {
        AcquisitionConfig {
            query_delay: Duration::ZERO,
            chunk_delay: Duration::ZERO,
            ..AcquisitionConfig::default()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_chunk_within_cap_and_near_target() {
        // ---
        for per_day in [7u64, 40, 100, 333] {
            let counter = SyntheticCounter::new(move |r: &DateRange| r.days() as u64 * per_day);
            let config = test_config();
            let planner = ChunkPlanner::new(&counter, &config);

            let start = date(1950, 1, 1);
            let range = planner
                .plan_next_chunk(start, date(2020, 12, 31))
                .await
                .unwrap();

            let count = range.days() as u64 * per_day;
            assert_eq!(range.start, start);
            assert!(count <= 20_000, "per_day={per_day}: {count} over cap");
            assert!(count >= 12_000, "per_day={per_day}: {count} under target");
        }
    }

    #[tokio::test]
    async fn test_short_span_takes_everything() {
        // ---
        let counter = SyntheticCounter::new(|r: &DateRange| r.days() as u64 * 10);
        let config = test_config();
        let planner = ChunkPlanner::new(&counter, &config);

        let start = date(2025, 1, 1);
        let max_end = date(2025, 12, 31);
        let range = planner.plan_next_chunk(start, max_end).await.unwrap();

        // 3650 events across the full year never reaches the target, so the
        // search keeps growing the chunk towards the right edge.
        assert!(range.days() >= 363, "got {:?}", range);
        assert!(range.end <= max_end);
    }

    #[tokio::test]
    async fn test_single_day_over_cap_collapses() {
        // ---
        let counter = SyntheticCounter::new(|r: &DateRange| (r.days() as u64 + 1) * 50_000);
        let config = test_config();
        let planner = ChunkPlanner::new(&counter, &config);

        let start = date(2011, 3, 1);
        let range = planner
            .plan_next_chunk(start, date(2011, 12, 31))
            .await
            .unwrap();

        assert_eq!(range.start, start);
        assert_eq!(range.end, start);
        assert!(counter.calls.load(Ordering::SeqCst) < 20);
    }

    #[tokio::test]
    async fn test_degenerate_interval_makes_no_queries() {
        // ---
        let counter = SyntheticCounter::new(|_: &DateRange| 1);
        let config = test_config();
        let planner = ChunkPlanner::new(&counter, &config);

        let start = date(2000, 1, 1);
        let range = planner.plan_next_chunk(start, start).await.unwrap();

        assert_eq!(range, DateRange { start, end: start });
        assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_good_enough_stops_early() {
        // ---
        // The first midpoint already lands inside [12000, 20000].
        let counter = SyntheticCounter::new(|r: &DateRange| r.days() as u64 * 300);
        let config = test_config();
        let planner = ChunkPlanner::new(&counter, &config);

        let start = date(2000, 1, 1);
        let range = planner
            .plan_next_chunk(start, date(2000, 4, 1))
            .await
            .unwrap();

        assert_eq!(range.end, date(2000, 2, 15));
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }
}
