//! Simple data models shared by the pipeline and the service.

use std::path::PathBuf;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::PredictionError;

// ---

/// An inclusive, day-granular span of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    // ---
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, or `None` when `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Number of whole days between the boundaries.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// The first day after this range.
    pub fn next_start(&self) -> NaiveDate {
        self.end.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX)
    }

    pub fn start_str(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// A downloaded, persisted batch of catalog events.
///
/// The raw payload is not held in memory; it lives verbatim in the file at
/// `path`, which the joiner reads back.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    // ---
    pub range: DateRange,
    /// Count reported by the catalog when the chunk was planned.
    pub expected_count: u64,
    pub path: PathBuf,
}

// ---

/// Body of a prediction request.
#[derive(Debug, Clone, Deserialize)]
pub struct ImpactRequest {
    // ---
    #[serde(alias = "mass")]
    pub mass_kg: f64,
    #[serde(alias = "velocity")]
    pub velocity_ms: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl ImpactRequest {
    /// Reject physically meaningless parameters before any computation.
    pub fn validate(&self) -> Result<(), PredictionError> {
        // ---
        if !(self.mass_kg > 0.0) {
            return Err(PredictionError::InvalidInput(
                "Mass must be positive".to_string(),
            ));
        }
        if !(self.velocity_ms > 0.0) {
            return Err(PredictionError::InvalidInput(
                "Velocity must be positive".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(PredictionError::InvalidInput(
                "Latitude must be between -90 and 90 degrees".to_string(),
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(PredictionError::InvalidInput(
                "Longitude must be between -180 and 180 degrees".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AsteroidProperties {
    pub mass_kg: f64,
    pub velocity_ms: f64,
    pub kinetic_energy_joules: f64,
}

/// Response body of a successful prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    // ---
    pub success: bool,
    pub magnitude: f64,
    pub energy: f64,
    pub cluster: usize,
    pub alert_level: String,
    pub alert_level_numeric: i64,
    pub intensity_mmi: f64,
    pub community_intensity_cdi: f64,
    pub significance: f64,
    pub depth: f64,
    pub tsunami_warning: bool,
    pub location: Location,
    pub asteroid_properties: AsteroidProperties,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(mass_kg: f64, velocity_ms: f64, latitude: f64, longitude: f64) -> ImpactRequest {
        ImpactRequest {
            mass_kg,
            velocity_ms,
            latitude,
            longitude,
        }
    }

    #[test]
    fn test_date_range_invariant() {
        // ---
        assert!(DateRange::new(date(2000, 1, 2), date(2000, 1, 1)).is_none());

        let range = DateRange::new(date(2000, 1, 1), date(2000, 3, 1)).unwrap();
        assert_eq!(range.days(), 60);
        assert_eq!(range.next_start(), date(2000, 3, 2));
        assert_eq!(range.start_str(), "2000-01-01");
        assert_eq!(range.end_str(), "2000-03-01");
    }

    #[test]
    fn test_request_validation() {
        // ---
        assert!(request(1.0e7, 18_000.0, 35.0, 139.0).validate().is_ok());
        assert!(request(1.0, 1.0, 90.0, -180.0).validate().is_ok());

        assert!(request(0.0, 18_000.0, 35.0, 139.0).validate().is_err());
        assert!(request(1.0e7, -1.0, 35.0, 139.0).validate().is_err());
        assert!(request(f64::NAN, 1.0, 35.0, 139.0).validate().is_err());
        assert!(request(1.0e7, 18_000.0, 90.5, 139.0).validate().is_err());
        assert!(request(1.0e7, 18_000.0, 35.0, -180.1).validate().is_err());
    }

    #[test]
    fn test_request_aliases() {
        // ---
        let req: ImpactRequest = serde_json::from_str(
            r#"{"mass": 1.4e7, "velocity": 18000, "latitude": 35.6762, "longitude": 139.6503}"#,
        )
        .unwrap();
        assert_eq!(req.mass_kg, 1.4e7);
        assert_eq!(req.velocity_ms, 18_000.0);
    }
}
