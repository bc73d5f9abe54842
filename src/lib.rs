//! Seismic impact predictions for hypothetical asteroid strikes.
//!
//! Two independent parts share this crate:
//! - [`acquisition`] and [`join`]: offline tools that download the historical
//!   earthquake catalog in count-bounded chunks and merge the chunks into one
//!   flattened corpus.
//! - [`inference`] and [`routes`]: the HTTP service that turns impact
//!   parameters into a seismic prediction using the trained model artifacts.
//!
//! Binaries and `routes/*` only import from this gateway (EMBP), so module
//! internals can move without touching them.

pub mod acquisition;
pub mod config;
pub mod error;
pub mod inference;
pub mod join;
pub mod models;
pub mod routes;
pub mod telemetry;

pub use config::{AcquisitionConfig, Config};
pub use error::{AcquisitionError, JoinError, ModelError, PredictionError};
pub use models::{Chunk, DateRange, ImpactRequest, PredictionResponse};
