//! Seismic impact inference.
//!
//! A request's mass and velocity give an impact energy and an equivalent
//! magnitude. From that a synthetic feature vector is built, normalized with
//! the training scaler, assigned to a cluster, and finally refined with the
//! closest real event of that cluster.

mod artifacts;
mod energy;
mod features;
mod matcher;
mod model;
mod predictor;

pub use artifacts::{
    ArtifactLoader, Artifacts, FsArtifactLoader, HistoricalDataset, Row, StaticArtifactLoader,
    Table, CLUSTERED_DATASET_FILE, CLUSTER_COLUMN, METADATA_FILE, MODEL_FILE,
    ORIGINAL_DATASET_FILE, SCALER_FILE,
};
pub use energy::{energy_to_magnitude, kinetic_energy, magnitude_to_energy};
pub use features::{
    synthesize, synthesize_at_depth, synthesize_with, AlertLevel, SeismicFeatures,
    DOMINANT_MAG_TYPE, MAX_IMPACT_DEPTH_KM, MODEL_FEATURE_ORDER,
};
pub use matcher::{NearestExample, NearestExampleMatcher, COMPARISON_FEATURES};
pub use model::{ClusterAssignment, ClusterModel, ModelInferencer, ModelMetadata, Scaler};
pub use predictor::{predict_with, refine, Prediction, Predictor};
