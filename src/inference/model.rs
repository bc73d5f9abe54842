//! Pre-fit scaler and clustering model, and the inference step that uses them.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use super::artifacts::Artifacts;
use super::features::{SeismicFeatures, MODEL_FEATURE_ORDER};
use crate::error::ModelError;

// ---

/// Per-feature linear transform `(x - mean) / scale`, fit during training.
#[derive(Debug, Clone, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect()
    }

    pub fn inverse_transform(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(z, (mean, scale))| z * scale + mean)
            .collect()
    }
}

/// Centroid-based clustering model.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterModel {
    pub cluster_centers: Vec<Vec<f64>>,
}

impl ClusterModel {
    /// Number of features each centroid expects.
    pub fn dimensions(&self) -> usize {
        self.cluster_centers.first().map_or(0, Vec::len)
    }

    /// Index of the centroid closest to `point`.
    pub fn predict(&self, point: &[f64]) -> Option<usize> {
        // ---
        self.cluster_centers
            .iter()
            .map(|center| squared_distance(center, point))
            .enumerate()
            .filter(|(_, d)| !d.is_nan())
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
    }
}

pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn default_feature_order() -> Vec<String> {
    MODEL_FEATURE_ORDER.iter().map(|s| s.to_string()).collect()
}

/// Which features the scaler covers, and the model's input order.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelMetadata {
    #[serde(alias = "features_to normalize")]
    pub features_to_normalize: Vec<String>,
    #[serde(default = "default_feature_order")]
    pub feature_order: Vec<String>,
}

// ---

/// Result of mapping one feature vector through the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment {
    pub cluster: usize,
    /// Normalized values of the scaled features, by name.
    pub normalized: BTreeMap<String, f64>,
}

/// Normalizes a feature vector and assigns it to a cluster.
pub struct ModelInferencer<'a> {
    artifacts: &'a Artifacts,
}

impl<'a> ModelInferencer<'a> {
    pub fn new(artifacts: &'a Artifacts) -> Self {
        Self { artifacts }
    }

    pub fn infer(&self, features: &SeismicFeatures) -> Result<ClusterAssignment, ModelError> {
        // ---
        let meta = &self.artifacts.metadata;

        let raw = meta
            .features_to_normalize
            .iter()
            .map(|name| lookup(features, name))
            .collect::<Result<Vec<_>, _>>()?;
        let scaled = self.artifacts.scaler.transform(&raw);

        let normalized: BTreeMap<String, f64> = meta
            .features_to_normalize
            .iter()
            .cloned()
            .zip(scaled)
            .collect();

        let vector = meta
            .feature_order
            .iter()
            .map(|name| match normalized.get(name) {
                Some(value) => Ok(*value),
                None => lookup(features, name),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cluster = self.artifacts.model.predict(&vector).ok_or_else(|| {
            ModelError::InvalidArtifact("cluster model has no usable centroids".to_string())
        })?;

        debug!(cluster, "Assigned feature vector to cluster");
        Ok(ClusterAssignment {
            cluster,
            normalized,
        })
    }
}

fn lookup(features: &SeismicFeatures, name: &str) -> Result<f64, ModelError> {
    features
        .get(name)
        .ok_or_else(|| ModelError::InvalidArtifact(format!("unknown model feature '{name}'")))
}
