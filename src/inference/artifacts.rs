//! Loading of the trained model artifacts.
//!
//! Inference needs four artifacts: the clustering model, the scaler, the
//! metadata describing which features were scaled, and the historical
//! dataset (normalized rows tagged with their cluster, plus the same rows at
//! original scale). [`ArtifactLoader`] abstracts where they come from.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::info;

use super::matcher::COMPARISON_FEATURES;
use super::model::{ClusterModel, ModelMetadata, Scaler};
use crate::error::ModelError;

pub const MODEL_FILE: &str = "kmeans_model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const METADATA_FILE: &str = "model_info.json";
pub const CLUSTERED_DATASET_FILE: &str = "clustered_earthquakes.csv";
pub const ORIGINAL_DATASET_FILE: &str = "dataset.csv";

/// Column of the clustered dataset holding each row's cluster id.
pub const CLUSTER_COLUMN: &str = "cluster";

// ---

/// A numeric table read from CSV. Empty or non-numeric cells are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl Table {
    pub fn from_reader<R: Read>(reader: R, label: &str) -> Result<Self, ModelError> {
        // ---
        let csv_err = |source| ModelError::Csv {
            path: label.to_string(),
            source,
        };

        let mut rdr = csv::Reader::from_reader(reader);
        let columns: Vec<String> = rdr
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(csv_err)?;
            let row = record
                .iter()
                .map(|cell| cell.trim().parse::<f64>().unwrap_or(f64::NAN))
                .collect();
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Borrow row `index` together with the column names.
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            columns: &self.columns,
            values,
        })
    }
}

/// One table row, addressable by column name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [f64],
}

impl<'a> Row<'a> {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| self.values.get(i).copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Historical events used to refine predictions.
#[derive(Debug, Clone)]
pub struct HistoricalDataset {
    /// Normalized rows with a [`CLUSTER_COLUMN`].
    pub clustered: Table,
    /// The same events at original scale, row for row.
    pub original: Table,
}

// ---

/// Source of the trained artifacts.
pub trait ArtifactLoader: Send + Sync {
    fn load_model(&self) -> Result<ClusterModel, ModelError>;
    fn load_scaler(&self) -> Result<Scaler, ModelError>;
    fn load_metadata(&self) -> Result<ModelMetadata, ModelError>;
    fn load_dataset(&self) -> Result<HistoricalDataset, ModelError>;
}

/// Reads artifacts from a directory on disk.
#[derive(Debug, Clone)]
pub struct FsArtifactLoader {
    dir: PathBuf,
}

impl FsArtifactLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn open(&self, name: &str) -> Result<(File, String), ModelError> {
        let path = self.dir.join(name);
        let label = path.display().to_string();
        match File::open(&path) {
            Ok(file) => Ok((file, label)),
            Err(source) => Err(ModelError::Io {
                path: label,
                source,
            }),
        }
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, ModelError> {
        let (file, path) = self.open(name)?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|source| ModelError::Json { path, source })
    }

    fn read_table(&self, name: &str) -> Result<Table, ModelError> {
        let (file, path) = self.open(name)?;
        Table::from_reader(BufReader::new(file), &path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactLoader for FsArtifactLoader {
    fn load_model(&self) -> Result<ClusterModel, ModelError> {
        self.read_json(MODEL_FILE)
    }

    fn load_scaler(&self) -> Result<Scaler, ModelError> {
        self.read_json(SCALER_FILE)
    }

    fn load_metadata(&self) -> Result<ModelMetadata, ModelError> {
        self.read_json(METADATA_FILE)
    }

    fn load_dataset(&self) -> Result<HistoricalDataset, ModelError> {
        Ok(HistoricalDataset {
            clustered: self.read_table(CLUSTERED_DATASET_FILE)?,
            original: self.read_table(ORIGINAL_DATASET_FILE)?,
        })
    }
}

/// Serves artifacts already held in memory.
#[derive(Debug, Clone)]
pub struct StaticArtifactLoader {
    artifacts: Artifacts,
}

impl StaticArtifactLoader {
    pub fn new(artifacts: Artifacts) -> Self {
        Self { artifacts }
    }
}

impl ArtifactLoader for StaticArtifactLoader {
    fn load_model(&self) -> Result<ClusterModel, ModelError> {
        Ok(self.artifacts.model.clone())
    }

    fn load_scaler(&self) -> Result<Scaler, ModelError> {
        Ok(self.artifacts.scaler.clone())
    }

    fn load_metadata(&self) -> Result<ModelMetadata, ModelError> {
        Ok(self.artifacts.metadata.clone())
    }

    fn load_dataset(&self) -> Result<HistoricalDataset, ModelError> {
        Ok(self.artifacts.dataset.clone())
    }
}

// ---

/// The complete, validated artifact set. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub model: ClusterModel,
    pub scaler: Scaler,
    pub metadata: ModelMetadata,
    pub dataset: HistoricalDataset,
}

impl Artifacts {
    pub fn load(loader: &dyn ArtifactLoader) -> Result<Self, ModelError> {
        // ---
        let artifacts = Self {
            model: loader.load_model()?,
            scaler: loader.load_scaler()?,
            metadata: loader.load_metadata()?,
            dataset: loader.load_dataset()?,
        };
        artifacts.validate()?;

        info!(
            clusters = artifacts.model.cluster_centers.len(),
            historical_rows = artifacts.dataset.clustered.len(),
            "Model artifacts loaded"
        );
        Ok(artifacts)
    }

    /// Check the artifacts agree with each other and with the feature schema.
    pub fn validate(&self) -> Result<(), ModelError> {
        // ---
        let invalid = |msg: String| Err(ModelError::InvalidArtifact(msg));
        let meta = &self.metadata;
        let probe = super::features::synthesize_at_depth(0.0, 0.0, 0.0, 0.0);

        if self.model.cluster_centers.is_empty() {
            return invalid("cluster model has no centroids".to_string());
        }
        if self
            .model
            .cluster_centers
            .iter()
            .any(|c| c.len() != meta.feature_order.len())
        {
            return invalid(format!(
                "centroids must have {} dimensions",
                meta.feature_order.len()
            ));
        }
        if self.scaler.mean.len() != meta.features_to_normalize.len()
            || self.scaler.scale.len() != meta.features_to_normalize.len()
        {
            return invalid(format!(
                "scaler covers {} features, metadata names {}",
                self.scaler.len(),
                meta.features_to_normalize.len()
            ));
        }
        if self.scaler.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return invalid("scaler has a zero or non-finite scale".to_string());
        }
        if let Some(name) = meta
            .feature_order
            .iter()
            .chain(&meta.features_to_normalize)
            .find(|name| probe.get(name).is_none())
        {
            return invalid(format!("unknown model feature '{name}'"));
        }
        if let Some(name) = COMPARISON_FEATURES
            .iter()
            .find(|&&name| !meta.features_to_normalize.iter().any(|f| f == name))
        {
            return invalid(format!("comparison feature '{name}' is not normalized"));
        }

        let clustered = &self.dataset.clustered;
        if let Some(name) = COMPARISON_FEATURES
            .iter()
            .chain(std::iter::once(&CLUSTER_COLUMN))
            .find(|&&name| clustered.column_index(name).is_none())
        {
            return invalid(format!("clustered dataset lacks column '{name}'"));
        }
        if self.dataset.original.len() < clustered.len() {
            return invalid(format!(
                "original dataset has {} rows, clustered dataset {}",
                self.dataset.original.len(),
                clustered.len()
            ));
        }
        Ok(())
    }
}
