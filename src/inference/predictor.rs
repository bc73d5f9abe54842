//! End-to-end prediction: physics, synthesis, clustering, refinement.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::artifacts::{ArtifactLoader, Artifacts};
use super::energy::{energy_to_magnitude, kinetic_energy};
use super::features::{synthesize, AlertLevel, SeismicFeatures};
use super::matcher::NearestExampleMatcher;
use super::model::ModelInferencer;
use crate::error::{ModelError, PredictionError};
use crate::models::{AsteroidProperties, ImpactRequest, Location, PredictionResponse};

/// Fields of the synthetic vector that refinement never replaces.
const KEEP_SYNTHETIC: [&str; 3] = ["mag", "latitude", "longitude"];

// ---

#[derive(Debug, Clone)]
pub struct Prediction {
    /// Refined features, or the synthetic ones when no example was found.
    pub features: SeismicFeatures,
    pub energy: f64,
    pub cluster: usize,
    /// Distance to the example used for refinement.
    pub match_distance: Option<f64>,
}

impl Prediction {
    pub fn to_response(&self, request: &ImpactRequest) -> PredictionResponse {
        // ---
        let f = &self.features;
        let alert_numeric = f.alert.round() as i64;
        let alert_name = AlertLevel::name_for(alert_numeric);

        PredictionResponse {
            success: true,
            magnitude: f.mag,
            energy: self.energy,
            cluster: self.cluster,
            alert_level: alert_name.to_string(),
            alert_level_numeric: alert_numeric,
            intensity_mmi: f.mmi,
            community_intensity_cdi: f.cdi,
            significance: f.sig,
            depth: f.depth,
            tsunami_warning: f.tsunami != 0.0,
            location: Location {
                latitude: request.latitude,
                longitude: request.longitude,
            },
            asteroid_properties: AsteroidProperties {
                mass_kg: request.mass_kg,
                velocity_ms: request.velocity_ms,
                kinetic_energy_joules: self.energy,
            },
            message: Some(format!(
                "Predicted seismic impact: Magnitude {:.2}, {} alert level",
                f.mag, alert_name
            )),
        }
    }
}

/// Copy an example's original-scale values over the synthetic vector.
pub fn refine<'a>(
    synthetic: &SeismicFeatures,
    example: impl IntoIterator<Item = (&'a str, f64)>,
) -> SeismicFeatures {
    // ---
    let mut refined = synthetic.clone();
    for (column, value) in example {
        if KEEP_SYNTHETIC.contains(&column) || !value.is_finite() {
            continue;
        }
        if !refined.set(column, value) {
            debug!(column, "Ignoring dataset column outside the feature schema");
        }
    }
    refined
}

/// Run the model on an already synthesized vector.
pub fn predict_with(
    artifacts: &Artifacts,
    synthetic: SeismicFeatures,
    energy: f64,
) -> Result<Prediction, ModelError> {
    // ---
    let assignment = ModelInferencer::new(artifacts).infer(&synthetic)?;
    let matcher = NearestExampleMatcher::new(&artifacts.dataset);

    let prediction = match matcher.nearest(assignment.cluster, &assignment.normalized) {
        Some(example) => {
            debug!(
                cluster = assignment.cluster,
                row = example.index,
                distance = example.distance,
                "Refining with nearest historical example"
            );
            Prediction {
                features: refine(&synthetic, example.original.iter()),
                energy,
                cluster: assignment.cluster,
                match_distance: Some(example.distance),
            }
        }
        None => {
            warn!(
                cluster = assignment.cluster,
                "No historical example in cluster, returning synthetic features"
            );
            Prediction {
                features: synthetic,
                energy,
                cluster: assignment.cluster,
                match_distance: None,
            }
        }
    };
    Ok(prediction)
}

/// Serves predictions, loading artifacts on first use.
///
/// The loaded artifacts are shared read-only between requests. A failed load
/// is not remembered, so a later request tries again.
pub struct Predictor {
    loader: Arc<dyn ArtifactLoader>,
    artifacts: OnceCell<Arc<Artifacts>>,
}

impl Predictor {
    pub fn new(loader: Arc<dyn ArtifactLoader>) -> Self {
        Self {
            loader,
            artifacts: OnceCell::new(),
        }
    }

    pub async fn artifacts(&self) -> Result<Arc<Artifacts>, ModelError> {
        // ---
        self.artifacts
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                tokio::task::spawn_blocking(move || Artifacts::load(loader.as_ref()))
                    .await
                    .map_err(|e| {
                        ModelError::InvalidArtifact(format!("artifact loading aborted: {e}"))
                    })?
                    .map(Arc::new)
            })
            .await
            .cloned()
    }

    pub async fn predict(&self, request: &ImpactRequest) -> Result<Prediction, PredictionError> {
        // ---
        request.validate()?;

        let energy = kinetic_energy(request.mass_kg, request.velocity_ms);
        let magnitude = energy_to_magnitude(energy)?;
        let synthetic = synthesize(magnitude, request.latitude, request.longitude);

        let artifacts = self.artifacts().await.map_err(|e| {
            warn!("Error loading models: {}", e);
            e
        })?;

        let prediction = predict_with(&artifacts, synthetic, energy)?;
        info!(
            magnitude,
            cluster = prediction.cluster,
            alert = prediction.features.alert,
            "Prediction complete"
        );
        Ok(prediction)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    // ---
    use super::*;
    use crate::inference::artifacts::{HistoricalDataset, StaticArtifactLoader, Table};
    use crate::inference::features::synthesize_at_depth;
    use crate::inference::model::{ClusterModel, ModelMetadata, Scaler};

    /// Two centroids split on normalized magnitude. Every historical row
    /// sits in cluster 0, so cluster 1 exercises the fallback path.
    pub(crate) fn fixture() -> Artifacts {
        // ---
        let names: Vec<String> = ["mag", "depth", "latitude", "longitude", "sig", "cdi", "mmi"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let clustered = "mag,depth,latitude,longitude,sig,cdi,mmi,cluster\n\
                         0.9,6.7,0.2,0.2,0.75,0.75,0.9,0\n\
                         -0.9,20.3,-0.1,1.1,-1.5,-0.45,-0.4,0\n";
        let original = "mag,depth,latitude,longitude,sig,cdi,mmi,felt,alert,tsunami,place\n\
                        6.9,12.5,10,20,850,5.5,6.8,900,3,1,Honshu\n\
                        5.1,33.0,-5,100,400,3.1,4.2,120,1,0,Sumatra\n";

        Artifacts {
            model: ClusterModel {
                cluster_centers: vec![
                    vec![-1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                    vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                ],
            },
            scaler: Scaler {
                mean: vec![6.0, 2.5, 0.0, 0.0, 700.0, 4.0, 5.0],
                scale: vec![1.0, 1.5, 45.0, 90.0, 200.0, 2.0, 2.0],
            },
            metadata: ModelMetadata {
                features_to_normalize: names.clone(),
                feature_order: names,
            },
            dataset: HistoricalDataset {
                clustered: Table::from_reader(clustered.as_bytes(), "clustered").unwrap(),
                original: Table::from_reader(original.as_bytes(), "original").unwrap(),
            },
        }
    }

    #[test]
    fn test_fixture_is_valid() {
        // ---
        fixture().validate().unwrap();
    }

    #[test]
    fn test_refine_keeps_magnitude_and_position() {
        // ---
        let artifacts = fixture();
        let synthetic = synthesize_at_depth(5.2, 35.0, 139.0, 1.0);

        // mag 5.2 normalizes below the mean, so it lands in cluster 0.
        let prediction = predict_with(&artifacts, synthetic.clone(), 1.0e13).unwrap();
        assert_eq!(prediction.cluster, 0);
        assert!(prediction.match_distance.is_some());

        let refined = &prediction.features;
        assert_eq!(refined.mag, 5.2);
        assert_eq!(refined.latitude, 35.0);
        assert_eq!(refined.longitude, 139.0);
        assert_eq!(refined.time, synthetic.time);
        assert_eq!(refined.mag_type, synthetic.mag_type);
        // Everything else comes from one of the historical rows.
        assert!(refined.depth == 12.5 || refined.depth == 33.0);
        assert!(refined.alert == 3.0 || refined.alert == 1.0);
    }

    #[test]
    fn test_empty_cluster_falls_back_to_synthetic() {
        // ---
        let artifacts = fixture();
        let synthetic = synthesize_at_depth(7.04, 35.6762, 139.6503, 2.0);

        let prediction = predict_with(&artifacts, synthetic.clone(), 2.268e15).unwrap();
        assert_eq!(prediction.cluster, 1);
        assert_eq!(prediction.match_distance, None);
        assert_eq!(prediction.features, synthetic);
    }

    #[test]
    fn test_response_shape() {
        // ---
        let artifacts = fixture();
        let request = ImpactRequest {
            mass_kg: 1.4e7,
            velocity_ms: 18_000.0,
            latitude: 35.6762,
            longitude: 139.6503,
        };
        let energy = kinetic_energy(request.mass_kg, request.velocity_ms);
        let magnitude = energy_to_magnitude(energy).unwrap();
        let synthetic = synthesize_at_depth(magnitude, request.latitude, request.longitude, 3.0);

        let response = predict_with(&artifacts, synthetic, energy)
            .unwrap()
            .to_response(&request);

        assert!(response.success);
        assert_eq!(response.alert_level, "Red");
        assert_eq!(response.alert_level_numeric, 4);
        assert_eq!(response.cluster, 1);
        assert!(!response.tsunami_warning);
        assert_eq!(response.asteroid_properties.kinetic_energy_joules, energy);
        let expected = format!("Predicted seismic impact: Magnitude {magnitude:.2}, Red alert level");
        assert_eq!(response.message.as_deref(), Some(expected.as_str()));
    }

    #[tokio::test]
    async fn test_predictor_caches_artifacts() {
        // ---
        let loader = StaticArtifactLoader::new(fixture());
        let predictor = Predictor::new(Arc::new(loader));

        let first = predictor.artifacts().await.unwrap();
        let second = predictor.artifacts().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_predictor_rejects_invalid_request() {
        // ---
        let loader = StaticArtifactLoader::new(fixture());
        let predictor = Predictor::new(Arc::new(loader));

        let request = ImpactRequest {
            mass_kg: -1.0,
            velocity_ms: 18_000.0,
            latitude: 0.0,
            longitude: 0.0,
        };
        assert!(matches!(
            predictor.predict(&request).await,
            Err(PredictionError::InvalidInput(_))
        ));
    }
}
