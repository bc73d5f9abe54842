//! Synthetic seismic feature vectors for a hypothetical impact.
//!
//! Everything except depth is a fixed function of magnitude. The alert tier
//! cascade mirrors the rules used when the training data was prepared and
//! must stay in sync with them.

use rand::Rng;
use serde::Serialize;

/// Encoded magnitude type: the most common category in the training data.
pub const DOMINANT_MAG_TYPE: f64 = 24.0;

/// Upper bound of the sampled impact depth, in km.
pub const MAX_IMPACT_DEPTH_KM: f64 = 5.0;

/// Feature order expected by the clustering model.
pub const MODEL_FEATURE_ORDER: [&str; 12] = [
    "mag", "time", "felt", "cdi", "mmi", "alert", "sig", "tsunami", "magType", "longitude",
    "latitude", "depth",
];

// ---

/// Ordinal severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertLevel {
    NoAlert = 0,
    Green = 1,
    Yellow = 2,
    Orange = 3,
    Red = 4,
}

impl AlertLevel {
    pub fn from_numeric(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::NoAlert),
            1 => Some(Self::Green),
            2 => Some(Self::Yellow),
            3 => Some(Self::Orange),
            4 => Some(Self::Red),
            _ => None,
        }
    }

    pub fn numeric(self) -> i64 {
        self as i64
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::NoAlert => "No Alert",
            Self::Green => "Green",
            Self::Yellow => "Yellow",
            Self::Orange => "Orange",
            Self::Red => "Red",
        }
    }

    /// Display name for a raw numeric tier, `"Unknown"` outside 0..=4.
    pub fn name_for(value: i64) -> &'static str {
        Self::from_numeric(value).map_or("Unknown", Self::name)
    }

    /// First matching tier, evaluated from Red down.
    pub fn classify(magnitude: f64, sig: f64, mmi: f64, cdi: f64, depth: f64) -> Self {
        // ---
        if magnitude >= 7.0 || sig >= 1000.0 || mmi >= 8.0 || cdi >= 7.0 {
            Self::Red
        } else if magnitude >= 6.5
            || sig >= 700.0
            || mmi >= 6.5
            || cdi >= 5.5
            || (magnitude >= 6.0 && depth <= 10.0)
        {
            Self::Orange
        } else if magnitude >= 6.0
            || sig >= 400.0
            || mmi >= 5.0
            || cdi >= 4.0
            || (magnitude >= 5.5 && depth <= 20.0)
        {
            Self::Yellow
        } else if magnitude >= 5.5
            || sig >= 200.0
            || mmi >= 4.0
            || cdi >= 3.0
            || (magnitude >= 5.0 && depth <= 30.0)
        {
            Self::Green
        } else {
            Self::NoAlert
        }
    }
}

/// Fixed-schema seismic attributes fed to the model.
///
/// All fields are `f64` so rows from the historical dataset can be copied in
/// without conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeismicFeatures {
    pub mag: f64,
    /// Epoch milliseconds.
    pub time: f64,
    pub felt: f64,
    pub cdi: f64,
    pub mmi: f64,
    pub alert: f64,
    pub sig: f64,
    pub tsunami: f64,
    #[serde(rename = "magType")]
    pub mag_type: f64,
    pub longitude: f64,
    pub latitude: f64,
    pub depth: f64,
}

impl SeismicFeatures {
    /// Value of a feature by its dataset column name.
    pub fn get(&self, name: &str) -> Option<f64> {
        // ---
        let value = match name {
            "mag" => self.mag,
            "time" => self.time,
            "felt" => self.felt,
            "cdi" => self.cdi,
            "mmi" => self.mmi,
            "alert" => self.alert,
            "sig" => self.sig,
            "tsunami" => self.tsunami,
            "magType" => self.mag_type,
            "longitude" => self.longitude,
            "latitude" => self.latitude,
            "depth" => self.depth,
            _ => return None,
        };
        Some(value)
    }

    /// Overwrite a feature by column name. Returns `false` for unknown names.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        // ---
        let slot = match name {
            "mag" => &mut self.mag,
            "time" => &mut self.time,
            "felt" => &mut self.felt,
            "cdi" => &mut self.cdi,
            "mmi" => &mut self.mmi,
            "alert" => &mut self.alert,
            "sig" => &mut self.sig,
            "tsunami" => &mut self.tsunami,
            "magType" => &mut self.mag_type,
            "longitude" => &mut self.longitude,
            "latitude" => &mut self.latitude,
            "depth" => &mut self.depth,
            _ => return false,
        };
        *slot = value;
        true
    }

    pub fn alert_level(&self) -> Option<AlertLevel> {
        AlertLevel::from_numeric(self.alert.round() as i64)
    }
}

// ---

fn cdi_for(magnitude: f64) -> f64 {
    if magnitude >= 7.0 {
        6.0
    } else if magnitude >= 6.0 {
        4.0
    } else if magnitude >= 5.0 {
        3.0
    } else {
        2.0
    }
}

fn mmi_for(magnitude: f64) -> f64 {
    if magnitude >= 7.0 {
        7.0
    } else if magnitude >= 6.0 {
        5.0
    } else if magnitude >= 5.0 {
        4.0
    } else {
        3.0
    }
}

/// Synthesize features with depth drawn from `rng`.
pub fn synthesize_with<R: Rng>(
    rng: &mut R,
    magnitude: f64,
    latitude: f64,
    longitude: f64,
) -> SeismicFeatures {
    // ---
    let depth = rng.gen_range(0.0..=MAX_IMPACT_DEPTH_KM);
    synthesize_at_depth(magnitude, latitude, longitude, depth)
}

/// Synthesize features with a uniformly sampled impact depth.
pub fn synthesize(magnitude: f64, latitude: f64, longitude: f64) -> SeismicFeatures {
    synthesize_with(&mut rand::thread_rng(), magnitude, latitude, longitude)
}

/// The deterministic part of synthesis, for a known depth.
pub fn synthesize_at_depth(
    magnitude: f64,
    latitude: f64,
    longitude: f64,
    depth: f64,
) -> SeismicFeatures {
    // ---
    let cdi = cdi_for(magnitude);
    let mmi = mmi_for(magnitude);
    let felt = ((magnitude - 3.0) * 1000.0).trunc().max(0.0);
    let sig = (magnitude * 100.0 + 100.0).trunc();
    let alert = AlertLevel::classify(magnitude, sig, mmi, cdi, depth);

    SeismicFeatures {
        mag: magnitude,
        time: chrono::Utc::now().timestamp_millis() as f64,
        felt,
        cdi,
        mmi,
        alert: alert.numeric() as f64,
        sig,
        tsunami: 0.0,
        mag_type: DOMINANT_MAG_TYPE,
        longitude,
        latitude,
        depth,
    }
}
