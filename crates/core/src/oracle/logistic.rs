//! Logistic-regression ignition model loaded from JSON
//!
//! Model file layout (keys of `weights`, `means` and `scales` are the
//! feature names; `means`/`scales` are optional and default to 0 and 1):
//!
//! ```json
//! {
//!   "intercept": -1.2,
//!   "weights": { "X_frp": 0.8, "slope": 0.1, "temp": 0.4, "humidity": -0.6,
//!                "wind_speed": 0.3, "fuel_dryness": 0.5, "pop_density": -0.05,
//!                "dist_to_road": 0.02 },
//!   "means":  { "X_frp": 60.0, "temp": 25.0, "humidity": 50.0, "dist_to_road": 1500.0 },
//!   "scales": { "X_frp": 40.0, "temp": 8.0, "humidity": 20.0, "dist_to_road": 1000.0 }
//! }
//! ```

use super::{IgnitionOracle, OracleError};
use crate::core_types::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ModelFile {
    intercept: f64,
    weights: BTreeMap<String, f64>,
    #[serde(default)]
    means: BTreeMap<String, f64>,
    #[serde(default)]
    scales: BTreeMap<String, f64>,
}

/// Standardize-then-logistic model over the 8 ordered features
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticOracle {
    intercept: f64,
    weights: [f64; FEATURE_COUNT],
    means: [f64; FEATURE_COUNT],
    scales: [f64; FEATURE_COUNT],
}

impl LogisticOracle {
    /// Build a model from coefficients in feature order, without scaling
    ///
    /// # Errors
    /// Returns [`OracleError::InvalidModel`] for non-finite coefficients.
    pub fn new(intercept: f64, weights: [f64; FEATURE_COUNT]) -> Result<Self, OracleError> {
        Self::with_scaling(intercept, weights, [0.0; FEATURE_COUNT], [1.0; FEATURE_COUNT])
    }

    /// Build a model that standardizes each feature as `(x - mean) / scale`
    ///
    /// # Errors
    /// Returns [`OracleError::InvalidModel`] for non-finite coefficients or
    /// non-positive scales.
    pub fn with_scaling(
        intercept: f64,
        weights: [f64; FEATURE_COUNT],
        means: [f64; FEATURE_COUNT],
        scales: [f64; FEATURE_COUNT],
    ) -> Result<Self, OracleError> {
        if !intercept.is_finite() {
            return Err(OracleError::InvalidModel("intercept is not finite".into()));
        }
        for (i, name) in FEATURE_NAMES.iter().enumerate() {
            if !weights[i].is_finite() || !means[i].is_finite() {
                return Err(OracleError::InvalidModel(format!(
                    "coefficient for {name} is not finite"
                )));
            }
            if !(scales[i].is_finite() && scales[i] > 0.0) {
                return Err(OracleError::InvalidModel(format!(
                    "scale for {name} must be positive, got {}",
                    scales[i]
                )));
            }
        }
        Ok(Self {
            intercept,
            weights,
            means,
            scales,
        })
    }

    /// Parse a model document
    ///
    /// # Errors
    /// Returns [`OracleError::Parse`] for malformed JSON and
    /// [`OracleError::InvalidModel`] for unknown or missing features.
    pub fn from_json(json: &str) -> Result<Self, OracleError> {
        let file: ModelFile = serde_json::from_str(json)?;

        for key in file
            .weights
            .keys()
            .chain(file.means.keys())
            .chain(file.scales.keys())
        {
            if !FEATURE_NAMES.contains(&key.as_str()) {
                return Err(OracleError::InvalidModel(format!("unknown feature '{key}'")));
            }
        }

        let mut weights = [0.0; FEATURE_COUNT];
        let mut means = [0.0; FEATURE_COUNT];
        let mut scales = [1.0; FEATURE_COUNT];
        for (i, name) in FEATURE_NAMES.iter().enumerate() {
            weights[i] = *file.weights.get(*name).ok_or_else(|| {
                OracleError::InvalidModel(format!("missing weight for '{name}'"))
            })?;
            if let Some(m) = file.means.get(*name) {
                means[i] = *m;
            }
            if let Some(s) = file.scales.get(*name) {
                scales[i] = *s;
            }
        }
        Self::with_scaling(file.intercept, weights, means, scales)
    }

    /// Read and parse a model file
    ///
    /// # Errors
    /// Returns [`OracleError::Io`] if the file cannot be read, otherwise as
    /// [`LogisticOracle::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OracleError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    fn logit(&self, features: &FeatureVector) -> f64 {
        let x = features.to_array();
        let mut z = self.intercept;
        for i in 0..FEATURE_COUNT {
            z += self.weights[i] * (x[i] - self.means[i]) / self.scales[i];
        }
        z
    }
}

impl IgnitionOracle for LogisticOracle {
    fn score(&self, features: &FeatureVector) -> Result<f64, OracleError> {
        if !features.is_finite() {
            return Err(OracleError::InvalidFeatures(*features));
        }
        let z = self.logit(features);
        Ok(1.0 / (1.0 + (-z).exp()))
    }

    fn describe(&self) -> String {
        "logistic ignition model".to_string()
    }
}
