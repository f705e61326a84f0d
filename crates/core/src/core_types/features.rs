//! The 8-dimensional feature vector scored by the ignition oracle

use serde::{Deserialize, Serialize};

/// Number of features per candidate cell
pub const FEATURE_COUNT: usize = 8;

/// Feature names in the fixed order every oracle expects
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "X_frp",
    "slope",
    "temp",
    "humidity",
    "wind_speed",
    "fuel_dryness",
    "pop_density",
    "dist_to_road",
];

/// Per-cell model inputs valid at the moment the cell ignited
///
/// Serialized field names match [`FEATURE_NAMES`] so model files and
/// `GeoJSON` properties use the same vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Fire radiative power proxy (MW), also reported as intensity
    #[serde(rename = "X_frp")]
    pub x_frp: f64,
    /// Terrain slope in degrees
    pub slope: f64,
    /// Air temperature (°C)
    pub temp: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Wind speed (m/s)
    pub wind_speed: f64,
    pub fuel_dryness: f64,
    pub pop_density: f64,
    /// Distance to the nearest road (m)
    pub dist_to_road: f64,
}

impl FeatureVector {
    /// Values in [`FEATURE_NAMES`] order
    #[must_use]
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.x_frp,
            self.slope,
            self.temp,
            self.humidity,
            self.wind_speed,
            self.fuel_dryness,
            self.pop_density,
            self.dist_to_road,
        ]
    }

    /// True when every feature is a finite number
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}
