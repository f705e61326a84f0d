//! Simulation requests and their `GeoJSON` wire form
//!
//! A request carries seed fire points plus the horizon and weather mode. The
//! wire form is a `GeoJSON` `FeatureCollection` of Point features whose
//! properties hold `frp` and `slope` (and optionally `fuel_dryness`,
//! `pop_density`, `dist_to_road`), with two extra top-level members:
//!
//! ```json
//! {
//!   "type": "FeatureCollection",
//!   "features": [
//!     { "type": "Feature",
//!       "geometry": { "type": "Point", "coordinates": [79.0, 30.0] },
//!       "properties": { "frp": 85.0, "slope": 12.0 } }
//!   ],
//!   "hours_to_predict": 6,
//!   "use_real_weather": false
//! }
//! ```

use crate::core_types::{Cell, FeatureVector};
use crate::weather::WeatherObservation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Horizon used when the caller does not ask for one
pub const DEFAULT_HORIZON_HOURS: u32 = 3;

/// Reasons a request document could not be understood
#[derive(Debug, Error)]
pub enum InputError {
    #[error("malformed request: {0}")]
    Json(#[from] serde_json::Error),
    #[error("feature {index}: unsupported geometry '{kind}', expected Point")]
    UnsupportedGeometry { index: usize, kind: String },
    #[error("feature {index}: point needs [lon, lat] coordinates")]
    BadCoordinates { index: usize },
    #[error("feature {index}: missing property '{name}'")]
    MissingProperty { index: usize, name: &'static str },
    #[error("feature {index}: property '{name}' is not a number")]
    NotANumber { index: usize, name: &'static str },
}

/// Values filled in for seed attributes the caller does not provide
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeedDefaults {
    pub fuel_dryness: f64,
    pub pop_density: f64,
    /// Meters
    pub dist_to_road: f64,
}

impl Default for SeedDefaults {
    fn default() -> Self {
        Self {
            fuel_dryness: 0.2,
            pop_density: 5.0,
            dist_to_road: 500.0,
        }
    }
}

/// One initial fire point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeedPoint {
    pub lon: f64,
    pub lat: f64,
    /// Fire radiative power (MW)
    pub frp: f64,
    /// Terrain slope (degrees)
    pub slope: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_dryness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pop_density: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist_to_road: Option<f64>,
}

impl SeedPoint {
    /// Seed with only the required attributes
    #[must_use]
    pub fn new(lon: f64, lat: f64, frp: f64, slope: f64) -> Self {
        Self {
            lon,
            lat,
            frp,
            slope,
            fuel_dryness: None,
            pop_density: None,
            dist_to_road: None,
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.lon, self.lat)
    }

    /// Check the seed can start a simulation; returns a reason if not
    pub fn problem(&self) -> Option<String> {
        if !(self.lon.is_finite() && (-180.0..=180.0).contains(&self.lon)) {
            return Some(format!("longitude {} out of range", self.lon));
        }
        if !(self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat)) {
            return Some(format!("latitude {} out of range", self.lat));
        }
        if !(self.frp.is_finite() && self.frp >= 0.0) {
            return Some(format!("frp {} must be a non-negative number", self.frp));
        }
        if !self.slope.is_finite() {
            return Some(format!("slope {} is not a number", self.slope));
        }
        let optional = [self.fuel_dryness, self.pop_density, self.dist_to_road];
        if optional.iter().flatten().any(|v| !v.is_finite()) {
            return Some("optional attributes must be finite".to_string());
        }
        None
    }

    /// Initial feature vector for this seed
    #[must_use]
    pub fn features(&self, defaults: &SeedDefaults, weather: &WeatherObservation) -> FeatureVector {
        FeatureVector {
            x_frp: self.frp,
            slope: self.slope,
            temp: weather.temp,
            humidity: weather.humidity,
            wind_speed: weather.wind_speed,
            fuel_dryness: self.fuel_dryness.unwrap_or(defaults.fuel_dryness),
            pop_density: self.pop_density.unwrap_or(defaults.pop_density),
            dist_to_road: self.dist_to_road.unwrap_or(defaults.dist_to_road),
        }
    }
}

/// Everything one simulation call needs from its caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub seeds: Vec<SeedPoint>,
    #[serde(default = "default_horizon")]
    pub hours_to_predict: u32,
    #[serde(default)]
    pub use_real_weather: bool,
    #[serde(default)]
    pub defaults: SeedDefaults,
}

fn default_horizon() -> u32 {
    DEFAULT_HORIZON_HOURS
}

impl SimulationRequest {
    /// Request with the default horizon and mock weather
    #[must_use]
    pub fn new(seeds: Vec<SeedPoint>) -> Self {
        Self {
            seeds,
            hours_to_predict: DEFAULT_HORIZON_HOURS,
            use_real_weather: false,
            defaults: SeedDefaults::default(),
        }
    }

    #[must_use]
    pub fn with_hours(mut self, hours: u32) -> Self {
        self.hours_to_predict = hours;
        self
    }

    #[must_use]
    pub fn with_real_weather(mut self, enabled: bool) -> Self {
        self.use_real_weather = enabled;
        self
    }

    /// Parse the `GeoJSON` wire form
    ///
    /// # Errors
    /// Returns [`InputError`] for malformed JSON, non-Point geometry or
    /// missing/non-numeric `frp` and `slope` properties.
    pub fn from_geojson(json: &str) -> Result<Self, InputError> {
        let input: ActiveFiresInput = serde_json::from_str(json)?;
        let seeds = input
            .features
            .iter()
            .enumerate()
            .map(|(index, f)| f.to_seed(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            seeds,
            hours_to_predict: input.hours_to_predict,
            use_real_weather: input.use_real_weather,
            defaults: SeedDefaults::default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ActiveFiresInput {
    features: Vec<FirePoint>,
    #[serde(default = "default_horizon")]
    hours_to_predict: u32,
    #[serde(default)]
    use_real_weather: bool,
}

#[derive(Debug, Deserialize)]
struct FirePoint {
    geometry: RawGeometry,
    #[serde(default)]
    properties: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

impl FirePoint {
    fn to_seed(&self, index: usize) -> Result<SeedPoint, InputError> {
        if self.geometry.kind != "Point" {
            return Err(InputError::UnsupportedGeometry {
                index,
                kind: self.geometry.kind.clone(),
            });
        }
        let coords = self
            .geometry
            .coordinates
            .as_array()
            .filter(|c| c.len() >= 2)
            .ok_or(InputError::BadCoordinates { index })?;
        let (Some(lon), Some(lat)) = (coords[0].as_f64(), coords[1].as_f64()) else {
            return Err(InputError::BadCoordinates { index });
        };

        Ok(SeedPoint {
            lon,
            lat,
            frp: self.required(index, "frp")?,
            slope: self.required(index, "slope")?,
            fuel_dryness: self.optional(index, "fuel_dryness")?,
            pop_density: self.optional(index, "pop_density")?,
            dist_to_road: self.optional(index, "dist_to_road")?,
        })
    }

    fn required(&self, index: usize, name: &'static str) -> Result<f64, InputError> {
        self.optional(index, name)?
            .ok_or(InputError::MissingProperty { index, name })
    }

    fn optional(&self, index: usize, name: &'static str) -> Result<Option<f64>, InputError> {
        match self.properties.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or(InputError::NotANumber { index, name }),
        }
    }
}
