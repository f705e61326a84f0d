//! External current-weather boundary
//!
//! A [`WeatherProvider`] answers "what is the weather at (lat, lon) right
//! now". Providers are only consulted for the seed snapshot of a request that
//! asks for real weather; a failure is never fatal and is downgraded by the
//! request layer to [`WeatherObservation::MOCK`].

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

/// Why a weather lookup produced nothing usable
#[derive(Debug, Error)]
pub enum WeatherFetchError {
    #[error("weather source unavailable: {0}")]
    Unavailable(String),
    #[error("malformed weather payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("weather value out of range: {0}")]
    OutOfRange(String),
}

/// Point weather reading in the units the ignition model was trained on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// °C
    pub temp: f64,
    /// %
    pub humidity: f64,
    /// m/s
    pub wind_speed: f64,
}

impl WeatherObservation {
    /// Fallback used when real weather is not requested or not available
    pub const MOCK: WeatherObservation = WeatherObservation {
        temp: 32.0,
        humidity: 25.0,
        wind_speed: 8.0,
    };

    fn validate(self) -> Result<Self, WeatherFetchError> {
        if !(self.temp.is_finite() && self.humidity.is_finite() && self.wind_speed.is_finite()) {
            return Err(WeatherFetchError::OutOfRange(format!("{self:?}")));
        }
        if !(0.0..=100.0).contains(&self.humidity) || self.wind_speed < 0.0 {
            return Err(WeatherFetchError::OutOfRange(format!("{self:?}")));
        }
        Ok(self)
    }
}

/// Source of current weather at a coordinate
pub trait WeatherProvider: Send + Sync {
    /// Current weather at `(lat, lon)`
    ///
    /// # Errors
    /// Returns [`WeatherFetchError`] when the source cannot be reached or its
    /// answer cannot be understood.
    fn current(&self, lat: f64, lon: f64) -> Result<WeatherObservation, WeatherFetchError>;
}

/// `OpenWeatherMap` "current weather" payload, reduced to the fields we read
#[derive(Debug, Deserialize)]
struct CurrentWeatherPayload {
    main: MainBlock,
    wind: WindBlock,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: f64,
}

/// Parse either a flat [`WeatherObservation`] or an `OpenWeatherMap`
/// current-weather document (metric units).
///
/// # Errors
/// Returns [`WeatherFetchError::Malformed`] when neither shape matches and
/// [`WeatherFetchError::OutOfRange`] for non-physical values.
pub fn parse_observation(json: &str) -> Result<WeatherObservation, WeatherFetchError> {
    let obs = match serde_json::from_str::<WeatherObservation>(json) {
        Ok(obs) => obs,
        Err(_) => {
            let payload: CurrentWeatherPayload = serde_json::from_str(json)?;
            WeatherObservation {
                temp: payload.main.temp,
                humidity: payload.main.humidity,
                wind_speed: payload.wind.speed,
            }
        }
    };
    obs.validate()
}

/// Provider backed by a JSON document on disk, re-read on every lookup.
///
/// Used by offline tooling where a downloaded observation stands in for a
/// live API call. The coordinates are ignored.
#[derive(Debug, Clone)]
pub struct ObservationFile {
    path: PathBuf,
}

impl ObservationFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl WeatherProvider for ObservationFile {
    fn current(&self, _lat: f64, _lon: f64) -> Result<WeatherObservation, WeatherFetchError> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            WeatherFetchError::Unavailable(format!("{}: {e}", self.path.display()))
        })?;
        parse_observation(&contents)
    }
}

/// Bounded memo in front of another provider.
///
/// Successful lookups are remembered per exact coordinate pair; once
/// `capacity` entries exist the oldest is evicted. Failures are not
/// remembered so a transient outage does not stick.
pub struct CachedWeatherProvider<P> {
    inner: P,
    capacity: usize,
    cache: Mutex<MemoTable>,
}

#[derive(Default)]
struct MemoTable {
    entries: FxHashMap<(u64, u64), WeatherObservation>,
    order: VecDeque<(u64, u64)>,
}

impl<P: WeatherProvider> CachedWeatherProvider<P> {
    /// Default number of remembered coordinates
    pub const DEFAULT_CAPACITY: usize = 32;

    pub fn new(inner: P) -> Self {
        Self::with_capacity(inner, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: P, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            cache: Mutex::new(MemoTable::default()),
        }
    }

    /// Number of remembered coordinates
    pub fn len(&self) -> usize {
        self.cache.lock().map_or(0, |t| t.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: WeatherProvider> WeatherProvider for CachedWeatherProvider<P> {
    fn current(&self, lat: f64, lon: f64) -> Result<WeatherObservation, WeatherFetchError> {
        let key = (lat.to_bits(), lon.to_bits());
        if let Ok(table) = self.cache.lock() {
            if let Some(obs) = table.entries.get(&key) {
                debug!(lat, lon, "Weather cache hit");
                return Ok(*obs);
            }
        }

        let obs = self.inner.current(lat, lon)?;

        // A poisoned lock only costs us the memo, never the answer
        if let Ok(mut table) = self.cache.lock() {
            if table.entries.len() >= self.capacity {
                if let Some(oldest) = table.order.pop_front() {
                    table.entries.remove(&oldest);
                }
            }
            if table.entries.insert(key, obs).is_none() {
                table.order.push_back(key);
            }
        }
        Ok(obs)
    }
}
