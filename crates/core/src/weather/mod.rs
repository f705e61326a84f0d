//! Synthetic seasonal weather and its daily refresh cadence
//!
//! The spread engine holds one [`WeatherSample`] per simulated day. A
//! [`WeatherSource`] draws fresh samples; [`WeatherState`] decides when a
//! draw happens (hour 1 and every hour where `hour % 24 == 1`) and keeps the
//! active sample in between. Samples are redrawn, never interpolated.
//!
//! The default source is [`SeasonalWeather`] driven by a [`SeasonalPreset`],
//! whose [`SeasonalPreset::uttarakhand`] preset reproduces the four-band
//! Himalayan foothill climate (winter, spring, monsoon, autumn).

pub mod provider;

pub use provider::{
    CachedWeatherProvider, ObservationFile, WeatherFetchError, WeatherObservation,
    WeatherProvider,
};

use crate::core_types::units::{Celsius, Degrees, MetersPerSecond, Percent};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Hours between weather redraws
pub const WEATHER_REFRESH_HOURS: u32 = 24;

/// Days per approximate month when mapping elapsed hours to a season
pub const DAYS_PER_MONTH: u32 = 30;

/// Weather valid for one simulated day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub temperature: Celsius,
    pub humidity: Percent,
    pub wind_speed: MetersPerSecond,
    /// Direction in degrees, compared against lattice offsets as a
    /// standard math angle (0° = +lon, 90° = +lat)
    pub wind_direction: Degrees,
}

impl WeatherSample {
    /// Unit wind vector `(cos θ, sin θ)` in lattice axes
    #[must_use]
    pub fn wind_components(&self) -> (f64, f64) {
        let rad = self.wind_direction.to_radians();
        (rad.cos(), rad.sin())
    }
}

impl fmt::Display for WeatherSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temp {}, Humidity {}, Wind {} from {}",
            self.temperature, self.humidity, self.wind_speed, self.wind_direction
        )
    }
}

/// Approximate month index (0 = January) for an elapsed simulation hour
#[inline]
#[must_use]
pub fn month_index(hour: u32) -> u32 {
    let day = hour / 24;
    (day / DAYS_PER_MONTH) % 12
}

/// True for the hours at which a new daily sample must be drawn
#[inline]
#[must_use]
pub fn is_refresh_hour(hour: u32) -> bool {
    hour == 1 || hour % WEATHER_REFRESH_HOURS == 1
}

/// Seasonal bands used by the synthetic generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Season {
    /// Dec-Feb
    Winter,
    /// Mar-May
    Spring,
    /// Jun-Oct
    Monsoon,
    /// Nov
    Autumn,
}

impl Season {
    /// Season for a month index (0 = January). Out-of-band months fall back
    /// to autumn.
    #[must_use]
    pub fn from_month(month: u32) -> Self {
        match month {
            11 | 0 | 1 => Season::Winter,
            2..=4 => Season::Spring,
            5..=9 => Season::Monsoon,
            _ => Season::Autumn,
        }
    }
}

/// Base ranges drawn once per sample for one season
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonBand {
    /// Uniform range for the base temperature (°C), `[min, max)`
    pub temp_base: (f64, f64),
    /// Uniform range for the base relative humidity (%), `[min, max)`
    pub humidity_base: (f64, f64),
}

/// Climate description for [`SeasonalWeather`]
///
/// # Example
/// ```
/// use fire_spread_core::weather::{Season, SeasonalPreset};
///
/// let preset = SeasonalPreset::uttarakhand();
/// assert_eq!(preset.band(Season::Monsoon).humidity_base, (60.0, 90.0));
/// assert_eq!(preset.wind_direction, (200.0, 320.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPreset {
    /// Region name
    pub name: String,
    pub winter: SeasonBand,
    pub spring: SeasonBand,
    pub monsoon: SeasonBand,
    pub autumn: SeasonBand,
    /// Daily temperature jitter, drawn from `[-j, j)` and added to the base
    pub temp_jitter: f64,
    /// Daily humidity jitter, drawn from `[-j, j)` and added to the base
    pub humidity_jitter: f64,
    /// Final humidity clamp `[min, max]`
    pub humidity_clamp: (f64, f64),
    /// Wind speed range (m/s), season independent
    pub wind_speed: (f64, f64),
    /// Wind direction band (degrees), season independent
    pub wind_direction: (f64, f64),
}

impl SeasonalPreset {
    /// Uttarakhand foothills: cool dry winters, hot pre-monsoon spring,
    /// humid monsoon, prevailing south-westerly winds.
    #[must_use]
    pub fn uttarakhand() -> Self {
        Self {
            name: "Uttarakhand".to_string(),
            winter: SeasonBand {
                temp_base: (5.0, 15.0),
                humidity_base: (40.0, 70.0),
            },
            spring: SeasonBand {
                temp_base: (15.0, 25.0),
                humidity_base: (30.0, 60.0),
            },
            monsoon: SeasonBand {
                temp_base: (20.0, 30.0),
                humidity_base: (60.0, 90.0),
            },
            autumn: SeasonBand {
                temp_base: (10.0, 20.0),
                humidity_base: (50.0, 80.0),
            },
            temp_jitter: 5.0,
            humidity_jitter: 10.0,
            humidity_clamp: (10.0, 95.0),
            wind_speed: (1.0, 12.0),
            wind_direction: (200.0, 320.0),
        }
    }

    /// Band parameters for a season
    #[must_use]
    pub fn band(&self, season: Season) -> &SeasonBand {
        match season {
            Season::Winter => &self.winter,
            Season::Spring => &self.spring,
            Season::Monsoon => &self.monsoon,
            Season::Autumn => &self.autumn,
        }
    }
}

impl Default for SeasonalPreset {
    fn default() -> Self {
        Self::uttarakhand()
    }
}

/// A [`SeasonalPreset`] that cannot produce physical weather
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PresetError {
    #[error("preset '{preset}': {field} is not finite")]
    NotFinite { preset: String, field: String },
    #[error("preset '{preset}': {field} range ({lo}, {hi}) is inverted")]
    InvertedRange {
        preset: String,
        field: String,
        lo: f64,
        hi: f64,
    },
    #[error("preset '{preset}': {field} must not be negative, got {value}")]
    Negative {
        preset: String,
        field: String,
        value: f64,
    },
    #[error("preset '{preset}': {season:?} can reach {coldest}°C, below absolute zero")]
    BelowAbsoluteZero {
        preset: String,
        season: Season,
        coldest: f64,
    },
}

impl SeasonalPreset {
    /// Check that every draw this preset allows is physical
    ///
    /// # Errors
    /// Returns [`PresetError`] for non-finite values, inverted ranges,
    /// negative jitters or wind speeds, and temperature bands whose base
    /// minus jitter falls below absolute zero.
    pub fn validate(&self) -> Result<(), PresetError> {
        let seasons = [
            (Season::Winter, &self.winter),
            (Season::Spring, &self.spring),
            (Season::Monsoon, &self.monsoon),
            (Season::Autumn, &self.autumn),
        ];
        let mut ranges = vec![
            ("humidity_clamp".to_string(), self.humidity_clamp),
            ("wind_speed".to_string(), self.wind_speed),
            ("wind_direction".to_string(), self.wind_direction),
        ];
        for (season, band) in &seasons {
            ranges.push((format!("{season:?} temp_base"), band.temp_base));
            ranges.push((format!("{season:?} humidity_base"), band.humidity_base));
        }

        for (field, (lo, hi)) in &ranges {
            if !(lo.is_finite() && hi.is_finite()) {
                return Err(PresetError::NotFinite {
                    preset: self.name.clone(),
                    field: field.clone(),
                });
            }
            if lo > hi {
                return Err(PresetError::InvertedRange {
                    preset: self.name.clone(),
                    field: field.clone(),
                    lo: *lo,
                    hi: *hi,
                });
            }
        }

        for (field, value) in [
            ("temp_jitter", self.temp_jitter),
            ("humidity_jitter", self.humidity_jitter),
            ("wind_speed", self.wind_speed.0),
        ] {
            if !value.is_finite() {
                return Err(PresetError::NotFinite {
                    preset: self.name.clone(),
                    field: field.to_string(),
                });
            }
            if value < 0.0 {
                return Err(PresetError::Negative {
                    preset: self.name.clone(),
                    field: field.to_string(),
                    value,
                });
            }
        }

        for (season, band) in seasons {
            let coldest = band.temp_base.0 - self.temp_jitter;
            if coldest < Celsius::ABSOLUTE_ZERO.value() {
                return Err(PresetError::BelowAbsoluteZero {
                    preset: self.name.clone(),
                    season,
                    coldest,
                });
            }
        }
        Ok(())
    }
}

/// Anything that can draw a fresh daily weather sample
///
/// Implementations must be shareable across threads so one engine can serve
/// concurrent simulations; all randomness comes from the caller's `rng`.
pub trait WeatherSource: Send + Sync {
    /// Draw the sample valid from `hour` until the next refresh hour
    fn sample(&self, hour: u32, rng: &mut dyn RngCore) -> WeatherSample;
}

/// Seasonal random weather generator
#[derive(Debug, Clone, Default)]
pub struct SeasonalWeather {
    preset: SeasonalPreset,
}

impl SeasonalWeather {
    /// Generator for a validated preset
    ///
    /// # Errors
    /// Returns [`PresetError`] if the preset fails
    /// [`SeasonalPreset::validate`].
    pub fn new(preset: SeasonalPreset) -> Result<Self, PresetError> {
        preset.validate()?;
        Ok(Self { preset })
    }

    #[must_use]
    pub fn preset(&self) -> &SeasonalPreset {
        &self.preset
    }
}

/// Uniform draw from `[lo, hi)`. Degenerate ranges return `lo` without
/// consuming randomness.
fn uniform(rng: &mut dyn RngCore, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo {
        rng.random_range(lo..hi)
    } else {
        lo
    }
}

impl WeatherSource for SeasonalWeather {
    fn sample(&self, hour: u32, rng: &mut dyn RngCore) -> WeatherSample {
        let p = &self.preset;
        let band = p.band(Season::from_month(month_index(hour)));

        let temp_base = uniform(rng, band.temp_base);
        let humidity_base = uniform(rng, band.humidity_base);

        let temp = temp_base + uniform(rng, (-p.temp_jitter, p.temp_jitter));
        let humidity = (humidity_base + uniform(rng, (-p.humidity_jitter, p.humidity_jitter)))
            .clamp(p.humidity_clamp.0, p.humidity_clamp.1);
        let wind_speed = uniform(rng, p.wind_speed);
        let wind_direction = uniform(rng, p.wind_direction);

        WeatherSample {
            temperature: Celsius::new(temp),
            humidity: Percent::new(humidity),
            wind_speed: MetersPerSecond::new(wind_speed),
            wind_direction: Degrees::new(wind_direction),
        }
    }
}

/// A source that always returns the same sample. Consumes no randomness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWeather(pub WeatherSample);

impl WeatherSource for FixedWeather {
    fn sample(&self, _hour: u32, _rng: &mut dyn RngCore) -> WeatherSample {
        self.0
    }
}

/// The active daily sample plus the hour it was drawn at
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeatherState {
    current: Option<WeatherSample>,
    last_updated: Option<u32>,
}

impl WeatherState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The sample in force, if one has been drawn
    #[must_use]
    pub fn current(&self) -> Option<WeatherSample> {
        self.current
    }

    /// Hour of the most recent draw
    #[must_use]
    pub fn last_updated(&self) -> Option<u32> {
        self.last_updated
    }

    /// Return the sample valid at `hour`, drawing a new one from `source` on
    /// refresh hours (or when nothing has been drawn yet).
    pub fn advance(
        &mut self,
        hour: u32,
        source: &dyn WeatherSource,
        rng: &mut dyn RngCore,
    ) -> WeatherSample {
        match self.current {
            Some(sample) if !is_refresh_hour(hour) => sample,
            _ => {
                let sample = source.sample(hour, rng);
                debug!(hour, weather = %sample, "Weather redrawn");
                self.current = Some(sample);
                self.last_updated = Some(hour);
                sample
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_refresh_hours() {
        let refresh: Vec<u32> = (0..=73).filter(|&h| is_refresh_hour(h)).collect();
        assert_eq!(refresh, vec![1, 25, 49, 73]);
    }

    #[test]
    fn test_month_and_season_mapping() {
        assert_eq!(month_index(0), 0);
        assert_eq!(month_index(24 * 30 - 1), 0);
        assert_eq!(month_index(24 * 30), 1);
        assert_eq!(month_index(24 * 30 * 12), 0);

        assert_eq!(Season::from_month(0), Season::Winter);
        assert_eq!(Season::from_month(11), Season::Winter);
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(7), Season::Monsoon);
        assert_eq!(Season::from_month(10), Season::Autumn);
    }

    #[test]
    fn test_seasonal_samples_respect_bounds() {
        let source = SeasonalWeather::default();
        let mut rng = StdRng::seed_from_u64(7);

        for hour in (1..24 * 365).step_by(24) {
            let s = source.sample(hour, &mut rng);
            let band = source
                .preset()
                .band(Season::from_month(month_index(hour)));
            assert!(*s.temperature >= band.temp_base.0 - 5.0);
            assert!(*s.temperature < band.temp_base.1 + 5.0);
            assert!((10.0..=95.0).contains(&*s.humidity));
            assert!((1.0..12.0).contains(&*s.wind_speed));
            assert!((200.0..320.0).contains(&*s.wind_direction));
        }
    }

    #[test]
    fn test_uttarakhand_preset_is_valid() {
        assert_eq!(SeasonalPreset::uttarakhand().validate(), Ok(()));
        assert!(SeasonalWeather::new(SeasonalPreset::uttarakhand()).is_ok());
    }

    #[test]
    fn test_preset_below_absolute_zero_rejected() {
        let mut preset = SeasonalPreset::uttarakhand();
        preset.winter.temp_base = (-300.0, -290.0);
        assert!(matches!(
            SeasonalWeather::new(preset),
            Err(PresetError::BelowAbsoluteZero {
                season: Season::Winter,
                ..
            })
        ));

        // Base in range but jitter reaches past absolute zero
        let mut preset = SeasonalPreset::uttarakhand();
        preset.spring.temp_base = (-270.0, -260.0);
        preset.temp_jitter = 10.0;
        assert!(matches!(
            preset.validate(),
            Err(PresetError::BelowAbsoluteZero {
                season: Season::Spring,
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_presets_rejected() {
        let mut inverted = SeasonalPreset::uttarakhand();
        inverted.monsoon.humidity_base = (90.0, 60.0);
        assert!(matches!(
            inverted.validate(),
            Err(PresetError::InvertedRange { .. })
        ));

        let mut nan = SeasonalPreset::uttarakhand();
        nan.wind_direction = (f64::NAN, 320.0);
        assert!(matches!(nan.validate(), Err(PresetError::NotFinite { .. })));

        let mut negative = SeasonalPreset::uttarakhand();
        negative.temp_jitter = -5.0;
        assert!(matches!(
            negative.validate(),
            Err(PresetError::Negative { .. })
        ));
    }

    #[test]
    fn test_same_seed_same_weather() {
        let source = SeasonalWeather::default();
        let a = source.sample(1, &mut StdRng::seed_from_u64(42));
        let b = source.sample(1, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_state_holds_sample_within_day() {
        let source = SeasonalWeather::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = WeatherState::new();

        let day1 = state.advance(1, &source, &mut rng);
        for hour in 2..=24 {
            assert_eq!(state.advance(hour, &source, &mut rng), day1);
        }
        assert_eq!(state.last_updated(), Some(1));

        let day2 = state.advance(25, &source, &mut rng);
        assert_ne!(day1, day2);
        assert_eq!(state.last_updated(), Some(25));
        assert_eq!(state.current(), Some(day2));
    }

    #[test]
    fn test_state_draws_when_empty() {
        let fixed = WeatherSample {
            temperature: Celsius::new(20.0),
            humidity: Percent::new(50.0),
            wind_speed: MetersPerSecond::new(3.0),
            wind_direction: Degrees::new(270.0),
        };
        let mut state = WeatherState::new();
        let got = state.advance(5, &FixedWeather(fixed), &mut StdRng::seed_from_u64(0));
        assert_eq!(got, fixed);
        assert_eq!(state.last_updated(), Some(5));
    }
}
