//! Feature vectors for candidate neighbor cells
//!
//! Terrain and demographic features are treated as locally constant and are
//! inherited from the burning parent. Weather features come from the day's
//! sample. FRP drifts by a random factor and distance-to-road grows by a flat
//! step per hop regardless of the true distance travelled.

use super::state::FireRecord;
use crate::core_types::{Cell, FeatureVector};
use crate::weather::WeatherSample;
use rand::Rng;

/// Multiplicative FRP jitter range `[min, max)`
pub const FRP_JITTER: (f64, f64) = (0.9, 1.1);

/// Lower FRP clamp for spread cells
pub const FRP_MIN: f64 = 10.0;

/// Upper FRP clamp for spread cells
pub const FRP_MAX: f64 = 250.0;

/// Distance-to-road added per hop (m)
pub const DIST_TO_ROAD_STEP: f64 = 500.0;

/// One ignition trial: where, in which direction, and with what inputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub cell: Cell,
    pub dx: i8,
    pub dy: i8,
    pub features: FeatureVector,
}

/// Inputs for the neighbor of `parent` at `(dx, dy)` under `weather`
pub fn synthesize_candidate<R: Rng + ?Sized>(
    parent: &FireRecord,
    (dx, dy): (i8, i8),
    weather: &WeatherSample,
    rng: &mut R,
) -> Candidate {
    Candidate {
        cell: parent.cell().offset(dx, dy),
        dx,
        dy,
        features: synthesize_features(parent.features(), weather, rng),
    }
}

/// Feature vector inherited from `parent` under `weather`.
///
/// Consumes exactly one random draw (the FRP jitter).
pub fn synthesize_features<R: Rng + ?Sized>(
    parent: &FeatureVector,
    weather: &WeatherSample,
    rng: &mut R,
) -> FeatureVector {
    let jitter = rng.random_range(FRP_JITTER.0..FRP_JITTER.1);
    FeatureVector {
        x_frp: (parent.x_frp * jitter).clamp(FRP_MIN, FRP_MAX),
        slope: parent.slope,
        temp: weather.temperature.value(),
        humidity: weather.humidity.value(),
        wind_speed: weather.wind_speed.value(),
        fuel_dryness: parent.fuel_dryness,
        pop_density: parent.pop_density,
        dist_to_road: parent.dist_to_road + DIST_TO_ROAD_STEP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::units::{Celsius, Degrees, MetersPerSecond, Percent};
    use crate::core_types::DEGREE_OFFSET;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn parent(x_frp: f64) -> FireRecord {
        FireRecord::seed(
            Cell::new(79.0, 30.0),
            FeatureVector {
                x_frp,
                slope: 12.0,
                temp: 32.0,
                humidity: 25.0,
                wind_speed: 8.0,
                fuel_dryness: 0.2,
                pop_density: 5.0,
                dist_to_road: 500.0,
            },
        )
    }

    fn weather() -> WeatherSample {
        WeatherSample {
            temperature: Celsius::new(18.0),
            humidity: Percent::new(55.0),
            wind_speed: MetersPerSecond::new(4.0),
            wind_direction: Degrees::new(250.0),
        }
    }

    #[test]
    fn test_inherits_terrain_and_takes_weather() {
        let mut rng = StdRng::seed_from_u64(1);
        let c = synthesize_candidate(&parent(100.0), (1, -1), &weather(), &mut rng);

        assert_relative_eq!(c.cell.lon, 79.0 + DEGREE_OFFSET);
        assert_relative_eq!(c.cell.lat, 30.0 - DEGREE_OFFSET);
        assert_eq!((c.dx, c.dy), (1, -1));
        assert_eq!(c.features.slope, 12.0);
        assert_eq!(c.features.fuel_dryness, 0.2);
        assert_eq!(c.features.pop_density, 5.0);
        assert_eq!(c.features.temp, 18.0);
        assert_eq!(c.features.humidity, 55.0);
        assert_eq!(c.features.wind_speed, 4.0);
        assert_eq!(c.features.dist_to_road, 1000.0);
    }

    #[test]
    fn test_frp_jitter_within_band() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..500 {
            let f = synthesize_features(parent(100.0).features(), &weather(), &mut rng);
            assert!((90.0..110.0).contains(&f.x_frp), "{}", f.x_frp);
        }
    }

    #[test]
    fn test_frp_clamped() {
        let mut rng = StdRng::seed_from_u64(2);
        let low = synthesize_features(parent(1.0).features(), &weather(), &mut rng);
        let high = synthesize_features(parent(1000.0).features(), &weather(), &mut rng);
        assert_eq!(low.x_frp, FRP_MIN);
        assert_eq!(high.x_frp, FRP_MAX);
    }
}
