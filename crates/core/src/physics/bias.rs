//! Wind alignment and uphill tendency adjustments
//!
//! The oracle scores a candidate cell from its features alone; it has no idea
//! which direction the fire is travelling. These two deterministic terms add
//! that directional information on top of the learned probability:
//!
//! ```text
//! uphill_bias = (dx * slope / 45 + dy * slope / 45) * 0.1
//! wind_bias   = (dx * cos(wind_dir) + dy * sin(wind_dir)) * 0.25
//! final       = clamp(oracle + wind_bias + uphill_bias, 0, 1)
//! ```
//!
//! Wind outweighs slope 2.5 to 1.

use crate::core_types::units::Degrees;
use serde::{Deserialize, Serialize};

/// Weight applied to the wind alignment term
pub const WIND_BIAS_WEIGHT: f64 = 0.25;

/// Weight applied to the normalized slope term
pub const SLOPE_BIAS_WEIGHT: f64 = 0.1;

/// Slope (degrees) treated as "steep" when normalizing
pub const REFERENCE_SLOPE_DEG: f64 = 45.0;

/// Weights of the directional bias terms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasWeights {
    pub wind: f64,
    pub slope: f64,
    pub reference_slope_deg: f64,
}

impl Default for BiasWeights {
    fn default() -> Self {
        Self {
            wind: WIND_BIAS_WEIGHT,
            slope: SLOPE_BIAS_WEIGHT,
            reference_slope_deg: REFERENCE_SLOPE_DEG,
        }
    }
}

impl BiasWeights {
    /// Both terms disabled; the final probability equals the oracle's
    #[must_use]
    pub fn none() -> Self {
        Self {
            wind: 0.0,
            slope: 0.0,
            ..Self::default()
        }
    }

    /// Uphill tendency for a lattice step on a slope of `slope_deg`
    #[inline]
    #[must_use]
    pub fn uphill_bias(&self, dx: i8, dy: i8, slope_deg: f64) -> f64 {
        let (dx, dy) = (f64::from(dx), f64::from(dy));
        (dx * slope_deg / self.reference_slope_deg + dy * slope_deg / self.reference_slope_deg)
            * self.slope
    }

    /// Alignment of a lattice step with the wind, weighted
    #[inline]
    #[must_use]
    pub fn wind_bias(&self, dx: i8, dy: i8, wind_direction: Degrees) -> f64 {
        let rad = wind_direction.to_radians();
        let alignment = f64::from(dx) * rad.cos() + f64::from(dy) * rad.sin();
        alignment * self.wind
    }

    /// Sum of both terms for one step
    #[inline]
    #[must_use]
    pub fn total(&self, dx: i8, dy: i8, slope_deg: f64, wind_direction: Degrees) -> f64 {
        self.wind_bias(dx, dy, wind_direction) + self.uphill_bias(dx, dy, slope_deg)
    }

    /// Oracle probability adjusted by both terms and clipped to `[0, 1]`
    #[inline]
    #[must_use]
    pub fn adjust(
        &self,
        oracle_probability: f64,
        dx: i8,
        dy: i8,
        slope_deg: f64,
        wind_direction: Degrees,
    ) -> f64 {
        (oracle_probability + self.total(dx, dy, slope_deg, wind_direction)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uphill_bias_scaling() {
        let w = BiasWeights::default();
        // 45° slope, diagonal step: (1 + 1) * 0.1
        assert_relative_eq!(w.uphill_bias(1, 1, 45.0), 0.2);
        assert_relative_eq!(w.uphill_bias(-1, 0, 22.5), -0.05);
        // Opposing components cancel
        assert_relative_eq!(w.uphill_bias(1, -1, 30.0), 0.0);
        assert_relative_eq!(w.uphill_bias(1, 0, 0.0), 0.0);
    }

    #[test]
    fn test_wind_bias_alignment() {
        let w = BiasWeights::default();
        assert_relative_eq!(w.wind_bias(1, 0, Degrees::new(0.0)), 0.25, epsilon = 1e-12);
        assert_relative_eq!(w.wind_bias(-1, 0, Degrees::new(0.0)), -0.25, epsilon = 1e-12);
        assert_relative_eq!(w.wind_bias(0, 1, Degrees::new(0.0)), 0.0, epsilon = 1e-12);
        assert_relative_eq!(w.wind_bias(0, -1, Degrees::new(270.0)), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_wind_dominates_slope() {
        let w = BiasWeights::default();
        assert_relative_eq!(w.wind / w.slope, 2.5);
    }

    #[test]
    fn test_adjust_clips() {
        let w = BiasWeights::default();
        assert_eq!(w.adjust(0.95, 1, 1, 45.0, Degrees::new(45.0)), 1.0);
        assert_eq!(w.adjust(0.05, -1, -1, 45.0, Degrees::new(45.0)), 0.0);
    }

    #[test]
    fn test_none_passes_probability_through() {
        let w = BiasWeights::none();
        for (dx, dy) in crate::core_types::NEIGHBOR_OFFSETS {
            assert_eq!(w.adjust(0.45, dx, dy, 30.0, Degrees::new(250.0)), 0.45);
        }
    }
}
