//! Semantic unit types for the weather quantities that feed the spread model
//!
//! Newtype wrappers keep temperature, humidity, wind speed and bearings from
//! being mixed up when weather samples travel between the generator, the
//! external provider boundary and the feature synthesizer.
//!
//! All types wrap `f64` because the ignition oracle consumes `f64` features
//! and the values are copied into feature vectors verbatim.
//!
//! # Usage
//! ```
//! use fire_spread_core::core_types::units::{Celsius, Degrees, Percent};
//!
//! let temp = Celsius::new(32.0);
//! assert_eq!(*temp, 32.0);
//!
//! let humidity = Percent::new(120.0).clamp(Percent::new(10.0), Percent::new(95.0));
//! assert_eq!(humidity, Percent::new(95.0));
//!
//! let bearing = Degrees::new(270.0);
//! assert!((bearing.to_radians().sin() + 1.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Deref, Sub};

/// Generates an `f64` newtype with total ordering, `Deref` to the raw value
/// and a unit-suffixed `Display`.
macro_rules! scalar_unit {
    ($(#[$meta:meta])* $name:ident, $suffix:literal, $precision:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(f64);

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        // NaN sorts above every finite value
        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl Deref for $name {
            type Target = f64;
            #[inline]
            fn deref(&self) -> &f64 {
                &self.0
            }
        }

        impl $name {
            /// Get the raw f64 value
            #[inline]
            #[must_use]
            pub const fn value(self) -> f64 {
                self.0
            }
        }

        impl Add<f64> for $name {
            type Output = $name;
            fn add(self, rhs: f64) -> $name {
                $name::new(self.0 + rhs)
            }
        }

        impl Sub<f64> for $name {
            type Output = $name;
            fn sub(self, rhs: f64) -> $name {
                $name::new(self.0 - rhs)
            }
        }

        impl PartialEq<f64> for $name {
            fn eq(&self, other: &f64) -> bool {
                self.0 == *other
            }
        }

        impl PartialOrd<f64> for $name {
            fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
                self.0.partial_cmp(other)
            }
        }

        impl From<$name> for f64 {
            fn from(v: $name) -> f64 {
                v.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!("{:.", $precision, "}", $suffix), self.0)
            }
        }
    };
}

scalar_unit!(
    /// Air temperature in degrees Celsius
    Celsius,
    "°C",
    1
);

impl Celsius {
    /// Absolute zero in Celsius
    pub const ABSOLUTE_ZERO: Celsius = Celsius(-273.15);

    /// Create a new Celsius temperature. Asserts value >= absolute zero (-273.15°C).
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(
            value >= -273.15,
            "Celsius::new: value is below absolute zero (-273.15°C)"
        );
        Celsius(value)
    }
}

scalar_unit!(
    /// Relative humidity in percent (0-100)
    Percent,
    "%",
    1
);

impl Percent {
    /// Create a new percentage
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Percent(value)
    }
}

scalar_unit!(
    /// Wind speed in meters per second
    MetersPerSecond,
    " m/s",
    1
);

impl MetersPerSecond {
    /// Create a new speed
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        MetersPerSecond(value)
    }
}

scalar_unit!(
    /// Angle in degrees. Used for wind bearings and terrain slope.
    Degrees,
    "°",
    0
);

impl Degrees {
    /// Create a new angle in degrees
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Degrees(value)
    }

    /// Convert to radians
    #[inline]
    #[must_use]
    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_suffixes() {
        assert_eq!(Celsius::new(32.04).to_string(), "32.0°C");
        assert_eq!(Percent::new(25.0).to_string(), "25.0%");
        assert_eq!(MetersPerSecond::new(8.0).to_string(), "8.0 m/s");
        assert_eq!(Degrees::new(270.4).to_string(), "270°");
    }

    #[test]
    fn test_total_ordering_handles_nan() {
        let nan = Percent::new(f64::NAN);
        assert!(nan > Percent::new(100.0));
        assert_eq!(Percent::new(10.0).max(Percent::new(95.0)), Percent::new(95.0));
    }

    #[test]
    #[should_panic(expected = "below absolute zero")]
    fn test_celsius_rejects_below_absolute_zero() {
        let _ = Celsius::new(-300.0);
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&MetersPerSecond::new(8.5)).unwrap();
        assert_eq!(json, "8.5");
        let back: MetersPerSecond = serde_json::from_str(&json).unwrap();
        assert_eq!(back, 8.5);
    }
}
