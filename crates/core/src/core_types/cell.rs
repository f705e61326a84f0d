//! Geographic grid cells and their deduplication identity
//!
//! Cells are points on a regular lon/lat lattice whose spacing is the spread
//! resolution (0.5 km) converted to degrees with a flat 111 km per degree.
//! Distances are never geodesic; the same degree offset is used in both axes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Spread resolution between neighboring cells in kilometers
pub const SPREAD_RESOLUTION_KM: f64 = 0.5;

/// Flat kilometers-per-degree conversion used throughout
pub const KM_PER_DEGREE: f64 = 111.0;

/// Neighbor spacing in degrees (`0.5 / 111.0`)
pub const DEGREE_OFFSET: f64 = SPREAD_RESOLUTION_KM / KM_PER_DEGREE;

/// Decimal places kept when comparing cells for identity
pub const CELL_ID_DECIMALS: i32 = 4;

const CELL_ID_SCALE: f64 = 10_000.0;

/// The 8-connected neighbor offsets in expansion order.
///
/// Order matters: when two frontier cells share a neighbor, the first offset
/// visited on the first frontier cell claims it.
pub const NEIGHBOR_OFFSETS: [(i8, i8); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// A geographic point on the spread lattice (WGS84 lon/lat in degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub lon: f64,
    pub lat: f64,
}

impl Cell {
    /// Create a new cell
    #[inline]
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// The neighboring cell reached by `(dx, dy)` lattice steps
    #[inline]
    #[must_use]
    pub fn offset(self, dx: i8, dy: i8) -> Self {
        Self {
            lon: self.lon + f64::from(dx) * DEGREE_OFFSET,
            lat: self.lat + f64::from(dy) * DEGREE_OFFSET,
        }
    }

    /// Rounded identity used for "has this cell burned already" checks
    #[inline]
    #[must_use]
    pub fn id(self) -> CellId {
        CellId::from_coords(self.lon, self.lat)
    }

    /// Iterate the 8 neighbors together with their offsets
    pub fn neighbors(self) -> impl Iterator<Item = ((i8, i8), Cell)> {
        NEIGHBOR_OFFSETS
            .into_iter()
            .map(move |(dx, dy)| ((dx, dy), self.offset(dx, dy)))
    }
}

/// Cell identity: longitude and latitude rounded to [`CELL_ID_DECIMALS`]
/// decimal places, stored as scaled integers so it can be hashed.
///
/// Two cells with equal identity are the same cell regardless of how their
/// floating point coordinates were produced.
///
/// Rounding is half-to-even on the scaled value, so an exact tie such as a
/// scaled coordinate of `2.5` goes to `2`. The scaling multiply itself rounds,
/// which can move a coordinate written with five decimals off or onto a tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId {
    lon_e4: i64,
    lat_e4: i64,
}

impl CellId {
    #[inline]
    #[must_use]
    pub fn from_coords(lon: f64, lat: f64) -> Self {
        Self {
            lon_e4: round_scaled(lon * CELL_ID_SCALE),
            lat_e4: round_scaled(lat * CELL_ID_SCALE),
        }
    }

    /// Rounded longitude in degrees
    #[must_use]
    pub fn lon(self) -> f64 {
        self.lon_e4 as f64 / CELL_ID_SCALE
    }

    /// Rounded latitude in degrees
    #[must_use]
    pub fn lat(self) -> f64 {
        self.lat_e4 as f64 / CELL_ID_SCALE
    }
}

#[inline]
fn round_scaled(scaled: f64) -> i64 {
    scaled.round_ties_even() as i64
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lon(), self.lat())
    }
}
