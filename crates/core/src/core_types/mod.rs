//! Core types and utilities

pub mod cell;
pub mod features;
pub mod units;

pub use cell::{Cell, CellId, DEGREE_OFFSET, NEIGHBOR_OFFSETS};
pub use features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use units::*;
