//! Deterministic spread physics layered on top of the ignition oracle

pub mod bias;

pub use bias::{BiasWeights, REFERENCE_SLOPE_DEG, SLOPE_BIAS_WEIGHT, WIND_BIAS_WEIGHT};
