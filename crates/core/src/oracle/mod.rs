//! Ignition oracle boundary
//!
//! The oracle turns a [`FeatureVector`] into the probability that the
//! candidate cell ignites. The engine never cares how: a trained model, a
//! remote service or a constant stub for tests all plug in through
//! [`IgnitionOracle`].
//!
//! Oracles are loaded once and owned explicitly through an [`OracleSlot`]
//! handed to the engine at construction. An empty slot makes every
//! simulation fail fast with `OracleUnavailable`.

pub mod logistic;

pub use logistic::LogisticOracle;

use crate::core_types::FeatureVector;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

/// Failure inside an oracle
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("could not read model file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse model: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("invalid feature vector: {0:?}")]
    InvalidFeatures(FeatureVector),
    #[error("oracle returned {got} probabilities for {expected} vectors")]
    BatchSize { expected: usize, got: usize },
    #[error("oracle returned probability {0} outside [0, 1]")]
    ProbabilityOutOfRange(f64),
    #[error("oracle backend failure: {0}")]
    Backend(String),
}

/// Something that scores ignition probability from features
///
/// Implementations must be safe for concurrent read-only use so one loaded
/// model can back many simulations at once.
pub trait IgnitionOracle: Send + Sync {
    /// Probability in `[0, 1]` that a cell with these features ignites
    ///
    /// # Errors
    /// Returns [`OracleError`] if the backend fails or the input is unusable.
    fn score(&self, features: &FeatureVector) -> Result<f64, OracleError>;

    /// Score a batch of vectors, one probability per vector, in order.
    ///
    /// # Errors
    /// Returns the first scoring error encountered.
    fn score_batch(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, OracleError> {
        batch.iter().map(|f| self.score(f)).collect()
    }

    /// Short human readable description used in logs
    fn describe(&self) -> String {
        "ignition oracle".to_string()
    }
}

/// Stub oracle returning the same probability for every input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantOracle {
    probability: f64,
}

impl ConstantOracle {
    /// # Errors
    /// Returns [`OracleError::ProbabilityOutOfRange`] unless `probability`
    /// lies in `[0, 1]`.
    pub fn new(probability: f64) -> Result<Self, OracleError> {
        if (0.0..=1.0).contains(&probability) {
            Ok(Self { probability })
        } else {
            Err(OracleError::ProbabilityOutOfRange(probability))
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl IgnitionOracle for ConstantOracle {
    fn score(&self, _features: &FeatureVector) -> Result<f64, OracleError> {
        Ok(self.probability)
    }

    fn score_batch(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, OracleError> {
        Ok(vec![self.probability; batch.len()])
    }

    fn describe(&self) -> String {
        format!("constant oracle (p = {})", self.probability)
    }
}

/// Explicitly owned holder for the loaded oracle
///
/// Cloning shares the loaded model; an empty slot is a valid state that the
/// engine reports as "oracle unavailable".
#[derive(Clone, Default)]
pub struct OracleSlot {
    oracle: Option<Arc<dyn IgnitionOracle>>,
}

impl OracleSlot {
    /// A slot holding `oracle`
    pub fn ready(oracle: impl IgnitionOracle + 'static) -> Self {
        Self {
            oracle: Some(Arc::new(oracle)),
        }
    }

    /// A slot sharing an already loaded oracle
    pub fn shared(oracle: Arc<dyn IgnitionOracle>) -> Self {
        Self {
            oracle: Some(oracle),
        }
    }

    /// A slot with nothing loaded
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a [`LogisticOracle`] from disk. Failure is logged and leaves the
    /// slot empty rather than aborting the caller.
    pub fn load_logistic(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let start = Instant::now();
        match LogisticOracle::load(path) {
            Ok(model) => {
                info!(
                    path = %path.display(),
                    elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Ignition model loaded"
                );
                Self::ready(model)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Could not load ignition model");
                Self::empty()
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.oracle.is_some()
    }

    /// The loaded oracle, if any
    pub fn get(&self) -> Option<&Arc<dyn IgnitionOracle>> {
        self.oracle.as_ref()
    }
}

impl std::fmt::Debug for OracleSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.oracle {
            Some(o) => write!(f, "OracleSlot({})", o.describe()),
            None => write!(f, "OracleSlot(empty)"),
        }
    }
}

/// Check an oracle's batch answer: right length, every value a probability.
///
/// # Errors
/// Returns [`OracleError::BatchSize`] or
/// [`OracleError::ProbabilityOutOfRange`].
pub fn validate_batch(expected: usize, probabilities: &[f64]) -> Result<(), OracleError> {
    if probabilities.len() != expected {
        return Err(OracleError::BatchSize {
            expected,
            got: probabilities.len(),
        });
    }
    match probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        Some(&bad) => Err(OracleError::ProbabilityOutOfRange(bad)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> FeatureVector {
        FeatureVector {
            x_frp: 50.0,
            slope: 10.0,
            temp: 32.0,
            humidity: 25.0,
            wind_speed: 8.0,
            fuel_dryness: 0.2,
            pop_density: 5.0,
            dist_to_road: 500.0,
        }
    }

    #[test]
    fn test_constant_oracle() {
        let oracle = ConstantOracle::new(0.9).unwrap();
        assert_eq!(oracle.score(&features()).unwrap(), 0.9);
        assert_eq!(oracle.score_batch(&[features(); 3]).unwrap(), vec![0.9; 3]);
        assert!(ConstantOracle::new(1.5).is_err());
        assert!(ConstantOracle::new(f64::NAN).is_err());
    }

    #[test]
    fn test_slot_states() {
        assert!(!OracleSlot::empty().is_ready());
        let slot = OracleSlot::ready(ConstantOracle::new(0.2).unwrap());
        assert!(slot.is_ready());
        assert_eq!(format!("{slot:?}"), "OracleSlot(constant oracle (p = 0.2))");
    }

    #[test]
    fn test_failed_load_leaves_slot_empty() {
        let slot = OracleSlot::load_logistic("/no/such/model.json");
        assert!(!slot.is_ready());
    }

    #[test]
    fn test_validate_batch() {
        assert!(validate_batch(2, &[0.0, 1.0]).is_ok());
        assert!(matches!(
            validate_batch(3, &[0.1]),
            Err(OracleError::BatchSize { expected: 3, got: 1 })
        ));
        assert!(matches!(
            validate_batch(1, &[f64::NAN]),
            Err(OracleError::ProbabilityOutOfRange(_))
        ));
    }
}
