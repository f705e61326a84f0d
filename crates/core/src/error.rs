//! Errors surfaced by a simulation request
//!
//! A request either completes with its full result set or fails with one of
//! these; partial results are never returned. Weather lookup failures are not
//! represented here because they are recovered locally with mock weather.

use crate::oracle::OracleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    /// No ignition model is loaded. Maps to "service unavailable".
    #[error("ignition model not loaded; cannot run simulation")]
    OracleUnavailable,

    /// The request carried no seed fire points
    #[error("no active fire points provided")]
    EmptyInput,

    /// A seed point could not be turned into an initial fire record
    #[error("seed {index} is invalid: {reason}")]
    InvalidSeed { index: usize, reason: String },

    /// Anything that went wrong mid-simulation
    #[error("internal simulation error: {0}")]
    Internal(String),
}

impl From<OracleError> for SimulationError {
    fn from(e: OracleError) -> Self {
        SimulationError::Internal(e.to_string())
    }
}

impl SimulationError {
    /// HTTP-style status a service front end would answer with
    pub fn status_code(&self) -> u16 {
        match self {
            SimulationError::OracleUnavailable => 503,
            SimulationError::EmptyInput | SimulationError::InvalidSeed { .. } => 400,
            SimulationError::Internal(_) => 500,
        }
    }
}
