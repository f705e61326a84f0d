//! Wildfire Spread Core Library
//!
//! Hour-by-hour cellular automaton that advances a fire front across a
//! lon/lat lattice. Each candidate neighbor of the burning front is scored by
//! a pluggable ignition oracle and nudged by wind alignment and uphill
//! tendency; weather follows a synthetic seasonal generator redrawn once per
//! simulated day.
//!
//! ## Layout
//! - [`core_types`]: cells, cell identity, the 8-feature vector, unit types
//! - [`weather`]: seasonal generator, daily cadence, external weather boundary
//! - [`oracle`]: ignition oracle trait, stub and logistic implementations
//! - [`physics`]: wind and slope bias model
//! - [`simulation`]: spread engine, state, requests, results, ensembles
//!
//! ## Example
//! ```
//! use fire_spread_core::{
//!     ConstantOracle, OracleSlot, SeedPoint, SimulationRequest, SpreadEngine,
//! };
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let engine = SpreadEngine::new(OracleSlot::ready(ConstantOracle::new(0.9).unwrap()));
//! let request = SimulationRequest::new(vec![SeedPoint::new(79.0, 30.0, 120.0, 8.0)]).with_hours(2);
//!
//! let outcome = engine.run(&request, &mut StdRng::seed_from_u64(7)).unwrap();
//! assert_eq!(outcome.ignited_at(1).len(), 8);
//! ```

pub mod core_types;
pub mod error;
pub mod oracle;
pub mod physics;
pub mod simulation;
pub mod weather;

pub use core_types::{Cell, CellId, FeatureVector, FEATURE_NAMES};
pub use error::SimulationError;
pub use oracle::{ConstantOracle, IgnitionOracle, LogisticOracle, OracleError, OracleSlot};
pub use physics::BiasWeights;
pub use simulation::{
    ignites, Ensemble, EnsembleSummary, FireRecord, SeedPoint, SimulationOutcome,
    SimulationRequest, SimulationState, SpreadEngine, SpreadResponse, StepOutcome,
    IGNITION_THRESHOLD,
};
pub use weather::{
    FixedWeather, SeasonalPreset, SeasonalWeather, WeatherObservation, WeatherProvider,
    WeatherSample, WeatherSource,
};
