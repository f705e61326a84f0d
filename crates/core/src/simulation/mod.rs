//! Hour-by-hour cellular automaton fire spread
//!
//! `SpreadEngine` advances a fire front across the cell lattice:
//! - the frontier is every cell that ignited in the previous hour
//! - each frontier cell tries its 8 neighbors that have never burned
//! - a trial is scored by the ignition oracle, adjusted for wind and slope,
//!   and ignites only if the result is strictly above [`IGNITION_THRESHOLD`]
//! - weather is redrawn on the first hour of every simulated day
//! - the run ends at the horizon or at the first hour that ignites nothing
//!
//! The engine owns its dependencies (oracle, weather source, optional weather
//! provider) but no per-run state; every call to [`SpreadEngine::run`] builds
//! a fresh [`SimulationState`], so one engine can serve concurrent requests.
//! All randomness comes from the caller's RNG: identical inputs with an
//! identically seeded RNG produce identical results.

pub mod ensemble;
pub mod request;
pub mod results;
pub mod state;
pub mod synthesis;

pub use ensemble::{CellFrequency, Ensemble, EnsembleSummary};
pub use request::{InputError, SeedDefaults, SeedPoint, SimulationRequest, DEFAULT_HORIZON_HOURS};
pub use results::{hour_label, FeatureCollection, SimulationOutcome, SpreadResponse, Timesteps};
pub use state::{FireRecord, SimulationState};
pub use synthesis::{synthesize_candidate, synthesize_features, Candidate};

use crate::error::SimulationError;
use crate::oracle::{validate_batch, IgnitionOracle, OracleSlot};
use crate::physics::BiasWeights;
use crate::weather::{
    SeasonalWeather, WeatherObservation, WeatherProvider, WeatherSample, WeatherSource,
};
use rand::RngCore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A candidate ignites iff its final probability is strictly greater
pub const IGNITION_THRESHOLD: f64 = 0.45;

/// Ignition rule applied to the bias-adjusted probability
#[inline]
#[must_use]
pub fn ignites(final_probability: f64) -> bool {
    final_probability > IGNITION_THRESHOLD
}

/// What a single hour did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// `n > 0` new cells ignited and were committed
    Ignited(usize),
    /// The previous hour had no burning cells to expand
    NoFrontier,
    /// The frontier expanded into nothing
    Extinguished,
}

/// Fire spread engine with its injected dependencies
#[derive(Clone)]
pub struct SpreadEngine {
    oracle: OracleSlot,
    weather: Arc<dyn WeatherSource>,
    provider: Option<Arc<dyn WeatherProvider>>,
    bias: BiasWeights,
}

impl std::fmt::Debug for SpreadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpreadEngine")
            .field("oracle", &self.oracle)
            .field("has_weather_provider", &self.provider.is_some())
            .field("bias", &self.bias)
            .finish_non_exhaustive()
    }
}

impl SpreadEngine {
    /// Engine with seasonal synthetic weather and the default bias weights
    pub fn new(oracle: OracleSlot) -> Self {
        Self {
            oracle,
            weather: Arc::new(SeasonalWeather::default()),
            provider: None,
            bias: BiasWeights::default(),
        }
    }

    /// Replace the hourly weather source
    pub fn with_weather_source(mut self, source: impl WeatherSource + 'static) -> Self {
        self.weather = Arc::new(source);
        self
    }

    /// Provider consulted for seed weather when a request asks for real weather
    pub fn with_weather_provider(mut self, provider: impl WeatherProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn with_bias(mut self, bias: BiasWeights) -> Self {
        self.bias = bias;
        self
    }

    pub fn bias(&self) -> &BiasWeights {
        &self.bias
    }

    pub fn oracle(&self) -> &OracleSlot {
        &self.oracle
    }

    /// Run a full simulation.
    ///
    /// # Errors
    /// - [`SimulationError::OracleUnavailable`] if no oracle is loaded
    /// - [`SimulationError::EmptyInput`] if the request has no seeds
    /// - [`SimulationError::InvalidSeed`] for unusable seed attributes
    /// - [`SimulationError::Internal`] if scoring fails mid-run; no partial
    ///   result is returned
    pub fn run<R: RngCore>(
        &self,
        request: &SimulationRequest,
        rng: &mut R,
    ) -> Result<SimulationOutcome, SimulationError> {
        let oracle = Arc::clone(self.oracle.get().ok_or(SimulationError::OracleUnavailable)?);
        if request.seeds.is_empty() {
            return Err(SimulationError::EmptyInput);
        }
        if let Some((index, reason)) = request
            .seeds
            .iter()
            .enumerate()
            .find_map(|(i, s)| s.problem().map(|r| (i, r)))
        {
            return Err(SimulationError::InvalidSeed { index, reason });
        }

        let horizon = request.hours_to_predict;
        let mut state = SimulationState::new(horizon);

        let seed_weather = self.seed_weather(request, &mut state);
        let kept = state.seed(request.seeds.iter().map(|s| {
            FireRecord::seed(s.cell(), s.features(&request.defaults, &seed_weather))
        }));
        info!(
            seeds = kept,
            horizon,
            oracle = %oracle.describe(),
            "Starting spread simulation"
        );

        for hour in 1..=horizon {
            match self.step(oracle.as_ref(), &mut state, hour, rng)? {
                StepOutcome::Ignited(n) => debug!(hour, ignited = n, "Hour committed"),
                outcome => {
                    debug!(hour, ?outcome, "Spread stopped");
                    break;
                }
            }
        }

        let burned = state.visited_count();
        let outcome = state.into_outcome();
        info!(
            last_hour = outcome.last_hour(),
            spread_cells = outcome.spread_count(),
            burned_cells = burned,
            "Spread simulation finished"
        );
        Ok(outcome)
    }

    /// Advance `state` by one hour, expanding the front that ignited at
    /// `hour - 1`. Newly ignited cells are committed to `state`.
    ///
    /// # Errors
    /// Returns [`SimulationError::Internal`] if the oracle fails or answers
    /// with something that is not one probability per candidate.
    pub fn step<R: RngCore>(
        &self,
        oracle: &dyn IgnitionOracle,
        state: &mut SimulationState,
        hour: u32,
        rng: &mut R,
    ) -> Result<StepOutcome, SimulationError> {
        let frontier = state.frontier(hour.saturating_sub(1)).to_vec();
        if hour == 0 || frontier.is_empty() {
            return Ok(StepOutcome::NoFrontier);
        }

        let weather = state.weather_mut().advance(hour, self.weather.as_ref(), rng);

        let mut ignited = Vec::new();
        let mut candidates = Vec::with_capacity(8);
        let mut batch = Vec::with_capacity(8);

        for parent in &frontier {
            candidates.clear();
            batch.clear();

            // Neighbors of one parent are distinct cells, so checking them all
            // before any ignites is the same as checking one at a time.
            for ((dx, dy), cell) in parent.cell().neighbors() {
                if state.is_visited(cell.id()) {
                    continue;
                }
                let candidate = synthesize_candidate(parent, (dx, dy), &weather, rng);
                batch.push(candidate.features);
                candidates.push(candidate);
            }
            if candidates.is_empty() {
                continue;
            }

            let probabilities = oracle.score_batch(&batch)?;
            validate_batch(batch.len(), &probabilities)?;

            for (candidate, p) in candidates.iter().zip(probabilities) {
                let final_p = self.final_probability(p, candidate, parent, &weather);
                if ignites(final_p) && state.mark_visited(candidate.cell.id()) {
                    ignited.push(FireRecord::spread(
                        candidate.cell,
                        hour,
                        candidate.features,
                        final_p,
                    ));
                }
            }
        }

        if ignited.is_empty() {
            return Ok(StepOutcome::Extinguished);
        }
        let n = ignited.len();
        state.commit_hour(hour, ignited);
        Ok(StepOutcome::Ignited(n))
    }

    fn final_probability(
        &self,
        oracle_probability: f64,
        candidate: &Candidate,
        parent: &FireRecord,
        weather: &WeatherSample,
    ) -> f64 {
        self.bias.adjust(
            oracle_probability,
            candidate.dx,
            candidate.dy,
            parent.features().slope,
            weather.wind_direction,
        )
    }

    /// Weather for the seed snapshot. Real weather is looked up once at the
    /// first seed; any failure falls back to [`WeatherObservation::MOCK`].
    fn seed_weather(
        &self,
        request: &SimulationRequest,
        state: &mut SimulationState,
    ) -> WeatherObservation {
        if !request.use_real_weather {
            return WeatherObservation::MOCK;
        }
        let Some(first) = request.seeds.first() else {
            return WeatherObservation::MOCK;
        };

        let lookup = match &self.provider {
            Some(provider) => provider.current(first.lat, first.lon),
            None => Err(crate::weather::WeatherFetchError::Unavailable(
                "no weather provider configured".to_string(),
            )),
        };

        match lookup {
            Ok(obs) => {
                state.push_log(format!(
                    "Real weather data used: Temp {}°C, Humidity {}%, Wind {} m/s",
                    obs.temp, obs.humidity, obs.wind_speed
                ));
                obs
            }
            Err(e) => {
                warn!(error = %e, "Weather lookup failed, using mock weather");
                state.push_log("Weather API failed, using mock data.");
                WeatherObservation::MOCK
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::units::{Celsius, Degrees, MetersPerSecond, Percent};
    use crate::oracle::{ConstantOracle, OracleError};
    use crate::weather::FixedWeather;
    use crate::FeatureVector;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn calm() -> FixedWeather {
        FixedWeather(WeatherSample {
            temperature: Celsius::new(30.0),
            humidity: Percent::new(30.0),
            wind_speed: MetersPerSecond::new(5.0),
            wind_direction: Degrees::new(270.0),
        })
    }

    fn engine(p: f64) -> SpreadEngine {
        SpreadEngine::new(OracleSlot::ready(ConstantOracle::new(p).unwrap()))
            .with_weather_source(calm())
            .with_bias(BiasWeights::none())
    }

    fn single_seed(hours: u32) -> SimulationRequest {
        SimulationRequest::new(vec![SeedPoint::new(79.0, 30.0, 100.0, 0.0)]).with_hours(hours)
    }

    struct Broken;

    impl IgnitionOracle for Broken {
        fn score(&self, _: &FeatureVector) -> Result<f64, OracleError> {
            Err(OracleError::Backend("model crashed".into()))
        }
    }

    struct Overconfident;

    impl IgnitionOracle for Overconfident {
        fn score(&self, _: &FeatureVector) -> Result<f64, OracleError> {
            Ok(1.7)
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        assert!(!ignites(0.45));
        assert!(ignites(0.450_000_1));
        assert!(!ignites(0.0));
    }

    #[test]
    fn test_full_ring_per_hour_under_certain_ignition() {
        let out = engine(0.9)
            .run(&single_seed(3), &mut StdRng::seed_from_u64(1))
            .unwrap();
        // Rings of a square: 8, 16, 24
        assert_eq!(out.ignited_at(1).len(), 8);
        assert_eq!(out.ignited_at(2).len(), 16);
        assert_eq!(out.ignited_at(3).len(), 24);
        assert_eq!(
            out.logs(),
            [
                "Hour 1: 8 new cells ignited.",
                "Hour 2: 16 new cells ignited.",
                "Hour 3: 24 new cells ignited."
            ]
        );
    }

    #[test]
    fn test_oracle_unavailable_checked_first() {
        let engine = SpreadEngine::new(OracleSlot::empty());
        let err = engine
            .run(&SimulationRequest::new(Vec::new()), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, SimulationError::OracleUnavailable));
    }

    #[test]
    fn test_empty_and_invalid_input() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            engine(0.9).run(&SimulationRequest::new(Vec::new()), &mut rng),
            Err(SimulationError::EmptyInput)
        ));
        let bad = SimulationRequest::new(vec![
            SeedPoint::new(79.0, 30.0, 10.0, 0.0),
            SeedPoint::new(79.0, 95.0, 10.0, 0.0),
        ]);
        assert!(matches!(
            engine(0.9).run(&bad, &mut rng),
            Err(SimulationError::InvalidSeed { index: 1, .. })
        ));
    }

    #[test]
    fn test_oracle_failures_are_fatal() {
        let mut rng = StdRng::seed_from_u64(0);
        let broken = SpreadEngine::new(OracleSlot::ready(Broken)).with_weather_source(calm());
        assert!(matches!(
            broken.run(&single_seed(3), &mut rng),
            Err(SimulationError::Internal(_))
        ));

        let wild = SpreadEngine::new(OracleSlot::ready(Overconfident)).with_weather_source(calm());
        assert!(matches!(
            wild.run(&single_seed(3), &mut rng),
            Err(SimulationError::Internal(_))
        ));
    }

    #[test]
    fn test_real_weather_without_provider_falls_back() {
        let out = engine(0.0)
            .run(
                &single_seed(1).with_real_weather(true),
                &mut StdRng::seed_from_u64(0),
            )
            .unwrap();
        assert_eq!(out.logs(), ["Weather API failed, using mock data."]);
        assert_eq!(out.seeds()[0].features().temp, 32.0);
    }

    #[test]
    fn test_step_without_frontier() {
        let engine = engine(0.9);
        let mut state = SimulationState::new(5);
        let oracle = ConstantOracle::new(0.9).unwrap();
        let outcome = engine
            .step(&oracle, &mut state, 1, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(outcome, StepOutcome::NoFrontier);
    }

    #[test]
    fn test_wind_steers_spread() {
        // p = 0.3 alone never ignites; +0.25 downwind does, crosswind does not
        let engine = SpreadEngine::new(OracleSlot::ready(ConstantOracle::new(0.3).unwrap()))
            .with_weather_source(FixedWeather(WeatherSample {
                wind_direction: Degrees::new(0.0),
                ..calm().0
            }))
            .with_bias(BiasWeights {
                slope: 0.0,
                ..BiasWeights::default()
            });
        let out = engine
            .run(&single_seed(1), &mut StdRng::seed_from_u64(0))
            .unwrap();
        let offsets: Vec<(i64, i64)> = out
            .ignited_at(1)
            .iter()
            .map(|r| {
                let c = r.cell();
                (
                    ((c.lon - 79.0) / crate::core_types::DEGREE_OFFSET).round() as i64,
                    ((c.lat - 30.0) / crate::core_types::DEGREE_OFFSET).round() as i64,
                )
            })
            .collect();
        // Only dx = +1 gains 0.25: (1,0), (1,-1), (1,1)
        assert_eq!(offsets, vec![(1, 0), (1, -1), (1, 1)]);
    }
}
