//! Monte Carlo ensembles of independent spread runs
//!
//! Each member runs the same request with its own `StdRng` seeded
//! `base_seed + member` and its own state, so members share nothing but the
//! read-only engine. Members run in parallel on the rayon pool; results are
//! gathered in member order, so the summary does not depend on scheduling.

use super::{SimulationOutcome, SimulationRequest, SpreadEngine};
use crate::core_types::CellId;
use crate::error::SimulationError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Fraction of ensemble members in which a cell burned
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellFrequency {
    pub lon: f64,
    pub lat: f64,
    pub frequency: f64,
}

/// Aggregate of an ensemble run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSummary {
    pub members: usize,
    /// Mean number of cells ignited by spread (seeds excluded)
    pub mean_spread_cells: f64,
    /// Mean of each member's last hour with ignitions
    pub mean_last_hour: f64,
    /// Burn frequency per cell, most frequent first
    pub burn_frequency: Vec<CellFrequency>,
}

/// Builder for an ensemble over one engine
#[derive(Debug, Clone, Copy)]
pub struct Ensemble<'a> {
    engine: &'a SpreadEngine,
    members: usize,
    base_seed: u64,
}

impl<'a> Ensemble<'a> {
    pub fn new(engine: &'a SpreadEngine) -> Self {
        Self {
            engine,
            members: 16,
            base_seed: 0,
        }
    }

    pub fn members(mut self, members: usize) -> Self {
        self.members = members;
        self
    }

    pub fn base_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    /// Run every member and keep their outcomes, in member order
    ///
    /// # Errors
    /// Fails if any member fails; no partial ensemble is returned.
    pub fn run_members(
        &self,
        request: &SimulationRequest,
    ) -> Result<Vec<SimulationOutcome>, SimulationError> {
        (0..self.members)
            .into_par_iter()
            .map(|member| {
                let mut rng = StdRng::seed_from_u64(self.base_seed.wrapping_add(member as u64));
                self.engine.run(request, &mut rng)
            })
            .collect()
    }

    /// Run every member and summarize
    ///
    /// # Errors
    /// As [`Ensemble::run_members`].
    pub fn run(&self, request: &SimulationRequest) -> Result<EnsembleSummary, SimulationError> {
        let outcomes = self.run_members(request)?;
        let summary = summarize(&outcomes);
        info!(
            members = summary.members,
            mean_spread_cells = summary.mean_spread_cells,
            "Ensemble finished"
        );
        Ok(summary)
    }
}

/// Aggregate member outcomes into burn frequencies
#[must_use]
pub fn summarize(outcomes: &[SimulationOutcome]) -> EnsembleSummary {
    let members = outcomes.len();
    if members == 0 {
        return EnsembleSummary {
            members: 0,
            mean_spread_cells: 0.0,
            mean_last_hour: 0.0,
            burn_frequency: Vec::new(),
        };
    }

    let mut counts: FxHashMap<CellId, usize> = FxHashMap::default();
    for outcome in outcomes {
        for id in outcome.burned_cells() {
            *counts.entry(id).or_insert(0) += 1;
        }
    }

    let mut cells: Vec<(CellId, usize)> = counts.into_iter().collect();
    cells.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let n = members as f64;
    EnsembleSummary {
        members,
        mean_spread_cells: outcomes.iter().map(|o| o.spread_count() as f64).sum::<f64>() / n,
        mean_last_hour: outcomes.iter().map(|o| f64::from(o.last_hour())).sum::<f64>() / n,
        burn_frequency: cells
            .into_iter()
            .map(|(id, count)| CellFrequency {
                lon: id.lon(),
                lat: id.lat(),
                frequency: count as f64 / n,
            })
            .collect(),
    }
}
