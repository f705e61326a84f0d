//! Per-request simulation state
//!
//! One [`SimulationState`] exists per simulation call. It is created with the
//! seed records at hour 0, grows hour by hour and is consumed into a
//! [`SimulationOutcome`] at the end. Nothing is shared between requests.

use super::results::SimulationOutcome;
use crate::core_types::{Cell, CellId, FeatureVector};
use crate::weather::WeatherState;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::debug;

/// One ignited cell, frozen at the moment it caught fire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireRecord {
    cell: Cell,
    t_hour: u32,
    features: FeatureVector,
    prob_spread: Option<f64>,
}

impl FireRecord {
    /// An hour-0 seed record; seeds have no spread probability
    #[must_use]
    pub fn seed(cell: Cell, features: FeatureVector) -> Self {
        Self {
            cell,
            t_hour: 0,
            features,
            prob_spread: None,
        }
    }

    /// A record created by spread at `t_hour` with the probability that
    /// caused the ignition
    #[must_use]
    pub fn spread(cell: Cell, t_hour: u32, features: FeatureVector, prob_spread: f64) -> Self {
        Self {
            cell,
            t_hour,
            features,
            prob_spread: Some(prob_spread),
        }
    }

    pub fn cell(&self) -> Cell {
        self.cell
    }

    pub fn id(&self) -> CellId {
        self.cell.id()
    }

    pub fn t_hour(&self) -> u32 {
        self.t_hour
    }

    pub fn features(&self) -> &FeatureVector {
        &self.features
    }

    /// Final probability that ignited this cell (`None` for seeds)
    pub fn prob_spread(&self) -> Option<f64> {
        self.prob_spread
    }

    /// Fire intensity reported to callers (the FRP proxy)
    pub fn intensity(&self) -> f64 {
        self.features.x_frp
    }
}

/// Mutable state owned by one in-flight simulation
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Every record ever created, in creation order
    records: Vec<FireRecord>,
    /// Identities of every cell that has burned
    visited: FxHashSet<CellId>,
    /// Hour -> slice of `records` created in that hour
    hourly: BTreeMap<u32, Range<usize>>,
    log: Vec<String>,
    weather: WeatherState,
    horizon: u32,
}

impl SimulationState {
    /// Empty state for a run of at most `horizon` hours
    #[must_use]
    pub fn new(horizon: u32) -> Self {
        Self {
            records: Vec::new(),
            visited: FxHashSet::default(),
            hourly: BTreeMap::new(),
            log: Vec::new(),
            weather: WeatherState::new(),
            horizon,
        }
    }

    /// Install the hour-0 seed records. Seeds sharing a cell identity with
    /// an earlier seed are dropped. Returns the number of seeds kept.
    pub fn seed(&mut self, seeds: impl IntoIterator<Item = FireRecord>) -> usize {
        debug_assert!(self.records.is_empty(), "state seeded twice");
        let start = self.records.len();
        for record in seeds {
            if self.visited.insert(record.id()) {
                self.records.push(FireRecord { t_hour: 0, ..record });
            } else {
                debug!(cell = %record.id(), "Duplicate seed cell dropped");
            }
        }
        let end = self.records.len();
        if end > start {
            self.hourly.insert(0, start..end);
        }
        end - start
    }

    /// Records that ignited during `hour`
    pub fn frontier(&self, hour: u32) -> &[FireRecord] {
        self.hourly
            .get(&hour)
            .map_or(&[][..], |r| &self.records[r.clone()])
    }

    pub fn is_visited(&self, id: CellId) -> bool {
        self.visited.contains(&id)
    }

    /// Claim a cell. Returns false if it had already burned.
    pub fn mark_visited(&mut self, id: CellId) -> bool {
        self.visited.insert(id)
    }

    /// Append the records ignited during `hour` plus the hour's log line.
    /// Empty hours are not recorded.
    pub fn commit_hour(&mut self, hour: u32, ignited: Vec<FireRecord>) {
        if ignited.is_empty() {
            return;
        }
        debug_assert!(hour <= self.horizon, "hour {hour} beyond horizon");
        debug_assert!(ignited.iter().all(|r| r.t_hour == hour));
        debug_assert!(
            self.hourly.keys().next_back().is_none_or(|&last| last < hour),
            "hours must be committed in increasing order"
        );

        let start = self.records.len();
        let count = ignited.len();
        self.records.extend(ignited);
        self.hourly.insert(hour, start..self.records.len());
        self.log.push(format!("Hour {hour}: {count} new cells ignited."));
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    pub fn records(&self) -> &[FireRecord] {
        &self.records
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Latest hour with recorded ignitions (0 once seeded)
    pub fn last_hour(&self) -> Option<u32> {
        self.hourly.keys().next_back().copied()
    }

    pub fn weather_mut(&mut self) -> &mut WeatherState {
        &mut self.weather
    }

    /// Finish the run
    #[must_use]
    pub fn into_outcome(self) -> SimulationOutcome {
        SimulationOutcome::new(self.records, self.hourly, self.log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> FeatureVector {
        FeatureVector {
            x_frp: 80.0,
            slope: 5.0,
            temp: 32.0,
            humidity: 25.0,
            wind_speed: 8.0,
            fuel_dryness: 0.2,
            pop_density: 5.0,
            dist_to_road: 500.0,
        }
    }

    #[test]
    fn test_seed_dedups_and_indexes_hour_zero() {
        let mut state = SimulationState::new(3);
        let a = Cell::new(79.0, 30.0);
        let kept = state.seed([
            FireRecord::seed(a, features()),
            FireRecord::seed(Cell::new(79.00001, 30.0), features()),
            FireRecord::seed(a.offset(1, 0), features()),
        ]);
        assert_eq!(kept, 2);
        assert_eq!(state.frontier(0).len(), 2);
        assert!(state.is_visited(a.id()));
        assert_eq!(state.last_hour(), Some(0));
    }

    #[test]
    fn test_commit_hour_appends_and_logs() {
        let mut state = SimulationState::new(3);
        let a = Cell::new(79.0, 30.0);
        state.seed([FireRecord::seed(a, features())]);

        let n = a.offset(0, 1);
        assert!(state.mark_visited(n.id()));
        assert!(!state.mark_visited(n.id()));
        state.commit_hour(1, vec![FireRecord::spread(n, 1, features(), 0.7)]);

        assert_eq!(state.frontier(1).len(), 1);
        assert_eq!(state.frontier(1)[0].prob_spread(), Some(0.7));
        assert_eq!(state.log(), ["Hour 1: 1 new cells ignited."]);
        assert_eq!(state.records().len(), 2);
        assert_eq!(state.visited_count(), 2);
    }

    #[test]
    fn test_empty_hour_leaves_no_trace() {
        let mut state = SimulationState::new(3);
        state.seed([FireRecord::seed(Cell::new(79.0, 30.0), features())]);
        state.commit_hour(1, Vec::new());
        assert!(state.frontier(1).is_empty());
        assert!(state.log().is_empty());
        assert_eq!(state.last_hour(), Some(0));
    }
}
