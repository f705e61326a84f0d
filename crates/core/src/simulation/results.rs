//! Final result set of a simulation and its `GeoJSON` rendering
//!
//! Hours that ignited nothing never appear. Hour 0 is the seed snapshot and
//! carries only intensity; later hours also carry the spread probability.

use super::state::FireRecord;
use crate::core_types::CellId;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::ops::Range;

/// Status line attached to successful responses
pub const COMPLETED_STATUS: &str = "Simulation Completed. Map data is ready.";

/// Label used for an hour in the response (`"0h"`, `"1h"`, ...)
#[must_use]
pub fn hour_label(hour: u32) -> String {
    format!("{hour}h")
}

/// Everything a finished simulation produced
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    records: Vec<FireRecord>,
    hourly: BTreeMap<u32, Range<usize>>,
    logs: Vec<String>,
}

impl SimulationOutcome {
    pub(crate) fn new(
        records: Vec<FireRecord>,
        hourly: BTreeMap<u32, Range<usize>>,
        logs: Vec<String>,
    ) -> Self {
        Self {
            records,
            hourly,
            logs,
        }
    }

    /// All records in creation order, seeds first
    pub fn records(&self) -> &[FireRecord] {
        &self.records
    }

    /// Hours with at least one record, ascending (includes 0)
    pub fn hours(&self) -> impl Iterator<Item = u32> + '_ {
        self.hourly.keys().copied()
    }

    /// Records created during `hour`; empty for hours that produced nothing
    pub fn ignited_at(&self, hour: u32) -> &[FireRecord] {
        self.hourly
            .get(&hour)
            .map_or(&[][..], |r| &self.records[r.clone()])
    }

    /// The seed snapshot
    pub fn seeds(&self) -> &[FireRecord] {
        self.ignited_at(0)
    }

    /// Number of cells ignited by spread (seeds excluded)
    pub fn spread_count(&self) -> usize {
        self.records.len() - self.seeds().len()
    }

    /// Latest hour with ignitions
    pub fn last_hour(&self) -> u32 {
        self.hourly.keys().next_back().copied().unwrap_or(0)
    }

    /// Identities of every burned cell
    pub fn burned_cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.records.iter().map(FireRecord::id)
    }

    /// Human readable event log
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Feature collection for one hour
    #[must_use]
    pub fn feature_collection(&self, hour: u32) -> FeatureCollection {
        FeatureCollection::from_records(self.ignited_at(hour))
    }

    /// Wire response keyed by hour label
    #[must_use]
    pub fn to_response(&self) -> SpreadResponse {
        let timesteps = Timesteps(
            self.hourly
                .keys()
                .map(|&h| (h, self.feature_collection(h)))
                .collect(),
        );
        SpreadResponse {
            timesteps,
            logs: self.logs.clone(),
            status: COMPLETED_STATUS.to_string(),
        }
    }
}

/// Serialized simulation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadResponse {
    pub timesteps: Timesteps,
    pub logs: Vec<String>,
    pub status: String,
}

/// Per-hour feature collections, serialized as a JSON object keyed by hour
/// label in ascending hour order (`"0h"`, `"1h"`, ..., `"10h"`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timesteps(BTreeMap<u32, FeatureCollection>);

impl Timesteps {
    /// Feature collection recorded for `hour`
    pub fn get(&self, hour: u32) -> Option<&FeatureCollection> {
        self.0.get(&hour)
    }

    /// Recorded hours, ascending
    pub fn hours(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.keys().copied()
    }

    /// Wire labels in serialization order
    pub fn labels(&self) -> Vec<String> {
        self.hours().map(hour_label).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Timesteps {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (&hour, collection) in &self.0 {
            map.serialize_entry(&hour_label(hour), collection)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Timesteps {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, FeatureCollection>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(label, collection)| {
                label
                    .strip_suffix('h')
                    .and_then(|h| h.parse::<u32>().ok())
                    .map(|hour| (hour, collection))
                    .ok_or_else(|| D::Error::custom(format!("bad hour label '{label}'")))
            })
            .collect::<Result<BTreeMap<u32, FeatureCollection>, D::Error>>()
            .map(Timesteps)
    }
}

/// `GeoJSON` `FeatureCollection` of ignited cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    #[must_use]
    pub fn from_records(records: &[FireRecord]) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features: records.iter().map(Feature::from_record).collect(),
        }
    }
}

/// `GeoJSON` `Feature` for one ignited cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: PointGeometry,
    pub properties: CellProperties,
}

impl Feature {
    fn from_record(record: &FireRecord) -> Self {
        let cell = record.cell();
        Self {
            kind: "Feature".to_string(),
            geometry: PointGeometry {
                kind: "Point".to_string(),
                coordinates: [cell.lon, cell.lat],
            },
            properties: CellProperties {
                prob_spread: record.prob_spread(),
                x_frp: record.intensity(),
                t_hour: record.t_hour(),
            },
        }
    }
}

/// `GeoJSON` Point geometry, `[lon, lat]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prob_spread: Option<f64>,
    /// Intensity (FRP proxy)
    #[serde(rename = "X_frp")]
    pub x_frp: f64,
    pub t_hour: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Cell, FeatureVector};

    fn features(x_frp: f64) -> FeatureVector {
        FeatureVector {
            x_frp,
            slope: 0.0,
            temp: 32.0,
            humidity: 25.0,
            wind_speed: 8.0,
            fuel_dryness: 0.2,
            pop_density: 5.0,
            dist_to_road: 500.0,
        }
    }

    fn outcome() -> SimulationOutcome {
        let seed = Cell::new(79.0, 30.0);
        let records = vec![
            FireRecord::seed(seed, features(100.0)),
            FireRecord::spread(seed.offset(1, 0), 1, features(95.0), 0.8),
            FireRecord::spread(seed.offset(0, 1), 1, features(104.0), 0.6),
        ];
        let mut hourly = BTreeMap::new();
        hourly.insert(0, 0..1);
        hourly.insert(1, 1..3);
        SimulationOutcome::new(records, hourly, vec!["Hour 1: 2 new cells ignited.".into()])
    }

    #[test]
    fn test_typed_access() {
        let out = outcome();
        assert_eq!(out.hours().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(out.seeds().len(), 1);
        assert_eq!(out.ignited_at(1).len(), 2);
        assert!(out.ignited_at(2).is_empty());
        assert_eq!(out.spread_count(), 2);
        assert_eq!(out.last_hour(), 1);
    }

    #[test]
    fn test_response_shape() {
        let json = serde_json::to_value(outcome().to_response()).unwrap();
        assert_eq!(json["status"], COMPLETED_STATUS);
        assert_eq!(json["logs"][0], "Hour 1: 2 new cells ignited.");

        let hour0 = &json["timesteps"]["0h"];
        assert_eq!(hour0["type"], "FeatureCollection");
        assert_eq!(hour0["features"][0]["geometry"]["type"], "Point");
        assert_eq!(hour0["features"][0]["geometry"]["coordinates"][0], 79.0);
        assert_eq!(hour0["features"][0]["properties"]["X_frp"], 100.0);
        assert!(hour0["features"][0]["properties"].get("prob_spread").is_none());

        let hour1 = &json["timesteps"]["1h"];
        assert_eq!(hour1["features"].as_array().unwrap().len(), 2);
        assert_eq!(hour1["features"][0]["properties"]["prob_spread"], 0.8);
        assert!(json["timesteps"].get("2h").is_none());
    }

    #[test]
    fn test_timesteps_serialize_in_hour_order() {
        let seed = Cell::new(79.0, 30.0);
        let mut records = vec![FireRecord::seed(seed, features(100.0))];
        let mut hourly = BTreeMap::new();
        hourly.insert(0, 0..1);
        for hour in 1..=11u32 {
            let start = records.len();
            records.push(FireRecord::spread(
                seed.offset(i8::try_from(hour).unwrap(), 0),
                hour,
                features(90.0),
                0.7,
            ));
            hourly.insert(hour, start..records.len());
        }
        let response = SimulationOutcome::new(records, hourly, Vec::new()).to_response();
        assert_eq!(
            response.timesteps.hours().collect::<Vec<_>>(),
            (0..=11).collect::<Vec<_>>()
        );

        let json = serde_json::to_string(&response).unwrap();
        let positions: Vec<usize> = (0..=11u32)
            .map(|h| json.find(&format!("\"{h}h\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");

        let back: SpreadResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }

    #[test]
    fn test_timesteps_reject_bad_labels() {
        let json = r#"{"timesteps": {"soon": {"type": "FeatureCollection", "features": []}},
                       "logs": [], "status": "ok"}"#;
        assert!(serde_json::from_str::<SpreadResponse>(json).is_err());
    }
}
