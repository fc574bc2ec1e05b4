use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use geo::MultiPolygon;
use serde::Serialize;

use super::error::PredictError;
use crate::plan::{OrbitalDirection, PlanRecord};

/// A plan record that intersects the AOI and has not ended before the reference instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedRecord {
    #[serde(flatten)]
    pub record: PlanRecord,
    /// Share of the AOI area covered by the footprint, 0 to 100.
    pub aoi_overlap_pct: f64,
}

/// Why a direction group has no next pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Undetermined {
    /// The plan does not reach far enough past the reference instant to rule a pass out.
    HorizonExceeded { horizon: Option<DateTime<Utc>> },
    /// The plan covers at least a full repeat cycle and never touches the AOI.
    NoIntersection { horizon: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PassOutcome {
    Next(MatchedRecord),
    Undetermined(Undetermined),
}

impl PassOutcome {
    pub fn next(&self) -> Option<&MatchedRecord> {
        match self {
            PassOutcome::Next(m) => Some(m),
            PassOutcome::Undetermined(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionGroup {
    /// `Unspecified` for satellites reported as one group.
    pub direction: OrbitalDirection,
    pub outcome: PassOutcome,
    /// The earliest matches of the group, the selected one first.
    pub upcoming: Vec<MatchedRecord>,
}

/// Prediction for one satellite. `summary` and `footprints` are index-aligned: line `i`
/// describes footprint `i`, which is `None` for undetermined groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverpassResult {
    pub satellite: String,
    pub reference: DateTime<Utc>,
    pub horizon: Option<DateTime<Utc>>,
    pub groups: Vec<DirectionGroup>,
    pub summary: Vec<String>,
    #[serde(skip)]
    pub footprints: Vec<Option<MultiPolygon<f64>>>,
}

impl OverpassResult {
    pub fn lines(&self) -> impl Iterator<Item = (&str, Option<&MultiPolygon<f64>>)> {
        self.summary
            .iter()
            .map(String::as_str)
            .zip(self.footprints.iter().map(Option::as_ref))
    }

    /// Selected pass of a direction group. `Unspecified` selects the single group of
    /// satellites without direction grouping.
    pub fn next_pass(&self, direction: OrbitalDirection) -> Option<&MatchedRecord> {
        self.groups
            .iter()
            .find(|g| g.direction == direction)
            .and_then(|g| g.outcome.next())
    }

    pub fn is_undetermined(&self) -> bool {
        self.groups.iter().all(|g| g.outcome.next().is_none())
    }
}

/// Results of one run, keyed by satellite name.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub reference: DateTime<Utc>,
    #[serde(serialize_with = "serialize_results")]
    pub results: BTreeMap<String, Result<OverpassResult, PredictError>>,
}

impl Prediction {
    pub fn get(&self, satellite: &str) -> Option<&Result<OverpassResult, PredictError>> {
        self.results.get(satellite)
    }

    pub fn successes(&self) -> impl Iterator<Item = &OverpassResult> {
        self.results.values().filter_map(|r| r.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &PredictError> {
        self.results.values().filter_map(|r| r.as_ref().err())
    }
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ResultEntry<'a> {
    Ok(&'a OverpassResult),
    Error {
        message: String,
    },
}

fn serialize_results<S>(
    results: &BTreeMap<String, Result<OverpassResult, PredictError>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;

    let mut map = serializer.serialize_map(Some(results.len()))?;
    for (satellite, result) in results {
        let entry = match result {
            Ok(result) => ResultEntry::Ok(result),
            Err(e) => ResultEntry::Error {
                message: e.to_string(),
            },
        };
        map.serialize_entry(satellite, &entry)?;
    }
    map.end()
}
