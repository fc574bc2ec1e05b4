use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer};

use super::error::PlanError;
use super::landsat::{CrossingTimes, LandsatPlan};
use super::sentinel::SentinelPlan;
use super::types::{Grouping, PlanRecord, PlanStats};
use crate::aoi::Aoi;

/// Configured plan source, as read from the config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum PlanSpec {
    Sentinel {
        satellite: String,
        files: Vec<PathBuf>,
        #[serde(default = "default_sentinel_cycle", deserialize_with = "deserialize_cycle")]
        repeat_cycle: Duration,
    },
    Landsat {
        schedule: PathBuf,
        wrs2: PathBuf,
        #[serde(default = "default_missions")]
        missions: BTreeMap<String, String>,
        #[serde(default)]
        crossing_times: CrossingTimes,
        #[serde(default = "default_landsat_cycle", deserialize_with = "deserialize_cycle")]
        repeat_cycle: Duration,
    },
}

fn default_sentinel_cycle() -> Duration {
    Duration::days(12)
}

fn default_landsat_cycle() -> Duration {
    Duration::days(16)
}

fn default_missions() -> BTreeMap<String, String> {
    [("landsat_8", "Landsat-8"), ("landsat_9", "Landsat-9")]
        .into_iter()
        .map(|(mission, satellite)| (mission.to_string(), satellite.to_string()))
        .collect()
}

/// Repeat cycles are written as humantime durations, e.g. `12days`.
fn deserialize_cycle<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let std = humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)?;
    Duration::from_std(std).map_err(serde::de::Error::custom)
}

impl PlanSpec {
    /// Satellites this source reports on, known without loading it.
    pub fn satellites(&self) -> Vec<String> {
        match self {
            PlanSpec::Sentinel { satellite, .. } => vec![satellite.clone()],
            PlanSpec::Landsat { missions, .. } => missions.values().cloned().collect(),
        }
    }

    /// Make relative file paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        match self {
            PlanSpec::Sentinel { files, .. } => files.iter_mut().for_each(resolve),
            PlanSpec::Landsat { schedule, wrs2, .. } => {
                resolve(schedule);
                resolve(wrs2);
            }
        }
    }

    pub fn load(&self) -> Result<PlanSource, PlanError> {
        match self {
            PlanSpec::Sentinel {
                satellite,
                files,
                repeat_cycle,
            } => SentinelPlan::load(satellite, files, *repeat_cycle).map(PlanSource::Sentinel),
            PlanSpec::Landsat {
                schedule,
                wrs2,
                missions,
                crossing_times,
                repeat_cycle,
            } => LandsatPlan::load(
                schedule,
                wrs2,
                missions.clone(),
                *crossing_times,
                *repeat_cycle,
            )
            .map(PlanSource::Landsat),
        }
    }
}

/// A loaded plan, ready to produce records.
#[derive(Debug, Clone)]
pub enum PlanSource {
    Sentinel(SentinelPlan),
    Landsat(LandsatPlan),
}

impl PlanSource {
    pub fn satellites(&self) -> Vec<String> {
        match self {
            PlanSource::Sentinel(plan) => vec![plan.satellite().to_string()],
            PlanSource::Landsat(plan) => plan.satellites(),
        }
    }

    pub fn grouping(&self) -> Grouping {
        match self {
            PlanSource::Sentinel(_) => Grouping::Single,
            PlanSource::Landsat(_) => Grouping::ByDirection,
        }
    }

    pub fn horizon(&self, satellite: &str) -> Option<DateTime<Utc>> {
        match self {
            PlanSource::Sentinel(plan) if plan.satellite() == satellite => plan.horizon(),
            PlanSource::Sentinel(_) => None,
            PlanSource::Landsat(plan) => plan.horizon(satellite),
        }
    }

    pub fn repeat_cycle(&self) -> Duration {
        match self {
            PlanSource::Sentinel(plan) => plan.repeat_cycle(),
            PlanSource::Landsat(plan) => plan.repeat_cycle(),
        }
    }

    pub fn stats(&self, satellite: &str) -> PlanStats {
        match self {
            PlanSource::Sentinel(plan) => plan.stats(),
            PlanSource::Landsat(plan) => plan.stats(satellite),
        }
    }

    /// Candidate records of `satellite`. Landsat candidates are limited to scenes whose
    /// bounds touch the AOI; the caller still runs the exact intersection test.
    pub fn records<'a>(
        &'a self,
        satellite: &'a str,
        aoi: &'a Aoi,
        reference: DateTime<Utc>,
    ) -> Box<dyn Iterator<Item = PlanRecord> + 'a> {
        match self {
            PlanSource::Sentinel(plan) => Box::new(
                plan.records()
                    .iter()
                    .filter(move |r| r.satellite == satellite)
                    .cloned(),
            ),
            PlanSource::Landsat(plan) => Box::new(plan.records(satellite, aoi.bounds(), reference)),
        }
    }
}
