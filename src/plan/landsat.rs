use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use geo::Rect;
use serde::{Deserialize, Deserializer};

use super::error::PlanError;
use super::types::{Grouping, OrbitalDirection, PassMetadata, PlanRecord, PlanStats};
use super::wrs2::Wrs2Grid;

/// Scenes per WRS-2 orbit.
pub const WRS2_ROWS: u16 = 248;
pub const MAX_WRS2_PATH: u16 = 233;

const ORBIT_PERIOD_SECONDS: f64 = 98.9 * 60.0;
/// Rows at which each half orbit crosses the equator.
const DESCENDING_EQUATOR_ROW: f64 = 60.0;
const ASCENDING_EQUATOR_ROW: f64 = 184.0;

const DAY_FORMAT: &str = "%m/%d/%Y";
const SECONDS_PER_DAY: i64 = 86_400;

/// Mean local solar time of the equator crossings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CrossingTimes {
    #[serde(default = "default_descending", deserialize_with = "deserialize_clock")]
    pub descending: NaiveTime,
    #[serde(default = "default_ascending", deserialize_with = "deserialize_clock")]
    pub ascending: NaiveTime,
}

fn default_descending() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 11, 0).unwrap_or_default()
}

fn default_ascending() -> NaiveTime {
    NaiveTime::from_hms_opt(22, 11, 0).unwrap_or_default()
}

fn deserialize_clock<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|e| serde::de::Error::custom(format!("invalid time '{}': {}", s, e)))
}

impl Default for CrossingTimes {
    fn default() -> Self {
        CrossingTimes {
            descending: default_descending(),
            ascending: default_ascending(),
        }
    }
}

impl CrossingTimes {
    pub fn local(&self, direction: OrbitalDirection) -> Option<NaiveTime> {
        match direction {
            OrbitalDirection::Descending => Some(self.descending),
            OrbitalDirection::Ascending => Some(self.ascending),
            OrbitalDirection::Unspecified => None,
        }
    }

    /// Approximate instant at which the scene `row` of a path centered at `center_lon` is
    /// imaged on the UTC calendar `day`. The local crossing time is converted with the
    /// longitude and the along-track offset of the row from the equator crossing, then
    /// wrapped into that day.
    pub fn pass_instant(
        &self,
        day: NaiveDate,
        direction: OrbitalDirection,
        row: u16,
        center_lon: f64,
    ) -> Option<DateTime<Utc>> {
        let local = self.local(direction)?;
        let equator_row = match direction {
            OrbitalDirection::Ascending => ASCENDING_EQUATOR_ROW,
            _ => DESCENDING_EQUATOR_ROW,
        };
        let longitude_offset = -center_lon / 15.0 * 3600.0;
        let row_offset = (row as f64 - equator_row) * ORBIT_PERIOD_SECONDS / WRS2_ROWS as f64;
        let seconds = (local.num_seconds_from_midnight() as f64 + longitude_offset + row_offset)
            .round() as i64;

        day.and_hms_opt(0, 0, 0)?
            .and_utc()
            .checked_add_signed(Duration::seconds(seconds.rem_euclid(SECONDS_PER_DAY)))
    }
}

/// Published acquisition calendar: for each mission, the WRS-2 paths imaged on each day.
#[derive(Debug, Clone, Default)]
pub struct CycleSchedule {
    missions: BTreeMap<String, BTreeMap<NaiveDate, Vec<u16>>>,
    skipped: usize,
}

impl CycleSchedule {
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let origin = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: origin.clone(),
            source,
        })?;
        Self::parse_str(&origin, &text)
    }

    /// Parse `{"<mission>": {"MM/DD/YYYY": {"path": "1,17,33"}}}`. Unreadable days and path
    /// tokens are skipped and counted.
    pub fn parse_str(origin: &str, text: &str) -> Result<Self, PlanError> {
        let root: serde_json::Value = serde_json::from_str(text).map_err(|source| PlanError::Json {
            path: origin.to_string(),
            source,
        })?;
        let missions = root.as_object().ok_or_else(|| PlanError::Structure {
            path: origin.to_string(),
            message: "expected an object keyed by mission".into(),
        })?;

        let mut schedule = CycleSchedule::default();
        for (mission, days) in missions {
            let Some(days) = days.as_object() else {
                log::warn!("{}: mission {} has no day table", origin, mission);
                schedule.skipped += 1;
                continue;
            };

            for (key, entry) in days {
                let Ok(day) = NaiveDate::parse_from_str(key.trim(), DAY_FORMAT) else {
                    log::debug!("{}: bad schedule date '{}'", origin, key);
                    schedule.skipped += 1;
                    continue;
                };
                let Some(paths) = entry.get("path").and_then(|p| p.as_str()) else {
                    schedule.skipped += 1;
                    continue;
                };

                let mut parsed = Vec::new();
                for token in paths.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                    match token.parse::<u16>() {
                        Ok(path) if (1..=MAX_WRS2_PATH).contains(&path) => parsed.push(path),
                        _ => {
                            log::debug!("{}: {} bad path token '{}'", origin, key, token);
                            schedule.skipped += 1;
                        }
                    }
                }
                schedule.insert(mission, day, parsed);
            }
        }

        if schedule.entries() == 0 {
            return Err(PlanError::NoRecords {
                path: origin.to_string(),
                skipped: schedule.skipped,
            });
        }
        if schedule.skipped > 0 {
            log::warn!("{}: skipped {} schedule entries", origin, schedule.skipped);
        }
        Ok(schedule)
    }

    pub fn insert(&mut self, mission: &str, day: NaiveDate, paths: Vec<u16>) {
        let entry = self
            .missions
            .entry(mission.to_string())
            .or_default()
            .entry(day)
            .or_default();
        entry.extend(paths);
        entry.sort_unstable();
        entry.dedup();
    }

    pub fn days(&self, mission: &str) -> Option<&BTreeMap<NaiveDate, Vec<u16>>> {
        self.missions.get(mission)
    }

    /// Midnight after the last scheduled day of `mission`.
    pub fn horizon(&self, mission: &str) -> Option<DateTime<Utc>> {
        let (last, _) = self.days(mission)?.last_key_value()?;
        last.succ_opt()?.and_hms_opt(0, 0, 0).map(|t| t.and_utc())
    }

    /// Number of scheduled (day, path) pairs over all missions.
    pub fn entries(&self) -> usize {
        self.missions
            .values()
            .flat_map(|days| days.values())
            .map(Vec::len)
            .sum()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Landsat acquisitions derived from the cycle schedule and the WRS-2 grid.
#[derive(Debug, Clone)]
pub struct LandsatPlan {
    schedule: CycleSchedule,
    grid: Wrs2Grid,
    /// Schedule mission key to reported satellite name.
    missions: BTreeMap<String, String>,
    crossing_times: CrossingTimes,
    repeat_cycle: Duration,
}

impl LandsatPlan {
    pub fn new(
        schedule: CycleSchedule,
        grid: Wrs2Grid,
        missions: BTreeMap<String, String>,
        crossing_times: CrossingTimes,
        repeat_cycle: Duration,
    ) -> Self {
        LandsatPlan {
            schedule,
            grid,
            missions,
            crossing_times,
            repeat_cycle,
        }
    }

    pub fn load(
        schedule_path: &Path,
        wrs2_path: &Path,
        missions: BTreeMap<String, String>,
        crossing_times: CrossingTimes,
        repeat_cycle: Duration,
    ) -> Result<Self, PlanError> {
        let schedule = CycleSchedule::load(schedule_path)?;
        let grid = Wrs2Grid::load(wrs2_path)?;
        for (mission, satellite) in &missions {
            if schedule.days(mission).is_none() {
                log::warn!(
                    "{}: mission '{}' ({}) is not in the schedule",
                    schedule_path.display(),
                    mission,
                    satellite
                );
            }
        }
        Ok(Self::new(schedule, grid, missions, crossing_times, repeat_cycle))
    }

    pub fn satellites(&self) -> Vec<String> {
        self.missions.values().cloned().collect()
    }

    pub fn repeat_cycle(&self) -> Duration {
        self.repeat_cycle
    }

    fn mission(&self, satellite: &str) -> Option<&str> {
        self.missions
            .iter()
            .find(|(_, name)| name.as_str() == satellite)
            .map(|(mission, _)| mission.as_str())
    }

    pub fn horizon(&self, satellite: &str) -> Option<DateTime<Utc>> {
        self.schedule.horizon(self.mission(satellite)?)
    }

    pub fn stats(&self, satellite: &str) -> PlanStats {
        let entries = self
            .mission(satellite)
            .and_then(|m| self.schedule.days(m))
            .map(|days| days.values().map(Vec::len).sum())
            .unwrap_or(0);
        PlanStats {
            entries,
            skipped: self.schedule.skipped() + self.grid.skipped(),
            horizon: self.horizon(satellite),
        }
    }

    /// Candidate records of `satellite` for scenes whose bounds touch `area`. Days that ended
    /// well before `reference` are not expanded.
    pub fn records<'a>(
        &'a self,
        satellite: &'a str,
        area: Rect<f64>,
        reference: DateTime<Utc>,
    ) -> impl Iterator<Item = PlanRecord> + 'a {
        let days = self.mission(satellite).and_then(|m| self.schedule.days(m));
        let earliest = (reference - Duration::days(2)).date_naive();
        let grid = &self.grid;
        let crossing = self.crossing_times;

        days.into_iter()
            .flat_map(move |days| days.range(earliest..))
            .flat_map(move |(day, paths)| {
                let day = *day;
                paths.iter().flat_map(move |path| {
                    Grouping::ByDirection
                        .directions()
                        .iter()
                        .flat_map(move |direction| grid.cells(*path, *direction))
                        .filter(move |cell| cell.may_touch(&area))
                        .filter_map(move |cell| {
                            let instant =
                                crossing.pass_instant(day, cell.direction, cell.row, cell.center_lon)?;
                            Some(PlanRecord {
                                satellite: satellite.to_string(),
                                direction: cell.direction,
                                footprint: cell.footprint.clone(),
                                window_start: instant,
                                window_end: instant,
                                metadata: PassMetadata::Landsat {
                                    path: cell.path,
                                    row: cell.row,
                                },
                            })
                        })
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::wrs2::Wrs2Cell;
    use chrono::TimeZone;
    use geo::{coord, polygon, MultiPolygon};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn plan() -> LandsatPlan {
        let mut schedule = CycleSchedule::default();
        schedule.insert("landsat_8", day(2025, 1, 4), vec![41, 57]);
        schedule.insert("landsat_8", day(2025, 1, 10), vec![41]);
        schedule.insert("landsat_9", day(2025, 1, 12), vec![41]);

        let mut grid = Wrs2Grid::default();
        let square = |w: f64, s: f64| {
            MultiPolygon::new(vec![polygon![
                (x: w, y: s), (x: w + 2.0, y: s), (x: w + 2.0, y: s + 1.5), (x: w, y: s + 1.5),
            ]])
        };
        for (row, direction) in [(36, OrbitalDirection::Descending), (188, OrbitalDirection::Ascending)] {
            grid.insert(Wrs2Cell::new(41, row, direction, square(-119.5, 34.0)).unwrap());
        }
        grid.insert(Wrs2Cell::new(57, 36, OrbitalDirection::Descending, square(20.0, 34.0)).unwrap());

        let missions = [("landsat_8", "Landsat-8"), ("landsat_9", "Landsat-9")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LandsatPlan::new(
            schedule,
            grid,
            missions,
            CrossingTimes::default(),
            Duration::days(16),
        )
    }

    fn area() -> Rect<f64> {
        Rect::new(coord! { x: -118.6, y: 34.5 }, coord! { x: -118.5, y: 34.6 })
    }

    #[test]
    fn parses_cycle_json() {
        let json = r#"{
          "landsat_8": {
            "01/04/2025": {"path": "41, 57,300,x", "row": "1"},
            "13/45/2025": {"path": "1"},
            "01/05/2025": {"row": "2"}
          },
          "landsat_9": {"01/12/2025": {"path": "41"}}
        }"#;
        let schedule = CycleSchedule::parse_str("cycles.json", json).unwrap();
        assert_eq!(schedule.entries(), 3);
        assert_eq!(schedule.skipped(), 4);
        assert_eq!(schedule.days("landsat_8").unwrap()[&day(2025, 1, 4)], vec![41, 57]);
        assert_eq!(
            schedule.horizon("landsat_9"),
            Some(Utc.with_ymd_and_hms(2025, 1, 13, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn empty_schedule_is_an_error() {
        let result = CycleSchedule::parse_str("cycles.json", r#"{"landsat_8": {}}"#);
        assert!(matches!(result, Err(PlanError::NoRecords { .. })));
        let result = CycleSchedule::parse_str("cycles.json", "[]");
        assert!(matches!(result, Err(PlanError::Structure { .. })));
    }

    #[test]
    fn pass_instant_follows_longitude_and_row() {
        let times = CrossingTimes::default();
        let at_equator = times
            .pass_instant(day(2025, 1, 4), OrbitalDirection::Descending, 60, 0.0)
            .unwrap();
        assert_eq!(at_equator, Utc.with_ymd_and_hms(2025, 1, 4, 10, 11, 0).unwrap());

        let west = times
            .pass_instant(day(2025, 1, 4), OrbitalDirection::Descending, 60, -90.0)
            .unwrap();
        assert_eq!(west, Utc.with_ymd_and_hms(2025, 1, 4, 16, 11, 0).unwrap());

        // Scenes north of the equator are imaged before the descending crossing.
        let north = times
            .pass_instant(day(2025, 1, 4), OrbitalDirection::Descending, 36, 0.0)
            .unwrap();
        assert!(north < at_equator);

        let ascending = times
            .pass_instant(day(2025, 1, 4), OrbitalDirection::Ascending, 184, 0.0)
            .unwrap();
        assert_eq!(ascending.hour(), 22);
        assert!(times
            .pass_instant(day(2025, 1, 4), OrbitalDirection::Unspecified, 1, 0.0)
            .is_none());
    }

    #[test]
    fn pass_instant_stays_on_the_scheduled_day() {
        let times = CrossingTimes::default();
        // 22:11 local at 118.5°W is past midnight UTC.
        let instant = times
            .pass_instant(day(2025, 1, 2), OrbitalDirection::Ascending, 188, -118.5)
            .unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 1, 2, 6, 6, 36).unwrap());
    }

    #[test]
    fn records_cover_both_directions_of_touching_cells() {
        let plan = plan();
        let reference = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let records: Vec<PlanRecord> = plan.records("Landsat-8", area(), reference).collect();

        // Two days with path 41, each with one descending and one ascending scene.
        assert_eq!(records.len(), 4);
        assert!(records
            .iter()
            .all(|r| matches!(r.metadata, PassMetadata::Landsat { path: 41, .. })));
        assert_eq!(
            records
                .iter()
                .filter(|r| r.direction == OrbitalDirection::Ascending)
                .count(),
            2
        );
        assert!(records.iter().all(|r| r.window_start == r.window_end));
    }

    #[test]
    fn records_skip_days_long_past() {
        let plan = plan();
        let reference = Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap();
        let records: Vec<PlanRecord> = plan.records("Landsat-8", area(), reference).collect();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.window_start.date_naive() == day(2025, 1, 10)));
        assert_eq!(plan.records("Landsat-7", area(), reference).count(), 0);
    }

    #[test]
    fn horizon_and_stats_per_satellite() {
        let plan = plan();
        assert_eq!(
            plan.horizon("Landsat-8"),
            Some(Utc.with_ymd_and_hms(2025, 1, 11, 0, 0, 0).unwrap())
        );
        assert_eq!(plan.stats("Landsat-8").entries, 3);
        assert_eq!(plan.stats("Landsat-9").entries, 1);
        assert_eq!(plan.horizon("Landsat-7"), None);
        assert_eq!(plan.satellites(), vec!["Landsat-8", "Landsat-9"]);
    }

    #[test]
    fn crossing_times_from_yaml() {
        let times: CrossingTimes = serde_yaml::from_str("descending: \"10:30\"").unwrap();
        assert_eq!(times.descending, NaiveTime::from_hms_opt(10, 30, 0).unwrap());
        assert_eq!(times.ascending, default_ascending());
    }
}
