use std::fmt;

use chrono::{DateTime, Utc};
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrbitalDirection {
    Ascending,
    Descending,
    Unspecified,
}

impl OrbitalDirection {
    /// Accepts the spellings found in plan documents: `A`/`D`, `ASC`/`DESC`,
    /// `ascending`/`descending` in any case.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "a" | "asc" | "ascending" => Some(OrbitalDirection::Ascending),
            "d" | "des" | "desc" | "descending" => Some(OrbitalDirection::Descending),
            _ => None,
        }
    }
}

/// Identifying data of a planned pass, by plan family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PassMetadata {
    Sentinel {
        relative_orbit: Option<u32>,
        absolute_orbit: Option<u32>,
        mode: Option<String>,
    },
    Landsat {
        path: u16,
        row: u16,
    },
}

impl fmt::Display for PassMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassMetadata::Sentinel {
                relative_orbit,
                absolute_orbit,
                mode,
            } => {
                match relative_orbit {
                    Some(orbit) => write!(f, "relative orbit {}", orbit)?,
                    None => write!(f, "relative orbit n/a")?,
                }
                if let Some(orbit) = absolute_orbit {
                    write!(f, " (absolute {})", orbit)?;
                }
                if let Some(mode) = mode {
                    write!(f, ", mode {}", mode)?;
                }
                Ok(())
            }
            PassMetadata::Landsat { path, row } => write!(f, "path {} row {}", path, row),
        }
    }
}

/// One planned observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRecord {
    pub satellite: String,
    pub direction: OrbitalDirection,
    #[serde(skip)]
    pub footprint: MultiPolygon<f64>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub metadata: PassMetadata,
}

/// How the selector partitions a satellite's matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// One implicit group regardless of the record direction.
    Single,
    /// Ascending and descending passes are reported separately.
    ByDirection,
}

impl Grouping {
    pub fn directions(&self) -> &'static [OrbitalDirection] {
        match self {
            Grouping::Single => &[OrbitalDirection::Unspecified],
            Grouping::ByDirection => &[OrbitalDirection::Ascending, OrbitalDirection::Descending],
        }
    }

    pub fn contains(&self, group: OrbitalDirection, record: OrbitalDirection) -> bool {
        match self {
            Grouping::Single => true,
            Grouping::ByDirection => group == record,
        }
    }
}

/// Coverage numbers reported by `validate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanStats {
    pub entries: usize,
    pub skipped: usize,
    pub horizon: Option<DateTime<Utc>>,
}
