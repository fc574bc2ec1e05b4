//! Text lines for the per-satellite summary.

use chrono::{DateTime, Utc};

use super::types::{MatchedRecord, Undetermined};
use crate::plan::OrbitalDirection;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `group` is the direction the selector grouped by; records of ungrouped satellites are
/// labelled with their own direction if the plan states one.
pub fn pass_line(satellite: &str, group: OrbitalDirection, matched: &MatchedRecord) -> String {
    let direction = match group {
        OrbitalDirection::Unspecified => matched.record.direction,
        d => d,
    };
    format!(
        "{} | {} | {} | {} | AOI overlap {:.2}%",
        satellite,
        direction_label(direction),
        format_instant(matched.record.window_start),
        matched.record.metadata,
        matched.aoi_overlap_pct
    )
}

pub fn undetermined_line(
    satellite: &str,
    group: OrbitalDirection,
    undetermined: &Undetermined,
) -> String {
    let detail = match undetermined {
        Undetermined::HorizonExceeded { horizon: Some(h) } => {
            format!("plan ends {}", format_instant(*h))
        }
        Undetermined::HorizonExceeded { horizon: None } => "no plan data".to_string(),
        Undetermined::NoIntersection { horizon } => {
            format!("AOI not covered before {}", format_instant(*horizon))
        }
    };
    format!(
        "{} | {} | no qualifying pass found within horizon ({})",
        satellite,
        direction_label(group),
        detail
    )
}

/// Detail line for one of the upcoming passes of a group.
pub fn upcoming_line(matched: &MatchedRecord) -> String {
    format!(
        "{} | {} | {} | AOI overlap {:.2}%",
        format_instant(matched.record.window_start),
        direction_label(matched.record.direction),
        matched.record.metadata,
        matched.aoi_overlap_pct
    )
}

fn direction_label(direction: OrbitalDirection) -> &'static str {
    match direction {
        OrbitalDirection::Ascending => "ascending",
        OrbitalDirection::Descending => "descending",
        OrbitalDirection::Unspecified => "-",
    }
}

fn format_instant(t: DateTime<Utc>) -> String {
    format!("{} UTC", t.format(TIME_FORMAT))
}
