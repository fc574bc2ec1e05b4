use chrono::{DateTime, Utc};
use geo::{Area, BooleanOps, Intersects, MultiPolygon};

use super::types::MatchedRecord;
use crate::aoi::{Aoi, AoiShape};
use crate::geometry::{crosses_antimeridian, unwrap_antimeridian};
use crate::plan::PlanRecord;

/// Longitude shifts under which the AOI is compared with a footprint.
const SHIFTS: [f64; 2] = [0.0, 360.0];

/// Whether `record` can still be observed at or after `reference` and its footprint
/// intersects the AOI. Boundary contact counts as intersection.
pub fn matches(record: &PlanRecord, aoi: &Aoi, reference: DateTime<Utc>) -> bool {
    if record.window_end < reference {
        return false;
    }
    let footprint = comparable_footprint(&record.footprint);
    SHIFTS
        .iter()
        .any(|dx| shape_intersects(&aoi.shape().translated(*dx), &footprint))
}

/// Keep the records that match, in input order.
pub fn match_records<I>(records: I, aoi: &Aoi, reference: DateTime<Utc>) -> Vec<MatchedRecord>
where
    I: IntoIterator<Item = PlanRecord>,
{
    records
        .into_iter()
        .filter(|record| matches(record, aoi, reference))
        .map(|record| {
            let aoi_overlap_pct = overlap_pct(&record.footprint, aoi);
            MatchedRecord {
                record,
                aoi_overlap_pct,
            }
        })
        .collect()
}

/// Percentage of the AOI area inside `footprint`, rounded to two decimals. A point AOI
/// that is matched is fully covered.
pub fn overlap_pct(footprint: &MultiPolygon<f64>, aoi: &Aoi) -> f64 {
    let Some(area) = aoi.polygons() else {
        return 100.0;
    };
    let total = area.unsigned_area();
    if total <= 0.0 {
        return 0.0;
    }

    let footprint = comparable_footprint(footprint);
    let covered: f64 = SHIFTS
        .iter()
        .map(|dx| match aoi.shape().translated(*dx) {
            AoiShape::Area(shifted) => shifted.intersection(&footprint).unsigned_area(),
            AoiShape::Point(_) => 0.0,
        })
        .sum();

    let pct = (covered / total * 100.0).clamp(0.0, 100.0);
    (pct * 100.0).round() / 100.0
}

fn comparable_footprint(footprint: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    if crosses_antimeridian(footprint) {
        unwrap_antimeridian(footprint)
    } else {
        footprint.clone()
    }
}

fn shape_intersects(shape: &AoiShape, footprint: &MultiPolygon<f64>) -> bool {
    match shape {
        AoiShape::Point(p) => footprint.intersects(p),
        AoiShape::Area(area) => footprint.intersects(area),
    }
}
