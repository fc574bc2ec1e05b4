//! Longitude handling shared by the grid reference, the matcher and the footprint export.
//!
//! Footprints that straddle the antimeridian are written by most producers with vertices on
//! both sides of ±180°. Read naively such a polygon spans almost the whole globe, so every
//! polygon whose longitude extent exceeds 180° is moved into continuous longitude space
//! (negative longitudes shifted by +360°) before any spatial test. Callers then test against
//! the AOI and its copy shifted by +360° so both halves are covered.

use geo::{BoundingRect, Coord, MapCoords, MultiPolygon, Polygon};

pub fn polygon_crosses_antimeridian(polygon: &Polygon<f64>) -> bool {
    polygon
        .bounding_rect()
        .map(|r| r.max().x - r.min().x > 180.0)
        .unwrap_or(false)
}

pub fn crosses_antimeridian(footprint: &MultiPolygon<f64>) -> bool {
    footprint.0.iter().any(polygon_crosses_antimeridian)
}

/// Shift the negative longitudes of every antimeridian-crossing polygon by +360°.
/// Polygons that do not cross are returned unchanged.
pub fn unwrap_antimeridian(footprint: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    MultiPolygon::new(
        footprint
            .0
            .iter()
            .map(|polygon| {
                if polygon_crosses_antimeridian(polygon) {
                    polygon.map_coords(|c| {
                        if c.x < 0.0 {
                            Coord { x: c.x + 360.0, y: c.y }
                        } else {
                            c
                        }
                    })
                } else {
                    polygon.clone()
                }
            })
            .collect(),
    )
}

/// Wrap a longitude into [-180, 180).
pub fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
