use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use geo::{BoundingRect, Centroid, Geometry, MultiPolygon, Rect};
use geojson::{Feature, GeoJson};

use super::error::PlanError;
use super::types::OrbitalDirection;
use crate::geometry::{normalize_lon, unwrap_antimeridian};

/// One WRS-2 scene footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Wrs2Cell {
    pub path: u16,
    pub row: u16,
    pub direction: OrbitalDirection,
    pub footprint: MultiPolygon<f64>,
    /// Bounds of the footprint in continuous longitude space.
    pub bounds: Rect<f64>,
    /// Longitude of the footprint center, wrapped into [-180, 180).
    pub center_lon: f64,
}

impl Wrs2Cell {
    pub fn new(
        path: u16,
        row: u16,
        direction: OrbitalDirection,
        footprint: MultiPolygon<f64>,
    ) -> Option<Self> {
        let unwrapped = unwrap_antimeridian(&footprint);
        let bounds = unwrapped.bounding_rect()?;
        let center = unwrapped.centroid()?;
        Some(Wrs2Cell {
            path,
            row,
            direction,
            footprint,
            bounds,
            center_lon: normalize_lon(center.x()),
        })
    }

    /// Cheap bounds pre-check against an AOI extent, including the extent shifted by 360°.
    pub fn may_touch(&self, area: &Rect<f64>) -> bool {
        [0.0, 360.0].iter().any(|dx| {
            self.bounds.min().x <= area.max().x + dx
                && area.min().x + dx <= self.bounds.max().x
                && self.bounds.min().y <= area.max().y
                && area.min().y <= self.bounds.max().y
        })
    }
}

/// WRS-2 footprints indexed by path and orbit direction.
#[derive(Debug, Clone, Default)]
pub struct Wrs2Grid {
    cells: BTreeMap<(u16, OrbitalDirection), Vec<Wrs2Cell>>,
    skipped: usize,
}

impl Wrs2Grid {
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let origin = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: origin.clone(),
            source,
        })?;
        Self::parse_str(&origin, &text)
    }

    /// Parse a GeoJSON feature collection with `PATH`, `ROW` and optional `MODE`
    /// (`A`/`D`) properties. Features missing any of them are skipped.
    pub fn parse_str(origin: &str, text: &str) -> Result<Self, PlanError> {
        let geojson: GeoJson = text.parse().map_err(|source| PlanError::GeoJson {
            path: origin.to_string(),
            source,
        })?;
        let collection = match geojson {
            GeoJson::FeatureCollection(fc) => fc,
            _ => {
                return Err(PlanError::Structure {
                    path: origin.to_string(),
                    message: "expected a FeatureCollection".into(),
                })
            }
        };

        let mut grid = Wrs2Grid::default();
        for feature in &collection.features {
            match cell_from_feature(feature) {
                Some(cell) => grid.insert(cell),
                None => grid.skipped += 1,
            }
        }

        if grid.is_empty() {
            return Err(PlanError::NoRecords {
                path: origin.to_string(),
                skipped: grid.skipped,
            });
        }
        if grid.skipped > 0 {
            log::warn!("{}: skipped {} WRS-2 features", origin, grid.skipped);
        }
        log::debug!("{}: {} WRS-2 cells", origin, grid.len());
        Ok(grid)
    }

    pub fn insert(&mut self, cell: Wrs2Cell) {
        let cells = self.cells.entry((cell.path, cell.direction)).or_default();
        cells.push(cell);
        cells.sort_by_key(|c| c.row);
    }

    pub fn cells(&self, path: u16, direction: OrbitalDirection) -> &[Wrs2Cell] {
        self.cells
            .get(&(path, direction))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

fn cell_from_feature(feature: &Feature) -> Option<Wrs2Cell> {
    let path = property_number(feature, "path")?;
    let row = property_number(feature, "row")?;
    let direction = match property(feature, "mode") {
        None => OrbitalDirection::Descending,
        Some(mode) => OrbitalDirection::from_code(mode.as_str()?)?,
    };

    let geometry = feature.geometry.clone()?;
    let footprint = match Geometry::<f64>::try_from(geometry.value).ok()? {
        Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
        Geometry::MultiPolygon(mp) => mp,
        _ => return None,
    };
    Wrs2Cell::new(path, row, direction, footprint)
}

fn property<'a>(feature: &'a Feature, key: &str) -> Option<&'a serde_json::Value> {
    feature
        .properties
        .as_ref()?
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

fn property_number(feature: &Feature, key: &str) -> Option<u16> {
    let value = property(feature, key)?;
    let number = value
        .as_f64()
        .or_else(|| value.as_str()?.trim().parse::<f64>().ok())?;
    if number >= 0.0 && number.fract() == 0.0 && number <= u16::MAX as f64 {
        Some(number as u16)
    } else {
        None
    }
}
