use std::path::PathBuf;

use geo::{MultiPolygon, Point, Rect, Translate};

/// Raw AOI input as given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum AoiInput {
    Point {
        lat: f64,
        lon: f64,
    },
    BoundingBox {
        south: f64,
        north: f64,
        west: f64,
        east: f64,
    },
    BoundaryFile(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AoiShape {
    Point(Point<f64>),
    /// Union of one or more polygons.
    Area(MultiPolygon<f64>),
}

impl AoiShape {
    pub fn translated(&self, dx: f64) -> AoiShape {
        match self {
            AoiShape::Point(p) => AoiShape::Point(p.translate(dx, 0.0)),
            AoiShape::Area(mp) => AoiShape::Area(mp.translate(dx, 0.0)),
        }
    }
}

/// Canonical area of interest in WGS84 lon/lat degrees. Built once by [`super::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Aoi {
    pub(super) shape: AoiShape,
    pub(super) centroid: Point<f64>,
    pub(super) bounds: Rect<f64>,
}

impl Aoi {
    pub fn shape(&self) -> &AoiShape {
        &self.shape
    }

    pub fn centroid(&self) -> Point<f64> {
        self.centroid
    }

    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    pub fn is_point(&self) -> bool {
        matches!(self.shape, AoiShape::Point(_))
    }

    pub fn polygons(&self) -> Option<&MultiPolygon<f64>> {
        match &self.shape {
            AoiShape::Area(mp) => Some(mp),
            AoiShape::Point(_) => None,
        }
    }
}
