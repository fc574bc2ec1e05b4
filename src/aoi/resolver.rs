use std::path::PathBuf;

use geo::{BoundingRect, Centroid, Coord, MultiPolygon, Point, Rect, Validation};

use super::boundary::read_boundary;
use super::error::AoiError;
use super::types::{Aoi, AoiInput, AoiShape};

impl AoiInput {
    /// Interpret command line tokens: one token is a boundary file, two are `lat lon`,
    /// four are `south north west east`.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, AoiError> {
        match args {
            [path] => {
                let path = path.as_ref().trim();
                if path.parse::<f64>().is_ok() {
                    return Err(AoiError::Arity(1));
                }
                Ok(AoiInput::BoundaryFile(PathBuf::from(path)))
            }
            [lat, lon] => Ok(AoiInput::Point {
                lat: parse_number(lat.as_ref())?,
                lon: parse_number(lon.as_ref())?,
            }),
            [south, north, west, east] => Ok(AoiInput::BoundingBox {
                south: parse_number(south.as_ref())?,
                north: parse_number(north.as_ref())?,
                west: parse_number(west.as_ref())?,
                east: parse_number(east.as_ref())?,
            }),
            _ => Err(AoiError::Arity(args.len())),
        }
    }
}

/// Turn any AOI input into the canonical [`Aoi`].
pub fn resolve(input: &AoiInput) -> Result<Aoi, AoiError> {
    match input {
        AoiInput::Point { lat, lon } => point_aoi(*lat, *lon),
        AoiInput::BoundingBox {
            south,
            north,
            west,
            east,
        } => box_aoi(*south, *north, *west, *east),
        AoiInput::BoundaryFile(path) => {
            let polygons = read_boundary(path)?;
            area_aoi(polygons, &path.display().to_string())
        }
    }
}

fn point_aoi(lat: f64, lon: f64) -> Result<Aoi, AoiError> {
    check_lat(lat)?;
    check_lon(lon)?;

    let point = Point::new(lon, lat);
    Ok(Aoi {
        shape: AoiShape::Point(point),
        centroid: point,
        bounds: Rect::new(point.0, point.0),
    })
}

fn box_aoi(south: f64, north: f64, west: f64, east: f64) -> Result<Aoi, AoiError> {
    for lat in [south, north] {
        check_lat(lat)?;
    }
    for lon in [west, east] {
        check_lon(lon)?;
    }

    let (south, north) = ordered("latitude", south, north);
    let (west, east) = ordered("longitude", west, east);

    if south == north && west == east {
        return point_aoi(south, west);
    }
    if south == north || west == east {
        return Err(AoiError::DegenerateBox {
            south,
            north,
            west,
            east,
        });
    }

    let rect = Rect::new(Coord { x: west, y: south }, Coord { x: east, y: north });
    Ok(Aoi {
        shape: AoiShape::Area(MultiPolygon::new(vec![rect.to_polygon()])),
        centroid: Point::new((west + east) / 2.0, (south + north) / 2.0),
        bounds: rect,
    })
}

fn area_aoi(polygons: MultiPolygon<f64>, origin: &str) -> Result<Aoi, AoiError> {
    let invalid = |message: String| AoiError::Boundary {
        path: origin.to_string(),
        message,
    };

    if polygons.0.is_empty() {
        return Err(invalid("no polygons".into()));
    }

    for (i, polygon) in polygons.0.iter().enumerate() {
        for c in polygon.exterior().0.iter().chain(polygon.interiors().iter().flat_map(|r| r.0.iter())) {
            check_lat(c.y)?;
            check_lon(c.x)?;
        }
        if !polygon.is_valid() {
            return Err(invalid(format!(
                "polygon {} is self-intersecting or otherwise not simple",
                i + 1
            )));
        }
    }

    let bounds = polygons
        .bounding_rect()
        .ok_or_else(|| invalid("empty geometry".into()))?;
    let centroid = polygons
        .centroid()
        .ok_or_else(|| invalid("polygons have no area".into()))?;

    Ok(Aoi {
        shape: AoiShape::Area(polygons),
        centroid,
        bounds,
    })
}

fn ordered(axis: &str, min: f64, max: f64) -> (f64, f64) {
    if min > max {
        log::warn!(
            "minimum {} {:.6} is greater than maximum {:.6}; swapping values",
            axis,
            min,
            max
        );
        (max, min)
    } else {
        (min, max)
    }
}

fn parse_number(token: &str) -> Result<f64, AoiError> {
    let value = token
        .trim()
        .parse::<f64>()
        .map_err(|_| AoiError::Number(token.to_string()))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AoiError::NonFinite)
    }
}

fn check_lat(lat: f64) -> Result<(), AoiError> {
    if !lat.is_finite() {
        return Err(AoiError::NonFinite);
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(AoiError::Latitude(lat));
    }
    Ok(())
}

fn check_lon(lon: f64) -> Result<(), AoiError> {
    if !lon.is_finite() {
        return Err(AoiError::NonFinite);
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(AoiError::Longitude(lon));
    }
    Ok(())
}
