use std::fs;
use std::path::Path;

use geo::{Geometry, MultiPolygon, Polygon};
use geojson::GeoJson;

use super::error::AoiError;
use crate::kml::read_placemarks;

/// Read all polygons of a boundary file. `.kml` files are read as KML, `.geojson` and `.json`
/// as GeoJSON. Every polygon of every placemark or feature is part of the result.
pub fn read_boundary(path: &Path) -> Result<MultiPolygon<f64>, AoiError> {
    let name = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| AoiError::BoundaryRead {
        path: name.clone(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let polygons = match extension.as_str() {
        "kml" => kml_polygons(&content),
        "geojson" | "json" => geojson_polygons(&content),
        other => Err(format!("unsupported boundary file type '{}'", other)),
    }
    .map_err(|message| AoiError::Boundary {
        path: name.clone(),
        message,
    })?;

    if polygons.is_empty() {
        return Err(AoiError::Boundary {
            path: name,
            message: "no polygons found".into(),
        });
    }

    log::debug!("read {} boundary polygon(s) from {}", polygons.len(), name);
    Ok(MultiPolygon::new(polygons))
}

fn kml_polygons(content: &str) -> Result<Vec<Polygon<f64>>, String> {
    let placemarks = read_placemarks(content).map_err(|e| e.to_string())?;

    let mut polygons = Vec::new();
    for placemark in placemarks {
        if let Some(error) = placemark.geometry_error {
            let label = placemark.name.unwrap_or_else(|| "unnamed placemark".into());
            return Err(format!("{}: {}", label, error));
        }
        polygons.extend(placemark.polygons);
    }
    Ok(polygons)
}

fn geojson_polygons(content: &str) -> Result<Vec<Polygon<f64>>, String> {
    let geojson: GeoJson = content.parse().map_err(|e: geojson::Error| e.to_string())?;

    let geometries: Vec<geojson::Geometry> = match geojson {
        GeoJson::Geometry(g) => vec![g],
        GeoJson::Feature(f) => f.geometry.into_iter().collect(),
        GeoJson::FeatureCollection(fc) => fc.features.into_iter().filter_map(|f| f.geometry).collect(),
    };

    let mut polygons = Vec::new();
    for geometry in geometries {
        let geometry = Geometry::<f64>::try_from(geometry.value).map_err(|e| e.to_string())?;
        collect_polygons(geometry, &mut polygons)?;
    }
    Ok(polygons)
}

fn collect_polygons(geometry: Geometry<f64>, out: &mut Vec<Polygon<f64>>) -> Result<(), String> {
    match geometry {
        Geometry::Polygon(p) => out.push(p),
        Geometry::MultiPolygon(mp) => out.extend(mp.0),
        Geometry::Rect(r) => out.push(r.to_polygon()),
        Geometry::GeometryCollection(gc) => {
            for g in gc.0 {
                collect_polygons(g, out)?;
            }
        }
        _ => return Err("only Polygon and MultiPolygon geometries describe an area".into()),
    }
    Ok(())
}
