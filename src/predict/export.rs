use std::fs;
use std::io;
use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde_json::json;

use super::types::{MatchedRecord, PassOutcome, Prediction};
use crate::plan::OrbitalDirection;

/// Selected footprints of all successful satellites, one feature per found pass, in
/// satellite then group order.
pub fn footprint_collection(prediction: &Prediction) -> FeatureCollection {
    let features = prediction
        .successes()
        .flat_map(|result| {
            result.groups.iter().filter_map(move |group| match &group.outcome {
                PassOutcome::Next(matched) => {
                    Some(footprint_feature(&result.satellite, group.direction, matched))
                }
                PassOutcome::Undetermined(_) => None,
            })
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn footprint_feature(satellite: &str, group: OrbitalDirection, matched: &MatchedRecord) -> Feature {
    let record = &matched.record;
    let mut properties = JsonObject::new();
    properties.insert("satellite".into(), json!(satellite));
    properties.insert("group".into(), json!(group));
    properties.insert("direction".into(), json!(record.direction));
    properties.insert("window_start".into(), json!(record.window_start.to_rfc3339()));
    properties.insert("window_end".into(), json!(record.window_end.to_rfc3339()));
    properties.insert("metadata".into(), json!(record.metadata));
    properties.insert("aoi_overlap_pct".into(), json!(matched.aoi_overlap_pct));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&record.footprint))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn write_geojson(prediction: &Prediction, path: &Path) -> io::Result<()> {
    let collection = footprint_collection(prediction);
    log::debug!(
        "writing {} footprints to {}",
        collection.features.len(),
        path.display()
    );
    fs::write(path, collection.to_string())
}
