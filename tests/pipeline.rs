use std::fs;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use next_pass::aoi::{resolve, Aoi, AoiInput};
use next_pass::plan::{OrbitalDirection, PassMetadata};
use next_pass::predict::{
    footprint_collection, load_sources, predict, predict_one, PassOutcome, PredictOptions,
    SatelliteFilter, Undetermined,
};
use next_pass::{Config, PredictError, Prediction};

fn placemark(name: &str, start: &str, stop: &str, orbit: u32, ring: &str) -> String {
    format!(
        r#"<Placemark><name>{}</name>
          <ExtendedData>
            <Data name="ObservationTimeStart"><value>{}</value></Data>
            <Data name="ObservationTimeStop"><value>{}</value></Data>
            <Data name="OrbitRelative"><value>{}</value></Data>
            <Data name="Mode"><value>IW</value></Data>
          </ExtendedData>
          <Polygon><outerBoundaryIs><LinearRing><coordinates>{}</coordinates></LinearRing></outerBoundaryIs></Polygon>
        </Placemark>"#,
        name, start, stop, orbit, ring
    )
}

const LOS_ANGELES: &str =
    "-118.6,34.0 -117.9,34.0 -117.9,34.5 -118.6,34.5 -118.6,34.0";
const EUROPE: &str = "10.0,45.0 11.0,45.0 11.0,46.0 10.0,46.0 10.0,45.0";

fn sentinel_kml() -> String {
    let placemarks = [
        placemark("past", "2024-12-30T18:00:00", "2024-12-30T18:02:00", 71, LOS_ANGELES),
        placemark("elsewhere", "2025-01-02T10:00:00", "2025-01-02T10:02:00", 15, EUROPE),
        placemark("later", "2025-01-15T18:00:00", "2025-01-15T18:02:00", 71, LOS_ANGELES),
        placemark("next", "2025-01-03T18:00:00", "2025-01-03T18:02:00", 71, LOS_ANGELES),
    ];
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2"><Document>{}</Document></kml>"#,
        placemarks.join("\n")
    )
}

const CYCLES: &str = r#"{
  "landsat_8": {
    "01/02/2025": {"path": "41,42"},
    "01/10/2025": {"path": "41"}
  },
  "landsat_9": {
    "01/06/2025": {"path": "41"}
  }
}"#;

const WRS2: &str = r#"{"type":"FeatureCollection","features":[
  {"type":"Feature","properties":{"PATH":41,"ROW":36,"MODE":"D"},
   "geometry":{"type":"Polygon","coordinates":[[[-119.5,34.0],[-117.5,34.0],[-117.5,35.5],[-119.5,35.5],[-119.5,34.0]]]}},
  {"type":"Feature","properties":{"PATH":41,"ROW":188,"MODE":"A"},
   "geometry":{"type":"Polygon","coordinates":[[[-119.5,34.0],[-117.5,34.0],[-117.5,35.5],[-119.5,35.5],[-119.5,34.0]]]}},
  {"type":"Feature","properties":{"PATH":42,"ROW":36,"MODE":"D"},
   "geometry":{"type":"Polygon","coordinates":[[[-121.0,34.0],[-119.0,34.0],[-119.0,35.5],[-121.0,35.5],[-121.0,34.0]]]}}
]}"#;

const CONFIG: &str = r#"
max_passes: 3
plans:
  - family: sentinel
    satellite: Sentinel-1A
    files: [s1a.kml]
  - family: sentinel
    satellite: Sentinel-2A
    files: [missing/s2a.kml]
    repeat_cycle: 10days
  - family: landsat
    schedule: cycles.json
    wrs2: wrs2.geojson
"#;

fn fixtures() -> (TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("s1a.kml"), sentinel_kml()).unwrap();
    fs::write(dir.path().join("cycles.json"), CYCLES).unwrap();
    fs::write(dir.path().join("wrs2.geojson"), WRS2).unwrap();
    let config_path = dir.path().join("next_pass.yaml");
    fs::write(&config_path, CONFIG).unwrap();
    let config = Config::from_file(&config_path).unwrap();
    (dir, config)
}

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

fn run(config: &Config, aoi: &Aoi, reference: DateTime<Utc>) -> Prediction {
    let sources = load_sources(&config.plans);
    let options = PredictOptions {
        max_passes: config.max_passes,
        filter: SatelliteFilter::All,
    };
    predict(&sources, aoi, reference, &options)
}

fn la_box() -> Aoi {
    resolve(&AoiInput::BoundingBox {
        south: 34.15,
        north: 34.25,
        west: -118.20,
        east: -118.15,
    })
    .unwrap()
}

#[test]
fn sentinel_bbox_selects_earliest_covering_pass() {
    let (_dir, config) = fixtures();
    let prediction = run(&config, &la_box(), utc(2025, 1, 1, 0, 0, 0));

    let result = prediction.get("Sentinel-1A").unwrap().as_ref().unwrap();
    let next = result.next_pass(OrbitalDirection::Unspecified).unwrap();
    assert_eq!(next.record.window_start, utc(2025, 1, 3, 18, 0, 0));
    assert_eq!(next.record.window_end, utc(2025, 1, 3, 18, 2, 0));
    assert_eq!(next.aoi_overlap_pct, 100.0);
    assert!(matches!(
        next.record.metadata,
        PassMetadata::Sentinel {
            relative_orbit: Some(71),
            ..
        }
    ));

    assert_eq!(result.summary.len(), 1);
    assert!(result.summary[0].contains("2025-01-03 18:00:00 UTC"));
    assert!(result.summary[0].contains("relative orbit 71"));
    assert_eq!(result.footprints.len(), result.summary.len());
    assert_eq!(result.groups[0].upcoming.len(), 2);
}

#[test]
fn landsat_reports_each_direction() {
    let (_dir, config) = fixtures();
    let point = resolve(&AoiInput::Point {
        lat: 34.53,
        lon: -118.58,
    })
    .unwrap();
    let prediction = run(&config, &point, utc(2025, 1, 1, 0, 0, 0));

    let landsat8 = prediction.get("Landsat-8").unwrap().as_ref().unwrap();
    assert_eq!(landsat8.groups.len(), 2);
    assert_eq!(landsat8.groups[0].direction, OrbitalDirection::Ascending);
    assert_eq!(landsat8.groups[1].direction, OrbitalDirection::Descending);

    let descending = landsat8.next_pass(OrbitalDirection::Descending).unwrap();
    assert_eq!(descending.record.window_start, utc(2025, 1, 2, 17, 55, 26));
    assert_eq!(
        descending.record.metadata,
        PassMetadata::Landsat { path: 41, row: 36 }
    );
    let ascending = landsat8.next_pass(OrbitalDirection::Ascending).unwrap();
    assert_eq!(ascending.record.window_start, utc(2025, 1, 2, 6, 6, 36));

    let landsat9 = prediction.get("Landsat-9").unwrap().as_ref().unwrap();
    let descending = landsat9.next_pass(OrbitalDirection::Descending).unwrap();
    assert_eq!(descending.record.window_start.date_naive(), utc(2025, 1, 6, 0, 0, 0).date_naive());
}

#[test]
fn landsat_past_horizon_is_undetermined() {
    let (_dir, config) = fixtures();
    let point = resolve(&AoiInput::Point {
        lat: 34.53,
        lon: -118.58,
    })
    .unwrap();
    let prediction = run(&config, &point, utc(2025, 1, 11, 0, 0, 0));

    let landsat8 = prediction.get("Landsat-8").unwrap().as_ref().unwrap();
    assert_eq!(landsat8.horizon, Some(utc(2025, 1, 11, 0, 0, 0)));
    for group in &landsat8.groups {
        assert_eq!(
            group.outcome,
            PassOutcome::Undetermined(Undetermined::HorizonExceeded {
                horizon: Some(utc(2025, 1, 11, 0, 0, 0))
            })
        );
    }
    assert!(landsat8.is_undetermined());
    assert_eq!(landsat8.summary.len(), 2);
    assert!(landsat8
        .summary
        .iter()
        .all(|line| line.contains("no qualifying pass found within horizon")));
    assert!(landsat8.footprints.iter().all(Option::is_none));
}

#[test]
fn boundary_file_is_a_union_of_polygons() {
    let (dir, config) = fixtures();
    let boundary = dir.path().join("area.geojson");
    fs::write(
        &boundary,
        r#"{"type":"FeatureCollection","features":[
          {"type":"Feature","properties":{"name":"atlantic"},"geometry":{"type":"Polygon",
            "coordinates":[[[-30,0],[-29,0],[-29,1],[-30,1],[-30,0]]]}},
          {"type":"Feature","properties":{"name":"pasadena"},"geometry":{"type":"Polygon",
            "coordinates":[[[-118.3,34.1],[-118.1,34.1],[-118.1,34.3],[-118.3,34.3],[-118.3,34.1]]]}}
        ]}"#,
    )
    .unwrap();
    let aoi = resolve(&AoiInput::from_args(&[boundary.to_str().unwrap()]).unwrap()).unwrap();

    let prediction = run(&config, &aoi, utc(2025, 1, 1, 0, 0, 0));
    let result = prediction.get("Sentinel-1A").unwrap().as_ref().unwrap();
    let next = result.next_pass(OrbitalDirection::Unspecified).unwrap();
    assert_eq!(next.record.window_start, utc(2025, 1, 3, 18, 0, 0));
    assert!(next.aoi_overlap_pct > 3.0 && next.aoi_overlap_pct < 5.0);
}

#[test]
fn failing_source_does_not_affect_others() {
    let (_dir, config) = fixtures();
    let prediction = run(&config, &la_box(), utc(2025, 1, 1, 0, 0, 0));

    match prediction.get("Sentinel-2A").unwrap() {
        Err(PredictError::Plan {
            satellite,
            reference,
            ..
        }) => {
            assert_eq!(satellite, "Sentinel-2A");
            assert_eq!(*reference, utc(2025, 1, 1, 0, 0, 0));
        }
        other => panic!("expected a plan error, got {:?}", other),
    }
    assert!(prediction.get("Sentinel-1A").unwrap().is_ok());
    assert!(prediction.get("Landsat-8").unwrap().is_ok());
    assert_eq!(prediction.failures().count(), 1);
}

#[test]
fn filter_limits_satellites() {
    let (_dir, config) = fixtures();
    let sources = load_sources(&config.plans);
    let options = PredictOptions {
        max_passes: 1,
        filter: SatelliteFilter::Landsat,
    };
    let prediction = predict(&sources, &la_box(), utc(2025, 1, 1, 0, 0, 0), &options);
    let satellites: Vec<&str> = prediction.results.keys().map(String::as_str).collect();
    assert_eq!(satellites, vec!["Landsat-8", "Landsat-9"]);

    let unknown = predict_one(&sources, "Sentinel-3A", &la_box(), utc(2025, 1, 1, 0, 0, 0), 1);
    assert!(matches!(unknown, Err(PredictError::UnknownSatellite { .. })));
}

#[test]
fn repeated_runs_are_identical() {
    let (_dir, config) = fixtures();
    let reference = utc(2025, 1, 1, 0, 0, 0);
    let first = run(&config, &la_box(), reference);
    let second = run(&config, &la_box(), reference);

    for (satellite, result) in &first.results {
        if let (Ok(a), Some(Ok(b))) = (result, second.get(satellite)) {
            assert_eq!(a, b);
        }
    }
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(
        footprint_collection(&first).to_string(),
        footprint_collection(&second).to_string()
    );
}

#[test]
fn geojson_export_lists_found_passes() {
    let (dir, config) = fixtures();
    let prediction = run(&config, &la_box(), utc(2025, 1, 1, 0, 0, 0));
    let path = dir.path().join("footprints.geojson");
    next_pass::predict::write_geojson(&prediction, Path::new(&path)).unwrap();

    let collection = match fs::read_to_string(&path).unwrap().parse::<geojson::GeoJson>() {
        Ok(geojson::GeoJson::FeatureCollection(fc)) => fc,
        other => panic!("expected a feature collection, got {:?}", other),
    };
    let satellites: Vec<String> = collection
        .features
        .iter()
        .map(|f| f.property("satellite").unwrap().as_str().unwrap().to_string())
        .collect();
    assert!(satellites.contains(&"Sentinel-1A".to_string()));
    assert!(satellites.contains(&"Landsat-8".to_string()));
    assert!(!satellites.contains(&"Sentinel-2A".to_string()));
}
