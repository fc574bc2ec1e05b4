use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use geo::MultiPolygon;
use lazy_static::lazy_static;
use regex::Regex;

use super::error::PlanError;
use super::types::{OrbitalDirection, PassMetadata, PlanRecord, PlanStats};
use crate::kml::{read_placemarks, Placemark};

const START_KEYS: &[&str] = &[
    "observationtimestart",
    "begin",
    "start",
    "starttime",
    "acquisitionstart",
];
const STOP_KEYS: &[&str] = &[
    "observationtimestop",
    "end",
    "stop",
    "stoptime",
    "acquisitionstop",
];
const RELATIVE_ORBIT_KEYS: &[&str] = &["orbitrelative", "relativeorbit", "track"];
const ABSOLUTE_ORBIT_KEYS: &[&str] = &["orbitabsolute", "absoluteorbit", "orbit"];
const MODE_KEYS: &[&str] = &["mode", "instrumentmode"];
const DIRECTION_KEYS: &[&str] = &["pass", "passdirection", "orbitdirection"];

const NAIVE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

lazy_static! {
    static ref TABLE_ROW: Regex = Regex::new(
        r"(?is)<t[dh][^>]*>\s*([^<]+?)\s*</t[dh]>\s*<t[dh][^>]*>\s*([^<]*?)\s*</t[dh]>"
    )
    .unwrap();
    static ref TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref KEY_VALUE: Regex =
        Regex::new(r"(?m)^\s*([A-Za-z][A-Za-z0-9 _\-]*?)\s*[:=]\s*(\S.*?)\s*$").unwrap();
}

/// Acquisition plan of one Sentinel satellite, merged from one or more KML documents.
#[derive(Debug, Clone)]
pub struct SentinelPlan {
    satellite: String,
    records: Vec<PlanRecord>,
    skipped: usize,
    repeat_cycle: Duration,
}

struct Document {
    records: Vec<PlanRecord>,
    skipped: usize,
}

impl SentinelPlan {
    /// Load every plan file of a satellite. A file that cannot be used is logged and left
    /// out as long as at least one other file yields records.
    pub fn load(
        satellite: &str,
        files: &[PathBuf],
        repeat_cycle: Duration,
    ) -> Result<Self, PlanError> {
        let mut documents = Vec::new();
        let mut first_error = None;

        for path in files {
            match read_document(satellite, path) {
                Ok(document) => documents.push(document),
                Err(e) => {
                    log::warn!("Failed to parse plan {}: {}", path.display(), e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if documents.is_empty() {
            return Err(first_error.unwrap_or_else(|| PlanError::NoDocuments(satellite.into())));
        }
        Ok(Self::merge(satellite, documents, repeat_cycle))
    }

    /// Parse a single in-memory KML plan. `origin` names the document in errors.
    pub fn parse_str(
        satellite: &str,
        origin: &str,
        xml: &str,
        repeat_cycle: Duration,
    ) -> Result<Self, PlanError> {
        let document = parse_document(satellite, origin, xml)?;
        Ok(Self::merge(satellite, vec![document], repeat_cycle))
    }

    fn merge(satellite: &str, documents: Vec<Document>, repeat_cycle: Duration) -> Self {
        let skipped = documents.iter().map(|d| d.skipped).sum();
        let mut all: Vec<PlanRecord> = documents.into_iter().flat_map(|d| d.records).collect();
        all.sort_by_key(|r| r.window_start);

        // Overlapping plan releases repeat the same acquisitions.
        let mut records: Vec<PlanRecord> = Vec::with_capacity(all.len());
        for record in all {
            let duplicate = records
                .iter()
                .rev()
                .take_while(|kept| kept.window_start == record.window_start)
                .any(|kept| same_acquisition(kept, &record));
            if !duplicate {
                records.push(record);
            }
        }

        log::debug!(
            "{}: {} plan records, {} placemarks skipped",
            satellite,
            records.len(),
            skipped
        );

        SentinelPlan {
            satellite: satellite.to_string(),
            records,
            skipped,
            repeat_cycle,
        }
    }

    pub fn satellite(&self) -> &str {
        &self.satellite
    }

    /// Records in ascending start order.
    pub fn records(&self) -> &[PlanRecord] {
        &self.records
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn repeat_cycle(&self) -> Duration {
        self.repeat_cycle
    }

    /// Latest window end of the plan.
    pub fn horizon(&self) -> Option<DateTime<Utc>> {
        self.records.iter().map(|r| r.window_end).max()
    }

    pub fn stats(&self) -> PlanStats {
        PlanStats {
            entries: self.records.len(),
            skipped: self.skipped,
            horizon: self.horizon(),
        }
    }
}

fn same_acquisition(a: &PlanRecord, b: &PlanRecord) -> bool {
    let relative_orbit = |r: &PlanRecord| match &r.metadata {
        PassMetadata::Sentinel { relative_orbit, .. } => *relative_orbit,
        PassMetadata::Landsat { .. } => None,
    };
    a.window_start == b.window_start
        && a.window_end == b.window_end
        && relative_orbit(a) == relative_orbit(b)
        && a.footprint == b.footprint
}

fn read_document(satellite: &str, path: &Path) -> Result<Document, PlanError> {
    let origin = path.display().to_string();
    let xml = fs::read_to_string(path).map_err(|source| PlanError::Read {
        path: origin.clone(),
        source,
    })?;
    parse_document(satellite, &origin, &xml)
}

fn parse_document(satellite: &str, origin: &str, xml: &str) -> Result<Document, PlanError> {
    let placemarks = read_placemarks(xml).map_err(|source| PlanError::Kml {
        path: origin.to_string(),
        source,
    })?;

    let mut records = Vec::new();
    let mut skipped = 0;
    for (i, placemark) in placemarks.iter().enumerate() {
        match record_from_placemark(satellite, placemark) {
            Ok(record) => records.push(record),
            Err(reason) => {
                skipped += 1;
                log::debug!(
                    "{}: skipping placemark {}: {}",
                    origin,
                    placemark
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("#{}", i + 1)),
                    reason
                );
            }
        }
    }

    if records.is_empty() {
        return Err(PlanError::NoRecords {
            path: origin.to_string(),
            skipped,
        });
    }
    if skipped > 0 {
        log::warn!(
            "{}: skipped {} of {} placemarks",
            origin,
            skipped,
            placemarks.len()
        );
    }
    Ok(Document { records, skipped })
}

fn record_from_placemark(satellite: &str, placemark: &Placemark) -> Result<PlanRecord, String> {
    if let Some(error) = &placemark.geometry_error {
        return Err(error.clone());
    }
    if placemark.polygons.is_empty() {
        return Err("no footprint polygon".into());
    }

    let fields = Fields::from_placemark(placemark);

    let start = fields
        .get(START_KEYS)
        .ok_or("missing observation start")?;
    let window_start = parse_instant(start).ok_or_else(|| format!("bad start time '{}'", start))?;
    let stop = fields.get(STOP_KEYS).ok_or("missing observation stop")?;
    let window_end = parse_instant(stop).ok_or_else(|| format!("bad stop time '{}'", stop))?;
    if window_start > window_end {
        return Err(format!("start {} is after stop {}", start, stop));
    }

    let direction = fields
        .get(DIRECTION_KEYS)
        .and_then(OrbitalDirection::from_code)
        .unwrap_or(OrbitalDirection::Unspecified);

    Ok(PlanRecord {
        satellite: satellite.to_string(),
        direction,
        footprint: MultiPolygon::new(placemark.polygons.clone()),
        window_start,
        window_end,
        metadata: PassMetadata::Sentinel {
            relative_orbit: fields.get(RELATIVE_ORBIT_KEYS).and_then(parse_orbit),
            absolute_orbit: fields.get(ABSOLUTE_ORBIT_KEYS).and_then(parse_orbit),
            mode: fields.get(MODE_KEYS).map(str::to_string),
        },
    })
}

/// Attribute lookup over a placemark, keyed by lowercase alphanumerics only. Earlier sources
/// win: extended data, then the time span, then the description.
struct Fields(BTreeMap<String, String>);

impl Fields {
    fn from_placemark(placemark: &Placemark) -> Self {
        let mut fields = Fields(BTreeMap::new());
        for (key, value) in &placemark.data {
            fields.insert(key, value);
        }
        if let Some(begin) = &placemark.time_begin {
            fields.insert("begin", begin);
        }
        if let Some(end) = &placemark.time_end {
            fields.insert("end", end);
        }
        if let Some(description) = &placemark.description {
            for row in TABLE_ROW.captures_iter(description) {
                fields.insert(&row[1], &row[2]);
            }
            let text = TAG.replace_all(description, "\n");
            for line in KEY_VALUE.captures_iter(&text) {
                fields.insert(&line[1], &line[2]);
            }
        }
        fields
    }

    fn insert(&mut self, key: &str, value: &str) {
        let key = normalize_key(key);
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            return;
        }
        self.0.entry(key).or_insert_with(|| value.to_string());
    }

    fn get(&self, aliases: &[&str]) -> Option<&str> {
        aliases
            .iter()
            .find_map(|alias| self.0.get(*alias).map(String::as_str))
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// RFC 3339, or an ISO-like timestamp without offset taken as UTC.
fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }
    let value = value.trim_end_matches('Z');
    NAIVE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|t| t.and_utc())
}

fn parse_orbit(value: &str) -> Option<u32> {
    let value = value.trim();
    value.parse::<u32>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u32::MAX as f64)
            .map(|v| v as u32)
    })
}
