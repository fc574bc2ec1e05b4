use thiserror::Error;

use crate::kml::KmlError;

/// A plan document that cannot be used at all. Individual bad entries are skipped and
/// counted instead.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("plan document {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("plan document {path}: {source}")]
    Kml {
        path: String,
        #[source]
        source: KmlError,
    },
    #[error("plan document {path}: JSON error: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("plan document {path}: GeoJSON error: {source}")]
    GeoJson {
        path: String,
        #[source]
        source: geojson::Error,
    },
    #[error("plan document {path}: {message}")]
    Structure { path: String, message: String },
    #[error("plan document {path}: no usable records ({skipped} skipped)")]
    NoRecords { path: String, skipped: usize },
    #[error("no plan documents configured for {0}")]
    NoDocuments(String),
}
