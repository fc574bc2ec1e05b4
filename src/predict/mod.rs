//! Matching plan records against the AOI and selecting the next pass per satellite.

mod engine;
mod error;
mod export;
mod matcher;
mod selector;
mod summary;
mod types;

pub use engine::{load_sources, predict, predict_one, LoadedSource, PredictOptions, SatelliteFilter};
pub use error::PredictError;
pub use export::{footprint_collection, write_geojson};
pub use matcher::{match_records, matches, overlap_pct};
pub use selector::{select, SelectionContext};
pub use summary::upcoming_line;
pub use types::{DirectionGroup, MatchedRecord, OverpassResult, PassOutcome, Prediction, Undetermined};
