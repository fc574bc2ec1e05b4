//! Next overpass prediction for Sentinel-1/2 and Landsat-8/9 over an area of interest,
//! from published acquisition plans.

pub mod aoi;
pub mod config;
pub mod geometry;
pub mod kml;
pub mod plan;
pub mod predict;
pub mod reference;

pub use aoi::{Aoi, AoiError, AoiInput};
pub use config::Config;
pub use plan::{OrbitalDirection, PlanError, PlanRecord, PlanSource, PlanSpec};
pub use predict::{OverpassResult, PassOutcome, Prediction, PredictError};
