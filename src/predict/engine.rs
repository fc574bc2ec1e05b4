use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use rayon::prelude::*;

use super::error::PredictError;
use super::matcher::match_records;
use super::selector::{select, SelectionContext};
use super::types::{OverpassResult, Prediction};
use crate::aoi::Aoi;
use crate::plan::{PlanError, PlanSource, PlanSpec};

/// Which satellites a run reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SatelliteFilter {
    #[value(name = "sentinel-1")]
    Sentinel1,
    #[value(name = "sentinel-2")]
    Sentinel2,
    Landsat,
    #[default]
    All,
}

impl SatelliteFilter {
    pub fn accepts(&self, satellite: &str) -> bool {
        let name: String = satellite
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match self {
            SatelliteFilter::Sentinel1 => name.starts_with("sentinel1"),
            SatelliteFilter::Sentinel2 => name.starts_with("sentinel2"),
            SatelliteFilter::Landsat => name.starts_with("landsat"),
            SatelliteFilter::All => true,
        }
    }
}

/// A configured source after loading. Its satellites are known from the configuration even
/// when the documents failed to load, so the failure can be reported per satellite.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub satellites: Vec<String>,
    pub plan: Result<PlanSource, Arc<PlanError>>,
}

/// Load all configured sources in parallel.
pub fn load_sources(specs: &[PlanSpec]) -> Vec<LoadedSource> {
    specs
        .par_iter()
        .map(|spec| LoadedSource {
            satellites: spec.satellites(),
            plan: spec.load().map_err(Arc::new),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictOptions {
    pub max_passes: usize,
    pub filter: SatelliteFilter,
}

impl Default for PredictOptions {
    fn default() -> Self {
        PredictOptions {
            max_passes: 5,
            filter: SatelliteFilter::All,
        }
    }
}

/// Predict the next passes of every accepted satellite. Satellites run independently: a
/// failing plan only fails its own satellites.
pub fn predict(
    sources: &[LoadedSource],
    aoi: &Aoi,
    reference: DateTime<Utc>,
    options: &PredictOptions,
) -> Prediction {
    let mut jobs: Vec<(&LoadedSource, &str)> = Vec::new();
    for source in sources {
        for satellite in &source.satellites {
            if !options.filter.accepts(satellite) {
                continue;
            }
            if jobs.iter().any(|(_, s)| *s == satellite.as_str()) {
                log::warn!("{} is configured twice; using the first source", satellite);
                continue;
            }
            jobs.push((source, satellite.as_str()));
        }
    }

    let results: BTreeMap<String, Result<OverpassResult, PredictError>> = jobs
        .par_iter()
        .map(|(source, satellite)| {
            let result = predict_satellite(source, satellite, aoi, reference, options.max_passes);
            (satellite.to_string(), result)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect();

    Prediction { reference, results }
}

/// Predict a single satellite by name.
pub fn predict_one(
    sources: &[LoadedSource],
    satellite: &str,
    aoi: &Aoi,
    reference: DateTime<Utc>,
    max_passes: usize,
) -> Result<OverpassResult, PredictError> {
    let source = sources
        .iter()
        .find(|s| s.satellites.iter().any(|name| name == satellite))
        .ok_or_else(|| PredictError::UnknownSatellite {
            satellite: satellite.to_string(),
            reference,
        })?;
    predict_satellite(source, satellite, aoi, reference, max_passes)
}

fn predict_satellite(
    source: &LoadedSource,
    satellite: &str,
    aoi: &Aoi,
    reference: DateTime<Utc>,
    max_passes: usize,
) -> Result<OverpassResult, PredictError> {
    let plan = source.plan.as_ref().map_err(|e| PredictError::Plan {
        satellite: satellite.to_string(),
        reference,
        source: Arc::clone(e),
    })?;

    let matched = match_records(plan.records(satellite, aoi, reference), aoi, reference);
    log::debug!("{}: {} matching plan records", satellite, matched.len());

    let ctx = SelectionContext {
        satellite,
        grouping: plan.grouping(),
        reference,
        horizon: plan.horizon(satellite),
        repeat_cycle: plan.repeat_cycle(),
        max_passes,
    };
    Ok(select(&ctx, matched))
}
