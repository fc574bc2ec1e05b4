use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::plan::PlanError;

/// Failure of one satellite's prediction. Other satellites are unaffected.
#[derive(Debug, Clone, Error)]
pub enum PredictError {
    #[error("plan for {satellite} unavailable: {source}")]
    Plan {
        satellite: String,
        reference: DateTime<Utc>,
        #[source]
        source: Arc<PlanError>,
    },
    #[error("no plan source configured for {satellite}")]
    UnknownSatellite {
        satellite: String,
        reference: DateTime<Utc>,
    },
}

impl PredictError {
    pub fn satellite(&self) -> &str {
        match self {
            PredictError::Plan { satellite, .. } | PredictError::UnknownSatellite { satellite, .. } => {
                satellite
            }
        }
    }

    pub fn reference(&self) -> DateTime<Utc> {
        match self {
            PredictError::Plan { reference, .. } | PredictError::UnknownSatellite { reference, .. } => {
                *reference
            }
        }
    }
}
