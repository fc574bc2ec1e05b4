//! Acquisition plans: the published Sentinel KML plans and the Landsat cycle schedule
//! combined with the WRS-2 grid, both turned into time-stamped [`PlanRecord`]s.

mod error;
mod landsat;
mod sentinel;
mod source;
mod types;
mod wrs2;

pub use error::PlanError;
pub use landsat::{CrossingTimes, CycleSchedule, LandsatPlan};
pub use sentinel::SentinelPlan;
pub use source::{PlanSource, PlanSpec};
pub use types::{Grouping, OrbitalDirection, PassMetadata, PlanRecord, PlanStats};
pub use wrs2::{Wrs2Cell, Wrs2Grid};
