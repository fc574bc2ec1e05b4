mod boundary;
mod error;
mod resolver;
mod types;

pub use boundary::read_boundary;
pub use error::AoiError;
pub use resolver::resolve;
pub use types::{Aoi, AoiInput, AoiShape};
