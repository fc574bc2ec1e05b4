use thiserror::Error;

/// Invalid area of interest. Always fatal for the invocation.
#[derive(Debug, Error)]
pub enum AoiError {
    #[error("expected 2 values (lat lon), 4 values (south north west east) or one boundary file, got {0} values")]
    Arity(usize),
    #[error("invalid number '{0}'")]
    Number(String),
    #[error("coordinate is not a finite number")]
    NonFinite,
    #[error("latitude {0} outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} outside [-180, 180]")]
    Longitude(f64),
    #[error("bounding box collapses to a line (south={south}, north={north}, west={west}, east={east})")]
    DegenerateBox {
        south: f64,
        north: f64,
        west: f64,
        east: f64,
    },
    #[error("boundary file {path}: {source}")]
    BoundaryRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("boundary file {path}: {message}")]
    Boundary { path: String, message: String },
}
