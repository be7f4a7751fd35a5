use thiserror::Error;

/// Errors raised while constructing time values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeError {
    #[error("Rate must be a positive finite number, got {0}")]
    InvalidRate(f64),

    #[error("Time value must be finite, got {0}")]
    InvalidValue(f64),
}

/// Errors raised while loading or saving timeline documents
#[derive(Error, Debug)]
pub enum TimelineError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Time error: {0}")]
    Time(#[from] TimeError),
}
