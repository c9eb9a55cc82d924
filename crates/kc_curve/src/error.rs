use crop_common::{CommonError, Doy};
use thiserror::Error;

use crate::types::Side;

#[derive(Error, Debug)]
pub enum KcError {
    #[error("No observations left after noise filtering")]
    EmptyInput,

    #[error("{side} segment has {len} points but the smoothing window needs {window}")]
    SegmentTooShort { side: Side, len: usize, window: usize },

    #[error("Series of {len} points is shorter than the smoothing window of {window}")]
    SeriesTooShort { len: usize, window: usize },

    #[error("Cannot fit {segments} segments to {points} points")]
    DegenerateFit { points: usize, segments: usize },

    #[error("Cannot level {count} breakpoints in adjacent pairs")]
    UnpairedBreakpoint { count: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Duplicate observation for day {0}")]
    DuplicateDoy(Doy),

    #[error("Non-finite value at day {0}")]
    NonFiniteValue(Doy),

    #[error("Points must be strictly ascending by day; day {0} is out of order")]
    Unordered(Doy),

    #[error("Curve has no value at day {0}")]
    MissingDoy(Doy),

    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, KcError>;
