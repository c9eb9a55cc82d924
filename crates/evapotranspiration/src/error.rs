use crop_common::{CommonError, Doy};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtError {
    #[error("Invalid weather for day {doy}: {reason}")]
    InvalidWeather { doy: Doy, reason: String },

    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EtError>;
