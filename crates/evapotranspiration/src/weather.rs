use std::{fs, io::Read, path::Path};

use crop_common::{utils, Doy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EtError, Result};

/// One day of station weather, as found in the weather tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DailyWeather {
    #[serde(default)]
    pub date: Option<String>,
    pub doy: Doy,
    /// Latitude in decimal degrees, north positive
    pub lat: f64,
    /// Station altitude (m)
    #[serde(rename = "z")]
    pub altitude: f64,
    #[serde(rename = "Tmin")]
    pub t_min: f64,
    #[serde(rename = "Tmax")]
    pub t_max: f64,
    #[serde(rename = "Tmean")]
    pub t_mean: f64,
    #[serde(rename = "RHmin")]
    pub rh_min: f64,
    #[serde(rename = "RHmax")]
    pub rh_max: f64,
    /// Wind speed at 2 m (m/s)
    #[serde(rename = "uz")]
    pub wind_speed: f64,
    /// Actual sunshine duration (hours)
    #[serde(rename = "n")]
    pub sunshine_hours: f64,
    /// Air pressure (kPa)
    pub pressure: f64,
}

impl DailyWeather {
    pub fn validate(&self) -> Result<()> {
        utils::check_doy(self.doy as i64)?;
        let invalid = |reason: &str| EtError::InvalidWeather {
            doy: self.doy,
            reason: reason.to_string(),
        };
        let fields = [
            self.lat, self.altitude, self.t_min, self.t_max, self.t_mean,
            self.rh_min, self.rh_max, self.wind_speed, self.sunshine_hours, self.pressure,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(invalid("non-finite value"));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(invalid("latitude outside -90..=90"));
        }
        if self.t_min > self.t_max {
            return Err(invalid("Tmin above Tmax"));
        }
        if !(0.0..=100.0).contains(&self.rh_min) || !(0.0..=100.0).contains(&self.rh_max) {
            return Err(invalid("relative humidity outside 0..=100"));
        }
        if self.wind_speed < 0.0 || self.sunshine_hours < 0.0 {
            return Err(invalid("negative wind speed or sunshine"));
        }
        if self.pressure <= 0.0 {
            return Err(invalid("pressure must be positive"));
        }
        Ok(())
    }
}

pub fn read_weather_csv<P: AsRef<Path>>(path: P) -> Result<Vec<DailyWeather>> {
    let file = fs::File::open(path.as_ref())?;
    read_weather(file)
}

/// Read and validate weather rows; extra columns are ignored
pub fn read_weather<R: Read>(reader: R) -> Result<Vec<DailyWeather>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let records = csv_reader
        .deserialize::<DailyWeather>()
        .map(|row| -> Result<DailyWeather> {
            let row = row?;
            row.validate()?;
            Ok(row)
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(rows = records.len(), "weather read");
    Ok(records)
}
