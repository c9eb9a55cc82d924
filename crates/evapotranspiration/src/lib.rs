//! # Evapotranspiration
//!
//! Daily reference evapotranspiration (ET0) from station weather with the
//! FAO-56 Penman-Monteith equation, and crop evapotranspiration
//! `ETc = ET0 x Kc` against a daily crop coefficient curve.
//!
//! ```rust,no_run
//! use evapotranspiration::{crop_evapotranspiration, et0_series, read_weather_csv, RadiationConfig};
//! use crop_common::DenseCurve;
//!
//! let weather = read_weather_csv("weather.csv")?;
//! let et0 = et0_series(&weather, &RadiationConfig::default());
//! let kc = DenseCurve::new(120, vec![0.4; 90])?;
//! for record in crop_evapotranspiration(&et0, &kc) {
//!     println!("{} {:.2}", record.doy, record.etc);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod weather;
pub mod penman;
pub mod crop;

pub use error::{EtError, Result};
pub use weather::{read_weather, read_weather_csv, DailyWeather};
pub use penman::{reference_et0, RadiationConfig};
pub use crop::{crop_evapotranspiration, et0_series, write_et0_csv, write_etc_csv, Et0Series, EtcRecord};
