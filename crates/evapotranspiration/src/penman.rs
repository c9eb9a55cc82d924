//! FAO-56 Penman-Monteith reference evapotranspiration on a daily step.
//!
//! Soil heat flux is taken as zero, as is usual for daily periods.

use std::f64::consts::PI;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::weather::DailyWeather;

/// Solar constant (MJ m^-2 min^-1)
const GSC: f64 = 0.082;
/// Stefan-Boltzmann constant (MJ K^-4 m^-2 day^-1)
const SIGMA: f64 = 4.903e-9;
const KELVIN: f64 = 273.16;

/// Shortwave radiation coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RadiationConfig {
    /// Canopy reflection coefficient of the grass reference crop
    pub albedo: f64,
    /// Angstrom coefficient: fraction of Ra reaching the ground on overcast days
    pub a_s: f64,
    /// Angstrom coefficient added on clear days
    pub b_s: f64,
}

impl Default for RadiationConfig {
    fn default() -> Self {
        Self {
            albedo: 0.23,
            a_s: 0.25,
            b_s: 0.50,
        }
    }
}

/// Saturation vapour pressure (kPa) at `t` degrees Celsius
pub fn saturation_vapour_pressure(t: f64) -> f64 {
    0.6108 * (17.27 * t / (t + 237.3)).exp()
}

/// Mean saturation and actual vapour pressure (kPa) from daily extremes
pub fn vapour_pressures(t_min: f64, t_max: f64, rh_min: f64, rh_max: f64) -> (f64, f64) {
    let e_min = saturation_vapour_pressure(t_min);
    let e_max = saturation_vapour_pressure(t_max);
    let es = (e_min + e_max) / 2.0;
    let ea = (e_min * rh_max + e_max * rh_min) / 200.0;
    (es, ea)
}

/// Slope of the saturation vapour pressure curve (kPa/°C)
pub fn vapour_pressure_slope(t_mean: f64) -> f64 {
    4098.0 * saturation_vapour_pressure(t_mean) / (t_mean + 237.3).powi(2)
}

/// Psychrometric constant (kPa/°C) from air pressure in kPa
pub fn psychrometric_constant(pressure: f64) -> f64 {
    0.000665 * pressure
}

/// Extraterrestrial radiation (MJ m^-2 day^-1) and daylight hours
pub fn extraterrestrial_radiation(latitude: f64, doy: u16) -> (f64, f64) {
    let phi = latitude * PI / 180.0;
    let day_angle = 2.0 * PI * doy as f64 / 365.0;
    let dr = 1.0 + 0.033 * day_angle.cos();
    let declination = 0.409 * (day_angle - 1.39).sin();
    // clamped for polar day and night
    let omega = (-phi.tan() * declination.tan()).clamp(-1.0, 1.0).acos();

    let ra = 24.0 * 60.0 / PI
        * GSC
        * dr
        * (omega * phi.sin() * declination.sin() + phi.cos() * declination.cos() * omega.sin());
    (ra.max(0.0), 24.0 * omega / PI)
}

/// Net radiation at the crop surface (MJ m^-2 day^-1)
pub fn net_radiation(weather: &DailyWeather, ea: f64, config: &RadiationConfig) -> f64 {
    let (ra, daylight) = extraterrestrial_radiation(weather.lat, weather.doy);
    let sunshine_fraction = if daylight > 0.0 {
        (weather.sunshine_hours / daylight).min(1.0)
    } else {
        0.0
    };
    let rs = (config.a_s + config.b_s * sunshine_fraction) * ra;
    let rso = (0.75 + 2e-5 * weather.altitude) * ra;
    let rns = (1.0 - config.albedo) * rs;

    let relative_shortwave = if rso > 0.0 { (rs / rso).min(1.0) } else { 1.0 };
    let mean_t4 = ((weather.t_min + KELVIN).powi(4) + (weather.t_max + KELVIN).powi(4)) / 2.0;
    let rnl = SIGMA * mean_t4 * (0.34 - 0.14 * ea.sqrt()) * (1.35 * relative_shortwave - 0.35);
    rns - rnl
}

/// Reference evapotranspiration ET0 (mm/day)
pub fn reference_et0(weather: &DailyWeather, config: &RadiationConfig) -> f64 {
    let delta = vapour_pressure_slope(weather.t_mean);
    let gamma = psychrometric_constant(weather.pressure);
    let (es, ea) = vapour_pressures(weather.t_min, weather.t_max, weather.rh_min, weather.rh_max);
    let rn = net_radiation(weather, ea, config);
    let u2 = weather.wind_speed;

    let radiation_term = 0.408 * delta * rn;
    let aerodynamic_term = gamma * 900.0 / (weather.t_mean + 273.0) * u2 * (es - ea);
    (radiation_term + aerodynamic_term) / (delta + gamma * (1.0 + 0.34 * u2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::tests::brussels;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_vapour_pressure() {
        assert!(close(saturation_vapour_pressure(25.0), 3.168, 1e-3));
        assert!(close(vapour_pressure_slope(25.0), 0.189, 1e-3));
        let (es, ea) = vapour_pressures(12.3, 21.5, 63.0, 84.0);
        assert!(close(es, 1.997, 2e-3));
        assert!(close(ea, 1.409, 2e-3));
    }

    #[test]
    fn test_psychrometric_constant() {
        assert!(close(psychrometric_constant(101.3), 0.0674, 1e-4));
    }

    #[test]
    fn test_extraterrestrial_radiation() {
        // 20°S on 3 September
        let (ra, daylight) = extraterrestrial_radiation(-20.0, 246);
        assert!(close(ra, 32.2, 0.1), "ra {}", ra);
        assert!(close(daylight, 11.7, 0.1), "N {}", daylight);
    }

    #[test]
    fn test_polar_night_has_no_radiation() {
        let (ra, daylight) = extraterrestrial_radiation(80.0, 355);
        assert_eq!(daylight, 0.0);
        assert!(ra.abs() < 1e-9);
    }

    #[test]
    fn test_reference_et0_brussels() {
        let et0 = reference_et0(&brussels(), &RadiationConfig::default());
        assert!(close(et0, 3.9, 0.15), "et0 {}", et0);
    }

    #[test]
    fn test_dry_wind_raises_et0() {
        let base = brussels();
        let mut windy = base.clone();
        windy.wind_speed = 5.0;
        windy.rh_min = 20.0;
        let config = RadiationConfig::default();
        assert!(reference_et0(&windy, &config) > reference_et0(&base, &config));
    }
}
