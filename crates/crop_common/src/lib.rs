//! # Crop Common - Shared Types and Utilities
//!
//! Leaf data structures shared by the crop-coefficient pipeline and the
//! evapotranspiration crate: day-of-year handling and gap-free daily curves.
//!
//! ## Example
//!
//! ```rust
//! use crop_common::{DenseCurve, utils};
//!
//! let curve = DenseCurve::new(120, vec![0.3, 0.35, 0.4]).unwrap();
//! assert_eq!(curve.end_doy(), 122);
//! assert_eq!(curve.get(121), Some(0.35));
//!
//! let doy = utils::doy_from_date_str("2021-02-01").unwrap();
//! assert_eq!(doy, 32);
//! ```

use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use thiserror::Error;

// Re-exports for convenience
pub use chrono::NaiveDate;

/// Day of year, 1..=366
pub type Doy = u16;

pub const MIN_DOY: Doy = 1;
pub const MAX_DOY: Doy = 366;

/// Result type for shared crop operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Standard error type for shared crop operations
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Day of year {doy} outside 1..=366")]
    InvalidDoy { doy: i64 },

    #[error("Curve must contain at least one day")]
    EmptyCurve,

    #[error("Curve starting at day {start} with {len} values runs past day 366")]
    CurveOverflow { start: Doy, len: usize },

    #[error("Curves do not meet: first ends at day {end}, second starts at day {start}")]
    Discontiguous { end: Doy, start: Doy },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// A mapping from every integer day in `[start_doy, end_doy]` to a value.
///
/// Gaps are unrepresentable: values are stored contiguously from `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DenseCurve {
    start: Doy,
    values: Vec<f64>,
}

impl DenseCurve {
    /// Create a curve whose first value belongs to `start`
    pub fn new(start: Doy, values: Vec<f64>) -> Result<Self> {
        utils::check_doy(start as i64)?;
        if values.is_empty() {
            return Err(CommonError::EmptyCurve);
        }
        let end = start as usize + values.len() - 1;
        if end > MAX_DOY as usize {
            return Err(CommonError::CurveOverflow {
                start,
                len: values.len(),
            });
        }
        Ok(Self { start, values })
    }

    pub fn start_doy(&self) -> Doy {
        self.start
    }

    pub fn end_doy(&self) -> Doy {
        self.start + (self.values.len() - 1) as Doy
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; kept for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check if a day falls within the curve span
    pub fn contains(&self, doy: Doy) -> bool {
        doy >= self.start && doy <= self.end_doy()
    }

    /// Value at `doy`, or `None` outside the span
    pub fn get(&self, doy: Doy) -> Option<f64> {
        if !self.contains(doy) {
            return None;
        }
        self.values.get((doy - self.start) as usize).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// All covered days in ascending order
    pub fn doys(&self) -> impl Iterator<Item = Doy> + '_ {
        (0..self.values.len()).map(move |i| self.start + i as Doy)
    }

    /// `(doy, value)` pairs in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (Doy, f64)> + '_ {
        self.doys().zip(self.values.iter().copied())
    }

    /// Apply `f` to every value, keeping the span
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        Self {
            start: self.start,
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Replace the values, keeping the span
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.values.len() {
            return Err(CommonError::Parse(format!(
                "expected {} values, got {}",
                self.values.len(),
                values.len()
            )));
        }
        Ok(Self {
            start: self.start,
            values,
        })
    }

    /// Join `next` onto the end of this curve.
    ///
    /// `next` must start on this curve's last day or the day after. A shared
    /// day keeps this curve's value.
    pub fn concat(&self, next: &DenseCurve) -> Result<Self> {
        let end = self.end_doy();
        let skip = match next.start {
            s if s == end => 1,
            s if s == end + 1 => 0,
            s => return Err(CommonError::Discontiguous { end, start: s }),
        };
        let mut values = self.values.clone();
        values.extend(next.values.iter().skip(skip).copied());
        Self::new(self.start, values)
    }
}

/// Utility functions for calendar handling
pub mod utils {
    use super::*;
    use chrono::Datelike;

    /// Validate a raw day-of-year number
    pub fn check_doy(doy: i64) -> Result<Doy> {
        if doy < MIN_DOY as i64 || doy > MAX_DOY as i64 {
            return Err(CommonError::InvalidDoy { doy });
        }
        Ok(doy as Doy)
    }

    /// Day of year (1-based) for a calendar date
    pub fn day_of_year(date: NaiveDate) -> Doy {
        date.ordinal() as Doy
    }

    /// Parse a `YYYY-MM-DD` date
    pub fn parse_date(text: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map_err(|e| CommonError::Parse(format!("invalid date '{}': {}", text, e)))
    }

    /// Parse a `YYYY-MM-DD` date straight to its day of year
    pub fn doy_from_date_str(text: &str) -> Result<Doy> {
        parse_date(text).map(day_of_year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_curve_span() {
        let curve = DenseCurve::new(100, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(curve.start_doy(), 100);
        assert_eq!(curve.end_doy(), 102);
        assert_eq!(curve.get(101), Some(2.0));
        assert_eq!(curve.get(99), None);
        assert_eq!(curve.get(103), None);
        let doys: Vec<Doy> = curve.doys().collect();
        assert_eq!(doys, vec![100, 101, 102]);
    }

    #[test]
    fn test_dense_curve_rejects_bad_spans() {
        assert!(matches!(DenseCurve::new(10, vec![]), Err(CommonError::EmptyCurve)));
        assert!(matches!(
            DenseCurve::new(0, vec![1.0]),
            Err(CommonError::InvalidDoy { doy: 0 })
        ));
        assert!(matches!(
            DenseCurve::new(365, vec![1.0, 2.0, 3.0]),
            Err(CommonError::CurveOverflow { .. })
        ));
        assert!(DenseCurve::new(365, vec![1.0, 2.0]).is_ok());
    }

    #[test]
    fn test_concat_shared_day_keeps_first_value() {
        let left = DenseCurve::new(10, vec![1.0, 2.0, 3.0]).unwrap();
        let right = DenseCurve::new(12, vec![3.5, 2.0, 1.0]).unwrap();
        let merged = left.concat(&right).unwrap();
        assert_eq!(merged.start_doy(), 10);
        assert_eq!(merged.values(), &[1.0, 2.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_concat_adjacent_and_gap() {
        let left = DenseCurve::new(10, vec![1.0, 2.0]).unwrap();
        let adjacent = DenseCurve::new(12, vec![3.0]).unwrap();
        assert_eq!(left.concat(&adjacent).unwrap().values(), &[1.0, 2.0, 3.0]);

        let gapped = DenseCurve::new(14, vec![3.0]).unwrap();
        assert!(matches!(
            left.concat(&gapped),
            Err(CommonError::Discontiguous { end: 11, start: 14 })
        ));
    }

    #[test]
    fn test_map_keeps_span() {
        let curve = DenseCurve::new(50, vec![0.4, 0.6]).unwrap();
        let kc = curve.map(|ndvi| 1.25 * ndvi + 0.2);
        assert_eq!(kc.start_doy(), 50);
        assert!((kc.values()[1] - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_day_of_year() {
        assert_eq!(utils::doy_from_date_str("2021-01-01").unwrap(), 1);
        assert_eq!(utils::doy_from_date_str("2021-12-31").unwrap(), 365);
        assert_eq!(utils::doy_from_date_str("2020-12-31").unwrap(), 366);
        assert!(utils::parse_date("31/12/2020").is_err());
    }

    #[test]
    fn test_check_doy() {
        assert_eq!(utils::check_doy(1).unwrap(), 1);
        assert_eq!(utils::check_doy(366).unwrap(), 366);
        assert!(utils::check_doy(367).is_err());
        assert!(utils::check_doy(-4).is_err());
    }
}
