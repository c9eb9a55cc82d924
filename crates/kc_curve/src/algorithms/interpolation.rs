use crop_common::{DenseCurve, Doy};
use tracing::debug;

use crate::error::{KcError, Result};

/// Fill every missing day between the first and last point by linear
/// interpolation. Nothing is extrapolated past the end points.
///
/// Points must be strictly ascending by day.
pub fn interpolate_dense(points: &[(Doy, f64)]) -> Result<DenseCurve> {
    let Some(&(start, first_value)) = points.first() else {
        return Err(KcError::EmptyInput);
    };
    if let Some(pair) = points.windows(2).find(|w| w[1].0 <= w[0].0) {
        return Err(KcError::Unordered(pair[1].0));
    }

    let mut values = Vec::with_capacity(points.last().map_or(1, |p| (p.0 - start) as usize + 1));
    values.push(first_value);
    for pair in points.windows(2) {
        let ((d0, v0), (d1, v1)) = (pair[0], pair[1]);
        let span = (d1 - d0) as f64;
        for doy in (d0 + 1)..d1 {
            let t = (doy - d0) as f64 / span;
            values.push(v0 + (v1 - v0) * t);
        }
        values.push(v1);
    }
    Ok(DenseCurve::new(start, values)?)
}

/// Join the two dense flanks into one seasonal curve.
///
/// The flanks share the peak day; the ascending flank's value is kept there.
pub fn merge_segments(left: &DenseCurve, right: &DenseCurve) -> Result<DenseCurve> {
    if let (Some(l), Some(r)) = (left.get(right.start_doy()), right.get(right.start_doy())) {
        if (l - r).abs() > 1e-9 {
            debug!(
                doy = right.start_doy(),
                left = l,
                right = r,
                "flanks disagree at the peak, keeping the left value"
            );
        }
    }
    let merged = left.concat(right)?;
    debug!(
        start = merged.start_doy(),
        end = merged.end_doy(),
        "flanks merged"
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_gaps_linearly() {
        let curve = interpolate_dense(&[(1, 10.0), (5, 20.0)]).unwrap();
        let pairs: Vec<_> = curve.iter().collect();
        assert_eq!(
            pairs,
            vec![(1, 10.0), (2, 12.5), (3, 15.0), (4, 17.5), (5, 20.0)]
        );
    }

    #[test]
    fn test_no_gaps_no_duplicates() {
        let curve = interpolate_dense(&[(100, 0.2), (103, 0.5), (110, 0.4), (111, 0.3)]).unwrap();
        let doys: Vec<_> = curve.doys().collect();
        let expected: Vec<Doy> = (100..=111).collect();
        assert_eq!(doys, expected);
        assert_eq!(curve.get(103), Some(0.5));
    }

    #[test]
    fn test_dense_input_is_unchanged() {
        let points: Vec<(Doy, f64)> = (50..60).map(|d| (d, (d as f64).sin())).collect();
        let curve = interpolate_dense(&points).unwrap();
        let again = interpolate_dense(&curve.iter().collect::<Vec<_>>()).unwrap();
        assert_eq!(curve, again);
        assert_eq!(curve.iter().collect::<Vec<_>>(), points);
    }

    #[test]
    fn test_single_point() {
        let curve = interpolate_dense(&[(42, 0.7)]).unwrap();
        assert_eq!(curve.len(), 1);
        assert_eq!(curve.get(42), Some(0.7));
    }

    #[test]
    fn test_rejects_unordered_and_empty() {
        assert!(matches!(interpolate_dense(&[]), Err(KcError::EmptyInput)));
        assert!(matches!(
            interpolate_dense(&[(10, 1.0), (10, 2.0)]),
            Err(KcError::Unordered(10))
        ));
        assert!(matches!(
            interpolate_dense(&[(10, 1.0), (8, 2.0)]),
            Err(KcError::Unordered(8))
        ));
    }

    #[test]
    fn test_merge_dedups_peak_day() {
        let left = interpolate_dense(&[(100, 0.2), (104, 0.8)]).unwrap();
        let right = interpolate_dense(&[(104, 0.8), (106, 0.4)]).unwrap();
        let merged = merge_segments(&left, &right).unwrap();
        assert_eq!(merged.start_doy(), 100);
        assert_eq!(merged.end_doy(), 106);
        assert_eq!(merged.len(), 7);
        assert_eq!(merged.get(104), Some(0.8));
        assert!((merged.get(105).unwrap() - 0.6).abs() < 1e-12);
    }
}
