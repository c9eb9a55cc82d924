use crop_common::{DenseCurve, Doy};
use tracing::debug;

use crate::{
    config::{KcTransform, LevelingPolicy},
    error::{KcError, Result},
    types::Breakpoint,
};

use super::interpolation::interpolate_dense;

/// Look up each breakpoint day on the NDVI curve and convert it to Kc
pub fn map_breakpoints(doys: &[Doy], curve: &DenseCurve, transform: &KcTransform) -> Result<Vec<Breakpoint>> {
    doys.iter()
        .map(|&doy| -> Result<Breakpoint> {
            let ndvi = curve.get(doy).ok_or(KcError::MissingDoy(doy))?;
            Ok(Breakpoint {
                doy,
                ndvi,
                kc: transform.apply(ndvi),
            })
        })
        .collect()
}

/// Replace the Kc of each consecutive pair with the pair's mean.
///
/// Pairs are (0,1), (2,3), ... and NDVI is left untouched. An odd trailing
/// breakpoint is handled by `policy`.
pub fn level_breakpoints(breakpoints: &[Breakpoint], policy: LevelingPolicy) -> Result<Vec<Breakpoint>> {
    if breakpoints.len() % 2 == 1 && policy == LevelingPolicy::Reject {
        return Err(KcError::UnpairedBreakpoint {
            count: breakpoints.len(),
        });
    }

    let mut leveled = breakpoints.to_vec();
    for pair in leveled.chunks_exact_mut(2) {
        let mean = (pair[0].kc + pair[1].kc) / 2.0;
        pair[0].kc = mean;
        pair[1].kc = mean;
    }
    debug!(
        count = leveled.len(),
        trailing = leveled.len() % 2 == 1,
        "breakpoints leveled"
    );
    Ok(leveled)
}

/// Daily Kc between the first and last breakpoint
pub fn interpolate_kc(breakpoints: &[Breakpoint]) -> Result<DenseCurve> {
    let points: Vec<(Doy, f64)> = breakpoints.iter().map(|bp| (bp.doy, bp.kc)).collect();
    interpolate_dense(&points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bp(doy: Doy, kc: f64) -> Breakpoint {
        Breakpoint { doy, ndvi: 0.0, kc }
    }

    #[test]
    fn test_map_uses_transform() {
        let curve = DenseCurve::new(100, vec![0.2, 0.4, 0.6]).unwrap();
        let bps = map_breakpoints(&[100, 102], &curve, &KcTransform::default()).unwrap();
        assert_eq!(bps[1].doy, 102);
        assert_eq!(bps[1].ndvi, 0.6);
        assert!((bps[1].kc - 0.95).abs() < 1e-12);
        assert!((bps[0].kc - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_map_missing_day() {
        let curve = DenseCurve::new(100, vec![0.2, 0.4]).unwrap();
        assert!(matches!(
            map_breakpoints(&[100, 105], &curve, &KcTransform::default()),
            Err(KcError::MissingDoy(105))
        ));
    }

    #[test]
    fn test_level_pairs_share_mean() {
        let input = vec![bp(100, 0.4), bp(130, 0.6), bp(160, 1.2), bp(200, 1.0), bp(240, 0.5)];
        let leveled = level_breakpoints(&input, LevelingPolicy::KeepTrailing).unwrap();
        assert_eq!(leveled.len(), 5);
        assert!((leveled[0].kc - 0.5).abs() < 1e-12);
        assert_eq!(leveled[0].kc, leveled[1].kc);
        assert!((leveled[2].kc - 1.1).abs() < 1e-12);
        assert_eq!(leveled[2].kc, leveled[3].kc);
        assert_eq!(leveled[4].kc, 0.5);
        for (a, b) in input.iter().zip(&leveled) {
            assert_eq!(a.doy, b.doy);
            assert_eq!(a.ndvi, b.ndvi);
        }
    }

    #[test]
    fn test_level_odd_count_rejected() {
        let input = vec![bp(100, 0.4), bp(130, 0.6), bp(160, 1.2)];
        assert!(matches!(
            level_breakpoints(&input, LevelingPolicy::Reject),
            Err(KcError::UnpairedBreakpoint { count: 3 })
        ));
        assert_eq!(level_breakpoints(&input[..2], LevelingPolicy::Reject).unwrap().len(), 2);
    }

    #[test]
    fn test_kc_curve_spans_breakpoints() {
        let curve = interpolate_kc(&[bp(100, 0.5), bp(104, 0.9), bp(106, 0.9)]).unwrap();
        assert_eq!(curve.start_doy(), 100);
        assert_eq!(curve.end_doy(), 106);
        assert!((curve.get(102).unwrap() - 0.7).abs() < 1e-12);
        assert_eq!(curve.get(105), Some(0.9));
    }
}
