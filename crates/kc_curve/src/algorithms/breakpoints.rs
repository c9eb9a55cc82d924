//! Piecewise-linear breakpoint search.
//!
//! Breakpoints are restricted to sample positions. [`SegmentedLeastSquares`]
//! solves the discontinuous problem exactly by dynamic programming;
//! [`ContinuousPiecewiseFit`] starts from that solution and moves one
//! breakpoint at a time while the continuous fit keeps improving.

use crop_common::{DenseCurve, Doy};
use tracing::debug;

use crate::{
    error::{KcError, Result},
    traits::BreakpointFitter,
};

use super::linalg::solve;

/// Exact segmentation: each segment gets its own least-squares line and
/// neighbouring segments share their boundary sample.
#[derive(Debug, Clone, Default)]
pub struct SegmentedLeastSquares;

impl BreakpointFitter for SegmentedLeastSquares {
    fn fit(&self, x: &[f64], y: &[f64], segments: usize) -> Result<Vec<f64>> {
        check_inputs(x, y, segments)?;
        let knots = optimal_segmentation(x, y, segments);
        Ok(knots.iter().map(|&k| x[k]).collect())
    }
}

/// Continuous piecewise-linear least squares
#[derive(Debug, Clone)]
pub struct ContinuousPiecewiseFit {
    /// Upper bound on coordinate-descent sweeps
    pub max_iterations: usize,
}

impl Default for ContinuousPiecewiseFit {
    fn default() -> Self {
        Self { max_iterations: 50 }
    }
}

impl BreakpointFitter for ContinuousPiecewiseFit {
    fn fit(&self, x: &[f64], y: &[f64], segments: usize) -> Result<Vec<f64>> {
        check_inputs(x, y, segments)?;
        let mut knots = optimal_segmentation(x, y, segments);
        let mut best = continuous_sse(x, y, &knots);

        let mut sweeps = 0;
        while sweeps < self.max_iterations {
            sweeps += 1;
            let mut improved = false;
            for k in 1..segments {
                let (lo, hi) = (knots[k - 1] + 1, knots[k + 1] - 1);
                for candidate in lo..=hi {
                    if candidate == knots[k] {
                        continue;
                    }
                    let mut trial = knots.clone();
                    trial[k] = candidate;
                    let sse = continuous_sse(x, y, &trial);
                    if sse < best - 1e-12 {
                        best = sse;
                        knots = trial;
                        improved = true;
                    }
                }
            }
            if !improved {
                break;
            }
        }

        debug!(segments, sweeps, sse = best, "continuous fit converged");
        Ok(knots.iter().map(|&k| x[k]).collect())
    }
}

/// Snap fitted positions onto the curve's days.
///
/// Fails with `DegenerateFit` unless exactly `segments + 1` distinct days
/// remain.
pub fn breakpoint_doys(positions: &[f64], curve: &DenseCurve, segments: usize) -> Result<Vec<Doy>> {
    let (lo, hi) = (curve.start_doy() as f64, curve.end_doy() as f64);
    let mut doys: Vec<Doy> = positions
        .iter()
        .filter(|p| p.is_finite())
        .map(|p| p.round().clamp(lo, hi) as Doy)
        .collect();
    doys.sort_unstable();
    doys.dedup();

    if doys.len() != segments + 1 {
        return Err(KcError::DegenerateFit {
            points: curve.len(),
            segments,
        });
    }
    Ok(doys)
}

fn check_inputs(x: &[f64], y: &[f64], segments: usize) -> Result<()> {
    if x.len() != y.len() {
        return Err(KcError::InvalidInput(format!(
            "x has {} values but y has {}",
            x.len(),
            y.len()
        )));
    }
    if segments == 0 {
        return Err(KcError::InvalidConfig("at least one segment is required".into()));
    }
    if x.len() < segments + 1 {
        return Err(KcError::DegenerateFit {
            points: x.len(),
            segments,
        });
    }
    if x.windows(2).any(|w| w[1] <= w[0]) {
        return Err(KcError::InvalidInput("x must be strictly ascending".into()));
    }
    Ok(())
}

/// Prefix sums giving the residual of a straight-line fit over any run
struct LineCosts {
    sx: Vec<f64>,
    sy: Vec<f64>,
    sxx: Vec<f64>,
    sxy: Vec<f64>,
    syy: Vec<f64>,
}

impl LineCosts {
    fn new(x: &[f64], y: &[f64]) -> Self {
        let origin = x[0];
        let n = x.len();
        let mut costs = Self {
            sx: vec![0.0; n + 1],
            sy: vec![0.0; n + 1],
            sxx: vec![0.0; n + 1],
            sxy: vec![0.0; n + 1],
            syy: vec![0.0; n + 1],
        };
        for i in 0..n {
            let (xi, yi) = (x[i] - origin, y[i]);
            costs.sx[i + 1] = costs.sx[i] + xi;
            costs.sy[i + 1] = costs.sy[i] + yi;
            costs.sxx[i + 1] = costs.sxx[i] + xi * xi;
            costs.sxy[i + 1] = costs.sxy[i] + xi * yi;
            costs.syy[i + 1] = costs.syy[i] + yi * yi;
        }
        costs
    }

    /// Squared residual of the best line through samples `i..=j`
    fn sse(&self, i: usize, j: usize) -> f64 {
        let m = (j - i + 1) as f64;
        if m <= 2.0 {
            return 0.0;
        }
        let sx = self.sx[j + 1] - self.sx[i];
        let sy = self.sy[j + 1] - self.sy[i];
        let cxx = self.sxx[j + 1] - self.sxx[i] - sx * sx / m;
        let cxy = self.sxy[j + 1] - self.sxy[i] - sx * sy / m;
        let cyy = self.syy[j + 1] - self.syy[i] - sy * sy / m;
        let sse = if cxx > 0.0 { cyy - cxy * cxy / cxx } else { cyy };
        sse.max(0.0)
    }
}

/// Sample indices of the `segments + 1` boundaries minimising total residual
fn optimal_segmentation(x: &[f64], y: &[f64], segments: usize) -> Vec<usize> {
    let n = x.len();
    let costs = LineCosts::new(x, y);

    let mut best = vec![vec![f64::INFINITY; n]; segments + 1];
    let mut parent = vec![vec![0usize; n]; segments + 1];
    best[0][0] = 0.0;

    for k in 1..=segments {
        for j in k..n {
            for i in (k - 1)..j {
                let prior = best[k - 1][i];
                if !prior.is_finite() {
                    continue;
                }
                let total = prior + costs.sse(i, j);
                if total < best[k][j] {
                    best[k][j] = total;
                    parent[k][j] = i;
                }
            }
        }
    }

    let mut knots = vec![0usize; segments + 1];
    knots[segments] = n - 1;
    for k in (1..=segments).rev() {
        knots[k - 1] = parent[k][knots[k]];
    }
    knots
}

/// Residual of the continuous fit with corners at the given sample indices.
///
/// The model is a line plus one hinge `max(0, x - x_k)` per interior knot.
fn continuous_sse(x: &[f64], y: &[f64], knots: &[usize]) -> f64 {
    let origin = x[0];
    let scale = (x[x.len() - 1] - origin).max(f64::EPSILON);
    let hinges: Vec<f64> = knots[1..knots.len() - 1]
        .iter()
        .map(|&k| (x[k] - origin) / scale)
        .collect();
    let p = hinges.len() + 2;

    let basis = |xi: f64| -> Vec<f64> {
        let u = (xi - origin) / scale;
        let mut row = Vec::with_capacity(p);
        row.push(1.0);
        row.push(u);
        row.extend(hinges.iter().map(|&h| (u - h).max(0.0)));
        row
    };

    let mut jtj = vec![vec![0.0; p]; p];
    let mut jty = vec![0.0; p];
    for (&xi, &yi) in x.iter().zip(y) {
        let row = basis(xi);
        for a in 0..p {
            jty[a] += row[a] * yi;
            for b in 0..p {
                jtj[a][b] += row[a] * row[b];
            }
        }
    }

    let Some(beta) = solve(jtj, jty) else {
        return f64::INFINITY;
    };
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let fitted: f64 = basis(xi).iter().zip(&beta).map(|(b, c)| b * c).sum();
            (yi - fitted).powi(2)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat, rise, flat, fall: the shape of a growing season
    fn trapezoid() -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (100..=220).map(|d| d as f64).collect();
        let y = x
            .iter()
            .map(|&d| {
                if d <= 120.0 {
                    0.2
                } else if d <= 150.0 {
                    0.2 + (d - 120.0) * 0.02
                } else if d <= 190.0 {
                    0.8
                } else {
                    0.8 - (d - 190.0) * 0.015
                }
            })
            .collect();
        (x, y)
    }

    fn assert_ascending_distinct(bps: &[f64]) {
        assert!(bps.windows(2).all(|w| w[1] > w[0]), "{:?}", bps);
    }

    #[test]
    fn test_segmented_recovers_corners() {
        let (x, y) = trapezoid();
        let bps = SegmentedLeastSquares.fit(&x, &y, 4).unwrap();
        assert_eq!(bps, vec![100.0, 120.0, 150.0, 190.0, 220.0]);
    }

    #[test]
    fn test_continuous_recovers_corners() {
        let (x, y) = trapezoid();
        let bps = ContinuousPiecewiseFit::default().fit(&x, &y, 4).unwrap();
        assert_eq!(bps, vec![100.0, 120.0, 150.0, 190.0, 220.0]);
    }

    #[test]
    fn test_breakpoint_count_invariant() {
        let x: Vec<f64> = (1..=60).map(|d| d as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| (v / 9.0).sin() + 0.01 * (v * 7.0).cos()).collect();
        for segments in 1..=6 {
            for bps in [
                SegmentedLeastSquares.fit(&x, &y, segments).unwrap(),
                ContinuousPiecewiseFit::default().fit(&x, &y, segments).unwrap(),
            ] {
                assert_eq!(bps.len(), segments + 1);
                assert_ascending_distinct(&bps);
                assert_eq!(bps[0], 1.0);
                assert_eq!(bps[segments], 60.0);
            }
        }
    }

    #[test]
    fn test_continuous_never_worse_than_seed() {
        let x: Vec<f64> = (0..80).map(|d| d as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| (v / 12.0).sin()).collect();
        let seed = optimal_segmentation(&x, &y, 3);
        let seed_sse = continuous_sse(&x, &y, &seed);
        let fitted = ContinuousPiecewiseFit::default().fit(&x, &y, 3).unwrap();
        let knots: Vec<usize> = fitted.iter().map(|&v| v as usize).collect();
        assert!(continuous_sse(&x, &y, &knots) <= seed_sse + 1e-12);
    }

    #[test]
    fn test_minimum_points() {
        let x = [1.0, 2.0, 3.0];
        let y = [0.1, 0.5, 0.2];
        assert_eq!(
            ContinuousPiecewiseFit::default().fit(&x, &y, 2).unwrap(),
            vec![1.0, 2.0, 3.0]
        );
        assert!(matches!(
            SegmentedLeastSquares.fit(&x, &y, 3),
            Err(KcError::DegenerateFit { points: 3, segments: 3 })
        ));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let fitter = SegmentedLeastSquares;
        assert!(matches!(
            fitter.fit(&[1.0, 2.0], &[1.0], 1),
            Err(KcError::InvalidInput(_))
        ));
        assert!(matches!(
            fitter.fit(&[2.0, 1.0, 3.0], &[1.0, 1.0, 1.0], 1),
            Err(KcError::InvalidInput(_))
        ));
        assert!(matches!(
            fitter.fit(&[1.0, 2.0], &[1.0, 1.0], 0),
            Err(KcError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_line_costs_match_direct_fit() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 2.0, 5.0];
        let costs = LineCosts::new(&x, &y);
        // y = 1.1 + 1.1x has residuals -0.1, 0.8, -1.3, 0.6
        assert!((costs.sse(0, 3) - 2.7).abs() < 1e-9);
        assert_eq!(costs.sse(1, 2), 0.0);
    }

    #[test]
    fn test_breakpoint_doys_snaps_and_checks() {
        let curve = DenseCurve::new(100, vec![0.5; 21]).unwrap();
        let doys = breakpoint_doys(&[99.6, 104.4, 112.5, 125.0], &curve, 3).unwrap();
        assert_eq!(doys, vec![100, 104, 113, 120]);

        assert!(matches!(
            breakpoint_doys(&[100.0, 100.2, 120.0], &curve, 2),
            Err(KcError::DegenerateFit { points: 21, segments: 2 })
        ));
    }
}
