use crate::{
    config::SmoothingConfig,
    error::{KcError, Result},
    traits::Smoother,
};

use super::linalg::solve;

/// Savitzky-Golay style local polynomial smoother.
///
/// Every sample is replaced by a least-squares polynomial of `poly_order`
/// fitted over `window_length` consecutive samples and evaluated at that
/// sample. The window sits centred where it can and is shifted inward at
/// the series edges, so no padding is invented.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window_length: usize,
    poly_order: usize,
    /// `weights[o]` evaluates the fit at position `o` inside the window
    weights: Vec<Vec<f64>>,
}

impl SavitzkyGolay {
    pub fn new(window_length: usize, poly_order: usize) -> Result<Self> {
        SmoothingConfig { window_length, poly_order }.validate()?;
        let weights = (0..window_length)
            .map(|offset| window_weights(window_length, poly_order, offset))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            window_length,
            poly_order,
            weights,
        })
    }

    pub fn from_config(config: &SmoothingConfig) -> Result<Self> {
        Self::new(config.window_length, config.poly_order)
    }

    pub fn window_length(&self) -> usize {
        self.window_length
    }

    pub fn poly_order(&self) -> usize {
        self.poly_order
    }
}

impl Default for SavitzkyGolay {
    fn default() -> Self {
        // window 3, order 1: plain three-point moving average in the interior
        let third = 1.0 / 3.0;
        Self {
            window_length: 3,
            poly_order: 1,
            weights: vec![
                vec![5.0 / 6.0, third, -1.0 / 6.0],
                vec![third, third, third],
                vec![-1.0 / 6.0, third, 5.0 / 6.0],
            ],
        }
    }
}

impl Smoother for SavitzkyGolay {
    fn min_len(&self) -> usize {
        self.window_length
    }

    fn smooth(&self, values: &[f64]) -> Result<Vec<f64>> {
        let n = values.len();
        let w = self.window_length;
        if n < w {
            return Err(KcError::SeriesTooShort { len: n, window: w });
        }

        let half = (w - 1) / 2;
        let smoothed = (0..n)
            .map(|i| {
                let start = i.saturating_sub(half).min(n - w);
                let weights = &self.weights[i - start];
                weights
                    .iter()
                    .zip(&values[start..start + w])
                    .map(|(weight, value)| weight * value)
                    .sum()
            })
            .collect();
        Ok(smoothed)
    }
}

/// Weights that evaluate a least-squares polynomial over `window` samples at
/// the sample `offset` positions into the window.
fn window_weights(window: usize, order: usize, offset: usize) -> Result<Vec<f64>> {
    let p = order + 1;
    // Vandermonde rows with x measured from the evaluation point
    let rows: Vec<Vec<f64>> = (0..window)
        .map(|k| {
            let x = k as f64 - offset as f64;
            (0..p).map(|m| x.powi(m as i32)).collect()
        })
        .collect();

    let mut jtj = vec![vec![0.0; p]; p];
    for row in &rows {
        for a in 0..p {
            for b in 0..p {
                jtj[a][b] += row[a] * row[b];
            }
        }
    }

    // First row of (J^T J)^-1; the fit's value at x = 0 is its constant term
    let mut unit = vec![0.0; p];
    unit[0] = 1.0;
    let c = solve(jtj, unit).ok_or_else(|| {
        KcError::InvalidConfig(format!(
            "smoothing window {} cannot fit order {}",
            window, order
        ))
    })?;

    Ok(rows
        .iter()
        .map(|row| row.iter().zip(&c).map(|(x, c)| x * c).sum())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-9, "{} != {}", x, y);
        }
    }

    #[test]
    fn test_default_matches_computed_weights() {
        let computed = SavitzkyGolay::new(3, 1).unwrap();
        let default = SavitzkyGolay::default();
        for (a, b) in computed.weights.iter().zip(&default.weights) {
            assert_close(a, b);
        }
    }

    #[test]
    fn test_three_point_linear_smoothing() {
        let sg = SavitzkyGolay::new(3, 1).unwrap();
        let out = sg.smooth(&[0.2, 0.3, 0.3, 0.35, 0.5]).unwrap();
        // edges use the line through the first/last three samples
        let expected = [
            5.0 / 6.0 * 0.2 + 0.3 / 3.0 - 0.3 / 6.0,
            (0.2 + 0.3 + 0.3) / 3.0,
            (0.3 + 0.3 + 0.35) / 3.0,
            (0.3 + 0.35 + 0.5) / 3.0,
            -0.3 / 6.0 + 0.35 / 3.0 + 5.0 / 6.0 * 0.5,
        ];
        assert_close(&out, &expected);
    }

    #[test]
    fn test_linear_signal_is_preserved() {
        let data: Vec<f64> = (0..12).map(|i| 0.1 + 0.05 * i as f64).collect();
        for window in [2, 3, 5, 10] {
            let sg = SavitzkyGolay::new(window, 1).unwrap();
            assert_close(&sg.smooth(&data).unwrap(), &data);
        }
    }

    #[test]
    fn test_quadratic_order_preserves_parabola() {
        let data: Vec<f64> = (0..9).map(|i| (i as f64 - 4.0).powi(2)).collect();
        let sg = SavitzkyGolay::new(5, 2).unwrap();
        assert_close(&sg.smooth(&data).unwrap(), &data);
    }

    #[test]
    fn test_too_short_fails_fast() {
        let sg = SavitzkyGolay::new(5, 1).unwrap();
        assert!(matches!(
            sg.smooth(&[1.0, 2.0, 3.0]),
            Err(KcError::SeriesTooShort { len: 3, window: 5 })
        ));
        assert_eq!(sg.min_len(), 5);
    }

    #[test]
    fn test_window_must_exceed_order() {
        assert!(matches!(SavitzkyGolay::new(2, 2), Err(KcError::InvalidConfig(_))));
    }

    #[test]
    fn test_reduces_noise() {
        let data: Vec<f64> = (0..40)
            .map(|i| 0.5 + if i % 2 == 0 { 0.05 } else { -0.05 })
            .collect();
        let sg = SavitzkyGolay::new(5, 1).unwrap();
        let out = sg.smooth(&data).unwrap();
        let roughness = |v: &[f64]| v.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>();
        assert!(roughness(&out) < roughness(&data));
    }
}
