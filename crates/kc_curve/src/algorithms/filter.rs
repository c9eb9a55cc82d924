use tracing::debug;

use crate::{
    error::{KcError, Result},
    traits::ObservationFilter,
    types::ObservationSet,
};

/// Drops observations at or below a plausibility threshold
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    pub threshold: f64,
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self { threshold: 0.1 }
    }
}

impl ObservationFilter for NoiseFilter {
    fn filter(&self, observations: &ObservationSet) -> Result<ObservationSet> {
        let kept: Vec<_> = observations
            .iter()
            .filter(|obs| obs.value > self.threshold)
            .copied()
            .collect();

        debug!(
            before = observations.len(),
            after = kept.len(),
            threshold = self.threshold,
            "noise filter applied"
        );

        if kept.is_empty() {
            return Err(KcError::EmptyInput);
        }
        Ok(ObservationSet::from_sorted(kept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_low_values_in_order() {
        let set = ObservationSet::from_pairs(&[(10, 0.05), (20, 0.3), (30, 0.1), (40, 0.5)]).unwrap();
        let filtered = NoiseFilter::default().filter(&set).unwrap();
        let pairs: Vec<_> = filtered.iter().map(|o| (o.doy, o.value)).collect();
        assert_eq!(pairs, vec![(20, 0.3), (40, 0.5)]);
    }

    #[test]
    fn test_all_noise_is_empty_input() {
        let set = ObservationSet::from_pairs(&[(10, 0.05), (20, -0.2)]).unwrap();
        assert!(matches!(
            NoiseFilter::default().filter(&set),
            Err(KcError::EmptyInput)
        ));
        assert!(matches!(
            NoiseFilter::default().filter(&ObservationSet::default()),
            Err(KcError::EmptyInput)
        ));
    }
}
