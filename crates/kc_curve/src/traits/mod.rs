use crate::{
    error::Result,
    types::{DropCorrection, Observation, ObservationSet, Side},
};

/// Trait for discarding implausible observations
pub trait ObservationFilter: Send + Sync {
    /// Return the observations worth keeping, order preserved
    fn filter(&self, observations: &ObservationSet) -> Result<ObservationSet>;
}

/// Trait for sequential drop suppression on one flank of the curve
pub trait DropRemover: Send + Sync {
    /// The flank this remover is built for
    fn side(&self) -> Side;

    /// Produce a same-length corrected series
    fn correct(&self, observations: &[Observation]) -> DropCorrection;
}

/// Trait for smoothing an evenly indexed series
pub trait Smoother: Send + Sync {
    /// Smallest series the smoother accepts
    fn min_len(&self) -> usize;

    /// Smooth the values, returning a series of the same length
    fn smooth(&self, values: &[f64]) -> Result<Vec<f64>>;
}

/// Trait for piecewise-linear breakpoint search
pub trait BreakpointFitter: Send + Sync {
    /// Fit `segments` lines to `(x, y)` and return the `segments + 1`
    /// ascending breakpoint positions, both ends included
    fn fit(&self, x: &[f64], y: &[f64], segments: usize) -> Result<Vec<f64>>;
}
