pub mod builder;

use crop_common::{DenseCurve, Doy};
use tracing::{debug, info};

use crate::{
    algorithms::{
        breakpoint_doys, extract_growth_window, interpolate_dense, interpolate_kc,
        level_breakpoints, map_breakpoints, merge_segments, remove_drops, split_at_peak,
    },
    config::KcConfig,
    error::{KcError, Result},
    traits::{BreakpointFitter, ObservationFilter, Smoother},
    types::{DropCorrection, KcOutput, ObservationSet},
};

/// The NDVI to crop coefficient pipeline for a single field
pub struct Pipeline {
    config: KcConfig,
    filter: Box<dyn ObservationFilter>,
    smoother: Box<dyn Smoother>,
    curve_smoother: Option<Box<dyn Smoother>>,
    fitter: Box<dyn BreakpointFitter>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Pipeline with the stock stages configured from `config`
    pub fn from_config(config: KcConfig) -> Result<Self> {
        builder::PipelineBuilder::new().with_config(config).build()
    }

    pub fn new(
        config: KcConfig,
        filter: Box<dyn ObservationFilter>,
        smoother: Box<dyn Smoother>,
        curve_smoother: Option<Box<dyn Smoother>>,
        fitter: Box<dyn BreakpointFitter>,
    ) -> Self {
        Self {
            config,
            filter,
            smoother,
            curve_smoother,
            fitter,
        }
    }

    pub fn config(&self) -> &KcConfig {
        &self.config
    }

    /// Run one field's observations through every stage
    pub fn process(&self, observations: &ObservationSet) -> Result<KcOutput> {
        self.config.validate()?;

        // Step 1: Discard cloud and shadow contaminated samples
        let filtered = self.filter.filter(observations)?;

        // Step 2: Keep the growth window and split it at the peak
        let (window, windowed) = extract_growth_window(&filtered, &self.config.window)?;
        let (left_segment, right_segment) = split_at_peak(&windowed)?;

        // Step 3: Suppress drops, each flank with its own policy
        let left = remove_drops(&left_segment, &self.config.drops);
        let right = remove_drops(&right_segment, &self.config.drops);

        // Step 4: Smooth each flank and fill it out to daily values
        let left_curve = self.densify(&left)?;
        let right_curve = self.densify(&right)?;

        // Step 5: Join the flanks, optionally smoothing the whole season again
        let mut ndvi_curve = merge_segments(&left_curve, &right_curve)?;
        if let Some(curve_smoother) = &self.curve_smoother {
            if ndvi_curve.len() < curve_smoother.min_len() {
                return Err(KcError::SeriesTooShort {
                    len: ndvi_curve.len(),
                    window: curve_smoother.min_len(),
                });
            }
            ndvi_curve = ndvi_curve.with_values(curve_smoother.smooth(ndvi_curve.values())?)?;
        }

        // Step 6: Place the stage breakpoints
        let doys = self.fit_breakpoints(&ndvi_curve)?;

        // Step 7: Convert to Kc, level and expand to daily values
        let breakpoints = map_breakpoints(&doys, &ndvi_curve, &self.config.transform)?;
        let leveled = level_breakpoints(&breakpoints, self.config.leveling)?;
        let kc_curve = interpolate_kc(&leveled)?;

        info!(
            peak_doy = window.peak.doy,
            start_doy = ndvi_curve.start_doy(),
            end_doy = ndvi_curve.end_doy(),
            breakpoints = ?doys,
            "crop coefficient curve derived"
        );

        Ok(KcOutput {
            window,
            left,
            right,
            ndvi_curve,
            breakpoints,
            leveled,
            kc_curve,
        })
    }

    fn densify(&self, correction: &DropCorrection) -> Result<DenseCurve> {
        let len = correction.points.len();
        if len < self.smoother.min_len() {
            return Err(KcError::SegmentTooShort {
                side: correction.side,
                len,
                window: self.smoother.min_len(),
            });
        }
        let values: Vec<f64> = correction.points.iter().map(|p| p.1).collect();
        let smoothed = self.smoother.smooth(&values)?;
        let points: Vec<(Doy, f64)> = correction
            .points
            .iter()
            .zip(smoothed)
            .map(|(&(doy, _), value)| (doy, value))
            .collect();
        interpolate_dense(&points)
    }

    fn fit_breakpoints(&self, curve: &DenseCurve) -> Result<Vec<Doy>> {
        let segments = self.config.fit.segments;
        let x: Vec<f64> = curve.doys().map(f64::from).collect();
        let positions = self.fitter.fit(&x, curve.values(), segments)?;
        debug!(segments, ?positions, "breakpoints fitted");
        breakpoint_doys(&positions, curve, segments)
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: noise > {}, window -{}/+{} days, smoothing {}, {}curve smoothing, {} {} segments, kc = {} * ndvi + {}",
            self.config.noise_threshold,
            self.config.window.pre_days,
            self.config.window.post_days,
            self.smoother.min_len(),
            if self.curve_smoother.is_some() { "" } else { "no " },
            self.config.fit.segments,
            self.config.fit.method,
            self.config.transform.a,
            self.config.transform.b,
        )
    }
}
