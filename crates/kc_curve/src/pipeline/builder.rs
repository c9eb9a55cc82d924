use crate::{
    algorithms::{ContinuousPiecewiseFit, NoiseFilter, SavitzkyGolay, SegmentedLeastSquares},
    config::{FitMethod, KcConfig, KcTransform, LevelingPolicy, SmoothingConfig},
    error::Result,
    pipeline::Pipeline,
    traits::{BreakpointFitter, ObservationFilter, Smoother},
};

/// Builder for creating processing pipelines with a fluent API.
///
/// Stages that are not set explicitly are built from the configuration.
pub struct PipelineBuilder {
    config: KcConfig,
    filter: Option<Box<dyn ObservationFilter>>,
    smoother: Option<Box<dyn Smoother>>,
    fitter: Option<Box<dyn BreakpointFitter>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: KcConfig::default(),
            filter: None,
            smoother: None,
            fitter: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: KcConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the observation filter (replaces the configured noise filter)
    pub fn set_filter<F>(mut self, filter: F) -> Self
    where
        F: ObservationFilter + 'static,
    {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Set the per-flank smoother
    pub fn set_smoother<S>(mut self, smoother: S) -> Self
    where
        S: Smoother + 'static,
    {
        self.smoother = Some(Box::new(smoother));
        self
    }

    /// Set the breakpoint fitter (overrides `fit.method`)
    pub fn set_fitter<B>(mut self, fitter: B) -> Self
    where
        B: BreakpointFitter + 'static,
    {
        self.fitter = Some(Box::new(fitter));
        self
    }

    pub fn with_noise_threshold(mut self, threshold: f64) -> Self {
        self.config.noise_threshold = threshold;
        self
    }

    pub fn with_window(mut self, pre_days: u16, post_days: u16) -> Self {
        self.config.window.pre_days = pre_days;
        self.config.window.post_days = post_days;
        self
    }

    pub fn with_segments(mut self, segments: usize) -> Self {
        self.config.fit.segments = segments;
        self
    }

    pub fn with_fit_method(mut self, method: FitMethod) -> Self {
        self.config.fit.method = method;
        self
    }

    pub fn with_transform(mut self, transform: KcTransform) -> Self {
        self.config.transform = transform;
        self
    }

    pub fn with_leveling(mut self, policy: LevelingPolicy) -> Self {
        self.config.leveling = policy;
        self
    }

    /// Smooth the merged daily curve a second time
    pub fn with_curve_smoothing(mut self, window_length: usize, poly_order: usize) -> Self {
        self.config.curve_smoothing = Some(SmoothingConfig {
            window_length,
            poly_order,
        });
        self
    }

    /// Build the pipeline, filling unset stages from the configuration
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config;
        config.validate()?;

        let filter: Box<dyn ObservationFilter> = match self.filter {
            Some(filter) => filter,
            None => Box::new(NoiseFilter {
                threshold: config.noise_threshold,
            }),
        };
        let smoother: Box<dyn Smoother> = match self.smoother {
            Some(smoother) => smoother,
            None => Box::new(SavitzkyGolay::from_config(&config.smoothing)?),
        };
        let curve_smoother = match &config.curve_smoothing {
            Some(smoothing) => Some(Box::new(SavitzkyGolay::from_config(smoothing)?) as Box<dyn Smoother>),
            None => None,
        };
        let fitter: Box<dyn BreakpointFitter> = match self.fitter {
            Some(fitter) => fitter,
            None => match config.fit.method {
                FitMethod::Continuous => Box::new(ContinuousPiecewiseFit {
                    max_iterations: config.fit.max_iterations,
                }),
                FitMethod::Segmented => Box::new(SegmentedLeastSquares),
            },
        };

        Ok(Pipeline::new(config, filter, smoother, curve_smoother, fitter))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
