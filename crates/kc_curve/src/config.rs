use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

use crate::error::{KcError, Result};

/// Tunables for every pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct KcConfig {
    /// Observations at or below this index value are treated as cloud/shadow
    pub noise_threshold: f64,
    pub window: WindowConfig,
    pub drops: DropConfig,
    /// Per-flank smoothing before interpolation
    pub smoothing: SmoothingConfig,
    /// Optional second pass over the merged daily curve
    pub curve_smoothing: Option<SmoothingConfig>,
    pub fit: FitConfig,
    pub transform: KcTransform,
    pub leveling: LevelingPolicy,
}

impl Default for KcConfig {
    fn default() -> Self {
        Self {
            noise_threshold: 0.1,
            window: WindowConfig::default(),
            drops: DropConfig::default(),
            smoothing: SmoothingConfig::default(),
            curve_smoothing: None,
            fit: FitConfig::default(),
            transform: KcTransform::default(),
            leveling: LevelingPolicy::default(),
        }
    }
}

impl KcConfig {
    /// Reject settings no stage can honour
    pub fn validate(&self) -> Result<()> {
        if !self.noise_threshold.is_finite() {
            return Err(KcError::InvalidConfig("noise_threshold must be finite".into()));
        }
        self.drops.validate()?;
        self.smoothing.validate()?;
        if let Some(curve_smoothing) = &self.curve_smoothing {
            curve_smoothing.validate()?;
        }
        self.fit.validate()?;
        self.transform.validate()
    }
}

/// Days kept before and after the seasonal peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WindowConfig {
    pub pre_days: u16,
    pub post_days: u16,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            pre_days: 75,
            post_days: 85,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DropConfig {
    /// Relative decrease that opens a drop on the ascending flank
    #[schemars(range(min = 0.0, max = 1.0))]
    pub threshold: f64,
    /// Fraction of the drop start value a point must reach to end a drop
    #[schemars(range(min = 0.0, max = 1.0))]
    pub recovery_ratio: f64,
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            threshold: 0.20,
            recovery_ratio: 0.80,
        }
    }
}

impl DropConfig {
    fn validate(&self) -> Result<()> {
        for (name, value) in [("threshold", self.threshold), ("recovery_ratio", self.recovery_ratio)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(KcError::InvalidConfig(format!(
                    "drops.{} must lie in (0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Local polynomial smoothing window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SmoothingConfig {
    #[schemars(range(min = 1, max = 31))]
    pub window_length: usize,
    pub poly_order: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_length: 3,
            poly_order: 1,
        }
    }
}

impl SmoothingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_length < self.poly_order + 1 {
            return Err(KcError::InvalidConfig(format!(
                "smoothing window {} must be at least poly_order + 1 = {}",
                self.window_length,
                self.poly_order + 1
            )));
        }
        Ok(())
    }
}

/// Which piecewise-linear solver places the breakpoints
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FitMethod {
    /// Continuous lines joined at the breakpoints
    #[default]
    Continuous,
    /// Exact segmentation with an independent line per segment
    Segmented,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FitConfig {
    #[schemars(range(min = 1, max = 12))]
    pub segments: usize,
    pub method: FitMethod,
    /// Upper bound on breakpoint search sweeps
    pub max_iterations: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            segments: 4,
            method: FitMethod::default(),
            max_iterations: 50,
        }
    }
}

impl FitConfig {
    fn validate(&self) -> Result<()> {
        if self.segments == 0 {
            return Err(KcError::InvalidConfig("fit.segments must be at least 1".into()));
        }
        Ok(())
    }
}

/// Affine NDVI to crop coefficient calibration: `kc = a * ndvi + b`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct KcTransform {
    pub a: f64,
    pub b: f64,
}

impl Default for KcTransform {
    fn default() -> Self {
        Self { a: 1.25, b: 0.2 }
    }
}

impl KcTransform {
    /// Steeper calibration used for some fields
    pub const ALTERNATE: KcTransform = KcTransform { a: 2.0, b: -0.147 };

    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    pub fn apply(&self, ndvi: f64) -> f64 {
        self.a * ndvi + self.b
    }

    fn validate(&self) -> Result<()> {
        if !self.a.is_finite() || !self.b.is_finite() {
            return Err(KcError::InvalidConfig(format!(
                "transform coefficients must be finite, got a={} b={}",
                self.a, self.b
            )));
        }
        Ok(())
    }
}

/// What leveling does with an odd breakpoint count
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LevelingPolicy {
    /// Leave the trailing singleton breakpoint as fitted
    #[default]
    KeepTrailing,
    /// Fail with `UnpairedBreakpoint`
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = KcConfig::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.window.pre_days, 75);
        assert_eq!(config.fit.segments, 4);
        assert_eq!(config.leveling, LevelingPolicy::KeepTrailing);
    }

    #[test]
    fn test_smoothing_window_must_exceed_order() {
        let mut config = KcConfig::default();
        config.smoothing = SmoothingConfig { window_length: 2, poly_order: 2 };
        assert!(matches!(config.validate(), Err(KcError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_segments_rejected() {
        let mut config = KcConfig::default();
        config.fit.segments = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_drop_threshold_range() {
        let mut config = KcConfig::default();
        config.drops.threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_transform() {
        let kc = KcTransform::default().apply(0.6);
        assert!((kc - 0.95).abs() < 1e-12);
        let alt = KcTransform::ALTERNATE.apply(0.5);
        assert!((alt - 0.853).abs() < 1e-12);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: KcConfig =
            serde_json::from_str(r#"{"fit": {"segments": 5}, "leveling": "reject"}"#).unwrap();
        assert_eq!(config.fit.segments, 5);
        assert_eq!(config.fit.method, FitMethod::Continuous);
        assert_eq!(config.leveling, LevelingPolicy::Reject);
        assert_eq!(config.transform, KcTransform::default());
    }

    #[test]
    fn test_fit_method_from_str() {
        assert_eq!("segmented".parse::<FitMethod>().unwrap(), FitMethod::Segmented);
        assert!("pwlf".parse::<FitMethod>().is_err());
    }
}
