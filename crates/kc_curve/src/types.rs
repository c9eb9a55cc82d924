use crop_common::{utils, DenseCurve, Doy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

use crate::error::{KcError, Result};

/// One vegetation-index sample for a field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Observation {
    pub doy: Doy,
    pub value: f64,
}

impl Observation {
    pub fn new(doy: Doy, value: f64) -> Self {
        Self { doy, value }
    }
}

/// Observations for one field and season, ordered by day with unique days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ObservationSet {
    observations: Vec<Observation>,
}

impl ObservationSet {
    /// Validate and sort raw observations.
    ///
    /// Rejects days outside 1..=366, non-finite values and duplicate days.
    pub fn new(mut observations: Vec<Observation>) -> Result<Self> {
        for obs in &observations {
            utils::check_doy(obs.doy as i64)?;
            if !obs.value.is_finite() {
                return Err(KcError::NonFiniteValue(obs.doy));
            }
        }
        observations.sort_by_key(|obs| obs.doy);
        if let Some(pair) = observations.windows(2).find(|w| w[0].doy == w[1].doy) {
            return Err(KcError::DuplicateDoy(pair[0].doy));
        }
        Ok(Self { observations })
    }

    pub fn from_pairs(pairs: &[(Doy, f64)]) -> Result<Self> {
        Self::new(pairs.iter().map(|&(doy, value)| Observation::new(doy, value)).collect())
    }

    /// Subsets of an already validated set stay valid
    pub(crate) fn from_sorted(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Index and observation of the maximum value; the first one wins on ties
    pub fn peak(&self) -> Option<(usize, Observation)> {
        let mut best: Option<(usize, Observation)> = None;
        for (i, obs) in self.observations.iter().enumerate() {
            match best {
                Some((_, b)) if obs.value <= b.value => {}
                _ => best = Some((i, *obs)),
            }
        }
        best
    }
}

/// Which flank of the seasonal curve a segment belongs to
#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq, Hash
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Side {
    /// Ascending flank, up to and including the peak
    Left,
    /// Descending flank, starting at the peak
    Right,
}

/// One flank of the windowed series. Both flanks include the peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    pub side: Side,
    pub observations: Vec<Observation>,
}

/// Days kept around the seasonal peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GrowthWindow {
    pub start_doy: Doy,
    pub end_doy: Doy,
    pub peak: Observation,
}

impl GrowthWindow {
    pub fn contains(&self, doy: Doy) -> bool {
        doy >= self.start_doy && doy <= self.end_doy
    }

    pub fn length_days(&self) -> u16 {
        self.end_doy - self.start_doy + 1
    }
}

/// Output of a drop remover for one flank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DropCorrection {
    pub side: Side,
    /// Same length and days as the input segment
    pub points: Vec<(Doy, f64)>,
    /// Points whose value was replaced by a held plateau
    pub held: usize,
    /// Drop spans replayed verbatim after a recovery
    pub replayed_spans: usize,
}

/// A fitted stage boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Breakpoint {
    pub doy: Doy,
    pub ndvi: f64,
    pub kc: f64,
}

/// Every artifact derived for one field
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct KcOutput {
    pub window: GrowthWindow,
    pub left: DropCorrection,
    pub right: DropCorrection,
    /// Smoothed, gap-free NDVI over the growth window
    pub ndvi_curve: DenseCurve,
    /// Breakpoints with Kc straight from the transform
    pub breakpoints: Vec<Breakpoint>,
    /// Breakpoints after pairwise leveling
    pub leveled: Vec<Breakpoint>,
    /// Daily crop coefficient between the first and last breakpoint
    pub kc_curve: DenseCurve,
}

impl KcOutput {
    /// Crop coefficient for a day, `None` outside the fitted span
    pub fn kc_at(&self, doy: Doy) -> Option<f64> {
        self.kc_curve.get(doy)
    }

    pub fn breakpoint_doys(&self) -> Vec<Doy> {
        self.leveled.iter().map(|bp| bp.doy).collect()
    }
}
