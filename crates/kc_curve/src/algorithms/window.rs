use tracing::debug;

use crate::{
    config::WindowConfig,
    error::{KcError, Result},
    types::{GrowthWindow, ObservationSet, Segment, Side},
};

/// Truncate the series to the growth window around its peak.
///
/// The window is `[peak - pre_days, peak + post_days]`, clipped to the
/// observed range so it never extrapolates.
pub fn extract_growth_window(
    observations: &ObservationSet,
    config: &WindowConfig,
) -> Result<(GrowthWindow, ObservationSet)> {
    let (Some((_, peak)), Some(first), Some(last)) =
        (observations.peak(), observations.first(), observations.last())
    else {
        return Err(KcError::EmptyInput);
    };

    let start_doy = peak.doy.saturating_sub(config.pre_days).max(first.doy).max(1);
    let end_doy = (peak.doy as u32 + config.post_days as u32).min(last.doy as u32) as u16;

    let kept: Vec<_> = observations
        .iter()
        .filter(|obs| obs.doy >= start_doy && obs.doy <= end_doy)
        .copied()
        .collect();

    let window = GrowthWindow {
        start_doy,
        end_doy,
        peak,
    };
    debug!(
        peak_doy = peak.doy,
        start_doy,
        end_doy,
        points = kept.len(),
        "growth window extracted"
    );
    Ok((window, ObservationSet::from_sorted(kept)))
}

/// Split the windowed series at its maximum into ascending and descending
/// flanks. Both flanks include the peak observation.
pub fn split_at_peak(observations: &ObservationSet) -> Result<(Segment, Segment)> {
    let (peak_index, _) = observations.peak().ok_or(KcError::EmptyInput)?;
    let all = observations.as_slice();

    let left = Segment {
        side: Side::Left,
        observations: all[..=peak_index].to_vec(),
    };
    let right = Segment {
        side: Side::Right,
        observations: all[peak_index..].to_vec(),
    };
    Ok((left, right))
}
