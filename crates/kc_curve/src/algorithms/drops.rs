//! Sequential drop suppression.
//!
//! The two flanks of the season use different state machines. On the
//! ascending flank a sharp fall is sensor noise and is held flat at the last
//! accepted value. On the descending flank falls are expected, so a suspected
//! drop is buffered and the raw span is replayed once the series recovers.

use tracing::debug;

use crate::{
    config::DropConfig,
    traits::DropRemover,
    types::{DropCorrection, Observation, Segment, Side},
};

/// Holds a plateau through transient drops on the ascending flank
#[derive(Debug, Clone)]
pub struct LeftDropRemover {
    /// Relative decrease from the last accepted value that opens a drop
    pub threshold: f64,
    /// A drop ends once a raw value reaches this fraction of the drop start
    pub recovery_ratio: f64,
}

impl Default for LeftDropRemover {
    fn default() -> Self {
        Self {
            threshold: 0.20,
            recovery_ratio: 0.80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LeftState {
    Accepting,
    Holding,
}

impl DropRemover for LeftDropRemover {
    fn side(&self) -> Side {
        Side::Left
    }

    fn correct(&self, observations: &[Observation]) -> DropCorrection {
        let mut correction = DropCorrection {
            side: Side::Left,
            points: Vec::with_capacity(observations.len()),
            held: 0,
            replayed_spans: 0,
        };
        let Some((first, rest)) = observations.split_first() else {
            return correction;
        };

        correction.points.push((first.doy, first.value));
        let mut state = LeftState::Accepting;
        let mut accepted = first.value;
        let mut drop_start = first.value;

        for obs in rest {
            match state {
                LeftState::Holding if obs.value < drop_start * self.recovery_ratio => {
                    correction.points.push((obs.doy, accepted));
                    correction.held += 1;
                }
                LeftState::Holding => {
                    state = LeftState::Accepting;
                    accepted = obs.value;
                    drop_start = obs.value;
                    correction.points.push((obs.doy, accepted));
                }
                LeftState::Accepting => {
                    let decrease = if accepted != 0.0 {
                        (accepted - obs.value) / accepted
                    } else {
                        0.0
                    };
                    if decrease > self.threshold {
                        state = LeftState::Holding;
                        correction.held += 1;
                    } else {
                        accepted = obs.value;
                    }
                    correction.points.push((obs.doy, accepted));
                }
            }
        }
        correction
    }
}

/// Replays genuine decline on the descending flank
#[derive(Debug, Clone)]
pub struct RightDropRemover {
    /// A drop ends once a raw value reaches this fraction of the drop start
    pub recovery_ratio: f64,
}

impl Default for RightDropRemover {
    fn default() -> Self {
        Self { recovery_ratio: 0.80 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RightState {
    Following,
    /// Buffering from `span_start`; `drop_start` is the raw value before it
    Dropping { span_start: usize, drop_start: f64 },
}

impl DropRemover for RightDropRemover {
    fn side(&self) -> Side {
        Side::Right
    }

    fn correct(&self, observations: &[Observation]) -> DropCorrection {
        let mut correction = DropCorrection {
            side: Side::Right,
            points: Vec::with_capacity(observations.len()),
            held: 0,
            replayed_spans: 0,
        };
        let Some(first) = observations.first() else {
            return correction;
        };
        correction.points.push((first.doy, first.value));

        let emit = |points: &mut Vec<_>, span: &[Observation]| {
            points.extend(span.iter().map(|obs| (obs.doy, obs.value)));
        };

        let mut state = RightState::Following;
        for i in 1..observations.len() {
            let (previous, current) = (observations[i - 1].value, observations[i].value);
            match state {
                RightState::Following if current < previous => {
                    state = RightState::Dropping {
                        span_start: i,
                        drop_start: previous,
                    };
                }
                RightState::Following => emit(&mut correction.points, &observations[i..=i]),
                RightState::Dropping { span_start, drop_start } => {
                    if current >= previous || current >= drop_start * self.recovery_ratio {
                        emit(&mut correction.points, &observations[span_start..=i]);
                        correction.replayed_spans += 1;
                        state = RightState::Following;
                    }
                }
            }
        }

        // Unrecovered decline at the end of the season is real
        if let RightState::Dropping { span_start, .. } = state {
            emit(&mut correction.points, &observations[span_start..]);
        }
        correction
    }
}

/// Apply the drop policy that belongs to the segment's flank
pub fn remove_drops(segment: &Segment, config: &DropConfig) -> DropCorrection {
    let correction = match segment.side {
        Side::Left => LeftDropRemover {
            threshold: config.threshold,
            recovery_ratio: config.recovery_ratio,
        }
        .correct(&segment.observations),
        Side::Right => RightDropRemover {
            recovery_ratio: config.recovery_ratio,
        }
        .correct(&segment.observations),
    };
    debug!(
        side = %segment.side,
        points = correction.points.len(),
        held = correction.held,
        replayed = correction.replayed_spans,
        "drops removed"
    );
    correction
}
