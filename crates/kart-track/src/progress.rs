//! Curve-relative progress estimation.
//!
//! `estimate` searches a narrow window of the curve around the previous
//! progress value. Karts move continuously, so t changes little between
//! ticks and a window of a tenth of the loop is enough. `ProgressTracker`
//! carries that previous value for one kart and falls back to a full-loop
//! search when the window clearly missed (teleports, erratic updates).

use log::debug;
use serde::{Deserialize, Serialize};

use kart_core::constants::*;
use kart_core::types::Position;

use crate::curve::PathCurve;
use crate::wrap_progress;

/// Result of a progress query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackState {
    /// Progress parameter of the nearest sampled curve point, in [0, 1).
    pub t: f64,
    /// Planar distance from the queried position to `curve_point`.
    pub lateral_distance: f64,
    pub curve_point: Position,
}

/// Nearest sampled point within the default window around `last_t`.
pub fn estimate(curve: &PathCurve, position: &Position, last_t: f64) -> TrackState {
    estimate_window(curve, position, last_t, PROGRESS_SAMPLES, PROGRESS_WINDOW)
}

/// Nearest point among `samples` evenly spaced values in a window of
/// `width` centred on `center`. The window wraps at the seam. Height is
/// ignored.
pub fn estimate_window(
    curve: &PathCurve,
    position: &Position,
    center: f64,
    samples: usize,
    width: f64,
) -> TrackState {
    let samples = samples.max(1);
    let half = (samples / 2) as isize;
    let start = -half;
    let end = samples as isize - half;

    best_of(
        curve,
        position,
        (start..end).map(|i| center + (i as f64 / samples as f64) * width),
    )
}

/// Nearest point among `samples` values spread over the whole loop.
pub fn estimate_full(curve: &PathCurve, position: &Position, samples: usize) -> TrackState {
    let samples = samples.max(1);
    best_of(
        curve,
        position,
        (0..samples).map(|i| i as f64 / samples as f64),
    )
}

fn best_of(
    curve: &PathCurve,
    position: &Position,
    candidates: impl Iterator<Item = f64>,
) -> TrackState {
    let mut best = TrackState {
        t: 0.0,
        lateral_distance: f64::INFINITY,
        curve_point: Position::default(),
    };
    for raw_t in candidates {
        let t = wrap_progress(raw_t);
        let point = curve.point_at(t);
        let distance = position.planar_distance_to(&point);
        if distance < best.lateral_distance {
            best = TrackState {
                t,
                lateral_distance: distance,
                curve_point: point,
            };
        }
    }
    best
}

/// Progress state for one kart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressTracker {
    last_t: f64,
    /// False until the tracker has a trustworthy `last_t`.
    seeded: bool,
    resync_distance: f64,
    resyncs: u32,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    /// A tracker with no known progress. The first update searches the whole loop.
    pub fn new() -> Self {
        Self {
            last_t: 0.0,
            seeded: false,
            resync_distance: PROGRESS_RESYNC_DISTANCE,
            resyncs: 0,
        }
    }

    /// A tracker that already knows the kart is at `t`.
    pub fn starting_at(t: f64) -> Self {
        Self {
            last_t: wrap_progress(t),
            seeded: true,
            ..Self::new()
        }
    }

    /// Distance past which a windowed result triggers a full-loop search.
    pub fn with_resync_distance(mut self, distance: f64) -> Self {
        self.resync_distance = distance;
        self
    }

    pub fn resync_distance(&self) -> f64 {
        self.resync_distance
    }

    /// Last known progress.
    pub fn t(&self) -> f64 {
        self.last_t
    }

    /// Number of full-loop searches that changed the answer.
    pub fn resync_count(&self) -> u32 {
        self.resyncs
    }

    /// Forget the current estimate and pin progress to `t`.
    pub fn reset(&mut self, t: f64) {
        self.last_t = wrap_progress(t);
        self.seeded = true;
    }

    /// Estimate progress for `position` and remember the result.
    pub fn update(&mut self, curve: &PathCurve, position: &Position) -> TrackState {
        let mut state = estimate(curve, position, self.last_t);

        if !self.seeded || state.lateral_distance > self.resync_distance {
            let coarse = estimate_full(curve, position, PROGRESS_RESYNC_SAMPLES);
            let refined = estimate_window(
                curve,
                position,
                coarse.t,
                PROGRESS_SAMPLES,
                2.0 / PROGRESS_RESYNC_SAMPLES as f64,
            );
            if refined.lateral_distance < state.lateral_distance {
                debug!(
                    "progress resync: t {:.4} -> {:.4} (lateral {:.2} -> {:.2})",
                    state.t, refined.t, state.lateral_distance, refined.lateral_distance
                );
                self.resyncs += 1;
                state = refined;
            }
            self.seeded = true;
        }

        self.last_t = state.t;
        state
    }
}
