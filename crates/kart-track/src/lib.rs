//! Track geometry for the kart simulation.
//!
//! A closed centripetal Catmull-Rom centre line, arc-length parameterised,
//! plus curve-relative progress estimation for karts driving along it.

pub use kart_core as core;

pub mod curve;
pub mod progress;

// Re-export key types for convenience.
pub use curve::{CurveError, PathCurve};
pub use progress::{estimate, estimate_full, estimate_window, ProgressTracker, TrackState};

/// Wrap a progress value into [0, 1).
pub fn wrap_progress(t: f64) -> f64 {
    let wrapped = t.rem_euclid(1.0);
    // rem_euclid can round tiny negatives up to exactly 1.0
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}
