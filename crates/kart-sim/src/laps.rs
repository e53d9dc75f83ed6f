//! Lap counting from the progress sequence.

use serde::{Deserialize, Serialize};

use kart_core::constants::*;

/// True when progress wrapped forward past the seam in one step.
pub fn crosses_seam(previous_t: f64, current_t: f64) -> bool {
    previous_t > LAP_SEAM_HIGH && current_t < LAP_SEAM_LOW
}

/// True when progress wrapped backward past the seam (driving the wrong way).
fn crosses_seam_backward(previous_t: f64, current_t: f64) -> bool {
    previous_t < LAP_SEAM_LOW && current_t > LAP_SEAM_HIGH
}

/// Per-kart lap counter.
///
/// Progress jitters near the seam, so a raw edge detector can fire more
/// than once per crossing. The tracker only counts a forward crossing
/// while armed; counting or reversing over the seam disarms it, and
/// driving through the middle of the lap arms it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapTracker {
    laps_completed: u32,
    total_laps: u32,
    armed: bool,
}

impl LapTracker {
    pub fn new(total_laps: u32) -> Self {
        Self {
            laps_completed: 0,
            total_laps,
            armed: true,
        }
    }

    /// Feed one progress step. Returns true if a lap was completed.
    pub fn observe(&mut self, previous_t: f64, current_t: f64) -> bool {
        let (band_low, band_high) = LAP_REARM_BAND;
        if (band_low..=band_high).contains(&current_t) {
            self.armed = true;
        }

        if crosses_seam(previous_t, current_t) {
            if self.armed {
                self.armed = false;
                self.laps_completed += 1;
                return true;
            }
        } else if crosses_seam_backward(previous_t, current_t) {
            self.armed = false;
        }
        false
    }

    pub fn laps_completed(&self) -> u32 {
        self.laps_completed
    }

    pub fn total_laps(&self) -> u32 {
        self.total_laps
    }

    /// Lap currently being driven, 1-based, capped at the total.
    pub fn current_lap(&self) -> u32 {
        (self.laps_completed + 1).min(self.total_laps.max(1))
    }

    pub fn is_finished(&self) -> bool {
        self.laps_completed >= self.total_laps
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
