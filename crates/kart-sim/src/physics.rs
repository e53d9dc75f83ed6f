//! Kart physics: one frame of driving for the local kart.
//!
//! Operates on plain data rather than the ECS so it can be exercised
//! directly. Values are per tick; there is no dt scaling.

use serde::{Deserialize, Serialize};

use kart_core::components::Kart;
use kart_core::constants::*;
use kart_core::enums::Action;
use kart_core::input::Controls;
use kart_core::types::Position;
use kart_track::{PathCurve, ProgressTracker, TrackState};

/// Driving parameters. Defaults reproduce the stock kart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KartTuning {
    pub acceleration: f64,
    pub friction: f64,
    pub turn_speed: f64,
    pub steer_min_speed: f64,
    /// Lateral distance at which a move is rejected.
    pub track_half_width: f64,
    pub bounce: f64,
    /// Optional speed clamp, applied by magnitude. `None` or a non-finite
    /// value leaves speed unbounded.
    pub max_speed: Option<f64>,
}

impl Default for KartTuning {
    fn default() -> Self {
        Self {
            acceleration: KART_ACCELERATION,
            friction: KART_FRICTION,
            turn_speed: KART_TURN_SPEED,
            steer_min_speed: KART_STEER_MIN_SPEED,
            track_half_width: TRACK_HALF_WIDTH,
            bounce: KART_BOUNCE,
            max_speed: None,
        }
    }
}

/// What happened during one physics step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Progress query for the candidate position.
    pub track: TrackState,
    /// Whether the candidate move was inside the track.
    pub accepted: bool,
    /// Speed the move was attempted with (after acceleration and friction).
    pub attempted_speed: f64,
}

/// Advance one kart by a single tick.
///
/// Progress is updated from the candidate position whether or not the
/// move is accepted. A rejected move leaves position and heading as they
/// were and bounces speed back by `-bounce`.
pub fn step(
    kart: &mut Kart,
    position: &mut Position,
    tracker: &mut ProgressTracker,
    controls: &dyn Controls,
    curve: &PathCurve,
    tuning: &KartTuning,
) -> StepOutcome {
    // 1. Throttle
    if controls.is_held(Action::Accelerate) {
        kart.speed += tuning.acceleration;
    } else if controls.is_held(Action::Brake) {
        kart.speed -= tuning.acceleration;
    }

    // 2. Friction, every tick
    kart.speed *= tuning.friction;
    if let Some(max) = tuning.max_speed.filter(|m| m.is_finite()) {
        let max = max.abs();
        kart.speed = kart.speed.clamp(-max, max);
    }

    // 3. Steering; reversing flips the turn direction
    let prior_heading = kart.heading;
    if kart.speed.abs() > tuning.steer_min_speed {
        let direction = kart.speed.signum();
        if controls.is_held(Action::SteerLeft) {
            kart.heading += tuning.turn_speed * direction;
        }
        if controls.is_held(Action::SteerRight) {
            kart.heading -= tuning.turn_speed * direction;
        }
    }

    // 4. Candidate move
    let candidate = position.offset_along(kart.heading, kart.speed);

    // 5. Progress follows the candidate regardless of the collision result
    let track = tracker.update(curve, &candidate);
    kart.progress = track.t;

    // 6. Boundary collision
    let attempted_speed = kart.speed;
    let accepted = track.lateral_distance < tuning.track_half_width;
    if accepted {
        *position = candidate;
    } else {
        kart.heading = prior_heading;
        kart.speed *= -tuning.bounce;
    }

    StepOutcome {
        track,
        accepted,
        attempted_speed,
    }
}
