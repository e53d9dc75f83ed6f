//! Demo driver for headless runs.
//!
//! Chases a point a little way ahead on the centre line and fires any held
//! item straight away. Pure functions over the last snapshot, no ECS access.

use std::f64::consts::{PI, TAU};

use kart_core::enums::Action;
use kart_core::input::InputState;
use kart_core::state::RaceSnapshot;
use kart_track::PathCurve;

/// Progress ahead of the kart to aim at.
const LOOKAHEAD: f64 = 0.03;
/// Heading error (radians) tolerated before steering.
const STEER_DEAD_ZONE: f64 = 0.02;

#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    /// Whether UseItem was held last frame; item use needs a fresh press.
    use_pressed: bool,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide the held actions for the next frame.
    pub fn decide(&mut self, curve: &PathCurve, snapshot: &RaceSnapshot) -> InputState {
        let mut input = InputState::new();
        let Some(local) = &snapshot.local else {
            return input;
        };
        if local.finished {
            return input;
        }
        let Some(kart) = snapshot.karts.iter().find(|k| k.id == local.id) else {
            return input;
        };

        let target = curve.point_at(kart.progress + LOOKAHEAD);
        let desired = (target.x - kart.position.x).atan2(target.z - kart.position.z);
        let error = wrap_angle(desired - kart.heading);

        input.press(Action::Accelerate);
        // Positive heading change turns left.
        input.set(Action::SteerLeft, error > STEER_DEAD_ZONE);
        input.set(Action::SteerRight, error < -STEER_DEAD_ZONE);

        let use_item = local.held_item.is_some() && !self.use_pressed;
        input.set(Action::UseItem, use_item);
        self.use_pressed = use_item;

        input
    }
}

/// Wrap an angle into [-PI, PI).
fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}
