//! Driving system: physics and lap counting for the local kart.

use hecs::{Entity, World};
use log::{debug, info};

use kart_core::components::Kart;
use kart_core::events::RaceEvent;
use kart_core::input::Controls;
use kart_core::types::Position;
use kart_track::{PathCurve, ProgressTracker};

use crate::laps::LapTracker;
use crate::physics::{self, KartTuning, StepOutcome};

/// Result of driving the local kart for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveOutcome {
    pub step: StepOutcome,
    pub lap_completed: bool,
    pub finished: bool,
}

/// Step the local kart and observe its new progress.
/// Returns `None` if the entity is missing its driving components.
pub fn run(
    world: &mut World,
    kart_entity: Entity,
    controls: &dyn Controls,
    curve: &PathCurve,
    tuning: &KartTuning,
    tick: u64,
    events: &mut Vec<RaceEvent>,
) -> Option<DriveOutcome> {
    let (kart, position, tracker, laps) = world
        .query_one_mut::<(&mut Kart, &mut Position, &mut ProgressTracker, &mut LapTracker)>(
            kart_entity,
        )
        .ok()?;

    let previous_t = tracker.t();
    let step = physics::step(kart, position, tracker, controls, curve, tuning);

    if !step.accepted {
        debug!(
            "{} bounced off the edge (lateral {:.2})",
            kart.id, step.track.lateral_distance
        );
        events.push(RaceEvent::WallBounce {
            kart: kart.id.clone(),
            speed: kart.speed,
        });
    }

    let lap_completed = laps.observe(previous_t, kart.progress);
    let finished = laps.is_finished();
    if lap_completed {
        info!(
            "{} completed lap {}/{}",
            kart.id,
            laps.laps_completed(),
            laps.total_laps()
        );
        events.push(RaceEvent::LapCompleted {
            kart: kart.id.clone(),
            lap: laps.laps_completed(),
        });
        if finished {
            events.push(RaceEvent::RaceFinished {
                kart: kart.id.clone(),
                tick,
            });
        }
    }

    Some(DriveOutcome {
        step,
        lap_completed,
        finished,
    })
}
