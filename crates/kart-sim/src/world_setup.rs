//! Entity spawn factories for setting up the race world.
//!
//! Creates item boxes, the local kart, mirrored remote karts and
//! projectiles with appropriate component bundles.

use hecs::World;

use kart_core::components::*;
use kart_core::constants::*;
use kart_core::enums::*;
use kart_core::events::RemoteKartState;
use kart_core::types::{KartId, Position, Velocity};
use kart_track::{PathCurve, ProgressTracker};

use crate::laps::LapTracker;
use crate::physics::KartTuning;

/// Place one item box at each fixed progress location.
pub fn spawn_item_boxes(world: &mut World, curve: &PathCurve) -> Vec<hecs::Entity> {
    ITEM_BOX_LOCATIONS
        .iter()
        .enumerate()
        .map(|(index, &t)| {
            let on_curve = curve.point_at(t);
            let position = Position::new(on_curve.x, ITEM_BOX_HEIGHT, on_curve.z);
            world.spawn((
                position,
                ItemBox {
                    index,
                    t,
                    active: true,
                    respawn_at_tick: None,
                },
            ))
        })
        .collect()
}

/// Spawn the locally driven kart at the start line.
///
/// The progress tracker resyncs once the kart strays twice the tuned
/// half-width from the centre line.
pub fn spawn_local_kart(
    world: &mut World,
    curve: &PathCurve,
    id: KartId,
    name: String,
    color: u32,
    total_laps: u32,
    tuning: &KartTuning,
) -> hecs::Entity {
    let spawn = curve.spawn_point(0.0);
    let kart = Kart {
        id,
        name,
        color,
        heading: 0.0,
        speed: 0.0,
        progress: 0.0,
        origin: KartOrigin::Local,
    };

    world.spawn((
        LocalKart,
        kart,
        Position::new(spawn.x, KART_GROUND_OFFSET, spawn.z),
        Inventory::default(),
        ProgressTracker::starting_at(0.0).with_resync_distance(tuning.track_half_width * 2.0),
        LapTracker::new(total_laps),
    ))
}

/// Spawn a kart mirrored from a remote participant.
pub fn spawn_remote_kart(world: &mut World, state: &RemoteKartState) -> hecs::Entity {
    let kart = Kart {
        id: state.id.clone(),
        name: state.name.clone(),
        color: state.color,
        heading: state.angle,
        speed: state.speed,
        progress: 0.0,
        origin: KartOrigin::Remote,
    };
    world.spawn((kart, Position::new(state.x, KART_GROUND_OFFSET, state.z)))
}

/// Spawn a shell or hazard produced by `owner` using an item.
pub fn spawn_projectile(
    world: &mut World,
    kind: ProjectileKind,
    kart_position: &Position,
    heading: f64,
    owner: KartId,
    tick: u64,
) -> hecs::Entity {
    let (origin, velocity) = match kind {
        ProjectileKind::Shell => (*kart_position, Velocity::along_heading(heading, SHELL_SPEED)),
        ProjectileKind::Hazard => (
            kart_position.offset_along(heading, -HAZARD_DROP_OFFSET),
            Velocity::default(),
        ),
    };
    let position = Position::new(origin.x, PROJECTILE_HEIGHT, origin.z);

    world.spawn((
        position,
        velocity,
        Projectile {
            kind,
            owner,
            created_tick: tick,
        },
    ))
}
