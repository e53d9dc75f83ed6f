//! Snapshot system: queries the race world and builds a `RaceSnapshot`.
//!
//! This system is read-only. It never modifies the world.

use hecs::World;

use kart_core::components::*;
use kart_core::enums::*;
use kart_core::events::RaceEvent;
use kart_core::state::*;
use kart_core::types::{Position, SimTime, Velocity};

use crate::laps::LapTracker;

/// Build a complete snapshot from the current world state.
pub fn build_snapshot(
    world: &World,
    time: &SimTime,
    phase: GamePhase,
    events: Vec<RaceEvent>,
) -> RaceSnapshot {
    RaceSnapshot {
        time: *time,
        phase,
        karts: build_karts(world),
        item_boxes: build_item_boxes(world),
        projectiles: build_projectiles(world),
        local: build_local(world),
        events,
    }
}

/// Local kart first, then remote karts ordered by id.
fn build_karts(world: &World) -> Vec<KartView> {
    let mut karts: Vec<KartView> = world
        .query::<(&Kart, &Position)>()
        .iter()
        .map(|(_, (kart, pos))| KartView {
            id: kart.id.clone(),
            name: kart.name.clone(),
            color: kart.color,
            origin: kart.origin,
            position: *pos,
            heading: kart.heading,
            speed: kart.speed,
            progress: kart.progress,
        })
        .collect();
    karts.sort_by(|a, b| {
        let rank = |k: &KartView| k.origin != KartOrigin::Local;
        rank(a).cmp(&rank(b)).then_with(|| a.id.cmp(&b.id))
    });
    karts
}

fn build_item_boxes(world: &World) -> Vec<ItemBoxView> {
    let mut boxes: Vec<ItemBoxView> = world
        .query::<(&Position, &ItemBox)>()
        .iter()
        .map(|(_, (pos, item_box))| ItemBoxView {
            index: item_box.index,
            t: item_box.t,
            position: *pos,
            active: item_box.active,
        })
        .collect();
    boxes.sort_by_key(|b| b.index);
    boxes
}

fn build_projectiles(world: &World) -> Vec<ProjectileView> {
    let mut projectiles: Vec<(u64, ProjectileView)> = world
        .query::<(&Position, &Velocity, &Projectile)>()
        .iter()
        .map(|(_, (pos, vel, projectile))| {
            let view = ProjectileView {
                kind: projectile.kind,
                position: *pos,
                heading: if vel.is_zero() { 0.0 } else { vel.heading() },
                owner: projectile.owner.clone(),
            };
            (projectile.created_tick, view)
        })
        .collect();
    projectiles.sort_by_key(|(created, _)| *created);
    projectiles.into_iter().map(|(_, view)| view).collect()
}

fn build_local(world: &World) -> Option<LocalKartView> {
    let mut query = world.query::<(&LocalKart, &Kart, &LapTracker, &Inventory)>();
    let (_, (_, kart, laps, inventory)) = query.iter().next()?;
    Some(LocalKartView {
        id: kart.id.clone(),
        laps_completed: laps.laps_completed(),
        current_lap: laps.current_lap(),
        total_laps: laps.total_laps(),
        finished: laps.is_finished(),
        held_item: inventory.held,
        speed: kart.speed,
    })
}
