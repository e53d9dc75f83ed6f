//! Remote kart mirroring from presence events.
//!
//! Remote transforms are written directly from each update. There is no
//! physics, prediction or interpolation for them.

use hecs::{Entity, World};
use log::{debug, info, warn};

use kart_core::components::Kart;
use kart_core::constants::KART_GROUND_OFFSET;
use kart_core::enums::KartOrigin;
use kart_core::events::{PresenceEvent, RemoteKartState};
use kart_core::types::{KartId, Position};

use crate::world_setup;

/// Apply one presence event to the world.
pub fn apply(world: &mut World, event: &PresenceEvent) {
    match event {
        PresenceEvent::Joined(state) => {
            if find_kart(world, &state.id).is_none() {
                info!("{} ({}) joined", state.id, state.name);
                world_setup::spawn_remote_kart(world, state);
            }
        }
        PresenceEvent::Updated(state) => match find_kart(world, &state.id) {
            Some((entity, KartOrigin::Remote)) => update_kart(world, entity, state),
            Some((_, KartOrigin::Local)) => {
                warn!("ignoring presence update that targets the local kart {}", state.id);
            }
            None => {
                // Missed the join; create it now.
                debug!("update for unknown kart {}, spawning", state.id);
                world_setup::spawn_remote_kart(world, state);
            }
        },
        PresenceEvent::Left { id } => {
            if let Some((entity, KartOrigin::Remote)) = find_kart(world, id) {
                info!("{id} left");
                let _ = world.despawn(entity);
            }
        }
    }
}

fn find_kart(world: &World, id: &KartId) -> Option<(Entity, KartOrigin)> {
    world
        .query::<&Kart>()
        .iter()
        .find(|(_, kart)| &kart.id == id)
        .map(|(entity, kart)| (entity, kart.origin))
}

fn update_kart(world: &mut World, entity: Entity, state: &RemoteKartState) {
    if let Ok((kart, pos)) = world.query_one_mut::<(&mut Kart, &mut Position)>(entity) {
        *pos = Position::new(state.x, KART_GROUND_OFFSET, state.z);
        kart.heading = state.angle;
        kart.speed = state.speed;
    }
}
