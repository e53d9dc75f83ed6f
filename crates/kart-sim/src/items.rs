//! Item economy: box pickups, timed respawns, item use and projectile hits.
//!
//! Only the local kart is checked against boxes and projectiles. Remote
//! participants run the same checks on their own instances.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use hecs::{Entity, World};
use log::debug;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use kart_core::components::*;
use kart_core::constants::*;
use kart_core::enums::*;
use kart_core::events::RaceEvent;
use kart_core::types::Position;

use crate::world_setup;

/// A pending box reactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScheduledRespawn {
    pub due_tick: u64,
    pub box_index: usize,
}

/// Box respawns waiting for their tick. Drained once per tick by the
/// engine, so only the frame loop ever flips a box back on.
#[derive(Debug, Clone, Default)]
pub struct RespawnQueue {
    pending: BinaryHeap<Reverse<ScheduledRespawn>>,
}

impl RespawnQueue {
    pub fn schedule(&mut self, box_index: usize, due_tick: u64) {
        self.pending.push(Reverse(ScheduledRespawn {
            due_tick,
            box_index,
        }));
    }

    /// Remove and return every respawn due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: u64) -> Vec<ScheduledRespawn> {
        let mut due = Vec::new();
        while let Some(Reverse(next)) = self.pending.peek() {
            if next.due_tick > now {
                break;
            }
            due.push(*next);
            self.pending.pop();
        }
        due
    }
}

/// Reactivate boxes whose respawn is due.
pub fn run_respawns(
    world: &mut World,
    queue: &mut RespawnQueue,
    now: u64,
    events: &mut Vec<RaceEvent>,
) {
    for due in queue.drain_due(now) {
        for (_entity, item_box) in world.query_mut::<&mut ItemBox>() {
            if item_box.index == due.box_index && !item_box.active {
                item_box.active = true;
                item_box.respawn_at_tick = None;
                events.push(RaceEvent::BoxRespawned {
                    box_index: item_box.index,
                });
            }
        }
    }
}

/// Collect every active box within reach of `kart_entity`.
///
/// Each collected box is deactivated and scheduled to respawn. An item
/// is drawn only while the kart's slot is empty.
pub fn check_pickups(
    world: &mut World,
    kart_entity: Entity,
    rng: &mut ChaCha8Rng,
    queue: &mut RespawnQueue,
    now: u64,
    events: &mut Vec<RaceEvent>,
) {
    let kart_pos = match world.get::<&Position>(kart_entity) {
        Ok(p) => *p,
        Err(_) => return,
    };

    let mut collected = Vec::new();
    for (_entity, (pos, item_box)) in world.query_mut::<(&Position, &mut ItemBox)>() {
        if item_box.active && pos.distance_to(&kart_pos) < ITEM_PICKUP_RADIUS {
            let due = now + ITEM_RESPAWN_TICKS;
            item_box.active = false;
            item_box.respawn_at_tick = Some(due);
            queue.schedule(item_box.index, due);
            collected.push(item_box.index);
        }
    }

    if collected.is_empty() {
        return;
    }

    let Ok(mut inventory) = world.get::<&mut Inventory>(kart_entity) else {
        return;
    };
    for box_index in collected {
        let item = if inventory.is_empty() {
            let drawn = ItemKind::ALL.choose(rng).copied();
            if let Some(kind) = drawn {
                inventory.acquire(kind);
            }
            drawn
        } else {
            None
        };
        debug!("box {box_index} collected, item {item:?}");
        events.push(RaceEvent::ItemPickedUp { box_index, item });
    }
}

/// Consume the held item of `kart_entity` and apply its effect.
/// Returns the item used, or `None` when the slot was empty.
pub fn use_item(
    world: &mut World,
    kart_entity: Entity,
    tick: u64,
    events: &mut Vec<RaceEvent>,
) -> Option<ItemKind> {
    let (item, kart_id, position, heading) = {
        let (kart, position, inventory) = world
            .query_one_mut::<(&mut Kart, &Position, &mut Inventory)>(kart_entity)
            .ok()?;
        let item = inventory.take()?;
        if item == ItemKind::Boost {
            kart.speed += BOOST_SPEED;
        }
        (item, kart.id.clone(), *position, kart.heading)
    };

    if let Some(kind) = item.projectile() {
        world_setup::spawn_projectile(world, kind, &position, heading, kart_id.clone(), tick);
    }

    debug!("{kart_id} used {item:?}");
    events.push(RaceEvent::ItemUsed {
        kart: kart_id,
        item,
    });
    Some(item)
}

/// Remove projectiles that hit `kart_entity` and apply their effect.
/// A kart's own projectiles never hit it.
pub fn check_projectile_hits(
    world: &mut World,
    kart_entity: Entity,
    despawn_buffer: &mut Vec<Entity>,
    events: &mut Vec<RaceEvent>,
) {
    despawn_buffer.clear();

    let (kart_id, kart_pos) = match world.query_one_mut::<(&Kart, &Position)>(kart_entity) {
        Ok((kart, pos)) => (kart.id.clone(), *pos),
        Err(_) => return,
    };

    let mut spin_out = false;
    for (entity, (pos, projectile)) in world.query_mut::<(&Position, &Projectile)>() {
        if projectile.owner == kart_id || pos.distance_to(&kart_pos) >= PROJECTILE_HIT_RADIUS {
            continue;
        }
        despawn_buffer.push(entity);
        spin_out |= projectile.kind.spins_out();
        events.push(RaceEvent::SpunOut {
            kart: kart_id.clone(),
            kind: projectile.kind,
            owner: projectile.owner.clone(),
        });
    }

    if spin_out {
        if let Ok(mut kart) = world.get::<&mut Kart>(kart_entity) {
            kart.speed = 0.0;
        }
    }

    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
}
