//! Cleanup system: removes shells that have left the arena.

use hecs::{Entity, World};

use kart_core::components::Projectile;
use kart_core::constants::SHELL_DESPAWN_RADIUS;
use kart_core::enums::ProjectileKind;
use kart_core::types::Position;

/// Remove shells further than `SHELL_DESPAWN_RADIUS` from the world origin.
///
/// Distance is measured from the origin, not along the track, so a shell
/// circling near the middle of the map is never collected. Hazards are
/// only ever removed by being hit.
pub fn run(world: &mut World, despawn_buffer: &mut Vec<Entity>) {
    despawn_buffer.clear();

    for (entity, (pos, projectile)) in world.query_mut::<(&Position, &Projectile)>() {
        if projectile.kind == ProjectileKind::Shell && pos.length() > SHELL_DESPAWN_RADIUS {
            despawn_buffer.push(entity);
        }
    }

    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
}
