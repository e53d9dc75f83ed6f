//! Projectile integration: position += velocity each tick.

use hecs::World;

use kart_core::components::Projectile;
use kart_core::types::{Position, Velocity};

/// Move every projectile by its velocity. Hazards have zero velocity.
pub fn run(world: &mut World) {
    for (_entity, (pos, vel, _projectile)) in
        world.query_mut::<(&mut Position, &Velocity, &Projectile)>()
    {
        pos.x += vel.x;
        pos.y += vel.y;
        pos.z += vel.z;
    }
}
