//! ECS components for hecs entities.
//!
//! Components are plain data. `Inventory` additionally enforces the
//! one-item slot; everything else about the race lives in systems.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::KartId;

/// A kart on the track. Paired with `Position` on the same entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kart {
    pub id: KartId,
    pub name: String,
    /// 24-bit RGB colour used by the renderer.
    pub color: u32,
    /// Heading in radians. 0 faces +z, increasing toward +x.
    pub heading: f64,
    /// Signed scalar speed in world units per tick (negative = reversing).
    pub speed: f64,
    /// Progress parameter along the track, always in [0, 1).
    pub progress: f64,
    pub origin: KartOrigin,
}

/// Marker for the single locally simulated kart.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalKart;

/// One-slot item inventory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub held: Option<ItemKind>,
}

impl Inventory {
    /// Store `kind` if the slot is empty. Returns whether it was stored.
    pub fn acquire(&mut self, kind: ItemKind) -> bool {
        if self.held.is_some() {
            return false;
        }
        self.held = Some(kind);
        true
    }

    /// Empty the slot, returning what was held.
    pub fn take(&mut self) -> Option<ItemKind> {
        self.held.take()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_none()
    }
}

/// A stationary item box. Never despawned, only toggled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemBox {
    /// Stable index, matching `ITEM_BOX_LOCATIONS`.
    pub index: usize,
    /// Progress value the box was placed at.
    pub t: f64,
    pub active: bool,
    /// Tick at which a collected box becomes active again.
    pub respawn_at_tick: Option<u64>,
}

/// A shell or hazard left in the world by an item use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub kind: ProjectileKind,
    /// Kart that used the item. Never hit by its own projectile.
    pub owner: KartId,
    pub created_tick: u64,
}
