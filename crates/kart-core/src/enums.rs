//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Item a kart can hold in its single inventory slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Instant speed increase.
    Boost,
    /// Projectile fired forward along the kart's heading.
    Shell,
    /// Stationary trap dropped behind the kart.
    Hazard,
}

impl ItemKind {
    /// Every kind an item box can hand out.
    pub const ALL: [ItemKind; 3] = [ItemKind::Boost, ItemKind::Shell, ItemKind::Hazard];

    /// Projectile produced when this item is used, if any.
    pub fn projectile(self) -> Option<ProjectileKind> {
        match self {
            ItemKind::Boost => None,
            ItemKind::Shell => Some(ProjectileKind::Shell),
            ItemKind::Hazard => Some(ProjectileKind::Hazard),
        }
    }
}

/// Entity left in the world by using an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Moves at constant velocity until it hits something or leaves the arena.
    Shell,
    /// Sits still until a kart runs into it.
    Hazard,
}

impl ProjectileKind {
    /// Whether hitting this projectile stops the victim dead.
    pub fn spins_out(self) -> bool {
        matches!(self, ProjectileKind::Shell | ProjectileKind::Hazard)
    }
}

impl From<ProjectileKind> for ItemKind {
    fn from(kind: ProjectileKind) -> Self {
        match kind {
            ProjectileKind::Shell => ItemKind::Shell,
            ProjectileKind::Hazard => ItemKind::Hazard,
        }
    }
}

/// Where a kart's state comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KartOrigin {
    /// Simulated by this instance's physics.
    #[default]
    Local,
    /// Mirrored from presence updates.
    Remote,
}

/// Race lifecycle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No race yet; waiting for `StartRace`.
    #[default]
    Lobby,
    Racing,
    Paused,
    /// Local kart completed every lap.
    Finished,
}

/// Named input actions the simulation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Accelerate,
    Brake,
    SteerLeft,
    SteerRight,
    UseItem,
}
