//! Events emitted by the simulation and received from the network.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::KartId;

/// Race events for HUD and audio collaborators, drained into each snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RaceEvent {
    /// A lap was completed. `lap` counts completed laps.
    LapCompleted { kart: KartId, lap: u32 },
    /// The local kart completed the final lap.
    RaceFinished { kart: KartId, tick: u64 },
    /// A box was collected. `item` is `None` when the slot was already full.
    ItemPickedUp {
        box_index: usize,
        item: Option<ItemKind>,
    },
    ItemUsed { kart: KartId, item: ItemKind },
    /// The local kart ran into someone else's projectile.
    SpunOut {
        kart: KartId,
        kind: ProjectileKind,
        owner: KartId,
    },
    BoxRespawned { box_index: usize },
    /// A move was rejected at the track edge.
    WallBounce { kart: KartId, speed: f64 },
}

/// Latest known state of a remote participant, as mirrored from its
/// presence record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteKartState {
    pub id: KartId,
    pub name: String,
    pub color: u32,
    pub x: f64,
    pub z: f64,
    pub angle: f64,
    pub speed: f64,
}

/// Motion fields of the local kart, published to the presence store each
/// frame while connected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KartMotion {
    pub x: f64,
    pub z: f64,
    pub angle: f64,
    pub speed: f64,
}

/// Remote presence change delivered to the frame loop. Events originating
/// from the local participant never appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PresenceEvent {
    Joined(RemoteKartState),
    Updated(RemoteKartState),
    Left { id: KartId },
}

impl PresenceEvent {
    /// Identity the event refers to.
    pub fn kart_id(&self) -> &KartId {
        match self {
            PresenceEvent::Joined(state) | PresenceEvent::Updated(state) => &state.id,
            PresenceEvent::Left { id } => id,
        }
    }
}
