//! Race state snapshot: everything a renderer or HUD needs after each tick.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::events::RaceEvent;
use crate::types::{KartId, Position, SimTime};

/// Complete visible state produced after each tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub time: SimTime,
    pub phase: GamePhase,
    pub karts: Vec<KartView>,
    pub item_boxes: Vec<ItemBoxView>,
    pub projectiles: Vec<ProjectileView>,
    /// HUD data for the local kart; `None` before the race starts.
    pub local: Option<LocalKartView>,
    pub events: Vec<RaceEvent>,
}

/// A kart transform for drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KartView {
    pub id: KartId,
    pub name: String,
    pub color: u32,
    pub origin: KartOrigin,
    pub position: Position,
    /// Yaw in radians (0 = +z).
    pub heading: f64,
    pub speed: f64,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemBoxView {
    pub index: usize,
    /// Progress value along the track where the box sits.
    pub t: f64,
    pub position: Position,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub kind: ProjectileKind,
    pub position: Position,
    /// Direction of travel; 0 for stationary hazards.
    pub heading: f64,
    pub owner: KartId,
}

/// Lap counter, inventory and speed of the local kart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalKartView {
    pub id: KartId,
    pub laps_completed: u32,
    /// Lap being driven, 1-based (shown as "Lap: n/total").
    pub current_lap: u32,
    pub total_laps: u32,
    pub finished: bool,
    pub held_item: Option<ItemKind>,
    pub speed: f64,
}
