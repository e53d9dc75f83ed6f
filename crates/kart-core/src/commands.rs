//! Player commands sent from the shell around the simulation.
//!
//! Commands are queued and processed at the next tick boundary. Held
//! driving input is not a command; it is read through `Controls` each tick.

use serde::{Deserialize, Serialize};

use crate::types::KartId;

/// All discrete player actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerCommand {
    // --- Race lifecycle ---
    /// Spawn the local kart at the start line and begin racing.
    StartRace { name: String, color: u32 },
    /// Pause the simulation.
    Pause,
    /// Resume the simulation.
    Resume,

    // --- Items ---
    /// Use whatever the local kart is holding.
    UseItem,

    // --- Networking ---
    /// Adopt a network-assigned identity for the local kart.
    SetLocalIdentity { id: KartId },
}
