//! Fundamental geometric and simulation types.

use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// 3D position in world space.
/// x and z span the ground plane, y is up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// 3D velocity in world units per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

/// Identity of a kart. Local karts start as `"local"` and take the
/// network-assigned player id once a room is joined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KartId(pub String);

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another position (3D).
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Distance on the ground plane, ignoring height.
    pub fn planar_distance_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Distance from the world origin (3D).
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Offset this position along a heading on the ground plane.
    /// Heading 0 points along +z, increasing toward +x.
    pub fn offset_along(&self, heading: f64, distance: f64) -> Position {
        Position::new(
            self.x + heading.sin() * distance,
            self.y,
            self.z + heading.cos() * distance,
        )
    }
}

impl From<DVec3> for Position {
    fn from(v: DVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Position> for DVec3 {
    fn from(p: Position) -> Self {
        DVec3::new(p.x, p.y, p.z)
    }
}

impl Velocity {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Ground-plane velocity of magnitude `speed` along `heading`.
    pub fn along_heading(heading: f64, speed: f64) -> Self {
        Self::new(heading.sin() * speed, 0.0, heading.cos() * speed)
    }

    /// Speed magnitude.
    pub fn speed(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Heading on the ground plane (0 = +z, toward +x positive).
    pub fn heading(&self) -> f64 {
        self.x.atan2(self.z)
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

impl SimTime {
    /// Seconds per tick at the default tick rate.
    pub fn dt(&self) -> f64 {
        crate::constants::DT
    }

    /// Advance by one tick.
    pub fn advance(&mut self) {
        self.tick += 1;
        self.elapsed_secs += self.dt();
    }
}

impl KartId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identity used by the local kart before it joins a room.
    pub fn local() -> Self {
        Self(crate::constants::LOCAL_KART_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KartId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
