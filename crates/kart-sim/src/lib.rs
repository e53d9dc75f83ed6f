//! Simulation engine for the kart race.
//!
//! Owns the hecs ECS world, runs systems once per frame,
//! and produces `RaceSnapshot`s for the renderer and HUD.

pub mod engine;
pub mod items;
pub mod laps;
pub mod physics;
pub mod systems;
pub mod world_setup;

pub use kart_core as core;
pub use engine::{SimConfig, SimulationEngine};

#[cfg(test)]
mod tests;
