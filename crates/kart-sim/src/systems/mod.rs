//! ECS systems that operate on the race world each tick.
//!
//! Systems are plain functions over `&mut World` (or `&World` for read-only).
//! Cross-tick state they need is passed in explicitly by the engine.

pub mod cleanup;
pub mod driving;
pub mod movement;
pub mod remote;
pub mod snapshot;
