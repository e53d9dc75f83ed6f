//! Headless kart race application.
//!
//! Wires the simulation engine and presence networking together behind a
//! fixed-rate game loop thread. Rendering and input capture live outside
//! this crate; they talk to the loop through `GameLoopCommand`s and read
//! back the latest `RaceSnapshot`.

pub mod autopilot;
pub mod config;
pub mod game_loop;
pub mod logging;
pub mod session;
pub mod state;

pub use kart_core as core;
