//! State shared between the application shell and the game loop thread.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use kart_core::commands::PlayerCommand;
use kart_core::input::InputState;
use kart_core::state::RaceSnapshot;

/// Commands sent from the shell to the game loop thread.
#[derive(Debug)]
pub enum GameLoopCommand {
    /// A player command to forward to the simulation engine.
    PlayerCommand(PlayerCommand),
    /// Replace the currently held driving input.
    Controls(InputState),
    /// Shut down the game loop thread gracefully.
    Shutdown,
}

/// Shared application state.
///
/// `mpsc::Sender` is not `Sync`, so it sits behind a `Mutex`. The latest
/// snapshot is shared with the game loop thread through an `Arc`.
pub struct AppState {
    /// `None` until the game loop has been started.
    pub command_tx: Mutex<Option<mpsc::Sender<GameLoopCommand>>>,
    /// Updated by the game loop thread after each tick.
    pub latest_snapshot: Arc<Mutex<Option<RaceSnapshot>>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            command_tx: Mutex::new(None),
            latest_snapshot: Arc::new(Mutex::new(None)),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward `command` to the game loop. Returns false if the loop is
    /// not running.
    pub fn send(&self, command: GameLoopCommand) -> bool {
        match self.command_tx.lock() {
            Ok(tx) => tx.as_ref().is_some_and(|tx| tx.send(command).is_ok()),
            Err(_) => false,
        }
    }

    /// Copy of the most recent snapshot.
    pub fn snapshot(&self) -> Option<RaceSnapshot> {
        self.latest_snapshot.lock().ok().and_then(|s| s.clone())
    }
}
