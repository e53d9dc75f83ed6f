//! Input capability consumed by the simulation.
//!
//! Raw device handling lives outside the core. The simulation only asks
//! whether a named action is currently held.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::enums::Action;

/// Queryable held-state of named actions.
pub trait Controls {
    fn is_held(&self, action: Action) -> bool;
}

/// A plain set of held actions. Useful for scripted input and as the
/// payload forwarded from an input layer to the game loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    held: HashSet<Action>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper: mark `action` as held.
    pub fn with(mut self, action: Action) -> Self {
        self.held.insert(action);
        self
    }

    pub fn press(&mut self, action: Action) {
        self.held.insert(action);
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(&action);
    }

    pub fn set(&mut self, action: Action, held: bool) {
        if held {
            self.press(action);
        } else {
            self.release(action);
        }
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}

impl Controls for InputState {
    fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }
}

impl<C: Controls + ?Sized> Controls for &C {
    fn is_held(&self, action: Action) -> bool {
        (**self).is_held(action)
    }
}
