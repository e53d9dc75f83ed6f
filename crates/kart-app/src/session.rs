//! One racing client: a simulation engine plus its network presence.

use log::{info, warn};

use kart_core::commands::PlayerCommand;
use kart_core::input::Controls;
use kart_core::state::RaceSnapshot;
use kart_net::{NetError, NetworkSync};
use kart_sim::{SimConfig, SimulationEngine};

use crate::config::AppConfig;

pub struct RaceSession {
    engine: SimulationEngine,
    net: NetworkSync,
}

impl RaceSession {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_network(config.sim.clone(), NetworkSync::new(&config.backend))
    }

    pub fn with_network(sim: SimConfig, net: NetworkSync) -> Self {
        Self {
            engine: SimulationEngine::new(sim),
            net,
        }
    }

    /// Join `room` and queue the race start. Failing to join is not fatal;
    /// the race then runs offline under the default local identity.
    pub fn start(&mut self, room: &str, name: &str, color: u32) {
        match self.net.join(room, name, color) {
            Ok(id) => self
                .engine
                .queue_command(PlayerCommand::SetLocalIdentity { id }),
            Err(NetError::Offline) => info!("offline, racing alone"),
            Err(e) => warn!("could not join room {room}: {e}; racing alone"),
        }
        self.engine.queue_command(PlayerCommand::StartRace {
            name: name.to_string(),
            color,
        });
    }

    pub fn queue_command(&mut self, command: PlayerCommand) {
        self.engine.queue_command(command);
    }

    /// Run one frame: apply remote changes, step the engine, then publish
    /// the local kart.
    pub fn frame(&mut self, controls: &dyn Controls) -> RaceSnapshot {
        for event in self.net.poll() {
            self.engine.apply_presence(&event);
        }

        let snapshot = self.engine.tick(controls);

        if let Some(motion) = self.engine.local_motion() {
            self.net.publish(&motion);
        }
        snapshot
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn network(&self) -> &NetworkSync {
        &self.net
    }

    /// Leave the room explicitly.
    pub fn leave(&mut self) {
        self.net.leave();
    }
}
