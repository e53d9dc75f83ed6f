//! Simulation engine for one racing instance.
//!
//! `SimulationEngine` owns the hecs world and the track, processes player
//! commands, runs all systems once per frame and produces `RaceSnapshot`s.
//! It never touches the network; remote state arrives as `PresenceEvent`s
//! and the local kart's motion is read back through `local_motion()`.

use std::collections::VecDeque;

use hecs::{Entity, World};
use log::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use kart_core::commands::PlayerCommand;
use kart_core::components::{Inventory, ItemBox, Kart, Projectile};
use kart_core::constants::*;
use kart_core::enums::{Action, GamePhase};
use kart_core::events::{KartMotion, PresenceEvent, RaceEvent};
use kart_core::input::Controls;
use kart_core::state::RaceSnapshot;
use kart_core::types::{KartId, Position, SimTime};
use kart_track::{PathCurve, ProgressTracker};

use crate::items::{self, RespawnQueue};
use crate::laps::LapTracker;
use crate::physics::KartTuning;
use crate::systems;
use crate::world_setup;

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    pub total_laps: u32,
    pub tuning: KartTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            total_laps: DEFAULT_TOTAL_LAPS,
            tuning: KartTuning::default(),
        }
    }
}

/// The simulation engine. Owns the ECS world and all sim state.
pub struct SimulationEngine {
    world: World,
    curve: PathCurve,
    time: SimTime,
    phase: GamePhase,
    rng: ChaCha8Rng,
    total_laps: u32,
    tuning: KartTuning,
    local_id: KartId,
    local_entity: Option<Entity>,
    command_queue: VecDeque<PlayerCommand>,
    respawns: RespawnQueue,
    despawn_buffer: Vec<Entity>,
    events: Vec<RaceEvent>,
    use_item_requested: bool,
    use_item_was_held: bool,
}

impl SimulationEngine {
    /// Create an engine racing on the default circuit.
    pub fn new(config: SimConfig) -> Self {
        Self::with_curve(config, PathCurve::default_circuit())
    }

    /// Create an engine racing on `curve`. Item boxes are placed immediately.
    pub fn with_curve(config: SimConfig, curve: PathCurve) -> Self {
        let mut world = World::new();
        world_setup::spawn_item_boxes(&mut world, &curve);

        Self {
            world,
            curve,
            time: SimTime::default(),
            phase: GamePhase::default(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            total_laps: config.total_laps,
            tuning: config.tuning,
            local_id: KartId::local(),
            local_entity: None,
            command_queue: VecDeque::new(),
            respawns: RespawnQueue::default(),
            despawn_buffer: Vec::new(),
            events: Vec::new(),
            use_item_requested: false,
            use_item_was_held: false,
        }
    }

    /// Queue a player command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: PlayerCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = PlayerCommand>) {
        self.command_queue.extend(commands);
    }

    /// Mirror a remote presence change into the world. Accepted in any phase.
    pub fn apply_presence(&mut self, event: &PresenceEvent) {
        if event.kart_id() == &self.local_id {
            warn!("dropping presence event for own identity {}", self.local_id);
            return;
        }
        systems::remote::apply(&mut self.world, event);
    }

    /// Advance the simulation by one frame and return the resulting snapshot.
    pub fn tick(&mut self, controls: &dyn Controls) -> RaceSnapshot {
        self.process_commands();

        // Rising edge only; holding the key uses one item.
        let use_held = controls.is_held(Action::UseItem);
        if use_held && !self.use_item_was_held {
            self.use_item_requested = true;
        }
        self.use_item_was_held = use_held;

        if self.phase == GamePhase::Racing {
            self.run_systems(controls);
            self.time.advance();
        } else {
            self.use_item_requested = false;
        }

        let events = std::mem::take(&mut self.events);
        systems::snapshot::build_snapshot(&self.world, &self.time, self.phase, events)
    }

    /// Get the current game phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Get the current simulation time.
    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn curve(&self) -> &PathCurve {
        &self.curve
    }

    /// Identity of the local kart (network-assigned once joined).
    pub fn local_id(&self) -> &KartId {
        &self.local_id
    }

    /// Current motion of the local kart, or `None` before the race starts.
    pub fn local_motion(&self) -> Option<KartMotion> {
        let entity = self.local_entity?;
        let mut query = self.world.query_one::<(&Kart, &Position)>(entity).ok()?;
        let (kart, pos) = query.get()?;
        Some(KartMotion {
            x: pos.x,
            z: pos.z,
            angle: kart.heading,
            speed: kart.speed,
        })
    }

    /// Lap counter of the local kart.
    pub fn local_laps(&self) -> Option<LapTracker> {
        let entity = self.local_entity?;
        self.world.get::<&LapTracker>(entity).ok().map(|laps| (*laps).clone())
    }

    pub fn local_tracker(&self) -> Option<ProgressTracker> {
        let entity = self.local_entity?;
        self.world
            .get::<&ProgressTracker>(entity)
            .ok()
            .map(|tracker| (*tracker).clone())
    }

    pub fn local_inventory(&self) -> Option<Inventory> {
        let entity = self.local_entity?;
        self.world.get::<&Inventory>(entity).ok().map(|inventory| *inventory)
    }

    /// Teleport the local kart (for tests). Progress is left to the tracker.
    #[cfg(test)]
    pub fn place_local_kart(&mut self, position: Position, heading: f64, speed: f64) {
        let Some(entity) = self.local_entity else {
            return;
        };
        if let Ok((kart, pos)) = self.world.query_one_mut::<(&mut Kart, &mut Position)>(entity) {
            *pos = position;
            kart.heading = heading;
            kart.speed = speed;
        }
    }

    /// Put `kind` straight into the local kart's inventory (for tests).
    #[cfg(test)]
    pub fn give_local_item(&mut self, kind: kart_core::enums::ItemKind) {
        if let Some(entity) = self.local_entity {
            if let Ok(mut inventory) = self.world.get::<&mut Inventory>(entity) {
                inventory.held = Some(kind);
            }
        }
    }

    /// Spawn a projectile owned by someone else (for tests).
    #[cfg(test)]
    pub fn spawn_test_projectile(
        &mut self,
        kind: kart_core::enums::ProjectileKind,
        position: Position,
        heading: f64,
        owner: KartId,
    ) -> Entity {
        world_setup::spawn_projectile(&mut self.world, kind, &position, heading, owner, self.time.tick)
    }

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    /// Handle a single player command.
    fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::StartRace { name, color } => {
                if matches!(self.phase, GamePhase::Lobby | GamePhase::Finished) {
                    self.reset_race();
                    let entity = world_setup::spawn_local_kart(
                        &mut self.world,
                        &self.curve,
                        self.local_id.clone(),
                        name,
                        color,
                        self.total_laps,
                        &self.tuning,
                    );
                    self.local_entity = Some(entity);
                    self.phase = GamePhase::Racing;
                    info!("race started for {} ({} laps)", self.local_id, self.total_laps);
                }
            }
            PlayerCommand::Pause => {
                if self.phase == GamePhase::Racing {
                    self.phase = GamePhase::Paused;
                }
            }
            PlayerCommand::Resume => {
                if self.phase == GamePhase::Paused {
                    self.phase = GamePhase::Racing;
                }
            }
            PlayerCommand::UseItem => {
                if self.phase == GamePhase::Racing {
                    self.use_item_requested = true;
                }
            }
            PlayerCommand::SetLocalIdentity { id } => self.set_local_identity(id),
        }
    }

    /// Retag the local kart and its live projectiles with a new identity.
    fn set_local_identity(&mut self, id: KartId) {
        if id == self.local_id {
            return;
        }
        let previous = std::mem::replace(&mut self.local_id, id);
        if let Some(entity) = self.local_entity {
            if let Ok(mut kart) = self.world.get::<&mut Kart>(entity) {
                kart.id = self.local_id.clone();
            }
        }
        for (_entity, projectile) in self.world.query_mut::<&mut Projectile>() {
            if projectile.owner == previous {
                projectile.owner = self.local_id.clone();
            }
        }
        info!("local identity {} -> {}", previous, self.local_id);
    }

    /// Clear per-race state: local kart, projectiles and box timers.
    fn reset_race(&mut self) {
        if let Some(entity) = self.local_entity.take() {
            let _ = self.world.despawn(entity);
        }

        self.despawn_buffer.clear();
        for (entity, _) in self.world.query_mut::<&Projectile>() {
            self.despawn_buffer.push(entity);
        }
        for entity in self.despawn_buffer.drain(..) {
            let _ = self.world.despawn(entity);
        }

        for (_entity, item_box) in self.world.query_mut::<&mut ItemBox>() {
            item_box.active = true;
            item_box.respawn_at_tick = None;
        }
        self.respawns = RespawnQueue::default();
        self.time = SimTime::default();
        self.use_item_requested = false;
    }

    /// Run all systems in order.
    fn run_systems(&mut self, controls: &dyn Controls) {
        let now = self.time.tick;

        // 1. Box respawns due this tick
        items::run_respawns(&mut self.world, &mut self.respawns, now, &mut self.events);

        let Some(kart) = self.local_entity else {
            return;
        };

        // 2. Item use (before driving so a boost applies this frame)
        if std::mem::take(&mut self.use_item_requested) {
            items::use_item(&mut self.world, kart, now, &mut self.events);
        }

        // 3. Local kart physics and laps
        let outcome = systems::driving::run(
            &mut self.world,
            kart,
            controls,
            &self.curve,
            &self.tuning,
            now,
            &mut self.events,
        );
        if outcome.is_some_and(|o| o.finished) {
            info!("{} finished the race at tick {}", self.local_id, now);
            self.phase = GamePhase::Finished;
        }

        // 4. Box pickups
        items::check_pickups(
            &mut self.world,
            kart,
            &mut self.rng,
            &mut self.respawns,
            now,
            &mut self.events,
        );

        // 5. Projectile hits on the local kart
        items::check_projectile_hits(&mut self.world, kart, &mut self.despawn_buffer, &mut self.events);

        // 6. Projectile movement
        systems::movement::run(&mut self.world);

        // 7. Out-of-bounds shells
        systems::cleanup::run(&mut self.world, &mut self.despawn_buffer);
    }
}
