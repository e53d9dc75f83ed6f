//! Game loop thread: runs one race session at the tick rate and stores
//! the latest snapshot for polling.
//!
//! The session is created inside the thread so it never has to be shared.
//! Commands arrive via an `mpsc` channel.

use std::io;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, info};

use kart_core::constants::TICK_RATE;
use kart_core::input::InputState;
use kart_core::state::RaceSnapshot;

use crate::autopilot::Autopilot;
use crate::config::AppConfig;
use crate::session::RaceSession;
use crate::state::GameLoopCommand;

/// Duration of one tick.
const TICK_DURATION: Duration = Duration::from_nanos(1_000_000_000 / TICK_RATE as u64);

/// Spawns the game loop in a new thread.
///
/// The loop joins the configured room and starts the race at once. It
/// stops on `Shutdown`, when every sender is dropped, or after
/// `max_ticks` frames.
pub fn spawn_game_loop(
    config: AppConfig,
    latest_snapshot: Arc<Mutex<Option<RaceSnapshot>>>,
    max_ticks: Option<u64>,
) -> io::Result<(mpsc::Sender<GameLoopCommand>, JoinHandle<()>)> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<GameLoopCommand>();

    let handle = std::thread::Builder::new()
        .name("kart-game-loop".into())
        .spawn(move || {
            let mut session = RaceSession::new(&config);
            session.start(&config.room, &config.player_name, config.color);
            run_game_loop(&mut session, &config, cmd_rx, &latest_snapshot, max_ticks);
            session.leave();
        })?;

    Ok((cmd_tx, handle))
}

/// The game loop. Runs until Shutdown, channel disconnect or `max_ticks`.
pub fn run_game_loop(
    session: &mut RaceSession,
    config: &AppConfig,
    cmd_rx: mpsc::Receiver<GameLoopCommand>,
    latest_snapshot: &Mutex<Option<RaceSnapshot>>,
    max_ticks: Option<u64>,
) {
    let mut held = InputState::new();
    let mut autopilot = config.autopilot.then(Autopilot::new);
    let mut last: Option<RaceSnapshot> = None;
    let mut frames = 0u64;
    let mut next_tick_time = Instant::now();

    loop {
        if max_ticks.is_some_and(|max| frames >= max) {
            info!("stopping after {frames} frames");
            return;
        }

        // 1. Drain all pending commands
        loop {
            match cmd_rx.try_recv() {
                Ok(GameLoopCommand::PlayerCommand(cmd)) => session.queue_command(cmd),
                Ok(GameLoopCommand::Controls(input)) => held = input,
                Ok(GameLoopCommand::Shutdown) => return,
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    debug!("command channel closed");
                    return;
                }
            }
        }

        // 2. Choose input
        let input = match (&mut autopilot, &last) {
            (Some(pilot), Some(snapshot)) => pilot.decide(session.engine().curve(), snapshot),
            _ => held.clone(),
        };

        // 3. Advance one frame (remote changes in, local motion out)
        let snapshot = session.frame(&input);
        frames += 1;

        // 4. Store latest snapshot for polling
        if let Ok(mut lock) = latest_snapshot.lock() {
            *lock = Some(snapshot.clone());
        }
        last = Some(snapshot);

        // 5. Sleep until next tick
        if !config.realtime {
            continue;
        }
        next_tick_time += TICK_DURATION;
        let now = Instant::now();
        if next_tick_time > now {
            std::thread::sleep(next_tick_time - now);
        } else if now - next_tick_time > TICK_DURATION * 2 {
            // Too far behind; reset to avoid a catch-up spiral
            next_tick_time = now;
        }
    }
}
