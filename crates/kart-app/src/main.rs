use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use kart_app::config::AppConfig;
use kart_app::game_loop;
use kart_app::logging;
use kart_app::state::AppState;

/// Headless networked kart race
#[derive(Parser)]
#[command(name = "kart-race", author, version, about, long_about = None)]
struct Args {
    /// Room to join
    #[arg(long)]
    room: Option<String>,

    /// Display name of the local racer
    #[arg(long)]
    name: Option<String>,

    /// JSON config file (sim tuning, backend credentials)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many frames instead of running until killed
    #[arg(long)]
    ticks: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    let mut config = match &args.config {
        Some(path) => match AppConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("kart-race: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::default(),
    };
    if let Some(room) = args.room {
        config.room = room;
    }
    if let Some(name) = args.name {
        config.player_name = name;
    }

    let state = AppState::new();
    let (tx, handle) =
        match game_loop::spawn_game_loop(config, state.latest_snapshot.clone(), args.ticks) {
            Ok(spawned) => spawned,
            Err(e) => {
                eprintln!("kart-race: cannot start game loop: {e}");
                return ExitCode::FAILURE;
            }
        };
    if let Ok(mut slot) = state.command_tx.lock() {
        *slot = Some(tx);
    }

    if handle.join().is_err() {
        eprintln!("kart-race: game loop panicked");
        return ExitCode::FAILURE;
    }

    if let Some(snapshot) = state.snapshot() {
        let remote = snapshot.karts.len().saturating_sub(1);
        match snapshot.local {
            Some(local) => info!(
                "tick {}: lap {}/{}, {} other racer(s){}",
                snapshot.time.tick,
                local.current_lap,
                local.total_laps,
                remote,
                if local.finished { ", finished" } else { "" }
            ),
            None => info!("tick {}: no local kart", snapshot.time.tick),
        }
    }
    ExitCode::SUCCESS
}
