use env_logger::{Builder, Env};
use log::LevelFilter;

const CRATES: [&str; 5] = ["kart_core", "kart_track", "kart_sim", "kart_net", "kart_app"];

/// Build the default filter: warnings from dependencies, `level` for the
/// race crates.
fn default_filter(level: LevelFilter) -> String {
    let mut filter = String::from("warn");
    for name in CRATES {
        filter.push_str(&format!(",{name}={level}"));
    }
    filter
}

/// Initializes the global logger.
///
/// `RUST_LOG` overrides the default. Otherwise `verbose` selects debug
/// output for the race crates, and info level is used when it is off.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(default_filter(level));
    let mut builder = Builder::from_env(env);

    // Only fails if a logger is already installed, which happens when
    // tests call this more than once.
    let _ = builder.try_init();
}
