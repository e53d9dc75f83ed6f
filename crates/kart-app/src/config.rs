//! Application configuration: an optional JSON file plus command-line
//! overrides.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use kart_net::BackendConfig;
use kart_sim::SimConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything needed to run one racing client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub room: String,
    pub player_name: String,
    /// 24-bit RGB kart colour.
    pub color: u32,
    /// Drive the local kart with the built-in autopilot.
    pub autopilot: bool,
    /// Pace the loop at the tick rate. Off runs frames back to back.
    pub realtime: bool,
    pub sim: SimConfig,
    pub backend: BackendConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            room: "default".into(),
            player_name: "Player".into(),
            color: 0xff0000,
            autopilot: true,
            realtime: true,
            sim: SimConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load a config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
