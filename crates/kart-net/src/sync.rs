//! Joins a race room and keeps the local kart's presence record in sync.
//!
//! The frame loop calls `publish` once per tick and drains remote changes
//! with `poll`. Events about the local participant are dropped here, so
//! callers only ever see other karts.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use kart_core::events::{KartMotion, PresenceEvent, RemoteKartState};
use kart_core::types::KartId;

use crate::config::BackendConfig;
use crate::store::{ChildEvent, Connection, PresenceStore, StoreError};

const ID_PREFIX: &str = "player_";
const ID_LENGTH: usize = 9;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_COLOR: u32 = 0xff_ffff;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("no presence backend available")]
    Offline,
    #[error("not joined to a room")]
    NotJoined,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("malformed presence record: {0}")]
    Record(#[from] serde_json::Error),
}

/// One participant's record as stored under `room/<roomId>/players/<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
    pub id: KartId,
    pub name: String,
    #[serde(deserialize_with = "color_from_number")]
    pub color: u32,
    pub x: f64,
    pub z: f64,
    pub angle: f64,
    pub speed: f64,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_update: u64,
}

impl PresenceRecord {
    /// A freshly joined participant, parked at the origin.
    pub fn new(id: KartId, name: &str, color: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            color,
            x: 0.0,
            z: 0.0,
            angle: 0.0,
            speed: 0.0,
            last_update: now_millis(),
        }
    }

    pub fn into_state(self) -> RemoteKartState {
        RemoteKartState {
            id: self.id,
            name: self.name,
            color: self.color,
            x: self.x,
            z: self.z,
            angle: self.angle,
            speed: self.speed,
        }
    }
}

/// Path of the collection holding every participant of `room_id`.
pub fn players_path(room_id: &str) -> String {
    format!("room/{room_id}/players")
}

struct Session {
    events: Receiver<ChildEvent>,
    connection: Connection,
    room_id: String,
    player_id: KartId,
    record_path: String,
}

/// Network presence for the local participant.
pub struct NetworkSync {
    store: Option<Arc<dyn PresenceStore>>,
    rng: ChaCha8Rng,
    session: Option<Session>,
}

impl NetworkSync {
    /// Connect to the backend described by `config`. A missing or broken
    /// backend is not fatal: the sync starts offline and `join` fails.
    pub fn new(config: &BackendConfig) -> Self {
        match config.connect() {
            Ok(store) => {
                info!("presence backend ready ({})", config.database_url);
                Self::with_store(store)
            }
            Err(StoreError::NotConfigured) => {
                warn!("backend credentials missing, racing offline");
                Self::offline()
            }
            Err(e) => {
                warn!("backend initialisation failed: {e}; racing offline");
                Self::offline()
            }
        }
    }

    pub fn with_store(store: Arc<dyn PresenceStore>) -> Self {
        Self {
            store: Some(store),
            rng: ChaCha8Rng::from_entropy(),
            session: None,
        }
    }

    pub fn offline() -> Self {
        Self {
            store: None,
            rng: ChaCha8Rng::from_entropy(),
            session: None,
        }
    }

    /// Use a fixed seed for generated identities.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn is_online(&self) -> bool {
        self.store.is_some()
    }

    pub fn is_joined(&self) -> bool {
        self.session.is_some()
    }

    /// Identity assigned by the last successful `join`.
    pub fn local_id(&self) -> Option<&KartId> {
        self.session.as_ref().map(|s| &s.player_id)
    }

    pub fn room_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.room_id.as_str())
    }

    /// `player_` followed by nine random base-36 characters.
    pub fn generate_id(&mut self) -> KartId {
        let suffix: String = (0..ID_LENGTH)
            .map(|_| ID_ALPHABET[self.rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect();
        KartId::new(format!("{ID_PREFIX}{suffix}"))
    }

    /// Enter `room_id` under a new identity.
    ///
    /// Writes the initial record, arranges for the store to remove it when
    /// this client disconnects, and subscribes to the room. Everyone
    /// already present is reported by the next `poll` as `Joined`.
    pub fn join(&mut self, room_id: &str, name: &str, color: u32) -> Result<KartId, NetError> {
        let store = self.store.clone().ok_or(NetError::Offline)?;
        if self.session.is_some() {
            self.leave();
        }

        let player_id = self.generate_id();
        let collection = players_path(room_id);
        let record_path = format!("{collection}/{player_id}");

        let connection = Connection::open(store)?;
        let record = PresenceRecord::new(player_id.clone(), name, color);
        connection.set(&record_path, serde_json::to_value(&record)?)?;
        connection.on_disconnect_remove(&record_path)?;
        let events = connection.subscribe_children(&collection)?;

        info!("joined room {room_id} as {player_id}");
        self.session = Some(Session {
            events,
            connection,
            room_id: room_id.to_string(),
            player_id: player_id.clone(),
            record_path,
        });
        Ok(player_id)
    }

    /// Merge the local kart's motion into its record. Fire-and-forget:
    /// does nothing before `join`, and failures are only logged.
    pub fn publish(&self, motion: &KartMotion) {
        let Some(session) = &self.session else {
            return;
        };
        let Ok(Value::Object(mut fields)) = serde_json::to_value(motion) else {
            return;
        };
        fields.insert("lastUpdate".into(), Value::from(now_millis()));
        if let Err(e) = session.connection.update(&session.record_path, fields) {
            debug!("publish failed: {e}");
        }
    }

    /// Drain remote presence changes received since the last poll.
    pub fn poll(&mut self) -> Vec<PresenceEvent> {
        let Some(session) = &self.session else {
            return Vec::new();
        };

        let mut events = Vec::new();
        loop {
            let change = match session.events.try_recv() {
                Ok(change) => change,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("presence subscription closed");
                    break;
                }
            };
            if change.key() == session.player_id.as_str() {
                continue;
            }
            if let Some(event) = to_presence_event(change) {
                events.push(event);
            }
        }
        events
    }

    /// Remove the local record and close the connection.
    pub fn leave(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.connection.remove(&session.record_path) {
                debug!("leave: {e}");
            }
            info!("left room {}", session.room_id);
        }
    }
}

fn to_presence_event(change: ChildEvent) -> Option<PresenceEvent> {
    let parse = |key: &str, value: Value| match serde_json::from_value::<PresenceRecord>(value) {
        Ok(record) => Some(record.into_state()),
        Err(e) => {
            warn!("skipping malformed presence record {key}: {e}");
            None
        }
    };
    match change {
        ChildEvent::Added { key, value } => parse(&key, value).map(PresenceEvent::Joined),
        ChildEvent::Changed { key, value } => parse(&key, value).map(PresenceEvent::Updated),
        ChildEvent::Removed { key } => Some(PresenceEvent::Left {
            id: KartId::new(key),
        }),
    }
}

/// Colours arrive as any JSON number, fractional ones included. Truncate
/// and clamp into 24-bit RGB.
fn color_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if raw.is_nan() {
        return Ok(0);
    }
    Ok(raw.trunc().clamp(0.0, MAX_COLOR as f64) as u32)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
