//! Backend configuration.
//!
//! Field names follow the hosted backend's JSON config template
//! (`apiKey`, `databaseUrl`, `projectId`). Missing or placeholder values
//! mean the race runs offline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::memory;
use crate::store::{PresenceStore, StoreError};

/// URL scheme of the in-process store.
pub const MEMORY_SCHEME: &str = "memory://";

/// Prefix used by the unfilled config template.
const PLACEHOLDER_PREFIX: &str = "YOUR_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendConfig {
    pub api_key: String,
    #[serde(alias = "databaseURL")]
    pub database_url: String,
    pub project_id: String,
}

impl BackendConfig {
    /// Config for the shared in-process store called `name`.
    pub fn memory(name: &str) -> Self {
        Self {
            api_key: "local".into(),
            database_url: format!("{MEMORY_SCHEME}{name}"),
            project_id: name.into(),
        }
    }

    /// True when the API key and database URL are filled in.
    pub fn is_valid(&self) -> bool {
        let filled = |value: &str| !value.trim().is_empty() && !value.contains(PLACEHOLDER_PREFIX);
        filled(&self.api_key) && filled(&self.database_url) && !self.project_id.contains(PLACEHOLDER_PREFIX)
    }

    /// Open the store this config points at.
    pub fn connect(&self) -> Result<Arc<dyn PresenceStore>, StoreError> {
        if !self.is_valid() {
            return Err(StoreError::NotConfigured);
        }
        match self.database_url.strip_prefix(MEMORY_SCHEME) {
            Some(name) if !name.is_empty() => {
                let store: Arc<dyn PresenceStore> = memory::shared(name);
                Ok(store)
            }
            _ => Err(StoreError::UnsupportedBackend(self.database_url.clone())),
        }
    }
}
