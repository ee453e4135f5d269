//! Local record of managed resources
//!
//! The state file maps each address to the remote identifier and the last
//! server-confirmed configuration. The server stays authoritative: plans
//! always re-read it, and `refresh` compares against the stored
//! configuration to report drift.

use crate::paths;
use crate::resource::HttpItemConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use declarative::{ChangeOutcome, ResourceState, StateUpdate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// State Structures
// ============================================================================

/// Main state structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ItemState {
    /// Managed resources by address
    #[serde(default)]
    pub resources: BTreeMap<String, ManagedResource>,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,
}

/// One tracked remote object
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ManagedResource {
    /// Remote identifier
    pub id: String,

    /// Last time the object was confirmed against the server
    pub last_synced: DateTime<Utc>,

    /// Server-confirmed configuration at that time
    pub config: HttpItemConfig,
}

impl Default for ItemState {
    fn default() -> Self {
        Self {
            resources: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

// ============================================================================
// ItemState Implementation
// ============================================================================

impl ItemState {
    /// Resolve the state file path: explicit flag, else the default location
    pub fn path(explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(p) => Ok(p.to_path_buf()),
            None => paths::state_file(),
        }
    }

    /// Load state from disk, or return default if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!(
            "Loaded {} tracked resources from {}",
            state.resources.len(),
            path.display()
        );
        Ok(state)
    }

    /// Save state to disk, updating the timestamp
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        self.last_updated = Utc::now();
        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        // Write then rename, so an interrupted save never truncates the record
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, &content)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Address to remote identifier, as the planner needs it
    pub fn tracked(&self) -> BTreeMap<String, String> {
        self.resources
            .iter()
            .map(|(address, r)| (address.clone(), r.id.clone()))
            .collect()
    }

    pub fn get(&self, address: &str) -> Option<&ManagedResource> {
        self.resources.get(address)
    }

    /// Record a server-confirmed configuration
    pub fn record(&mut self, address: &str, id: &str, config: HttpItemConfig) {
        self.resources.insert(
            address.to_string(),
            ManagedResource {
                id: id.to_string(),
                last_synced: Utc::now(),
                config,
            },
        );
    }

    pub fn forget(&mut self, address: &str) -> Option<ManagedResource> {
        self.resources.remove(address)
    }

    /// Apply one outcome of an execution
    pub fn apply_update(&mut self, address: &str, update: &StateUpdate<HttpItemConfig>) {
        match update {
            StateUpdate::Keep => {}
            StateUpdate::Set(ResourceState::Managed { id, config }) => {
                self.record(address, id, config.clone());
            }
            StateUpdate::Set(ResourceState::Unmanaged) => {
                self.forget(address);
            }
        }
    }

    /// Apply every outcome of an execution; returns how many records changed
    pub fn apply_outcomes(&mut self, outcomes: &[ChangeOutcome<HttpItemConfig>]) -> usize {
        let mut changed = 0;
        for outcome in outcomes {
            if outcome.state != StateUpdate::Keep {
                changed += 1;
            }
            self.apply_update(&outcome.address, &outcome.state);
        }
        changed
    }
}
