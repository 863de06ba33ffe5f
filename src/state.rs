use crate::paths;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fleet::ErrorHostMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// ============================================================================
// State Structures
// ============================================================================

/// What nodefleet remembers between runs
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FleetState {
    /// State for each cluster
    #[serde(default)]
    pub clusters: HashMap<String, ClusterState>,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ClusterState {
    /// Most recent upgrade run, successful or not
    pub last_upgrade: Option<UpgradeRecord>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UpgradeRecord {
    pub finished_at: DateTime<Utc>,

    /// Hosts whose plan completed
    #[serde(default)]
    pub hosts_upgraded: Vec<String>,

    /// Hosts that failed (host id, error message)
    #[serde(default)]
    pub hosts_failed: Vec<(String, String)>,
}

// ============================================================================
// FleetState Implementation
// ============================================================================

impl FleetState {
    /// Load state from the state directory
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::state_file()?)
    }

    /// Load state from disk, or return default if file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to the state directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&paths::state_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Update the last_updated timestamp and save
    pub fn touch(&mut self) -> Result<()> {
        self.last_updated = Utc::now();
        self.save()
    }

    /// Replace a cluster's upgrade record with the outcome of a run
    pub fn record_upgrade(&mut self, cluster: &str, upgraded: Vec<String>, failed: &ErrorHostMap) {
        let record = UpgradeRecord {
            finished_at: Utc::now(),
            hosts_upgraded: upgraded,
            hosts_failed: failed
                .iter()
                .map(|(host, err)| (host.clone(), err.to_string()))
                .collect(),
        };
        self.clusters.entry(cluster.to_string()).or_default().last_upgrade = Some(record);
    }

    pub fn last_upgrade(&self, cluster: &str) -> Option<&UpgradeRecord> {
        self.clusters.get(cluster)?.last_upgrade.as_ref()
    }
}

impl Default for FleetState {
    fn default() -> Self {
        Self {
            clusters: HashMap::new(),
            last_updated: Utc::now(),
        }
    }
}
