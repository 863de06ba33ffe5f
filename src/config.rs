//! Configuration files
//!
//! `config.toml` tunes how nodefleet talks to nodes and where releases come
//! from. `clusters.toml` names the clusters and points at their inventories.
//! Both live in [`paths::config_dir`]; a missing file means defaults.

use crate::paths;
use anyhow::{Context, Result, anyhow};
use fleet::DispatchOptions;
use releases::{ReleaseSource, RetryConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// config.toml
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dispatch: DispatchConfig,
    pub ssh: SshConfig,
    pub node: NodeConfig,
    pub runtime: ReleaseSource,
    pub plugin: ReleaseSource,
    pub retry: RetrySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            ssh: SshConfig::default(),
            node: NodeConfig::default(),
            runtime: ReleaseSource::runtime(),
            plugin: ReleaseSource::plugin(),
            retry: RetrySettings::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Cap on concurrent hosts per round; unset runs every host at once
    pub max_concurrency: Option<usize>,
}

impl DispatchConfig {
    pub fn options(&self) -> DispatchOptions {
        DispatchOptions {
            max_concurrency: self.max_concurrency,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// Login user when the inventory names none
    pub user: String,
    pub connect_timeout_secs: u64,
    /// Deadline for one remote command
    pub command_timeout_secs: u64,
    /// Extra `-o` options passed to ssh
    pub extra_options: Vec<String>,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            user: "ubuntu".to_string(),
            connect_timeout_secs: 10,
            command_timeout_secs: 120,
            extra_options: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node API as seen from the node itself
    pub api_url: String,
    /// systemd unit running the node
    pub service_name: String,
    /// Directory holding the runtime binary
    pub runtime_dir: String,
    /// Directory holding one binary per plugin instance
    pub plugin_dir: String,
    /// Scratch directory for downloaded releases
    pub download_dir: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:9650".to_string(),
            service_name: "node".to_string(),
            runtime_dir: "/home/ubuntu/node".to_string(),
            plugin_dir: "/home/ubuntu/.node/plugins".to_string(),
            download_dir: "/tmp/nodefleet".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig::new(
            self.max_attempts.max(1),
            Duration::from_millis(self.base_delay_ms),
            2.0,
        )
    }
}

impl Config {
    /// Load `config.toml` from the config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

// ============================================================================
// clusters.toml
// ============================================================================

/// Every cluster nodefleet knows about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClustersConfig {
    #[serde(default)]
    pub clusters: BTreeMap<String, ClusterConfig>,

    /// Directory relative inventory paths are anchored at
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Network the cluster's nodes belong to (e.g. "mainnet")
    pub network: String,

    /// Inventory file; defaults to `inventories/<cluster>/hosts`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<String>,

    /// Subnet name to blockchain id
    #[serde(default)]
    pub subnets: BTreeMap<String, String>,
}

impl ClustersConfig {
    /// Load `clusters.toml` from the config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::clusters_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if !path.exists() {
            log::debug!("No clusters file at {}", path.display());
            return Ok(Self {
                base_dir,
                ..Self::default()
            });
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read clusters file: {}", path.display()))?;
        let mut clusters: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse clusters file: {}", path.display()))?;
        clusters.base_dir = base_dir;

        Ok(clusters)
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Look up a cluster, failing when it is not defined
    pub fn get(&self, name: &str) -> Result<&ClusterConfig> {
        self.clusters.get(name).ok_or_else(|| {
            anyhow!("Cluster '{name}' does not exist (run 'nodefleet list' to see defined clusters)")
        })
    }

    /// Resolved inventory file of a cluster
    pub fn inventory_path(&self, name: &str) -> Result<PathBuf> {
        let cluster = self.get(name)?;
        Ok(match &cluster.inventory {
            Some(path) => paths::resolve(path, &self.base_dir),
            None => self.base_dir.join("inventories").join(name).join("hosts"),
        })
    }
}

impl ClusterConfig {
    /// Blockchain id of a subnet tracked by this cluster
    pub fn blockchain_id(&self, subnet: &str) -> Result<&str> {
        self.subnets
            .get(subnet)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("No blockchain id configured for subnet '{subnet}'"))
    }
}
