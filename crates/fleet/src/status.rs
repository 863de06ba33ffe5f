//! Node status vocabulary and per-cluster status reports
//!
//! The `interpret_*` functions are pure and total: every raw input maps to a
//! status, and unknown sync strings degrade to [`SyncStatus::NotSynced`]
//! instead of failing.

use crate::host::Host;
use crate::results::{ErrorHostMap, ResultSet};
use crate::versions::NodeVersions;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw sync status reported by a node that is still catching up
pub const RAW_SYNCING: &str = "Syncing";

/// Raw sync status reported by a node validating the chain
pub const RAW_VALIDATING: &str = "Validating";

/// Whether a node finished bootstrapping to the primary network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootstrapStatus {
    Bootstrapped,
    NotBootstrapped,
}

impl BootstrapStatus {
    pub fn is_bootstrapped(self) -> bool {
        self == Self::Bootstrapped
    }
}

impl fmt::Display for BootstrapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bootstrapped => write!(f, "BOOTSTRAPPED"),
            Self::NotBootstrapped => write!(f, "NOT_BOOTSTRAPPED"),
        }
    }
}

/// Whether a node reports itself healthy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(self) -> bool {
        self == Self::Healthy
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "OK"),
            Self::Unhealthy => write!(f, "UNHEALTHY"),
        }
    }
}

/// A node's relationship to a tracked subnet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    NotSynced,
    Syncing,
    Validating,
}

impl SyncStatus {
    /// Synced to or validating the subnet
    pub fn is_synced(self) -> bool {
        matches!(self, Self::Syncing | Self::Validating)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSynced => write!(f, "NOT_SYNCED"),
            Self::Syncing => write!(f, "SYNCED"),
            Self::Validating => write!(f, "VALIDATING"),
        }
    }
}

pub fn interpret_bootstrap(raw: bool) -> BootstrapStatus {
    if raw {
        BootstrapStatus::Bootstrapped
    } else {
        BootstrapStatus::NotBootstrapped
    }
}

pub fn interpret_health(raw: bool) -> HealthStatus {
    if raw {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    }
}

/// Map a raw blockchain status to a [`SyncStatus`]
///
/// A node that is not bootstrapped to the primary network is never synced to
/// a subnet, whatever it reports.
pub fn interpret_sync(raw: &str, was_bootstrapped: bool) -> SyncStatus {
    if !was_bootstrapped {
        return SyncStatus::NotSynced;
    }
    match raw {
        RAW_SYNCING => SyncStatus::Syncing,
        RAW_VALIDATING => SyncStatus::Validating,
        _ => SyncStatus::NotSynced,
    }
}

/// One host's row in a status report
///
/// A `None` field means that host's query failed; the failure is in the
/// report's error map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostStatusRow {
    pub id: String,
    pub address: String,
    pub runtime_version: Option<String>,
    pub bootstrap: Option<BootstrapStatus>,
    pub health: Option<HealthStatus>,
    /// Only set when a subnet is tracked
    pub sync: Option<SyncStatus>,
}

impl HostStatusRow {
    fn is_bootstrapped(&self) -> bool {
        self.bootstrap.is_some_and(BootstrapStatus::is_bootstrapped)
    }

    fn is_healthy(&self) -> bool {
        self.health.is_some_and(HealthStatus::is_healthy)
    }
}

/// Outcomes of the dispatch rounds that make up a status check
pub struct StatusRounds<'a> {
    pub bootstrap: &'a ResultSet<bool>,
    pub health: &'a ResultSet<bool>,
    pub versions: &'a ResultSet<NodeVersions>,
    /// Raw blockchain status, queried on bootstrapped hosts only
    pub sync: Option<&'a ResultSet<String>>,
}

/// Status of every host in a cluster, ready for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterStatusReport {
    pub rows: Vec<HostStatusRow>,
    /// First failure seen for each host, in round order
    pub errors: ErrorHostMap,
}

impl ClusterStatusReport {
    /// Combine round outcomes into one row per host, in inventory order
    pub fn build(hosts: &[Host], rounds: &StatusRounds<'_>) -> Self {
        let mut errors = ErrorHostMap::new();
        let mut note = |id: &str, error: Option<&crate::Error>| {
            if let Some(e) = error
                && !errors.contains(id)
            {
                errors.insert(id, e.clone());
            }
        };

        let mut rows = Vec::with_capacity(hosts.len());
        for host in hosts {
            let id = host.id.as_str();

            note(id, rounds.bootstrap.error(id));
            note(id, rounds.health.error(id));
            note(id, rounds.versions.error(id));

            let bootstrap = rounds.bootstrap.value(id).copied().map(interpret_bootstrap);
            let was_bootstrapped = bootstrap.is_some_and(BootstrapStatus::is_bootstrapped);

            let sync = rounds.sync.map(|set| {
                note(id, set.error(id));
                match set.value(id) {
                    Some(raw) => interpret_sync(raw, was_bootstrapped),
                    None => SyncStatus::NotSynced,
                }
            });

            rows.push(HostStatusRow {
                id: host.id.clone(),
                address: host.address.clone(),
                runtime_version: rounds.versions.value(id).map(|v| v.runtime.clone()),
                bootstrap,
                health: rounds.health.value(id).copied().map(interpret_health),
                sync,
            });
        }

        Self { rows, errors }
    }

    pub fn all_bootstrapped(&self) -> bool {
        self.rows.iter().all(HostStatusRow::is_bootstrapped)
    }

    pub fn all_healthy(&self) -> bool {
        self.rows.iter().all(HostStatusRow::is_healthy)
    }

    /// Every host is synced to or validating the tracked subnet
    ///
    /// False when no subnet is tracked.
    pub fn all_synced(&self) -> bool {
        !self.rows.is_empty()
            && self
                .rows
                .iter()
                .all(|r| r.sync.is_some_and(SyncStatus::is_synced))
    }

    /// Every host validates the tracked subnet
    pub fn all_validating(&self) -> bool {
        !self.rows.is_empty()
            && self
                .rows
                .iter()
                .all(|r| r.sync == Some(SyncStatus::Validating))
    }

    /// Hosts that are not (or could not be confirmed) bootstrapped
    pub fn not_bootstrapped(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| !r.is_bootstrapped())
            .map(|r| r.id.as_str())
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_interpret_sync() {
        assert_eq!(interpret_sync("Syncing", true), SyncStatus::Syncing);
        assert_eq!(interpret_sync("Validating", true), SyncStatus::Validating);
        assert_eq!(interpret_sync("garbage", true), SyncStatus::NotSynced);
        assert_eq!(interpret_sync("", true), SyncStatus::NotSynced);
        assert_eq!(interpret_sync("validating", true), SyncStatus::NotSynced);
        assert_eq!(interpret_sync("Validating", false), SyncStatus::NotSynced);
        assert_eq!(interpret_sync("Syncing", false), SyncStatus::NotSynced);
    }

    #[test]
    fn test_interpret_sync_is_deterministic() {
        for raw in ["Syncing", "Validating", "Unknown", ""] {
            for bootstrapped in [true, false] {
                assert_eq!(
                    interpret_sync(raw, bootstrapped),
                    interpret_sync(raw, bootstrapped)
                );
            }
        }
    }

    #[test]
    fn test_interpret_flags() {
        assert_eq!(interpret_bootstrap(true), BootstrapStatus::Bootstrapped);
        assert_eq!(interpret_bootstrap(false), BootstrapStatus::NotBootstrapped);
        assert_eq!(interpret_health(true), HealthStatus::Healthy);
        assert_eq!(interpret_health(false), HealthStatus::Unhealthy);
    }

    fn hosts() -> Vec<Host> {
        vec![
            Host::new("node-a", "10.0.0.1"),
            Host::new("node-b", "10.0.0.2"),
            Host::new("node-c", "10.0.0.3"),
        ]
    }

    fn set<T>(entries: Vec<(&str, crate::NodeResult<T>)>) -> ResultSet<T> {
        ResultSet::from_results(entries.into_iter().map(|(id, r)| (id.to_string(), r)))
    }

    #[test]
    fn test_report_without_subnet() {
        let bootstrap = set(vec![
            ("node-a", Ok(true)),
            ("node-b", Ok(false)),
            ("node-c", Err(Error::transport("timeout"))),
        ]);
        let health = set(vec![
            ("node-a", Ok(true)),
            ("node-b", Ok(true)),
            ("node-c", Err(Error::transport("timeout"))),
        ]);
        let versions = set(vec![
            ("node-a", Ok(NodeVersions::new("v1.10.12"))),
            ("node-b", Ok(NodeVersions::new("v1.10.11"))),
            ("node-c", Err(Error::transport("timeout"))),
        ]);

        let report = ClusterStatusReport::build(
            &hosts(),
            &StatusRounds {
                bootstrap: &bootstrap,
                health: &health,
                versions: &versions,
                sync: None,
            },
        );

        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[0].id, "node-a");
        assert_eq!(report.rows[0].runtime_version.as_deref(), Some("v1.10.12"));
        assert_eq!(report.rows[1].bootstrap, Some(BootstrapStatus::NotBootstrapped));
        assert_eq!(report.rows[2].bootstrap, None);
        assert!(report.rows.iter().all(|r| r.sync.is_none()));

        assert!(!report.all_bootstrapped());
        assert_eq!(report.not_bootstrapped(), vec!["node-b", "node-c"]);
        assert_eq!(report.errors.hosts(), vec!["node-c"]);
        assert!(!report.all_synced());
    }

    #[test]
    fn test_report_with_subnet() {
        let bootstrap = set(vec![
            ("node-a", Ok(true)),
            ("node-b", Ok(true)),
            ("node-c", Ok(false)),
        ]);
        let health = set(vec![
            ("node-a", Ok(true)),
            ("node-b", Ok(true)),
            ("node-c", Ok(false)),
        ]);
        let versions = set(vec![
            ("node-a", Ok(NodeVersions::new("v1.10.12"))),
            ("node-b", Ok(NodeVersions::new("v1.10.12"))),
            ("node-c", Ok(NodeVersions::new("v1.10.12"))),
        ]);
        // node-c is not bootstrapped, so it is left out of the sync round
        let sync = set(vec![
            ("node-a", Ok("Validating".to_string())),
            ("node-b", Err(Error::parse("missing result"))),
        ]);

        let report = ClusterStatusReport::build(
            &hosts(),
            &StatusRounds {
                bootstrap: &bootstrap,
                health: &health,
                versions: &versions,
                sync: Some(&sync),
            },
        );

        assert_eq!(report.rows[0].sync, Some(SyncStatus::Validating));
        assert_eq!(report.rows[1].sync, Some(SyncStatus::NotSynced));
        assert_eq!(report.rows[2].sync, Some(SyncStatus::NotSynced));
        assert_eq!(report.errors.hosts(), vec!["node-b"]);
        assert!(!report.all_healthy());
        assert!(!report.all_synced());
    }

    #[test]
    fn test_all_synced_and_validating() {
        let hosts = &hosts()[..2];
        let ok = set(vec![("node-a", Ok(true)), ("node-b", Ok(true))]);
        let versions = set(vec![
            ("node-a", Ok(NodeVersions::new("v1.10.12"))),
            ("node-b", Ok(NodeVersions::new("v1.10.12"))),
        ]);
        let sync = set(vec![
            ("node-a", Ok("Syncing".to_string())),
            ("node-b", Ok("Validating".to_string())),
        ]);

        let report = ClusterStatusReport::build(
            hosts,
            &StatusRounds {
                bootstrap: &ok,
                health: &ok,
                versions: &versions,
                sync: Some(&sync),
            },
        );

        assert!(report.all_bootstrapped());
        assert!(report.all_healthy());
        assert!(report.all_synced());
        assert!(!report.all_validating());
        assert!(!report.has_errors());
    }
}
