//! Version compatibility between the runtime and its plugins
//!
//! Runtime and plugin share an integer protocol version. The table records,
//! for each plugin release, the protocol it speaks and, for each runtime
//! release, the protocols it supports. The table is read-only once built;
//! fetching and decoding the upstream documents is someone else's job.

use crate::error::{Error, Result};
use crate::versions::parse_version;
use semver::Version;
use std::collections::{BTreeMap, BTreeSet};

/// One row of a compatibility table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompatEntry {
    /// A plugin release and the protocol version it speaks
    Plugin {
        /// Plugin release
        version: Version,
        /// Protocol version
        protocol: u32,
    },
    /// A runtime release and every protocol version it supports
    Runtime {
        /// Runtime release
        version: Version,
        /// Supported protocol versions
        protocols: BTreeSet<u32>,
    },
}

/// Ordered, read-only compatibility entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityTable {
    entries: Vec<CompatEntry>,
}

impl CompatibilityTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in insertion order
    pub fn entries(&self) -> &[CompatEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a runtime entry
    pub fn with_runtime<I>(mut self, version: &str, protocols: I) -> Result<Self>
    where
        I: IntoIterator<Item = u32>,
    {
        self.entries.push(CompatEntry::Runtime {
            version: parse_version(version)?,
            protocols: protocols.into_iter().collect(),
        });
        Ok(self)
    }

    /// Add a plugin entry
    pub fn with_plugin(mut self, version: &str, protocol: u32) -> Result<Self> {
        self.entries.push(CompatEntry::Plugin {
            version: parse_version(version)?,
            protocol,
        });
        Ok(self)
    }

    /// Build runtime entries from a protocol -> runtime versions listing
    ///
    /// This is the shape runtime releases publish. Versions listed under
    /// several protocols become one entry supporting all of them. Tags that
    /// are not semantic versions are skipped.
    pub fn from_runtime_listing<I, V>(listing: I) -> Self
    where
        I: IntoIterator<Item = (u32, V)>,
        V: IntoIterator<Item = String>,
    {
        let mut by_version: BTreeMap<Version, BTreeSet<u32>> = BTreeMap::new();
        for (protocol, versions) in listing {
            for raw in versions {
                match parse_version(&raw) {
                    Ok(version) => {
                        by_version.entry(version).or_default().insert(protocol);
                    }
                    Err(e) => log::warn!("Skipping runtime compatibility entry: {e}"),
                }
            }
        }

        Self {
            entries: by_version
                .into_iter()
                .map(|(version, protocols)| CompatEntry::Runtime { version, protocols })
                .collect(),
        }
    }

    /// Build plugin entries from a plugin version -> protocol listing
    ///
    /// Tags that are not semantic versions are skipped.
    pub fn from_plugin_listing<I>(listing: I) -> Self
    where
        I: IntoIterator<Item = (String, u32)>,
    {
        let mut entries = Vec::new();
        for (raw, protocol) in listing {
            match parse_version(&raw) {
                Ok(version) => entries.push(CompatEntry::Plugin { version, protocol }),
                Err(e) => log::warn!("Skipping plugin compatibility entry: {e}"),
            }
        }
        Self { entries }
    }

    /// Append another table's entries
    pub fn merge(mut self, other: CompatibilityTable) -> Self {
        self.entries.extend(other.entries);
        self
    }

    fn runtimes(&self) -> impl Iterator<Item = (&Version, &BTreeSet<u32>)> {
        self.entries.iter().filter_map(|e| match e {
            CompatEntry::Runtime { version, protocols } => Some((version, protocols)),
            CompatEntry::Plugin { .. } => None,
        })
    }

    fn plugins(&self) -> impl Iterator<Item = (&Version, u32)> {
        self.entries.iter().filter_map(|e| match e {
            CompatEntry::Plugin { version, protocol } => Some((version, *protocol)),
            CompatEntry::Runtime { .. } => None,
        })
    }
}

/// Highest runtime version supporting `protocol`
///
/// Ties between runtime releases are broken by semantic version, not string
/// order.
pub fn resolve_runtime_for(protocol: u32, table: &CompatibilityTable) -> Result<Version> {
    table
        .runtimes()
        .filter(|(_, protocols)| protocols.contains(&protocol))
        .map(|(version, _)| version)
        .max()
        .cloned()
        .ok_or(Error::NoCompatibleVersion { protocol })
}

/// Protocol version spoken by an exact plugin release
pub fn resolve_plugin_rpc(plugin_version: &str, table: &CompatibilityTable) -> Result<u32> {
    let wanted = parse_version(plugin_version)?;
    table
        .plugins()
        .find(|(version, _)| **version == wanted)
        .map(|(_, protocol)| protocol)
        .ok_or_else(|| Error::UnknownPluginVersion {
            version: plugin_version.to_string(),
        })
}

/// Every runtime release that can run a plugin release, newest first
pub fn runtimes_supporting_plugin(
    plugin_version: &str,
    table: &CompatibilityTable,
) -> Result<Vec<Version>> {
    let protocol = resolve_plugin_rpc(plugin_version, table)?;
    let mut versions: Vec<Version> = table
        .runtimes()
        .filter(|(_, protocols)| protocols.contains(&protocol))
        .map(|(version, _)| version.clone())
        .collect();
    versions.sort_unstable_by(|a, b| b.cmp(a));
    versions.dedup();
    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CompatibilityTable {
        CompatibilityTable::new()
            .with_runtime("v1.2.0", [18])
            .unwrap()
            .with_runtime("v1.3.0", [18, 19])
            .unwrap()
            .with_plugin("v0.5.0", 18)
            .unwrap()
            .with_plugin("v0.6.0", 19)
            .unwrap()
    }

    #[test]
    fn test_resolve_runtime_for_picks_highest() {
        let table = table();
        assert_eq!(
            resolve_runtime_for(19, &table).unwrap(),
            Version::new(1, 3, 0)
        );
        assert_eq!(
            resolve_runtime_for(18, &table).unwrap(),
            Version::new(1, 3, 0)
        );
    }

    #[test]
    fn test_resolve_runtime_for_unknown_protocol() {
        let err = resolve_runtime_for(20, &table()).unwrap_err();
        assert_eq!(err, Error::NoCompatibleVersion { protocol: 20 });
    }

    #[test]
    fn test_tie_break_is_semantic() {
        let table = CompatibilityTable::new()
            .with_runtime("v1.9.0", [24])
            .unwrap()
            .with_runtime("v1.10.0", [24])
            .unwrap()
            .with_runtime("v1.2.0", [24])
            .unwrap();

        assert_eq!(
            resolve_runtime_for(24, &table).unwrap(),
            Version::new(1, 10, 0)
        );
    }

    #[test]
    fn test_resolve_plugin_rpc() {
        let table = table();
        assert_eq!(resolve_plugin_rpc("v0.6.0", &table).unwrap(), 19);
        assert_eq!(resolve_plugin_rpc("0.5.0", &table).unwrap(), 18);

        let err = resolve_plugin_rpc("v0.7.0", &table).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownPluginVersion {
                version: "v0.7.0".into()
            }
        );
    }

    #[test]
    fn test_runtimes_supporting_plugin() {
        let table = table();
        assert_eq!(
            runtimes_supporting_plugin("v0.5.0", &table).unwrap(),
            vec![Version::new(1, 3, 0), Version::new(1, 2, 0)]
        );
        assert_eq!(
            runtimes_supporting_plugin("v0.6.0", &table).unwrap(),
            vec![Version::new(1, 3, 0)]
        );
    }

    #[test]
    fn test_from_runtime_listing_inverts_protocols() {
        let table = CompatibilityTable::from_runtime_listing([
            (18, vec!["v1.2.0".to_string(), "v1.3.0".to_string()]),
            (19, vec!["v1.3.0".to_string(), "not-a-version".to_string()]),
        ]);

        assert_eq!(table.len(), 2);
        assert_eq!(
            resolve_runtime_for(19, &table).unwrap(),
            Version::new(1, 3, 0)
        );
        assert_eq!(
            resolve_runtime_for(18, &table).unwrap(),
            Version::new(1, 3, 0)
        );
    }

    #[test]
    fn test_merge_listings() {
        let runtime = CompatibilityTable::from_runtime_listing([(28, vec!["v1.10.12".to_string()])]);
        let plugin = CompatibilityTable::from_plugin_listing([("v0.5.6".to_string(), 28)]);
        let table = runtime.merge(plugin);

        let protocol = resolve_plugin_rpc("v0.5.6", &table).unwrap();
        assert_eq!(
            resolve_runtime_for(protocol, &table).unwrap(),
            Version::new(1, 10, 12)
        );
    }
}
