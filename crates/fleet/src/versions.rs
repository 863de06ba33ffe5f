//! Component versions reported by a node
//!
//! A node reports a flat mapping from component name to version string. A
//! fixed allow-list separates the standard components (the runtime itself and
//! its built-in engines) from plugin instances, which are keyed by an
//! arbitrary instance identifier.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Component name under which a node reports its runtime version
pub const RUNTIME_COMPONENT: &str = "platform";

/// Built-in component names; anything else is a plugin instance id
pub const STANDARD_COMPONENTS: [&str; 3] = [RUNTIME_COMPONENT, "avm", "evm"];

/// Check whether a component name is one of the standard components
pub fn is_standard_component(name: &str) -> bool {
    STANDARD_COMPONENTS.contains(&name)
}

/// Parse a version string as a semantic version
///
/// Accepts a leading `v` and a `name/` prefix (`luxd/1.10.12`).
pub fn parse_version(raw: &str) -> Result<semver::Version> {
    let trimmed = raw.trim();
    let tail = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let bare = tail.strip_prefix('v').unwrap_or(tail);
    semver::Version::parse(bare).map_err(|e| Error::InvalidVersion {
        version: raw.to_string(),
        message: e.to_string(),
    })
}

/// Compare two version strings semantically
pub fn same_version(a: &str, b: &str) -> Result<bool> {
    Ok(parse_version(a)? == parse_version(b)?)
}

/// Render a version the way release tags are written (`v1.2.3`)
pub fn version_tag(version: &semver::Version) -> String {
    format!("v{version}")
}

/// Typed view of the versions one node reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeVersions {
    /// Runtime version
    pub runtime: String,
    /// Other standard components (built-in engines)
    #[serde(default)]
    pub standard: BTreeMap<String, String>,
    /// Plugin instance id to installed plugin version
    #[serde(default)]
    pub plugins: BTreeMap<String, String>,
}

impl NodeVersions {
    /// Create versions for a node running only the runtime
    pub fn new(runtime: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
            standard: BTreeMap::new(),
            plugins: BTreeMap::new(),
        }
    }

    /// Add a plugin instance
    pub fn with_plugin(mut self, instance_id: impl Into<String>, version: impl Into<String>) -> Self {
        self.plugins.insert(instance_id.into(), version.into());
        self
    }

    /// Split a flat component map using the standard-name allow-list
    ///
    /// Fails with a parse error when the runtime component is missing.
    pub fn from_components<I, K, V>(components: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut runtime = None;
        let mut standard = BTreeMap::new();
        let mut plugins = BTreeMap::new();

        for (name, version) in components {
            let name = name.into();
            let version = version.into();
            if name == RUNTIME_COMPONENT {
                runtime = Some(version);
            } else if is_standard_component(&name) {
                standard.insert(name, version);
            } else {
                plugins.insert(name, version);
            }
        }

        let runtime = runtime.ok_or_else(|| {
            Error::parse(format!("no {RUNTIME_COMPONENT:?} entry in reported versions"))
        })?;

        Ok(Self {
            runtime,
            standard,
            plugins,
        })
    }

    /// Check if the node runs any plugin instance
    pub fn has_plugins(&self) -> bool {
        !self.plugins.is_empty()
    }
}
