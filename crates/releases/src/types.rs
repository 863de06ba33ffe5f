//! Core types for release lookups.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Where a component's releases and compatibility data live
///
/// Templates use `{version}` (without the leading `v`), `{tag}`, `{repo}`
/// and `{archive}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSource {
    /// GitHub repository (`owner/name`)
    pub repo: String,
    /// URL of the compatibility document
    pub compatibility_url: String,
    /// Release archive file name
    pub archive_template: String,
    /// Download URL of a release archive
    pub release_url_template: String,
    /// Name of the executable inside the archive
    pub binary: String,
}

impl ReleaseSource {
    /// Node runtime releases
    pub fn runtime() -> Self {
        Self {
            repo: "luxdefi/node".to_string(),
            compatibility_url:
                "https://raw.githubusercontent.com/luxdefi/node/master/version/compatibility.json"
                    .to_string(),
            archive_template: "node-linux-amd64-v{version}.tar.gz".to_string(),
            release_url_template: "https://github.com/{repo}/releases/download/{tag}/{archive}"
                .to_string(),
            binary: "node".to_string(),
        }
    }

    /// Plugin (execution engine) releases
    pub fn plugin() -> Self {
        Self {
            repo: "luxdefi/subnet-evm".to_string(),
            compatibility_url:
                "https://raw.githubusercontent.com/luxdefi/subnet-evm/master/compatibility.json"
                    .to_string(),
            archive_template: "subnet-evm_{version}_linux_amd64.tar.gz".to_string(),
            release_url_template: "https://github.com/{repo}/releases/download/{tag}/{archive}"
                .to_string(),
            binary: "subnet-evm".to_string(),
        }
    }

    /// Archive file name for a release tag
    pub fn archive_name(&self, tag: &str) -> String {
        let version = tag.strip_prefix('v').unwrap_or(tag);
        self.archive_template
            .replace("{version}", version)
            .replace("{tag}", tag)
    }

    /// Download URL for a release tag
    pub fn download_url(&self, tag: &str) -> String {
        self.release_url_template
            .replace("{repo}", &self.repo)
            .replace("{tag}", tag)
            .replace("{archive}", &self.archive_name(tag))
    }
}

/// Runtime compatibility document: protocol version -> runtime tags
///
/// Keys are protocol versions written as strings, e.g. `{"19": ["v1.9.6"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeCompatibility(pub BTreeMap<String, Vec<String>>);

impl RuntimeCompatibility {
    /// Protocol versions with their runtime tags
    pub fn listing(&self) -> Result<Vec<(u32, Vec<String>)>> {
        self.0
            .iter()
            .map(|(protocol, tags)| {
                let protocol = protocol.parse::<u32>().map_err(|e| {
                    Error::InvalidResponse(format!("protocol version {protocol:?}: {e}"))
                })?;
                Ok((protocol, tags.clone()))
            })
            .collect()
    }
}

/// Plugin compatibility document: plugin tag -> protocol version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginCompatibility {
    #[serde(rename = "rpcChainVMProtocolVersion")]
    pub rpc_chain_vm_protocol_version: BTreeMap<String, u32>,
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Create a retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            ..Self::default()
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_archive_and_url() {
        let source = ReleaseSource::plugin();
        assert_eq!(
            source.archive_name("v0.5.6"),
            "subnet-evm_0.5.6_linux_amd64.tar.gz"
        );
        assert_eq!(
            source.download_url("v0.5.6"),
            "https://github.com/luxdefi/subnet-evm/releases/download/v0.5.6/subnet-evm_0.5.6_linux_amd64.tar.gz"
        );
    }

    #[test]
    fn test_runtime_archive() {
        assert_eq!(
            ReleaseSource::runtime().archive_name("v1.10.12"),
            "node-linux-amd64-v1.10.12.tar.gz"
        );
    }

    #[test]
    fn test_runtime_compatibility_listing() {
        let doc: RuntimeCompatibility =
            serde_json::from_str(r#"{"19": ["v1.9.6", "v1.9.7"], "18": ["v1.9.5"]}"#).unwrap();
        let listing = doc.listing().unwrap();

        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0], (18, vec!["v1.9.5".to_string()]));
        assert_eq!(listing[1].1.len(), 2);
    }

    #[test]
    fn test_runtime_compatibility_bad_key() {
        let doc: RuntimeCompatibility = serde_json::from_str(r#"{"x": ["v1.9.6"]}"#).unwrap();
        assert!(matches!(doc.listing(), Err(Error::InvalidResponse(_))));
    }

    #[test]
    fn test_plugin_compatibility_decode() {
        let doc: PluginCompatibility = serde_json::from_str(
            r#"{"rpcChainVMProtocolVersion": {"v0.5.6": 28, "v0.5.5": 27}}"#,
        )
        .unwrap();
        assert_eq!(doc.rpc_chain_vm_protocol_version.get("v0.5.6"), Some(&28));
    }

    #[test]
    fn test_retry_config_delay() {
        let config = RetryConfig::new(5, Duration::from_secs(1), 2.0);

        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
    }

    #[test]
    fn test_retry_config_max_delay() {
        let config = RetryConfig {
            max_delay: Duration::from_secs(5),
            ..RetryConfig::new(10, Duration::from_secs(1), 2.0)
        };

        assert_eq!(config.delay_for_attempt(5), Duration::from_secs(5));
        assert_eq!(RetryConfig::no_retry().max_attempts, 1);
    }
}
