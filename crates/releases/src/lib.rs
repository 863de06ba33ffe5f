//! # releases
//!
//! Release lookups for node upgrades.
//!
//! This crate provides functionality for:
//! - Finding the latest published runtime and plugin releases
//! - Fetching both compatibility documents and merging them into one
//!   [`fleet::CompatibilityTable`]
//! - Retrying transient network failures with exponential backoff
//!
//! ## Example
//!
//! ```no_run
//! use releases::{Client, ReleaseSource};
//!
//! let client = Client::new();
//! let runtime = ReleaseSource::runtime();
//! let plugin = ReleaseSource::plugin();
//!
//! let latest = client.latest_versions(&runtime, &plugin).unwrap();
//! let table = client.compatibility_table(&runtime, &plugin).unwrap();
//! println!("latest plugin v{} ({} table entries)", latest.plugin, table.len());
//! ```

pub mod backend;
pub mod error;
pub mod retry;
pub mod types;

pub use backend::MockBackend;
pub use error::{Error, ErrorCategory, Result};
pub use retry::{LogCallback, RetryCallback, with_retry};
pub use types::{PluginCompatibility, ReleaseSource, RetryConfig, RuntimeCompatibility};

use backend::Backend;
use backend::github::GitHubBackend;
use fleet::{CompatibilityTable, LatestVersions};

/// Environment variable holding a GitHub API token.
pub const GITHUB_TOKEN_ENV: &str = "NODEFLEET_GITHUB_TOKEN";

/// High-level client for release lookups.
///
/// Every network call goes through [`with_retry`].
pub struct Client {
    backend: Box<dyn Backend>,
    retry: RetryConfig,
}

impl Client {
    /// Create a client with the GitHub backend, authenticated when
    /// [`GITHUB_TOKEN_ENV`] is set.
    #[must_use]
    pub fn new() -> Self {
        let backend = GitHubBackend::new().with_token(std::env::var(GITHUB_TOKEN_ENV).ok());
        Self::with_backend(Box::new(backend))
    }

    /// Create a client with a custom backend (useful for testing).
    #[must_use]
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            retry: RetryConfig::default(),
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Tag of the latest release of a source.
    pub fn latest_version(&self, source: &ReleaseSource) -> Result<String> {
        let tag = with_retry(&self.retry, Some(&LogCallback), || {
            self.backend.latest_release(source)
        })?;
        log::debug!("Latest release of {}: {}", source.repo, tag);
        Ok(tag)
    }

    /// Latest runtime and plugin releases, parsed.
    pub fn latest_versions(
        &self,
        runtime: &ReleaseSource,
        plugin: &ReleaseSource,
    ) -> Result<LatestVersions> {
        let runtime_tag = self.latest_version(runtime)?;
        let plugin_tag = self.latest_version(plugin)?;
        Ok(LatestVersions::parse(&runtime_tag, &plugin_tag)?)
    }

    /// Both compatibility documents merged into one table.
    pub fn compatibility_table(
        &self,
        runtime: &ReleaseSource,
        plugin: &ReleaseSource,
    ) -> Result<CompatibilityTable> {
        let runtime_doc = with_retry(&self.retry, Some(&LogCallback), || {
            self.backend.runtime_compatibility(&runtime.compatibility_url)
        })?;
        let plugin_doc = with_retry(&self.retry, Some(&LogCallback), || {
            self.backend.plugin_compatibility(&plugin.compatibility_url)
        })?;

        let table = CompatibilityTable::from_runtime_listing(runtime_doc.listing()?).merge(
            CompatibilityTable::from_plugin_listing(plugin_doc.rpc_chain_vm_protocol_version),
        );
        log::debug!("Compatibility table has {} entries", table.len());
        Ok(table)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet::resolve_plugin_rpc;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            max_delay: Duration::from_millis(5),
        }
    }

    fn mock() -> MockBackend {
        let mock = MockBackend::new();
        mock.set_latest("luxdefi/node", "v1.10.12");
        mock.set_latest("luxdefi/subnet-evm", "v0.5.6");

        let mut runtime = BTreeMap::new();
        runtime.insert(
            "28".to_string(),
            vec!["v1.10.11".to_string(), "v1.10.12".to_string()],
        );
        runtime.insert("27".to_string(), vec!["v1.10.10".to_string()]);
        mock.set_runtime_compatibility(
            ReleaseSource::runtime().compatibility_url,
            RuntimeCompatibility(runtime),
        );

        let mut plugin = BTreeMap::new();
        plugin.insert("v0.5.6".to_string(), 28);
        plugin.insert("v0.5.5".to_string(), 27);
        mock.set_plugin_compatibility(
            ReleaseSource::plugin().compatibility_url,
            PluginCompatibility {
                rpc_chain_vm_protocol_version: plugin,
            },
        );
        mock
    }

    #[test]
    fn test_latest_versions() {
        let client = Client::with_backend(Box::new(mock())).with_retry_config(fast_retry());

        let latest = client
            .latest_versions(&ReleaseSource::runtime(), &ReleaseSource::plugin())
            .unwrap();

        assert_eq!(latest.runtime, fleet::parse_version("v1.10.12").unwrap());
        assert_eq!(latest.plugin, fleet::parse_version("v0.5.6").unwrap());
    }

    #[test]
    fn test_compatibility_table() {
        let client = Client::with_backend(Box::new(mock())).with_retry_config(fast_retry());

        let table = client
            .compatibility_table(&ReleaseSource::runtime(), &ReleaseSource::plugin())
            .unwrap();

        assert_eq!(resolve_plugin_rpc("v0.5.5", &table).unwrap(), 27);
        assert_eq!(
            fleet::resolve_runtime_for(28, &table).unwrap(),
            fleet::parse_version("v1.10.12").unwrap()
        );
    }

    #[test]
    fn test_transient_failures_are_retried() {
        let backend = mock();
        backend.fail_next(2);
        let client = Client::with_backend(Box::new(backend.clone())).with_retry_config(fast_retry());

        let tag = client.latest_version(&ReleaseSource::runtime()).unwrap();

        assert_eq!(tag, "v1.10.12");
        assert_eq!(backend.calls(), 3);
    }

    #[test]
    fn test_missing_release_is_not_retried() {
        let backend = MockBackend::new();
        let client = Client::with_backend(Box::new(backend.clone())).with_retry_config(fast_retry());

        let err = client.latest_version(&ReleaseSource::plugin()).unwrap_err();

        assert!(matches!(err, Error::NoRelease { .. }));
        assert_eq!(backend.calls(), 1);
    }
}
