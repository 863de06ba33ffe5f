//! Backend traits and implementations for release lookups.
//!
//! [`github::GitHubBackend`] talks to GitHub and the raw compatibility
//! documents; [`MockBackend`] serves canned answers for tests.
//!
//! # Testing
//!
//! ```
//! use releases::backend::{Backend, MockBackend};
//! use releases::ReleaseSource;
//!
//! let mock = MockBackend::new();
//! mock.set_latest("luxdefi/node", "v1.10.12");
//!
//! let tag = mock.latest_release(&ReleaseSource::runtime()).unwrap();
//! assert_eq!(tag, "v1.10.12");
//! ```

pub mod github;

use crate::error::{Error, Result};
use crate::types::{PluginCompatibility, ReleaseSource, RuntimeCompatibility};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Backend trait for release lookups.
///
/// Backends do a single attempt; retrying is the client's job.
pub trait Backend: Send + Sync {
    /// Tag of the latest published release of a source.
    fn latest_release(&self, source: &ReleaseSource) -> Result<String>;

    /// Fetch a runtime compatibility document.
    fn runtime_compatibility(&self, url: &str) -> Result<RuntimeCompatibility>;

    /// Fetch a plugin compatibility document.
    fn plugin_compatibility(&self, url: &str) -> Result<PluginCompatibility>;
}

/// Mock backend for testing without network access.
///
/// Unknown repositories and URLs answer with HTTP 404. Transient failures can
/// be queued with [`fail_next`](Self::fail_next) to exercise retries.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    latest: Arc<Mutex<HashMap<String, String>>>,
    runtime: Arc<Mutex<HashMap<String, RuntimeCompatibility>>>,
    plugin: Arc<Mutex<HashMap<String, PluginCompatibility>>>,
    pending_failures: Arc<Mutex<u32>>,
    calls: Arc<Mutex<u32>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the latest release tag of a repository.
    pub fn set_latest(&self, repo: impl Into<String>, tag: impl Into<String>) {
        self.latest.lock().unwrap().insert(repo.into(), tag.into());
    }

    /// Serve a runtime compatibility document at `url`.
    pub fn set_runtime_compatibility(&self, url: impl Into<String>, doc: RuntimeCompatibility) {
        self.runtime.lock().unwrap().insert(url.into(), doc);
    }

    /// Serve a plugin compatibility document at `url`.
    pub fn set_plugin_compatibility(&self, url: impl Into<String>, doc: PluginCompatibility) {
        self.plugin.lock().unwrap().insert(url.into(), doc);
    }

    /// Make the next `count` calls fail with a transient network error.
    pub fn fail_next(&self, count: u32) {
        *self.pending_failures.lock().unwrap() = count;
    }

    /// Number of calls made so far, failed ones included.
    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }

    fn enter(&self) -> Result<()> {
        *self.calls.lock().unwrap() += 1;
        let mut pending = self.pending_failures.lock().unwrap();
        if *pending > 0 {
            *pending -= 1;
            return Err(Error::http("connection reset by peer", None));
        }
        Ok(())
    }
}

fn not_found(what: &str) -> Error {
    Error::http(format!("HTTP 404 for {what}"), Some(404))
}

impl Backend for MockBackend {
    fn latest_release(&self, source: &ReleaseSource) -> Result<String> {
        self.enter()?;
        self.latest
            .lock()
            .unwrap()
            .get(&source.repo)
            .cloned()
            .ok_or_else(|| Error::NoRelease {
                repo: source.repo.clone(),
            })
    }

    fn runtime_compatibility(&self, url: &str) -> Result<RuntimeCompatibility> {
        self.enter()?;
        self.runtime
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| not_found(url))
    }

    fn plugin_compatibility(&self, url: &str) -> Result<PluginCompatibility> {
        self.enter()?;
        self.plugin
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| not_found(url))
    }
}
