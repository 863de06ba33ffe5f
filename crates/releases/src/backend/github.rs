//! GitHub releases backend.
//!
//! Latest releases come from GitHub's Releases API; compatibility documents
//! are plain JSON files fetched from their configured URLs.
//!
//! # Rate Limiting
//!
//! Unauthenticated API requests are limited to 60 per hour. Pass a token with
//! [`GitHubBackend::with_token`] to lift the limit.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{PluginCompatibility, ReleaseSource, RuntimeCompatibility};
use serde::Deserialize;

const USER_AGENT: &str = "nodefleet";

/// GitHub releases backend.
pub struct GitHubBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// GitHub API base URL.
    api_base: String,
    /// Bearer token for API requests.
    token: Option<String>,
}

impl GitHubBackend {
    /// Create a new GitHub backend.
    #[must_use]
    pub fn new() -> Self {
        Self::with_api_base("https://api.github.com")
    }

    /// Create a backend with a custom API base (for mirrors and testing).
    #[must_use]
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            api_base: api_base.into(),
            token: None,
        }
    }

    /// Authenticate API requests with a token.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build the API URL for a repository's latest release.
    fn latest_release_url(&self, repo: &str) -> String {
        format!("{}/repos/{}/releases/latest", self.api_base, repo)
    }

    fn get_json<T>(&self, url: &str, api: bool) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        log::debug!("GET {url}");
        let mut request = self.agent.get(url).header("User-Agent", USER_AGENT);
        if api {
            request = request.header("Accept", "application/vnd.github+json");
            if let Some(token) = &self.token {
                request = request.header("Authorization", format!("Bearer {token}"));
            }
        }

        let value = request.call()?.body_mut().read_json()?;
        Ok(value)
    }
}

impl Default for GitHubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for GitHubBackend {
    fn latest_release(&self, source: &ReleaseSource) -> Result<String> {
        let release: GitHubRelease = self.get_json(&self.latest_release_url(&source.repo), true)?;
        release.into_tag(&source.repo)
    }

    fn runtime_compatibility(&self, url: &str) -> Result<RuntimeCompatibility> {
        self.get_json(url, false)
    }

    fn plugin_compatibility(&self, url: &str) -> Result<PluginCompatibility> {
        self.get_json(url, false)
    }
}

// =============================================================================
// GitHub API response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: Option<String>,
}

impl GitHubRelease {
    fn into_tag(self, repo: &str) -> Result<String> {
        self.tag_name
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::NoRelease {
                repo: repo.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_release_url() {
        let backend = GitHubBackend::new();
        assert_eq!(
            backend.latest_release_url("luxdefi/node"),
            "https://api.github.com/repos/luxdefi/node/releases/latest"
        );
    }

    #[test]
    fn test_custom_api_base() {
        let backend = GitHubBackend::with_api_base("https://mirror.example.com");
        assert_eq!(backend.api_base(), "https://mirror.example.com");
        assert_eq!(
            backend.latest_release_url("luxdefi/subnet-evm"),
            "https://mirror.example.com/repos/luxdefi/subnet-evm/releases/latest"
        );
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let backend = GitHubBackend::new().with_token(Some("  ".to_string()));
        assert!(backend.token.is_none());

        let backend = GitHubBackend::new().with_token(Some("ghp_abc".to_string()));
        assert_eq!(backend.token.as_deref(), Some("ghp_abc"));
    }

    #[test]
    fn test_release_tag() {
        let release: GitHubRelease =
            serde_json::from_str(r#"{"tag_name": "v1.10.12", "name": "Release"}"#).unwrap();
        assert_eq!(release.into_tag("luxdefi/node").unwrap(), "v1.10.12");

        let release: GitHubRelease = serde_json::from_str(r#"{"message": "Not Found"}"#).unwrap();
        assert!(matches!(
            release.into_tag("luxdefi/node"),
            Err(Error::NoRelease { .. })
        ));
    }
}
