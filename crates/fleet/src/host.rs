//! Host descriptors
//!
//! Hosts are owned by the inventory; dispatch rounds only borrow them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How to authenticate against a host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Remote login user (transport default when absent)
    pub user: Option<String>,
    /// Private key file used for the connection
    pub key_path: Option<PathBuf>,
}

/// One remote machine participating in a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    /// Stable identity, unique within a cluster
    pub id: String,
    /// Network address (IP or DNS name)
    pub address: String,
    /// Credential reference
    #[serde(default)]
    pub credential: Credential,
}

impl Host {
    /// Create a host with no credential reference
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            credential: Credential::default(),
        }
    }

    /// Set the login user
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.credential.user = Some(user.into());
        self
    }

    /// Set the private key path
    pub fn with_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.credential.key_path = Some(key_path.into());
        self
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_builder() {
        let host = Host::new("node-1", "10.0.0.1")
            .with_user("ubuntu")
            .with_key("/keys/node.pem");

        assert_eq!(host.credential.user.as_deref(), Some("ubuntu"));
        assert_eq!(
            host.credential.key_path,
            Some(PathBuf::from("/keys/node.pem"))
        );
        assert_eq!(host.to_string(), "node-1 (10.0.0.1)");
    }
}
