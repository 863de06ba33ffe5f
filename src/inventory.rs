//! Ansible-style inventory files
//!
//! ```text
//! [validators]
//! node-1 ansible_host=10.0.0.1 ansible_user=ubuntu ansible_ssh_private_key_file=~/.ssh/node.pem
//! node-2 ansible_host=10.0.0.2
//! ```
//!
//! Group headers, blank lines and `#`/`;` comments are skipped, as are the
//! bodies of `[group:vars]` and `[group:children]` sections. Unknown
//! `key=value` pairs are ignored.

use crate::config::ClustersConfig;
use crate::paths;
use anyhow::{Context, Result, bail};
use fleet::Host;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("line {line}: host '{host}' has no ansible_host")]
    MissingAddress { line: usize, host: String },

    #[error("line {line}: host '{host}' is listed twice")]
    DuplicateHost { line: usize, host: String },

    #[error("line {line}: expected key=value, found '{token}'")]
    Malformed { line: usize, token: String },
}

/// Parse inventory text into hosts, in file order
pub fn parse(content: &str) -> Result<Vec<Host>, InventoryError> {
    let mut hosts = Vec::new();
    let mut seen = HashSet::new();
    let mut in_host_section = true;

    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();

        if text.is_empty() || text.starts_with('#') || text.starts_with(';') {
            continue;
        }

        if let Some(section) = text.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            in_host_section = !section.ends_with(":vars") && !section.ends_with(":children");
            continue;
        }
        if !in_host_section {
            continue;
        }

        let mut tokens = text.split_whitespace();
        let Some(id) = tokens.next() else { continue };

        let mut address = None;
        let mut user = None;
        let mut key = None;
        for token in tokens {
            let (name, value) = token.split_once('=').ok_or_else(|| InventoryError::Malformed {
                line,
                token: token.to_string(),
            })?;
            match name {
                "ansible_host" => address = Some(value),
                "ansible_user" => user = Some(value),
                "ansible_ssh_private_key_file" => key = Some(value),
                _ => log::trace!("line {line}: ignoring {name}"),
            }
        }

        let address = address.ok_or_else(|| InventoryError::MissingAddress {
            line,
            host: id.to_string(),
        })?;

        if !seen.insert(id.to_string()) {
            return Err(InventoryError::DuplicateHost {
                line,
                host: id.to_string(),
            });
        }

        let mut host = Host::new(id, address);
        if let Some(user) = user {
            host = host.with_user(user);
        }
        if let Some(key) = key {
            host = host.with_key(paths::expand(key));
        }
        hosts.push(host);
    }

    Ok(hosts)
}

/// Read an inventory file; an inventory without hosts is an error
pub fn load(path: &Path) -> Result<Vec<Host>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read inventory: {}", path.display()))?;
    let hosts =
        parse(&content).with_context(|| format!("Invalid inventory: {}", path.display()))?;

    if hosts.is_empty() {
        bail!("Inventory {} has no hosts", path.display());
    }

    log::debug!("Loaded {} host(s) from {}", hosts.len(), path.display());
    Ok(hosts)
}

/// Hosts of a named cluster
pub fn load_cluster(clusters: &ClustersConfig, name: &str) -> Result<Vec<Host>> {
    let path = clusters.inventory_path(name)?;
    load(&path).with_context(|| format!("Cannot list hosts of cluster '{name}'"))
}
