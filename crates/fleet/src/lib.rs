//! # Fleet
//!
//! Concurrent dispatch and upgrade planning for a cluster of nodes.
//!
//! This crate runs one operation on every host of a cluster at once, keeps
//! every host's outcome (a failing host never hides the others), turns raw
//! node answers into a small status vocabulary, and works out which runtime
//! and plugin versions each host should move to.
//!
//! ## Core Concepts
//!
//! - **Host**: one remote machine, borrowed from the inventory
//! - **RemoteOperation**: anything that can be run against one host
//! - **Dispatcher**: fans an operation out to a host set and waits for all of it
//! - **ResultSet**: exactly one outcome per host, split into values and errors
//! - **CompatibilityTable**: which runtime releases speak which plugin protocol
//! - **UpgradePlan**: what to change on one host, executed in a fixed order
//!
//! ## Example
//!
//! ```ignore
//! use fleet::{Dispatcher, Host, NodeResult};
//!
//! let hosts = vec![Host::new("node-1", "10.0.0.1"), Host::new("node-2", "10.0.0.2")];
//! let set = Dispatcher::new().dispatch(&hosts, &|h: &Host| -> NodeResult<bool> {
//!     query_bootstrapped(h)
//! })?;
//!
//! if set.has_errors() {
//!     eprintln!("failed: {}", set.error_host_map());
//! }
//! ```
//!
//! ## Collaborator Traits
//!
//! - [`RemoteOperation`]: the operation run per host
//! - [`DispatchProgress`]: notified as hosts finish
//! - [`UpgradeActions`]: host-side effects of an upgrade
//!
//! Transport, inventory and release lookups live outside this crate.

pub mod compat;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod host;
pub mod planner;
pub mod results;
pub mod status;
pub mod versions;

pub use compat::{
    CompatEntry, CompatibilityTable, resolve_plugin_rpc, resolve_runtime_for,
    runtimes_supporting_plugin,
};
pub use dispatch::{DispatchOptions, DispatchProgress, Dispatcher, NoProgress, RemoteOperation, dispatch};
pub use error::{Error, ErrorCategory, Result};
pub use executor::{UpgradeActions, execute_plan, execute_plans};
pub use host::{Credential, Host};
pub use planner::{
    LatestVersions, PlanOutcome, UpgradePlan, UpgradeStep, plan_from_round, plan_upgrades,
};
pub use results::{ErrorHostMap, NodeResult, ResultSet};
pub use status::{
    BootstrapStatus, ClusterStatusReport, HealthStatus, HostStatusRow, StatusRounds, SyncStatus,
    interpret_bootstrap, interpret_health, interpret_sync,
};
pub use versions::{NodeVersions, STANDARD_COMPONENTS, parse_version, version_tag};
