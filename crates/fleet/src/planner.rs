//! Upgrade planning
//!
//! Compares what each host runs against the latest releases and decides,
//! per host, which components move and to which version. When plugins move,
//! the runtime target comes from the compatibility table rather than from
//! the latest runtime release, so the pair stays protocol-compatible.

use crate::compat::{CompatibilityTable, resolve_plugin_rpc, resolve_runtime_for};
use crate::error::Result;
use crate::results::{ErrorHostMap, ResultSet};
use crate::versions::{NodeVersions, parse_version, version_tag};
use semver::Version;
use std::collections::BTreeMap;
use std::fmt;

/// Latest published releases of both components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestVersions {
    pub runtime: Version,
    pub plugin: Version,
}

impl LatestVersions {
    /// Parse release tags such as `v1.10.12`
    pub fn parse(runtime: &str, plugin: &str) -> Result<Self> {
        Ok(Self {
            runtime: parse_version(runtime)?,
            plugin: parse_version(plugin)?,
        })
    }
}

/// What to change on one host
///
/// `None` means the component stays as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradePlan {
    pub runtime_version: Option<Version>,
    pub plugin_version: Option<Version>,
    /// Plugin instances to move to `plugin_version`
    pub plugin_ids: Vec<String>,
}

/// One step of executing an [`UpgradePlan`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeStep {
    DownloadRuntime(Version),
    DownloadPlugin(Version),
    StopRuntime,
    ReplacePlugin { instance_id: String, version: Version },
    ReplaceRuntime(Version),
    StartRuntime,
}

impl fmt::Display for UpgradeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DownloadRuntime(v) => write!(f, "download runtime {}", version_tag(v)),
            Self::DownloadPlugin(v) => write!(f, "download plugin {}", version_tag(v)),
            Self::StopRuntime => write!(f, "stop runtime"),
            Self::ReplacePlugin {
                instance_id,
                version,
            } => write!(f, "install plugin {} for {instance_id}", version_tag(version)),
            Self::ReplaceRuntime(v) => write!(f, "install runtime {}", version_tag(v)),
            Self::StartRuntime => write!(f, "start runtime"),
        }
    }
}

impl UpgradePlan {
    /// Check if nothing needs to change
    pub fn is_empty(&self) -> bool {
        self.runtime_version.is_none() && self.plugin_ids.is_empty()
    }

    /// Ordered steps to carry out the plan
    ///
    /// Downloads come before the runtime is stopped and starting it again is
    /// always last, so a failed download leaves the node running.
    pub fn actions(&self) -> Vec<UpgradeStep> {
        if self.is_empty() {
            return Vec::new();
        }

        let plugin = self
            .plugin_version
            .as_ref()
            .filter(|_| !self.plugin_ids.is_empty());

        let mut steps = Vec::new();
        if let Some(v) = &self.runtime_version {
            steps.push(UpgradeStep::DownloadRuntime(v.clone()));
        }
        if let Some(v) = plugin {
            steps.push(UpgradeStep::DownloadPlugin(v.clone()));
        }
        steps.push(UpgradeStep::StopRuntime);
        if let Some(v) = plugin {
            steps.extend(self.plugin_ids.iter().map(|id| UpgradeStep::ReplacePlugin {
                instance_id: id.clone(),
                version: v.clone(),
            }));
        }
        if let Some(v) = &self.runtime_version {
            steps.push(UpgradeStep::ReplaceRuntime(v.clone()));
        }
        steps.push(UpgradeStep::StartRuntime);
        steps
    }
}

/// Plans for the hosts that could be planned, errors for the rest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOutcome {
    /// Includes empty plans for hosts that are already up to date
    pub plans: BTreeMap<String, UpgradePlan>,
    pub errors: ErrorHostMap,
}

impl PlanOutcome {
    /// Hosts with something to do
    pub fn pending(&self) -> impl Iterator<Item = (&str, &UpgradePlan)> {
        self.plans
            .iter()
            .filter(|(_, plan)| !plan.is_empty())
            .map(|(id, plan)| (id.as_str(), plan))
    }

    /// Check if no host needs an upgrade
    pub fn is_up_to_date(&self) -> bool {
        self.pending().next().is_none()
    }
}

/// Plan upgrades for every host in a version map
///
/// A host that cannot be planned goes to the error map; the others are still
/// planned.
pub fn plan_upgrades<'a, I>(
    current: I,
    latest: &LatestVersions,
    table: &CompatibilityTable,
) -> PlanOutcome
where
    I: IntoIterator<Item = (&'a str, &'a NodeVersions)>,
{
    let mut outcome = PlanOutcome::default();
    for (host_id, versions) in current {
        match plan_host(versions, latest, table) {
            Ok(plan) => {
                outcome.plans.insert(host_id.to_string(), plan);
            }
            Err(e) => {
                log::debug!("{host_id}: cannot plan upgrade: {e}");
                outcome.errors.insert(host_id, e);
            }
        }
    }
    outcome
}

/// Plan upgrades from a version round, carrying its failures over
pub fn plan_from_round(
    round: &ResultSet<NodeVersions>,
    latest: &LatestVersions,
    table: &CompatibilityTable,
) -> PlanOutcome {
    let mut outcome = plan_upgrades(round.value_map(), latest, table);
    outcome.errors.extend(round.error_host_map());
    outcome
}

fn plan_host(
    versions: &NodeVersions,
    latest: &LatestVersions,
    table: &CompatibilityTable,
) -> Result<UpgradePlan> {
    let installed_runtime = parse_version(&versions.runtime)?;

    let mut plan = UpgradePlan::default();
    for (instance_id, installed) in &versions.plugins {
        if parse_version(installed)? != latest.plugin {
            plan.plugin_ids.push(instance_id.clone());
        }
    }

    let target_runtime = if plan.plugin_ids.is_empty() {
        latest.runtime.clone()
    } else {
        plan.plugin_version = Some(latest.plugin.clone());
        let protocol = resolve_plugin_rpc(&version_tag(&latest.plugin), table)?;
        resolve_runtime_for(protocol, table)?
    };

    if target_runtime != installed_runtime {
        if target_runtime < installed_runtime {
            log::warn!(
                "Runtime target {} is older than installed {}",
                version_tag(&target_runtime),
                version_tag(&installed_runtime)
            );
        }
        plan.runtime_version = Some(target_runtime);
    }

    Ok(plan)
}
