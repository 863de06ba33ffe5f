//! Upgrade plan execution
//!
//! Runs the steps of an [`UpgradePlan`] in order through an injected
//! [`UpgradeActions`] implementation. The executor owns the ordering; the
//! actions only know how to do one thing on one host.

use crate::dispatch::{DispatchProgress, Dispatcher};
use crate::error::{Error, Result};
use crate::host::Host;
use crate::planner::{UpgradePlan, UpgradeStep};
use crate::results::{NodeResult, ResultSet};
use semver::Version;
use std::collections::BTreeMap;

/// Host-side effects needed to upgrade a node
///
/// Implementations are shared across dispatch workers.
pub trait UpgradeActions: Sync {
    fn download_runtime(&self, host: &Host, version: &Version) -> NodeResult<()>;

    fn download_plugin(&self, host: &Host, version: &Version) -> NodeResult<()>;

    fn stop_runtime(&self, host: &Host) -> NodeResult<()>;

    /// Install the downloaded plugin as the binary for `instance_id`
    fn replace_plugin(&self, host: &Host, instance_id: &str, version: &Version) -> NodeResult<()>;

    /// Install the downloaded runtime in place of the current one
    fn replace_runtime(&self, host: &Host, version: &Version) -> NodeResult<()>;

    fn start_runtime(&self, host: &Host) -> NodeResult<()>;
}

fn run_step<A>(host: &Host, step: &UpgradeStep, actions: &A) -> NodeResult<()>
where
    A: UpgradeActions + ?Sized,
{
    match step {
        UpgradeStep::DownloadRuntime(v) => actions.download_runtime(host, v),
        UpgradeStep::DownloadPlugin(v) => actions.download_plugin(host, v),
        UpgradeStep::StopRuntime => actions.stop_runtime(host),
        UpgradeStep::ReplacePlugin {
            instance_id,
            version,
        } => actions.replace_plugin(host, instance_id, version),
        UpgradeStep::ReplaceRuntime(v) => actions.replace_runtime(host, v),
        UpgradeStep::StartRuntime => actions.start_runtime(host),
    }
}

/// Carry out one host's plan, stopping at the first failed step
pub fn execute_plan<A>(host: &Host, plan: &UpgradePlan, actions: &A) -> NodeResult<()>
where
    A: UpgradeActions + ?Sized,
{
    for step in plan.actions() {
        log::info!("{}: {}", host.id, step);
        run_step(host, &step, actions).map_err(|e| Error::StepFailed {
            step: step.to_string(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}

/// Carry out plans on many hosts through the dispatcher
///
/// Only hosts with a non-empty plan take part in the round. The dispatcher's
/// concurrency cap bounds how many nodes are down at the same time.
pub fn execute_plans<A, P>(
    dispatcher: &Dispatcher,
    hosts: &[Host],
    plans: &BTreeMap<String, UpgradePlan>,
    actions: &A,
    progress: &P,
) -> Result<ResultSet<()>>
where
    A: UpgradeActions + ?Sized,
    P: DispatchProgress + ?Sized,
{
    let targets: Vec<Host> = hosts
        .iter()
        .filter(|h| plans.get(&h.id).is_some_and(|p| !p.is_empty()))
        .cloned()
        .collect();

    let op = |host: &Host| -> NodeResult<()> {
        match plans.get(&host.id) {
            Some(plan) => execute_plan(host, plan, actions),
            None => Ok(()),
        }
    };

    dispatcher.dispatch_with_progress(&targets, &op, progress)
}
