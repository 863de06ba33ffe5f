pub mod config;
pub mod list;
pub mod ssh;
pub mod status;
pub mod upgrade;

use crate::Context;
use crate::config::{ClusterConfig, ClustersConfig, Config};
use crate::inventory;
use crate::node_api::NodeApi;
use crate::progress::HostProgress;
use crate::transport::SshTransport;
use anyhow::Result;
use fleet::{Dispatcher, Host, NodeResult, ResultSet};

/// Everything a command needs to talk to one cluster
///
/// Opening a session checks every precondition (known cluster, readable
/// inventory with at least one host) before any node is contacted.
pub struct ClusterSession {
    pub name: String,
    pub cluster: ClusterConfig,
    pub hosts: Vec<Host>,
    pub config: Config,
    pub transport: SshTransport,
}

impl ClusterSession {
    pub fn open(name: &str) -> Result<Self> {
        let config = Config::load()?;
        let clusters = ClustersConfig::load()?;
        Self::from_parts(name, config, &clusters)
    }

    pub fn from_parts(name: &str, config: Config, clusters: &ClustersConfig) -> Result<Self> {
        let cluster = clusters.get(name)?.clone();
        let hosts = inventory::load_cluster(clusters, name)?;
        let transport = SshTransport::new(config.ssh.clone());

        Ok(Self {
            name: name.to_string(),
            cluster,
            hosts,
            config,
            transport,
        })
    }

    /// Dispatcher honouring `[dispatch] max_concurrency`
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::with_options(self.config.dispatch.options())
    }

    pub fn api(&self) -> NodeApi<'_> {
        NodeApi::new(&self.transport, self.config.node.api_url.as_str())
    }
}

/// Run one dispatch round behind a progress bar
pub fn round<T, F>(
    ctx: &Context,
    dispatcher: &Dispatcher,
    hosts: &[Host],
    label: &str,
    op: F,
) -> Result<ResultSet<T>>
where
    F: Fn(&Host) -> NodeResult<T> + Sync,
    T: Send,
{
    log::debug!("Round: {label}");
    let progress = HostProgress::new(hosts.len(), label, ctx.quiet);
    let results = dispatcher.dispatch_with_progress(hosts, &op, &progress);
    progress.finish();
    Ok(results?)
}
