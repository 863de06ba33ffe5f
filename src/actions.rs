//! Upgrade steps carried out over ssh
//!
//! Releases are downloaded and unpacked into a per-version staging
//! directory under `[node] download_dir`, then copied into place while the
//! node service is stopped.

use crate::config::NodeConfig;
use crate::transport::{SshTransport, shell_quote};
use fleet::{Host, NodeResult, UpgradeActions, version_tag};
use releases::ReleaseSource;
use semver::Version;

pub struct RemoteUpgrade<'a> {
    transport: &'a SshTransport,
    node: &'a NodeConfig,
    runtime: &'a ReleaseSource,
    plugin: &'a ReleaseSource,
}

impl<'a> RemoteUpgrade<'a> {
    pub fn new(
        transport: &'a SshTransport,
        node: &'a NodeConfig,
        runtime: &'a ReleaseSource,
        plugin: &'a ReleaseSource,
    ) -> Self {
        Self {
            transport,
            node,
            runtime,
            plugin,
        }
    }

    fn staging_dir(&self, source: &ReleaseSource, version: &Version) -> String {
        format!(
            "{}/{}-{}",
            self.node.download_dir.trim_end_matches('/'),
            source.binary,
            version_tag(version)
        )
    }

    /// Fetch and unpack a release into its staging directory
    pub fn download_command(&self, source: &ReleaseSource, version: &Version) -> String {
        let tag = version_tag(version);
        let dir = self.staging_dir(source, version);
        let archive = format!("{dir}/{}", source.archive_name(&tag));
        format!(
            "mkdir -p {dir} && curl -fsSL -o {archive} {url} && tar -xzf {archive} -C {dir}",
            dir = shell_quote(&dir),
            archive = shell_quote(&archive),
            url = shell_quote(&source.download_url(&tag)),
        )
    }

    /// Copy a staged binary to `dest`
    pub fn install_command(&self, source: &ReleaseSource, version: &Version, dest: &str) -> String {
        let dest_dir = dest.rsplit_once('/').map_or(".", |(dir, _)| dir);
        format!(
            "src=$(find {dir} -type f -name {binary} | head -n 1) && test -n \"$src\" \
             && mkdir -p {dest_dir} && cp \"$src\" {dest} && chmod 755 {dest}",
            dir = shell_quote(&self.staging_dir(source, version)),
            binary = shell_quote(&source.binary),
            dest_dir = shell_quote(dest_dir),
            dest = shell_quote(dest),
        )
    }

    pub fn service_command(&self, action: &str) -> String {
        format!("sudo systemctl {action} {}", shell_quote(&self.node.service_name))
    }

    /// Where a plugin instance's binary lives
    pub fn plugin_path(&self, instance_id: &str) -> String {
        format!("{}/{}", self.node.plugin_dir.trim_end_matches('/'), instance_id)
    }

    pub fn runtime_path(&self) -> String {
        format!(
            "{}/{}",
            self.node.runtime_dir.trim_end_matches('/'),
            self.runtime.binary
        )
    }

    fn exec(&self, host: &Host, command: &str) -> NodeResult<()> {
        self.transport.run(host, command).map(|_| ())
    }
}

impl UpgradeActions for RemoteUpgrade<'_> {
    fn download_runtime(&self, host: &Host, version: &Version) -> NodeResult<()> {
        self.exec(host, &self.download_command(self.runtime, version))
    }

    fn download_plugin(&self, host: &Host, version: &Version) -> NodeResult<()> {
        self.exec(host, &self.download_command(self.plugin, version))
    }

    fn stop_runtime(&self, host: &Host) -> NodeResult<()> {
        self.exec(host, &self.service_command("stop"))
    }

    fn replace_plugin(&self, host: &Host, instance_id: &str, version: &Version) -> NodeResult<()> {
        let dest = self.plugin_path(instance_id);
        self.exec(host, &self.install_command(self.plugin, version, &dest))
    }

    fn replace_runtime(&self, host: &Host, version: &Version) -> NodeResult<()> {
        let dest = self.runtime_path();
        self.exec(host, &self.install_command(self.runtime, version, &dest))
    }

    fn start_runtime(&self, host: &Host) -> NodeResult<()> {
        self.exec(host, &self.service_command("start"))
    }
}
