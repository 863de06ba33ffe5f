//! Running commands on nodes over ssh
//!
//! Each call spawns the system `ssh` client. The remote side is wrapped in
//! `timeout` so a hung command cannot stall a dispatch round.

use crate::config::SshConfig;
use fleet::{Error, Host, NodeResult};
use std::process::{Command, Stdio};

/// Exit status `timeout(1)` reports when the deadline hit
const TIMEOUT_EXIT: i32 = 124;

#[derive(Debug, Clone)]
pub struct SshTransport {
    config: SshConfig,
}

impl SshTransport {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    fn user<'a>(&'a self, host: &'a Host) -> &'a str {
        host.credential.user.as_deref().unwrap_or(&self.config.user)
    }

    /// Arguments for `ssh`, without the remote command
    pub fn ssh_args(&self, host: &Host) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "IdentitiesOnly=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout_secs),
        ];
        for option in &self.config.extra_options {
            args.push("-o".to_string());
            args.push(option.clone());
        }
        if let Some(key) = &host.credential.key_path {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }
        args.push(format!("{}@{}", self.user(host), host.address));
        args
    }

    /// Command line an operator can paste to log into `host`
    pub fn connection_string(&self, host: &Host) -> String {
        format!("ssh {}", self.ssh_args(host).join(" "))
    }

    /// Remote command with its deadline attached
    pub fn wrap(&self, command: &str) -> String {
        format!(
            "timeout {} sh -c {}",
            self.config.command_timeout_secs,
            shell_quote(command)
        )
    }

    /// Run `command` on `host` and return its trimmed stdout
    pub fn run(&self, host: &Host, command: &str) -> NodeResult<String> {
        let mut args = vec!["-o".to_string(), "BatchMode=yes".to_string()];
        args.extend(self.ssh_args(host));
        args.push(self.wrap(command));

        log::trace!("{}: {}", host.id, command);
        let output = Command::new("ssh")
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::transport(format!("failed to execute ssh: {e}")))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = match output.status.code() {
            Some(TIMEOUT_EXIT) => format!(
                "command timed out after {}s",
                self.config.command_timeout_secs
            ),
            _ if !stderr.is_empty() => stderr,
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        };
        Err(Error::transport(message))
    }
}

/// Quote a string for a POSIX shell
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
