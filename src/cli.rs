use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "nodefleet")]
#[command(author = "Lux Partners")]
#[command(version)]
#[command(about = "Check, reach and upgrade clusters of network nodes", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List defined clusters
    List,

    /// Show bootstrap, health and version status of a cluster
    Status(StatusArgs),

    /// Upgrade a cluster's nodes to the latest compatible releases
    Upgrade(UpgradeArgs),

    /// Print ssh commands for nodes, or run a command on all of them
    Ssh(SshArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
pub struct StatusArgs {
    /// Cluster to check (lists clusters when omitted)
    pub cluster: Option<String>,

    /// Also report sync status for this subnet
    #[arg(long)]
    pub subnet: Option<String>,
}

#[derive(Args)]
pub struct UpgradeArgs {
    /// Cluster to upgrade
    pub cluster: String,

    /// Show the plan without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of nodes upgraded at the same time
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,
}

#[derive(Args)]
pub struct SshArgs {
    /// Cluster to reach (all clusters when omitted)
    pub cluster: Option<String>,

    /// Command to run on every node of the cluster
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved configuration and clusters
    Show,

    /// Print config and state locations
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_upgrade_defaults_to_one_job() {
        let cli = Cli::try_parse_from(["nodefleet", "upgrade", "alpha"]).unwrap();
        let Command::Upgrade(args) = cli.command else {
            panic!("expected upgrade");
        };
        assert_eq!(args.cluster, "alpha");
        assert_eq!(args.jobs, 1);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_upgrade_rejects_zero_jobs() {
        assert!(Cli::try_parse_from(["nodefleet", "upgrade", "alpha", "--jobs", "0"]).is_err());
    }

    #[test]
    fn test_ssh_command_keeps_its_flags() {
        let cli =
            Cli::try_parse_from(["nodefleet", "-v", "ssh", "alpha", "uptime", "-p"]).unwrap();
        assert_eq!(cli.verbose, 1);
        let Command::Ssh(args) = cli.command else {
            panic!("expected ssh");
        };
        assert_eq!(args.cluster.as_deref(), Some("alpha"));
        assert_eq!(args.command, vec!["uptime", "-p"]);
    }

    #[test]
    fn test_status_with_subnet() {
        let cli =
            Cli::try_parse_from(["nodefleet", "status", "alpha", "--subnet", "dex"]).unwrap();
        let Command::Status(args) = cli.command else {
            panic!("expected status");
        };
        assert_eq!(args.subnet.as_deref(), Some("dex"));
    }
}
