use super::{ClusterSession, round};
use crate::Context;
use crate::cli::SshArgs;
use crate::config::{ClustersConfig, Config};
use crate::inventory;
use crate::transport::SshTransport;
use crate::ui;
use anyhow::{Result, bail};
use colored::Colorize;
use fleet::Host;

pub fn run(ctx: &Context, args: SshArgs) -> Result<()> {
    match args.cluster {
        None => print_all(),
        Some(name) if args.command.is_empty() => {
            let session = ClusterSession::open(&name)?;
            print_cluster(
                &session.name,
                &session.cluster.network,
                &connection_lines(&session.hosts, &session.transport),
            );
            Ok(())
        }
        Some(name) => {
            let session = ClusterSession::open(&name)?;
            run_command(ctx, &session, &args.command.join(" "))
        }
    }
}

fn print_all() -> Result<()> {
    let config = Config::load()?;
    let clusters = ClustersConfig::load()?;
    if clusters.is_empty() {
        ui::info("There are no clusters defined.");
        return Ok(());
    }

    let transport = SshTransport::new(config.ssh);
    for (name, cluster) in &clusters.clusters {
        match inventory::load_cluster(&clusters, name) {
            Ok(hosts) => print_cluster(
                name,
                &cluster.network,
                &connection_lines(&hosts, &transport),
            ),
            Err(e) => ui::warn(&format!("Cluster \"{name}\": {e:#}")),
        }
    }
    Ok(())
}

fn connection_lines(hosts: &[Host], transport: &SshTransport) -> Vec<String> {
    hosts
        .iter()
        .map(|h| format!("[{}] {}", h.id, transport.connection_string(h)))
        .collect()
}

fn print_cluster(name: &str, network: &str, lines: &[String]) {
    println!("Cluster {} ({})", format!("\"{name}\"").bold(), network);
    for line in lines {
        println!("  {line}");
    }
    println!();
}

fn run_command(ctx: &Context, session: &ClusterSession, command: &str) -> Result<()> {
    let results = round(
        ctx,
        &session.dispatcher(),
        &session.hosts,
        &format!("Running '{command}'"),
        |h: &Host| session.transport.run(h, command),
    )?;

    for host in &session.hosts {
        if let Some(output) = results.value(&host.id) {
            println!("{} {}", format!("[{}]", host.id).bold(), host.address.dimmed());
            for line in output.lines() {
                println!("  {line}");
            }
        }
    }

    if results.has_errors() {
        let errors = results.error_host_map();
        ui::error_summary(&errors);
        bail!("'{command}' failed on {} host(s)", errors.len());
    }
    Ok(())
}
