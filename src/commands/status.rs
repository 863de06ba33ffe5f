use super::{ClusterSession, list, round};
use crate::Context;
use crate::cli::StatusArgs;
use crate::state::FleetState;
use crate::ui::{self, Cell};
use anyhow::{Result, bail};
use colored::{Color, Colorize};
use fleet::{
    BootstrapStatus, ClusterStatusReport, HealthStatus, Host, HostStatusRow, StatusRounds,
    SyncStatus,
};

pub fn run(ctx: &Context, args: StatusArgs) -> Result<()> {
    let Some(name) = args.cluster else {
        return list::run(ctx);
    };

    let session = ClusterSession::open(&name)?;
    let subnet = args.subnet.as_deref();
    let blockchain_id = subnet
        .map(|s| session.cluster.blockchain_id(s))
        .transpose()?;

    let dispatcher = session.dispatcher();
    let api = session.api();
    let hosts = &session.hosts;

    let bootstrap = round(ctx, &dispatcher, hosts, "Checking bootstrap status", |h: &Host| {
        api.is_bootstrapped(h)
    })?;
    let health = round(ctx, &dispatcher, hosts, "Checking health", |h: &Host| {
        api.is_healthy(h)
    })?;
    let versions = round(ctx, &dispatcher, hosts, "Fetching versions", |h: &Host| {
        api.node_versions(h)
    })?;

    // Only bootstrapped nodes can answer for a subnet.
    let sync = match blockchain_id {
        Some(id) => {
            let bootstrapped: Vec<Host> = hosts
                .iter()
                .filter(|h| bootstrap.value(&h.id) == Some(&true))
                .cloned()
                .collect();
            Some(round(
                ctx,
                &dispatcher,
                &bootstrapped,
                "Checking subnet sync status",
                |h: &Host| api.blockchain_status(h, id),
            )?)
        }
        None => None,
    };

    let report = ClusterStatusReport::build(
        hosts,
        &StatusRounds {
            bootstrap: &bootstrap,
            health: &health,
            versions: &versions,
            sync: sync.as_ref(),
        },
    );

    render(&session, subnet, &report);

    match FleetState::load() {
        Ok(state) => {
            if let Some(record) = state.last_upgrade(&name) {
                ui::kv(
                    "Last upgrade",
                    &record
                        .finished_at
                        .format("%Y-%m-%d %H:%M:%S UTC")
                        .to_string(),
                );
            }
        }
        Err(e) => log::warn!("Could not read state: {e:#}"),
    }

    if report.has_errors() {
        ui::error_summary(&report.errors);
        bail!(
            "{} of {} host(s) could not be queried",
            report.errors.len(),
            hosts.len()
        );
    }
    Ok(())
}

fn render(session: &ClusterSession, subnet: Option<&str>, report: &ClusterStatusReport) {
    let title = format!("STATUS FOR CLUSTER: {}", session.name);
    println!();
    println!("{}", title.bold());
    println!("{}", "=".repeat(title.len()));
    println!();

    match headline(&session.name, subnet, report) {
        Headline::Good(msg) => ui::success(&msg),
        Headline::Attention(msg) => ui::warn(&msg),
    }
    println!();

    ui::table(
        &headers(subnet),
        &rows(&report.rows, &session.cluster.network),
    );
    println!();
}

#[derive(Debug, PartialEq, Eq)]
enum Headline {
    Good(String),
    Attention(String),
}

fn headline(cluster: &str, subnet: Option<&str>, report: &ClusterStatusReport) -> Headline {
    match subnet {
        None if report.all_bootstrapped() => Headline::Good(format!(
            "All nodes in cluster {cluster} are bootstrapped to Primary Network!"
        )),
        None => Headline::Attention(format!(
            "Nodes not bootstrapped to Primary Network: {}",
            report.not_bootstrapped().join(", ")
        )),
        Some(subnet) if report.all_synced() => {
            let relation = if report.all_validating() {
                "validators of"
            } else {
                "synced to"
            };
            Headline::Good(format!(
                "All nodes in cluster {cluster} are {relation} Subnet {subnet}"
            ))
        }
        Some(subnet) => {
            let lagging: Vec<&str> = report
                .rows
                .iter()
                .filter(|r| !r.sync.is_some_and(SyncStatus::is_synced))
                .map(|r| r.id.as_str())
                .collect();
            Headline::Attention(format!(
                "Nodes not synced to Subnet {subnet}: {}",
                lagging.join(", ")
            ))
        }
    }
}

fn headers(subnet: Option<&str>) -> Vec<String> {
    let mut headers: Vec<String> = [
        "Node ID",
        "IP",
        "Network",
        "Version",
        "Primary Network",
        "Healthy",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    if let Some(subnet) = subnet {
        headers.push(format!("Subnet {subnet}"));
    }
    headers
}

fn unknown() -> Cell {
    Cell::colored("UNKNOWN", Color::Yellow)
}

fn rows(rows: &[HostStatusRow], network: &str) -> Vec<Vec<Cell>> {
    rows.iter()
        .map(|row| {
            let mut cells = vec![
                Cell::plain(row.id.as_str()),
                Cell::plain(row.address.as_str()),
                Cell::plain(network),
                row.runtime_version
                    .as_deref()
                    .map_or_else(unknown, Cell::plain),
                row.bootstrap.map_or_else(unknown, |b| {
                    let color = match b {
                        BootstrapStatus::Bootstrapped => Color::Green,
                        BootstrapStatus::NotBootstrapped => Color::Red,
                    };
                    Cell::colored(b.to_string(), color)
                }),
                row.health.map_or_else(unknown, |h| {
                    let color = match h {
                        HealthStatus::Healthy => Color::Green,
                        HealthStatus::Unhealthy => Color::Red,
                    };
                    Cell::colored(h.to_string(), color)
                }),
            ];
            if let Some(sync) = row.sync {
                let color = if sync.is_synced() {
                    Color::Green
                } else {
                    Color::Red
                };
                cells.push(Cell::colored(sync.to_string(), color));
            }
            cells
        })
        .collect()
}
