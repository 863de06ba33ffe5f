use super::{ClusterSession, round};
use crate::Context;
use crate::actions::RemoteUpgrade;
use crate::cli::UpgradeArgs;
use crate::progress::{self, HostProgress};
use crate::state::FleetState;
use crate::ui;
use anyhow::{Context as _, Result, bail};
use colored::Colorize;
use fleet::{
    CompatibilityTable, DispatchOptions, Dispatcher, ErrorHostMap, Host, LatestVersions,
    PlanOutcome, execute_plans, plan_from_round, version_tag,
};

pub fn run(ctx: &Context, args: UpgradeArgs) -> Result<()> {
    let session = ClusterSession::open(&args.cluster)?;
    let (latest, table) = fetch_releases(&session)?;

    let api = session.api();
    let versions = round(
        ctx,
        &session.dispatcher(),
        &session.hosts,
        "Fetching versions",
        |h: &Host| api.node_versions(h),
    )?;

    let outcome = plan_from_round(&versions, &latest, &table);
    print_plan(&outcome);

    if outcome.is_up_to_date() {
        ui::success(&format!(
            "Nodes in cluster {} are up to date",
            session.name
        ));
        return finish(&outcome.errors);
    }

    if args.dry_run {
        ui::info("Dry run: no changes made");
        return finish(&outcome.errors);
    }

    let pending = outcome.pending().count();
    if !args.yes && !confirm_proceed(pending, &session.name)? {
        ui::info("Upgrade cancelled");
        return Ok(());
    }

    let config = &session.config;
    let actions = RemoteUpgrade::new(
        &session.transport,
        &config.node,
        &config.runtime,
        &config.plugin,
    );
    let dispatcher =
        Dispatcher::with_options(DispatchOptions::with_max_concurrency(usize::from(args.jobs)));
    let progress = HostProgress::new(pending, "Upgrading nodes", ctx.quiet);
    let results = execute_plans(
        &dispatcher,
        &session.hosts,
        &outcome.plans,
        &actions,
        &progress,
    );
    progress.finish();

    let (done, failures) = results?.into_parts();
    let upgraded: Vec<String> = done.into_keys().collect();

    let mut errors = outcome.errors.clone();
    errors.extend(failures);

    record(&session.name, &upgraded, &errors);

    ui::header("Summary");
    for id in &upgraded {
        ui::success(&format!("{id} upgraded"));
    }
    ui::kv("Upgraded", &upgraded.len().to_string());
    ui::kv("Failed", &errors.len().to_string());

    finish(&errors)
}

fn fetch_releases(session: &ClusterSession) -> Result<(LatestVersions, CompatibilityTable)> {
    let config = &session.config;
    let client = releases::Client::new().with_retry_config(config.retry.to_retry_config());

    let pb = progress::spinner("Fetching release information...");
    let fetched = client
        .latest_versions(&config.runtime, &config.plugin)
        .and_then(|latest| {
            let table = client.compatibility_table(&config.runtime, &config.plugin)?;
            Ok((latest, table))
        });

    match fetched {
        Ok((latest, table)) => {
            progress::finish_success(
                &pb,
                &format!(
                    "Latest runtime {}, plugin {}",
                    version_tag(&latest.runtime),
                    version_tag(&latest.plugin)
                ),
            );
            Ok((latest, table))
        }
        Err(e) => {
            progress::finish_error(&pb, "Could not fetch release information");
            let advice = advice_for(&e);
            Err(e).context(advice)
        }
    }
}

fn advice_for(err: &releases::Error) -> String {
    format!("{} ({})", err.category(), err.category().advice())
}

fn print_plan(outcome: &PlanOutcome) {
    ui::header("Upgrade plan");
    for (id, plan) in &outcome.plans {
        if plan.is_empty() {
            println!("  {} {}", id.bold(), "up to date".dimmed());
            continue;
        }
        println!("  {}", id.bold());
        let steps = plan.actions();
        for (i, step) in steps.iter().enumerate() {
            print!("    ");
            ui::step(i + 1, steps.len(), &step.to_string());
        }
    }
    for (id, err) in &outcome.errors {
        println!("  {} {}", id.bold(), err.to_string().red());
    }
}

fn confirm_proceed(pending: usize, cluster: &str) -> Result<bool> {
    use dialoguer::Confirm;
    let confirmed = Confirm::new()
        .with_prompt(format!("Upgrade {pending} node(s) in cluster {cluster}?"))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

fn record(cluster: &str, upgraded: &[String], errors: &ErrorHostMap) {
    let mut state = match FleetState::load() {
        Ok(state) => state,
        Err(e) => {
            log::warn!("Could not read state, starting fresh: {e:#}");
            FleetState::default()
        }
    };
    state.record_upgrade(cluster, upgraded.to_vec(), errors);
    if let Err(e) = state.touch() {
        ui::warn(&format!("Could not save upgrade record: {e:#}"));
    }
}

fn finish(errors: &ErrorHostMap) -> Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    ui::error_summary(errors);
    bail!("{} host(s) failed", errors.len())
}
