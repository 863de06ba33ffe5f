use anyhow::{Context as _, Result};

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config::{ClustersConfig, Config};
use crate::paths;
use crate::ui;

pub fn run(_ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(),
        ConfigCommand::Path => path(),
    }
}

fn show() -> Result<()> {
    let config = Config::load()?;
    let clusters = ClustersConfig::load()?;

    ui::header("config.toml");
    mark_missing(&paths::config_file()?);
    print!(
        "{}",
        toml::to_string_pretty(&config).context("Failed to render configuration")?
    );

    ui::header("clusters.toml");
    mark_missing(&paths::clusters_file()?);
    if clusters.is_empty() {
        ui::dim("No clusters defined");
    } else {
        print!(
            "{}",
            toml::to_string_pretty(&clusters).context("Failed to render clusters")?
        );
    }

    Ok(())
}

fn mark_missing(path: &std::path::Path) {
    if !path.exists() {
        ui::dim(&format!("{} not found, showing defaults", path.display()));
    }
}

fn path() -> Result<()> {
    ui::header("Locations");
    ui::kv("Config directory", &paths::config_dir()?.display().to_string());
    ui::kv("Config file", &paths::config_file()?.display().to_string());
    ui::kv("Clusters file", &paths::clusters_file()?.display().to_string());
    ui::kv("State file", &paths::state_file()?.display().to_string());
    println!();
    ui::dim(&format!(
        "Override with {} and {}",
        paths::ENV_CONFIG_DIR,
        paths::ENV_STATE_DIR
    ));
    Ok(())
}
