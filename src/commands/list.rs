use crate::Context;
use crate::config::ClustersConfig;
use crate::inventory;
use crate::ui::{self, Cell};
use anyhow::Result;
use colored::Color;

pub fn run(_ctx: &Context) -> Result<()> {
    let clusters = ClustersConfig::load()?;

    if clusters.is_empty() {
        ui::info("There are no clusters defined.");
        return Ok(());
    }

    ui::header("Clusters");
    ui::table(&headers(), &rows(&clusters));
    Ok(())
}

fn headers() -> Vec<String> {
    ["Cluster", "Network", "Nodes", "Inventory"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn rows(clusters: &ClustersConfig) -> Vec<Vec<Cell>> {
    clusters
        .clusters
        .iter()
        .map(|(name, cluster)| {
            let path = clusters.inventory_path(name).ok();
            let nodes = match path.as_deref().map(inventory::load) {
                Some(Ok(hosts)) => Cell::plain(hosts.len().to_string()),
                Some(Err(e)) => {
                    log::debug!("{name}: {e:#}");
                    Cell::colored("unreadable", Color::Red)
                }
                None => Cell::colored("?", Color::Yellow),
            };
            vec![
                Cell::plain(name.as_str()),
                Cell::plain(cluster.network.as_str()),
                nodes,
                Cell::plain(
                    path.map(|p| p.display().to_string())
                        .unwrap_or_default(),
                ),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_rows_count_hosts() {
        let temp = TempDir::new().unwrap();
        let clusters_file = temp.path().join("clusters.toml");
        fs::write(
            &clusters_file,
            "[clusters.alpha]\nnetwork = \"mainnet\"\ninventory = \"alpha.ini\"\n\n\
             [clusters.beta]\nnetwork = \"testnet\"\ninventory = \"missing.ini\"\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("alpha.ini"),
            "n1 ansible_host=10.0.0.1\nn2 ansible_host=10.0.0.2\n",
        )
        .unwrap();
        let clusters = ClustersConfig::load_from(&clusters_file).unwrap();

        let rows = rows(&clusters);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], Cell::plain("alpha"));
        assert_eq!(rows[0][2], Cell::plain("2"));
        assert_eq!(rows[1][2], Cell::colored("unreadable", Color::Red));
    }
}
