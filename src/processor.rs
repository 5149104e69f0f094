use std::io::{self, Write};

use log::{debug, info, warn};

use crate::api::Client;
use crate::config::{Config, Window};
use crate::core::EmptyResult;
use crate::error::{Error, Result};
use crate::metrics::{Series, TrafficInfo};
use crate::stat::{OutputFormat, Stat};

pub enum Action {
    Report(OutputFormat),
    ListGraphs {host_id: String},
}

#[tokio::main(flavor = "current_thread")]
pub async fn process(config: &Config, action: &Action) -> EmptyResult {
    let mut client = Client::new(&config.server.url, config.server.timeout)?;

    client.login(&config.server.login, &config.server.password).await?;
    let result = run(&client, config, action).await;

    if let Err(err) = client.logout().await {
        warn!("Failed to log out from Zabbix: {err}.");
    }

    result
}

async fn run(client: &Client, config: &Config, action: &Action) -> EmptyResult {
    match action {
        Action::Report(format) => {
            let window = config.window.resolve()?;
            let stat = report_all(client, config, window).await?;
            stat.print(*format);
        },

        Action::ListGraphs {host_id} => {
            let mut stdout = io::stdout().lock();
            for graph in client.list_graphs(host_id).await? {
                let _ = writeln!(stdout, "{}  {}", graph.id, graph.name);
            }
        },
    }

    Ok(())
}

/// Reports every configured VLAN in order, failing on the first error.
pub async fn report_all(client: &Client, config: &Config, window: Window) -> Result<Stat> {
    let mut stat = Stat::new();

    for vlan in &config.vlans {
        info!("Calculating traffic info for VLAN {} (graph {})...", vlan.name, vlan.graph_id);
        let traffic = report(client, &vlan.graph_id, window).await.map_err(|e| Error::Vlan {
            name: vlan.name.clone(),
            source: Box::new(e),
        })?;
        stat.add(&vlan.name, traffic);
    }

    Ok(stat)
}

pub async fn fetch_vlan_series(client: &Client, graph_id: &str, window: Window) -> Result<Series> {
    let item_id = client.resolve_item_id(graph_id).await?;
    client.fetch_series(&item_id, window.time_from, window.time_till).await
}

pub async fn report(client: &Client, graph_id: &str, window: Window) -> Result<TrafficInfo> {
    let series = fetch_vlan_series(client, graph_id, window).await?;
    debug!("Graph {graph_id}: {} samples.", series.len());

    TrafficInfo::calculate(series.values()).ok_or_else(|| Error::Lookup(format!(
        "Item {} has no history data from {} till {}",
        series.item_id, series.time_from, series.time_till)))
}
