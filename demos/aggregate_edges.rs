use gastp::{
    display, remove_outliers, select_and_aggregate, GasTp, GasTpError, Indicator, Window,
};
use std::path::PathBuf;

/// Usage: aggregate_edges <topology.csv> <download dir> [secondary dir]
///
/// Aggregates 2021 physical flows onto the EU inflow corridors of a topology.
#[tokio::main]
async fn main() -> Result<(), GasTpError> {
    let mut args = std::env::args().skip(1);
    let topology_path = PathBuf::from(args.next().unwrap_or_else(|| "topology.csv".to_string()));

    let client = GasTp::new().await?;
    let data_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| client.default_download_dir());
    let secondary = args.next().map(PathBuf::from);

    let topology = client.load_topology(&topology_path).await?;
    let records = client
        .load_records(&data_dir)
        .maybe_secondary(secondary.as_deref())
        .call()
        .await?;

    let window = Window::new("2021-01-01", "2021-12-31")?;
    let series = client.reconstruct(records, window).await?;

    for (corridor, edges) in topology.corridors() {
        let edges: Vec<&str> = edges.iter().map(String::as_str).collect();
        let table = select_and_aggregate()
            .edges(&edges)
            .topology(&topology)
            .series(&series)
            .indicator(Indicator::PhysicalFlow)
            .quiet(true)
            .call()?;
        if table.is_empty() {
            println!("{}: no data", corridor);
            continue;
        }

        let frame = remove_outliers(&table.to_frame()?).call()?;
        println!("--- {} ---", corridor);
        println!("{}", display(frame, &topology)?);
    }

    Ok(())
}
