use anyhow::{Ok, Result};
use stormcensus::{district_density, write_district_csv};
use tracing::info;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::DistrictsArgs) -> Result<()> {
    let config = super::resolve_config(&args.source)?;
    let out_path = &args.output.clone().unwrap_or("./districts.csv".into());

    info!("[districts] aggregating buildings for {}", config.country);
    let summaries = district_density(&config)?;

    info!("[districts] writing {} districts to {}", summaries.len(), out_path.display());
    write_district_csv(&summaries, out_path)?;

    Ok(())
}
