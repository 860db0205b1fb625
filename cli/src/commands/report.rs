use anyhow::{Ok, Result};
use stormcensus::{build_inputs, ensure_dir_exists, Report};
use tracing::info;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::ReportArgs) -> Result<()> {
    let mut config = super::resolve_config(&args.source)?;
    if let Some(tracks) = &args.tracks { config.tracks = Some(tracks.clone()); }
    if let Some(season) = args.min_season { config.min_season = season; }
    let out_path = &args.output.clone().unwrap_or("./report.html".into());

    info!("[report] building {} report from {}", config.country, config.data_dir.display());
    let inputs = build_inputs(&config)?;

    let report = Report::new(&inputs)?;
    info!("[report] writing {} figures to {}", report.sections().len(), out_path.display());
    report.write_html(out_path)?;

    if let Some(svg_dir) = &args.svg_dir {
        ensure_dir_exists(svg_dir)?;
        info!("[report] writing choropleth SVGs to {}", svg_dir.display());
        inputs.write_choropleth_svgs(svg_dir)?;
    }

    Ok(())
}
