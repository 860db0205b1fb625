use std::path::PathBuf;

/// Building census and storm-track report CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "stormcensus", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Render the interactive report page for a country
    Report(ReportArgs),

    /// Write per-district building counts, areas and population to CSV
    Districts(DistrictsArgs),
}

/// Data selection shared by every subcommand.
#[derive(clap::Args, Debug)]
pub struct SourceArgs {
    /// Country to report on: south-africa or mozambique
    pub country: Option<String>,

    /// JSON report configuration; flags given here override its values
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Directory holding the census tables and boundary shapefiles, defaults to "."
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output HTML file, defaults to "./report.html"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Storm-track lines archive (zipped shapefile or .shp)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub tracks: Option<PathBuf>,

    /// Earliest storm season to draw
    #[arg(long)]
    pub min_season: Option<i32>,

    /// Also write the two choropleths as static SVGs into this directory
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub svg_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct DistrictsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output CSV file, defaults to "./districts.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}
