mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{districts, report};
use tracing_subscriber::EnvFilter;

/// Install the log subscriber; `RUST_LOG` wins over the `-v` count.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stormcensus={level},stormcensus_cli={level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Report(args) => report::run(&cli, args),
        Commands::Districts(args) => districts::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
