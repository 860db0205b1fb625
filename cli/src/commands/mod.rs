pub mod districts;
pub mod report;

use std::path::PathBuf;

use anyhow::{Result, bail};
use stormcensus::{Country, ReportConfig};

use crate::cli::SourceArgs;

/// Merge the optional config file with command-line flags; flags win.
pub(crate) fn resolve_config(source: &SourceArgs) -> Result<ReportConfig> {
    let mut config = match (&source.config, &source.country) {
        (Some(path), _) => ReportConfig::from_json_file(path)?,
        (None, Some(country)) => ReportConfig::new(country.parse::<Country>()?, "."),
        (None, None) => bail!("[cli] a country (south-africa, mozambique) or --config is required"),
    };

    if let (Some(_), Some(country)) = (&source.config, &source.country) {
        config.country = country.parse()?;
    }
    if let Some(dir) = &source.data_dir {
        config.data_dir = PathBuf::from(dir);
    }

    Ok(config)
}
