use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::{debug, info};

use crate::{common, config::ReportConfig};
use super::DistrictLayer;

/// Column every primary building row must carry.
pub const COUNTRY_COLUMN: &str = "Country";

/// Constant ISO-3 column attached to the primary building table.
pub const ISO3_COLUMN: &str = "iso_3";

/// Everything the loader reads for one country.
#[derive(Debug, Clone)]
pub struct CensusData {
    /// Buildings at or above 95% confidence, tagged with `iso_3`.
    pub buildings: DataFrame,
    /// District boundaries with label corrections applied.
    pub districts: DistrictLayer,
    /// Buildings at or above 90% confidence, used only for district aggregates.
    pub superset: DataFrame,
}

/// Load the building tables and district boundaries for the configured country.
pub fn load_census(config: &ReportConfig) -> Result<CensusData> {
    let profile = config.profile();
    info!("[census::load] loading {} ({}) from {}", profile.name, profile.iso3, config.data_dir.display());

    let buildings = load_buildings(&config.path(profile.buildings), profile.iso3)?;
    let districts = load_districts(&config.path(profile.districts), profile.name_fixes)?;
    let superset = common::read_zipped_csv(&config.path(profile.superset))?;

    info!(
        "[census::load] {} buildings, {} superset buildings, {} districts",
        buildings.height(), superset.height(), districts.len(),
    );

    Ok(CensusData { buildings, districts, superset })
}

/// Read the primary building table, drop rows without a country and tag the ISO-3 code.
pub(crate) fn load_buildings(path: &Path, iso3: &str) -> Result<DataFrame> {
    let df = common::read_csv(path)?;
    let df = drop_missing_country(df)
        .with_context(|| format!("[census::load] Bad building table {}", path.display()))?;
    tag_country(df, iso3)
}

/// Remove rows whose `Country` value is null.
pub(crate) fn drop_missing_country(df: DataFrame) -> Result<DataFrame> {
    let mask = df.column(COUNTRY_COLUMN)
        .with_context(|| format!("[census::load] missing {:?} column", COUNTRY_COLUMN))?
        .is_not_null();

    let before = df.height();
    let df = df.filter(&mask)?;
    debug!("[census::load] dropped {} rows without a country", before - df.height());
    Ok(df)
}

/// Attach a constant `iso_3` column.
pub(crate) fn tag_country(mut df: DataFrame, iso3: &str) -> Result<DataFrame> {
    let tag = Column::new(ISO3_COLUMN.into(), vec![iso3; df.height()]);
    df.with_column(tag)?;
    Ok(df)
}

/// Read district boundaries and apply the country's label corrections.
pub(crate) fn load_districts(path: &Path, fixes: &[(&str, &str)]) -> Result<DistrictLayer> {
    let mut districts = DistrictLayer::from_shapefile(path)?;
    let changed = districts.apply_name_fixes(fixes)?;
    if changed > 0 {
        debug!("[census::load] corrected {} boundary labels in {}", changed, path.display());
    }
    Ok(districts)
}
