use std::{fs::File, path::Path};

use anyhow::{Context, Result, ensure};
use geo::MultiPolygon;
use polars::{io::SerWriter, prelude::*};
use tracing::{debug, info};

use crate::config::ReportConfig;
use super::{load_census, DistrictLayer, PointLayer};

/// Per-building footprint area summed into each district.
pub const AREA_COLUMN: &str = "area_in_meters";

/// Per-building population estimate summed into each district.
pub const POPULATION_COLUMN: &str = "pop_2025";

/// Building totals for one district polygon that contains at least one building.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictSummary {
    /// Row of the polygon in its `DistrictLayer`.
    pub index: usize,
    pub country: Option<String>,
    pub region: Option<String>,
    pub district: Option<String>,
    pub count: u32,
    pub area_m2: f64,
    pub population: f64,
    pub geometry: MultiPolygon<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    count: u32,
    area_m2: f64,
    population: f64,
}

/// Point-in-polygon join: every (point index, polygon index) pair where the
/// polygon contains the point, in point order.
pub fn spatial_join(points: &PointLayer, districts: &DistrictLayer) -> Result<Vec<(usize, usize)>> {
    ensure!(
        points.epsg() == districts.epsg(),
        "[census::density] CRS mismatch: points in EPSG:{}, districts in EPSG:{}",
        points.epsg(), districts.epsg(),
    );

    Ok(points.points().iter().enumerate()
        .flat_map(|(i, point)| districts.geoms().containing(point).map(move |j| (i, j)))
        .collect())
}

/// Join points to districts, then count points and sum `area_col` / `pop_col` per district.
///
/// Summaries come back in district order. Districts without any point are left out.
/// Null attribute values add nothing to the sums but the point is still counted.
pub fn aggregate_districts(
    points: &PointLayer,
    districts: &DistrictLayer,
    area_col: &str,
    pop_col: &str,
) -> Result<Vec<DistrictSummary>> {
    let areas = points.f64_column(area_col)?;
    let populations = points.f64_column(pop_col)?;
    let pairs = spatial_join(points, districts)?;
    debug!("[census::density] {} of {} points matched a district", pairs.len(), points.len());

    let mut totals = vec![Totals::default(); districts.len()];
    for (i, j) in pairs {
        let entry = &mut totals[j];
        entry.count += 1;
        entry.area_m2 += areas[i].unwrap_or(0.0);
        entry.population += populations[i].unwrap_or(0.0);
    }

    Ok(totals.into_iter().enumerate()
        .filter(|(_, totals)| totals.count > 0)
        .map(|(j, totals)| DistrictSummary {
            index: j,
            country: districts.country(j).map(str::to_string),
            region: districts.region(j).map(str::to_string),
            district: districts.name(j).map(str::to_string),
            count: totals.count,
            area_m2: totals.area_m2,
            population: totals.population,
            geometry: districts.shapes()[j].clone(),
        })
        .collect())
}

/// Load the configured country and aggregate its lower-confidence buildings by district.
pub fn district_density(config: &ReportConfig) -> Result<Vec<DistrictSummary>> {
    let census = load_census(config)?;
    let superset = PointLayer::from_lat_lon(census.superset)?;
    let summaries = aggregate_districts(&superset, &census.districts, AREA_COLUMN, POPULATION_COLUMN)?;
    info!("[census::density] {} of {} districts contain buildings", summaries.len(), census.districts.len());
    Ok(summaries)
}

/// Tabulate summaries without geometry.
pub(crate) fn summaries_to_dataframe(summaries: &[DistrictSummary]) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new("NAME_0".into(), summaries.iter().map(|s| s.country.clone()).collect::<Vec<_>>()),
        Column::new("NAME_1".into(), summaries.iter().map(|s| s.region.clone()).collect::<Vec<_>>()),
        Column::new("NAME_2".into(), summaries.iter().map(|s| s.district.clone()).collect::<Vec<_>>()),
        Column::new("count".into(), summaries.iter().map(|s| s.count).collect::<Vec<_>>()),
        Column::new(AREA_COLUMN.into(), summaries.iter().map(|s| s.area_m2).collect::<Vec<_>>()),
        Column::new(POPULATION_COLUMN.into(), summaries.iter().map(|s| s.population).collect::<Vec<_>>()),
    ])?)
}

/// Write the district summaries (without geometry) to a CSV file.
pub fn write_district_csv(summaries: &[DistrictSummary], path: &Path) -> Result<()> {
    let mut df = summaries_to_dataframe(summaries)?;
    let file = File::create(path)
        .with_context(|| format!("[census::density] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("[census::density] Failed to write CSV to {:?}", path))
}
