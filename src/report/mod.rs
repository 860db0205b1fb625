//! The report page: five plotly figures with their headings and notes, plus
//! optional static SVG choropleths.

mod color;
mod columns;
mod figures;
mod geojson;
mod html;
mod svg;

use std::{fs::File, io::{BufWriter, Write}, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::{
    census::{aggregate_districts, load_census, DistrictSummary, PointLayer, AREA_COLUMN, POPULATION_COLUMN},
    config::{Country, ReportConfig},
    storms::{flatten_tracks, load_tracks, select_tracks, TrackTrace},
};

pub use figures::{building_area_heatmap, building_locations, district_choropleth, storm_traces, Figure};

const DENSITY_SVG: &str = "building_density.svg";
const AREA_SVG: &str = "building_area.svg";

/// Everything the figures are drawn from, computed once per run.
#[derive(Debug, Clone)]
pub struct ReportInputs {
    pub country: Country,
    /// Buildings at or above 95% confidence.
    pub buildings: PointLayer,
    /// Per-district totals over the 90% confidence superset.
    pub districts: Vec<DistrictSummary>,
    /// Tracks inside the country since the configured season.
    pub tracks: TrackTrace,
}

/// Load, join and flatten everything one report needs.
pub fn build_inputs(config: &ReportConfig) -> Result<ReportInputs> {
    let census = load_census(config)?;
    let buildings = PointLayer::from_lat_lon(census.buildings)?;
    let superset = PointLayer::from_lat_lon(census.superset)?;
    let districts = aggregate_districts(&superset, &census.districts, AREA_COLUMN, POPULATION_COLUMN)?;
    info!("[report] {} of {} districts contain buildings", districts.len(), census.districts.len());

    let tracks = load_tracks(&config.tracks_path())?;
    let selected = select_tracks(&tracks, &census.districts, config.min_season);
    let tracks = flatten_tracks(selected);
    info!("[report] {} storm track points", tracks.len());

    Ok(ReportInputs { country: config.country, buildings, districts, tracks })
}

impl ReportInputs {
    /// Write the two district choropleths as static SVGs into `dir`.
    pub fn write_choropleth_svgs(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let density = dir.join(DENSITY_SVG);
        svg::write_choropleth_file(&density, &self.districts, |s| s.count as f64, "Building Density")?;

        let area = dir.join(AREA_SVG);
        svg::write_choropleth_file(&area, &self.districts, |s| s.area_m2, "Building Area Coverage")?;

        debug!("[report] wrote {} and {}", density.display(), area.display());
        Ok(vec![density, area])
    }
}

/// One block of the page: optional heading, notes, then a figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub heading: Option<&'static str>,
    /// HTML paragraphs shown above the figure.
    pub notes: Vec<&'static str>,
    pub title: String,
    pub figure: Figure,
}

/// A rendered report for one country.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    country: String,
    sections: Vec<Section>,
}

const BUILDINGS_SOURCE: &str = r#"Buildings dataset is pulled from <a href="https://sites.research.google/open-buildings/">Google Open Buildings dataset</a> and reverse geocoded using <a href="https://nominatim.org/release-docs/latest/">Nominatim API</a>"#;
const BOUNDARIES_SOURCE: &str = r#"Spatial administrative boundaries data was obtained from <a href="http://www.diva-gis.org/gdata">Diva-GIS</a>"#;
const STORMS_SOURCE: &str = r#"The storm dataset is sourced from <a href="https://www.ncei.noaa.gov/products/international-best-track-archive">IBTrACS v4</a> for the South Indian ocean basin."#;

impl Report {
    /// Build all five figures from prepared inputs.
    pub fn new(inputs: &ReportInputs) -> Result<Self> {
        let center = inputs.country.profile().center;

        let sections = vec![
            Section {
                heading: Some("Building Locations"),
                notes: vec![
                    BUILDINGS_SOURCE,
                    "Buildings with confidence at or above 95% are shown below. Point size corresponds to building area estimate. Point color corresponds to confidence.",
                ],
                title: "Building Locations".to_string(),
                figure: building_locations(&inputs.buildings)?,
            },
            Section {
                heading: Some("Building Density by District"),
                notes: vec![
                    BOUNDARIES_SOURCE,
                    "The figure below pulls buildings at or above 90% confidence from Google Open Buildings and joins this with administrative boundaries. The counts of buildings at or above 90% confidence within each administrative boundary serves to estimate the density.",
                    "Caveat: If certain districts have lower confidence overall due to regional geographic aspects then this map may mislead building density.",
                ],
                title: "Building Density".to_string(),
                figure: district_choropleth(&inputs.districts, |s| s.count as f64, "Building Density"),
            },
            Section {
                heading: Some("Building Areas"),
                notes: vec![
                    "The figure below pulls buildings at or above 95% confidence from Google Open Buildings and joins this with administrative boundaries.",
                    "Caveat: If certain districts have lower confidence overall due to regional geographic aspects then this map may mislead building size density.",
                ],
                title: "Heatmap of Building Areas".to_string(),
                figure: building_area_heatmap(&inputs.buildings, center)?,
            },
            Section {
                heading: None,
                notes: vec![
                    "The figure below pulls buildings at or above 90% confidence from Google Open Buildings and joins this with administrative boundaries. The colors show the aggregate sum of these building areas within the district. It serves to estimate land area coverage by buildings.",
                    "Caveat: If certain districts have lower confidence overall due to regional geographic aspects then this map may mislead building size density analysis.",
                ],
                title: "Building Area Coverage".to_string(),
                figure: district_choropleth(&inputs.districts, |s| s.area_m2, "Building Area Coverage"),
            },
            Section {
                heading: Some("Storm Traces"),
                notes: vec![
                    STORMS_SOURCE,
                    "Shown below are storm traces overlaid with buildings above 95% confidence.",
                ],
                title: "Storm Traces".to_string(),
                figure: storm_traces(&inputs.tracks, &inputs.buildings, center)?,
            },
        ];

        Ok(Self { country: inputs.country.to_string(), sections })
    }

    #[inline] pub fn country(&self) -> &str { &self.country }

    #[inline] pub fn sections(&self) -> &[Section] { &self.sections }

    /// Render the page to a string.
    pub fn to_html(&self) -> Result<String> {
        let mut out = Vec::new();
        html::write_report(&mut out, self)?;
        String::from_utf8(out).context("[report] HTML output is not valid UTF-8")
    }

    /// Render the page to a file.
    pub fn write_html(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("[report] Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        html::write_report(&mut writer, self)?;
        writer.flush()
            .with_context(|| format!("[report] Failed to write {}", path.display()))
    }
}

/// Load a country's data and build its report.
pub fn build_report(config: &ReportConfig) -> Result<Report> {
    Report::new(&build_inputs(config)?)
}
