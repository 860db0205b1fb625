#![doc = "Building census density and storm-track maps for Southern Africa"]
mod census;
mod common;
mod config;
mod geom;
mod report;
mod storms;

#[doc(inline)]
pub use config::{Country, CountryProfile, ReportConfig, DEFAULT_TRACKS, MIN_SEASON};

#[doc(inline)]
pub use census::{
    aggregate_districts, district_density, load_census, spatial_join, write_district_csv,
    CensusData, DistrictLayer, DistrictSummary, PointLayer,
    AREA_COLUMN, COUNTRY_COLUMN, ISO3_COLUMN, POPULATION_COLUMN,
};

#[doc(inline)]
pub use storms::{flatten_tracks, line_segments, load_tracks, select_tracks, tracks_from_shapes, Track, TrackTrace};

#[doc(inline)]
pub use report::{
    building_area_heatmap, building_locations, district_choropleth, storm_traces,
    build_inputs, build_report, Figure, Report, ReportInputs, Section,
};

pub use common::ensure_dir_exists;
