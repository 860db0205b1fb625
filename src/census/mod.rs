mod density;
mod districts;
mod load;
mod points;

pub use density::{aggregate_districts, district_density, spatial_join, write_district_csv, DistrictSummary, AREA_COLUMN, POPULATION_COLUMN};
pub use districts::DistrictLayer;
pub use load::{load_census, CensusData, COUNTRY_COLUMN, ISO3_COLUMN};
pub use points::PointLayer;
