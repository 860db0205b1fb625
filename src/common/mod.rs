mod csv;
mod fs;
mod shp;

pub(crate) use csv::*;
pub use fs::ensure_dir_exists;
pub(crate) use fs::*;
pub(crate) use shp::*;
