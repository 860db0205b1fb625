use std::{fs::File, io::Cursor, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerReader, prelude::CsvReadOptions};

use super::{read_zip_entry, require_file_exists};

/// Rows scanned to infer column types; the census tables mix blank and numeric cells.
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Census reader options. Cells that do not parse as the inferred type become
/// null instead of failing the read, so a bad value past the inference window
/// costs one cell, not the table.
fn census_csv_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_ignore_errors(true)
}

/// Reads a CSV file from `path` into a Polars DataFrame.
pub(crate) fn read_csv(path: &Path) -> Result<DataFrame> {
    require_file_exists(path)
        .with_context(|| "[common::csv] Missing CSV input")?;
    let file = File::open(path)
        .with_context(|| format!("[common::csv] Failed to open CSV file: {}", path.display()))?;
    census_csv_options()
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[common::csv] Failed to read CSV from {:?}", path))
}

/// Read a DataFrame from in-memory CSV bytes.
pub(crate) fn read_csv_bytes(bytes: Vec<u8>) -> Result<DataFrame> {
    census_csv_options()
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .context("[common::csv] Failed to read CSV from bytes")
}

/// Reads the first `.csv` member of a zip archive.
pub(crate) fn read_zipped_csv(path: &Path) -> Result<DataFrame> {
    require_file_exists(path)
        .with_context(|| "[common::csv] Missing zipped CSV input")?;
    let bytes = read_zip_entry(path, "csv")
        .with_context(|| format!("[common::csv] Failed to unpack {}", path.display()))?;
    read_csv_bytes(bytes)
        .with_context(|| format!("[common::csv] Failed to parse CSV inside {}", path.display()))
}

/// Reads a CSV from a string.
#[cfg(test)]
pub(crate) fn read_csv_str(csv: &str) -> Result<DataFrame> {
    polars::prelude::CsvReader::new(Cursor::new(csv.as_bytes()))
        .finish()
        .with_context(|| "[common::csv] Failed to read CSV from string")
}

/// Valid rows past the inference window, then one unparseable latitude.
#[cfg(test)]
pub(crate) fn make_test_long_csv() -> String {
    let mut csv = String::from("Country,latitude,longitude\n");
    for _ in 0..=INFER_SCHEMA_ROWS {
        csv.push_str("ZAF,-26.2,28.0\n");
    }
    csv.push_str("ZAF,abc,28.0\n");
    csv
}
