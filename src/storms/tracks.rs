use std::path::Path;

use anyhow::{Context, Result};
use geo::{BoundingRect, Geometry, Rect, Relate};
use shapefile::{dbase::Record, Shape};
use tracing::{debug, info, warn};

use crate::{census::DistrictLayer, common};

/// One storm-track record: a season, a storm name, a timestamp and a line geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub season: i32,
    pub name: String,
    pub iso_time: String,
    pub geometry: Geometry<f64>,
}

/// Load storm tracks from an IBTrACS lines shapefile, or a zip archive holding one.
pub fn load_tracks(path: &Path) -> Result<Vec<Track>> {
    common::require_file_exists(path)
        .context("[storms::tracks] Missing storm-track input")?;

    let items = if common::has_extension(path, "zip") {
        let dir = tempfile::tempdir()
            .context("[storms::tracks] Failed to create a temporary directory")?;
        common::extract_zip(path, dir.path())?;
        let shp = common::find_file_with_extension(dir.path(), "shp")
            .with_context(|| format!("[storms::tracks] No shapefile inside {}", path.display()))?;
        debug!("[storms::tracks] reading {} from {}", shp.display(), path.display());
        common::read_shapefile(&shp)?
    } else {
        common::read_shapefile(path)?
    };

    let tracks = tracks_from_shapes(items);
    info!("[storms::tracks] loaded {} track records from {}", tracks.len(), path.display());
    Ok(tracks)
}

/// Convert shapefile items into tracks, dropping null shapes and records without a season.
pub fn tracks_from_shapes(items: Vec<(Shape, Record)>) -> Vec<Track> {
    let total = items.len();
    let tracks = items.into_iter()
        .filter_map(|(shape, record)| {
            let geometry = common::shape_to_geometry(&shape)?;
            let season = common::numeric_field(&record, "SEASON")?;
            Some(Track {
                season: season as i32,
                name: common::character_field(&record, "NAME").unwrap_or_default(),
                iso_time: common::text_field(&record, "ISO_TIME").unwrap_or_default(),
                geometry,
            })
        })
        .collect::<Vec<_>>();

    if tracks.len() < total {
        warn!("[storms::tracks] skipped {} track records without geometry or season", total - tracks.len());
    }
    tracks
}

/// Inclusive bounding-box containment, used to skip the exact test early.
fn covers(outer: &Rect<f64>, inner: &Rect<f64>) -> bool {
    outer.min().x <= inner.min().x && outer.min().y <= inner.min().y
        && outer.max().x >= inner.max().x && outer.max().y >= inner.max().y
}

/// Keep tracks from `min_season` onward that lie entirely within the union of the districts.
/// A track that crosses the region boundary is dropped as a whole.
pub fn select_tracks<'a>(tracks: &'a [Track], region: &DistrictLayer, min_season: i32) -> Vec<&'a Track> {
    let Some(area) = region.union() else { return Vec::new() };
    let Some(bounds) = region.geoms().bounds() else { return Vec::new() };

    let selected = tracks.iter()
        .filter(|track| track.season >= min_season)
        .filter(|track| track.geometry.bounding_rect().is_some_and(|rect| covers(&bounds, &rect)))
        .filter(|track| track.geometry.relate(&area).is_within())
        .collect::<Vec<_>>();

    debug!("[storms::tracks] {} of {} tracks inside the region since {}", selected.len(), tracks.len(), min_season);
    selected
}
