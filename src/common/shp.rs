use std::{fs, path::Path};

use anyhow::{Context, Result};
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPolygon, Point, Polygon};
use shapefile::{dbase::{FieldValue, Record}, PolygonRing, Reader, Shape};
use tracing::debug;

/// EPSG code for WGS84 longitude/latitude.
pub(crate) const WGS84: u32 = 4326;

/// Reads all shapes + attribute records from a given `.shp` file path.
pub(crate) fn read_shapefile(path: &Path) -> Result<Vec<(Shape, Record)>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("[common::shp] Failed to open shapefile: {}", path.display()))?;

    let mut items = Vec::with_capacity(reader.shape_count()?);
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result
            .with_context(|| format!("[common::shp] Error reading shape+record in {}", path.display()))?;
        items.push((shape, record));
    }
    Ok(items)
}

/// Guess the EPSG code from the `.prj` sidecar; only geographic WGS84 is recognized.
pub(crate) fn epsg_from_prj(shp_path: &Path) -> Option<u32> {
    let prj = fs::read_to_string(shp_path.with_extension("prj")).ok()?;
    let wkt = prj.trim_start();
    if wkt.starts_with("GEOGCS") && (wkt.contains("WGS_1984") || wkt.contains("WGS 84")) {
        Some(WGS84)
    } else {
        debug!("[common::shp] unrecognized projection in {}", shp_path.display());
        None
    }
}

/// Shapefile point types that carry planar x/y.
trait Xy {
    fn coord(&self) -> Coord<f64>;
}

impl Xy for shapefile::Point {
    fn coord(&self) -> Coord<f64> { Coord { x: self.x, y: self.y } }
}

impl Xy for shapefile::PointM {
    fn coord(&self) -> Coord<f64> { Coord { x: self.x, y: self.y } }
}

impl Xy for shapefile::PointZ {
    fn coord(&self) -> Coord<f64> { Coord { x: self.x, y: self.y } }
}

/// Build a closed geo ring from shapefile points.
fn closed_ring<P: Xy>(points: &[P]) -> LineString<f64> {
    let mut coords = points.iter().map(Xy::coord).collect::<Vec<_>>();
    if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
        if first != last { coords.push(first) }
    }
    LineString(coords)
}

/// Group each outer ring with the holes that follow it (Shapefile ring order).
fn rings_to_multipolygon<P: Xy>(rings: &[PolygonRing<P>]) -> MultiPolygon<f64> {
    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes: Vec<LineString<f64>> = Vec::new();

    for ring in rings {
        match ring {
            PolygonRing::Outer(points) => {
                if let Some(ext) = exterior.take() {
                    polys.push(Polygon::new(ext, std::mem::take(&mut holes)));
                }
                exterior = Some(closed_ring(points));
            }
            PolygonRing::Inner(points) => holes.push(closed_ring(points)),
        }
    }
    if let Some(ext) = exterior {
        polys.push(Polygon::new(ext, holes));
    }

    MultiPolygon(polys)
}

/// A single part becomes a LineString, several parts a MultiLineString.
fn parts_to_lines<P: Xy>(parts: &[Vec<P>]) -> Geometry<f64> {
    let mut lines = parts.iter()
        .map(|part| LineString(part.iter().map(Xy::coord).collect()))
        .collect::<Vec<_>>();
    if lines.len() == 1 {
        Geometry::LineString(lines.remove(0))
    } else {
        Geometry::MultiLineString(MultiLineString(lines))
    }
}

/// Convert a polygon shape to a MultiPolygon; `None` for any other shape kind.
pub(crate) fn shape_to_multipolygon(shape: &Shape) -> Option<MultiPolygon<f64>> {
    match shape {
        Shape::Polygon(p) => Some(rings_to_multipolygon(p.rings())),
        Shape::PolygonM(p) => Some(rings_to_multipolygon(p.rings())),
        Shape::PolygonZ(p) => Some(rings_to_multipolygon(p.rings())),
        _ => None,
    }
}

/// Convert any supported shape to a geo Geometry; `None` for null shapes and multipatches.
pub(crate) fn shape_to_geometry(shape: &Shape) -> Option<Geometry<f64>> {
    match shape {
        Shape::Point(p) => Some(Geometry::Point(Point::from(p.coord()))),
        Shape::PointM(p) => Some(Geometry::Point(Point::from(p.coord()))),
        Shape::PointZ(p) => Some(Geometry::Point(Point::from(p.coord()))),
        Shape::Polyline(p) => Some(parts_to_lines(p.parts())),
        Shape::PolylineM(p) => Some(parts_to_lines(p.parts())),
        Shape::PolylineZ(p) => Some(parts_to_lines(p.parts())),
        Shape::Polygon(_) | Shape::PolygonM(_) | Shape::PolygonZ(_) =>
            shape_to_multipolygon(shape).map(Geometry::MultiPolygon),
        _ => None,
    }
}

/// Get the trimmed value of a character field, if present and non-empty.
pub(crate) fn character_field(record: &Record, field: &str) -> Option<String> {
    match record.get(field) {
        Some(FieldValue::Character(Some(s))) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        _ => None,
    }
}

/// Get a numeric field as f64, whatever its dBase storage type.
pub(crate) fn numeric_field(record: &Record, field: &str) -> Option<f64> {
    match record.get(field) {
        Some(FieldValue::Numeric(Some(n))) => Some(*n),
        Some(FieldValue::Float(Some(n))) => Some(*n as f64),
        Some(FieldValue::Double(n)) => Some(*n),
        Some(FieldValue::Integer(n)) => Some(*n as f64),
        Some(FieldValue::Character(Some(s))) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Get a field as display text: character fields as-is, dates as `YYYY-MM-DD`.
pub(crate) fn text_field(record: &Record, field: &str) -> Option<String> {
    match record.get(field) {
        Some(FieldValue::Date(Some(d))) => Some(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())),
        Some(FieldValue::Numeric(Some(n))) => Some(n.to_string()),
        _ => character_field(record, field),
    }
}
