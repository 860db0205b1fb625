//! Static SVG choropleths of the district summaries.

use std::{fs::File, io::{BufWriter, Write}, path::Path};

use anyhow::{Context, Result};
use geo::{BoundingRect, Coord, CoordsIter, LineString, MultiPolygon, Rect};

use crate::census::DistrictSummary;
use super::{color::PLASMA, html::escape_html};

/// Projection function: lon/lat -> SVG coords (x,y)
type Projection = dyn Fn(&Coord<f64>) -> (f64, f64);

const WIDTH: f64 = 1200.0;
const MARGIN: f64 = 10.0;

pub(crate) struct SvgWriter<W: Write> {
    writer: W,
}

impl<W: Write> SvgWriter<W> {
    pub(crate) fn new(writer: W) -> Self { Self { writer } }

    /// Write the XML declaration, the opening <svg> tag and a white background.
    pub(crate) fn write_header(&mut self, width: f64, height: f64, bounds: &Rect<f64>) -> Result<()> {
        writeln!(self.writer, r##"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"##)?;
        writeln!(self.writer, r##"<svg xmlns="http://www.w3.org/2000/svg"
        width="{width:.0}" height="{height:.0}"
        viewBox="0 0 {width:.0} {height:.0}"
        data-lon-min="{lon_min}" data-lon-max="{lon_max}"
        data-lat-min="{lat_min}" data-lat-max="{lat_max}">"##,
            lon_min = bounds.min().x,
            lon_max = bounds.max().x,
            lat_min = bounds.min().y,
            lat_max = bounds.max().y,
        )?;
        writeln!(self.writer, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##)?;
        Ok(())
    }

    pub(crate) fn write_styles(&mut self) -> Result<()> {
        writeln!(self.writer, r##"<defs>
<style>
    .dist {{ stroke: #111827; stroke-width: 0.5; fill-opacity: 0.9; fill-rule: evenodd; }}
    .title {{ font: 16px sans-serif; fill: #111827; }}
</style>
</defs>"##)?;
        Ok(())
    }

    pub(crate) fn write_title(&mut self, title: &str) -> Result<()> {
        writeln!(self.writer, r#"<text class="title" x="{MARGIN}" y="{y}">{}</text>"#, escape_html(title), y = MARGIN + 16.0)?;
        Ok(())
    }

    /// One filled district path with a hover <title>.
    pub(crate) fn write_district(&mut self, path: &str, fill: &str, label: &str) -> Result<()> {
        writeln!(
            self.writer,
            r#"<path class="dist" d="{path}" style="fill:{fill}"><title>{}</title></path>"#,
            escape_html(label),
        )?;
        Ok(())
    }

    pub(crate) fn write_footer(&mut self) -> Result<()> {
        writeln!(self.writer, "</svg>")?;
        Ok(())
    }

    pub(crate) fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Build a compact SVG path string for a MultiPolygon (exteriors + holes).
fn multipolygon_to_path(shape: &MultiPolygon<f64>, project: &Projection) -> String {
    let mut out = String::new();

    for polygon in &shape.0 {
        out.push_str(&ring_to_path(polygon.exterior(), project));
        for interior in polygon.interiors() {
            out.push_str(&ring_to_path(interior, project));
        }
    }

    out.trim_start().to_string()
}

fn ring_to_path(ring: &LineString<f64>, project: &Projection) -> String {
    let mut out = String::new();

    let mut coords = ring.coords_iter()
        .map(|coord| project(&coord));
    if let Some((x, y)) = coords.next() {
        out.push_str(&format!(" M{x:.3},{y:.3}"));
        for (x, y) in coords {
            out.push_str(&format!(" L{x:.3},{y:.3}"));
        }
        out.push('Z');
    }

    out
}

/// Combined bounding box of every summary geometry.
fn summaries_bounds(summaries: &[DistrictSummary]) -> Option<Rect<f64>> {
    summaries.iter()
        .filter_map(|s| s.geometry.bounding_rect())
        .reduce(|a, b| Rect::new(
            Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
            Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
        ))
}

/// Fill colour per summary from the plasma ramp, scaled between the smallest
/// and largest value.
pub(crate) fn fill_colors(values: &[f64]) -> Vec<String> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let min = finite.clone().fold(f64::INFINITY, f64::min);
    let max = finite.fold(f64::NEG_INFINITY, f64::max);
    let range = if max > min { max - min } else { 1.0 };

    values.iter()
        .map(|&v| {
            let t = if v.is_finite() { (v - min) / range } else { 0.0 };
            PLASMA.sample(t).to_string()
        })
        .collect()
}

/// Render one choropleth: an equirectangular projection fitted to the
/// districts, one path per district, coloured by `value`.
pub(crate) fn write_choropleth<W: Write>(
    writer: W,
    summaries: &[DistrictSummary],
    value: impl Fn(&DistrictSummary) -> f64,
    title: &str,
) -> Result<W> {
    let mut svg = SvgWriter::new(writer);

    let Some(bounds) = summaries_bounds(summaries) else {
        svg.write_header(WIDTH, 2.0 * MARGIN + 40.0, &Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.0 }))?;
        svg.write_styles()?;
        svg.write_title(title)?;
        svg.write_footer()?;
        return svg.finish();
    };

    let scale = (WIDTH - 2.0 * MARGIN) / bounds.width().max(f64::EPSILON);
    let height = bounds.height() * scale + 2.0 * MARGIN + 24.0;

    let project = move |coord: &Coord<f64>| -> (f64, f64) {
        let x = MARGIN + (coord.x - bounds.min().x) * scale;
        let y = MARGIN + 24.0 + (bounds.max().y - coord.y) * scale; // invert vertically
        (x, y)
    };

    svg.write_header(WIDTH, height, &bounds)?;
    svg.write_styles()?;
    svg.write_title(title)?;

    let values = summaries.iter().map(&value).collect::<Vec<_>>();
    for ((summary, fill), v) in summaries.iter().zip(fill_colors(&values)).zip(&values) {
        let label = format!(
            "{} ({}): {}",
            summary.district.as_deref().unwrap_or("?"),
            summary.region.as_deref().unwrap_or("?"),
            v,
        );
        svg.write_district(&multipolygon_to_path(&summary.geometry, &project), &fill, &label)?;
    }

    svg.write_footer()?;
    svg.finish()
}

/// Write one choropleth SVG file.
pub(crate) fn write_choropleth_file(
    path: &Path,
    summaries: &[DistrictSummary],
    value: impl Fn(&DistrictSummary) -> f64,
    title: &str,
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[report::svg] Failed to create {}", path.display()))?;
    write_choropleth(BufWriter::new(file), summaries, value, title)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn make_test_summary(index: usize, x0: f64, count: u32, name: &str) -> DistrictSummary {
        DistrictSummary {
            index,
            country: Some("South Africa".to_string()),
            region: Some("Western Cape".to_string()),
            district: Some(name.to_string()),
            count,
            area_m2: 0.0,
            population: 0.0,
            geometry: MultiPolygon(vec![polygon![
                (x: x0, y: 0.0), (x: x0 + 1.0, y: 0.0), (x: x0 + 1.0, y: 1.0), (x: x0, y: 1.0), (x: x0, y: 0.0),
            ]]),
        }
    }

    fn render(summaries: &[DistrictSummary]) -> String {
        let bytes = write_choropleth(Vec::new(), summaries, |s| s.count as f64, "Building Density").unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn fill_colors_span_the_ramp() {
        let colors = fill_colors(&[1.0, 5.0, 3.0]);
        assert_eq!(colors[0], "rgb(13,8,135)");
        assert_eq!(colors[1], "rgb(240,249,33)");
        assert_eq!(fill_colors(&[4.0, 4.0]), vec!["rgb(13,8,135)".to_string(); 2]);
    }

    #[test]
    fn one_path_per_district() {
        let svg = render(&[
            make_test_summary(0, 0.0, 1, "Cape Town"),
            make_test_summary(1, 1.0, 9, "Stellenbosch"),
        ]);

        assert!(svg.starts_with("<?xml"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<path ").count(), 2);
        assert!(svg.contains("<title>Cape Town (Western Cape): 1</title>"));
        assert!(svg.contains("style=\"fill:rgb(240,249,33)\""));
        // Left edge of the first district lands on the margin.
        assert!(svg.contains("d=\"M10.000,"));
    }

    #[test]
    fn labels_are_escaped() {
        let svg = render(&[make_test_summary(0, 0.0, 1, "A & <B>")]);
        assert!(svg.contains("A &amp; &lt;B&gt;"));
    }

    #[test]
    fn empty_summaries_still_write_a_document() {
        let svg = render(&[]);
        assert!(svg.contains("Building Density"));
        assert_eq!(svg.matches("<path ").count(), 0);
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("density.svg");
        write_choropleth_file(&path, &[make_test_summary(0, 0.0, 1, "Cape Town")], |s| s.count as f64, "t").unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("<path "));
    }
}
