use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::{
    census::{DistrictSummary, PointLayer, AREA_COLUMN},
    storms::TrackTrace,
};
use super::{
    color::{Ramp, PLASMA, RAINBOW_R, SUNSET},
    columns::column_json,
    geojson::{districts_to_geojson, feature_id},
};

/// Extra columns shown when hovering a building.
pub(crate) const HOVER_COLUMNS: [&str; 5] = ["Type", "AddressType", AREA_COLUMN, "height_net", "vol_2025"];

const HOVER_NAME: &str = "City";
const CONFIDENCE_COLUMN: &str = "confidence";
const MAPBOX_STYLE: &str = "open-street-map";
const ZOOM: f64 = 3.0;
const SIZE_MAX: f64 = 20.0;
const DENSITY_RADIUS: u32 = 8;

/// One plotly figure: traces plus layout, serialised as-is for `Plotly.newPlot`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Value,
}

fn no_margin() -> Value { json!({"r": 0, "t": 0, "l": 0, "b": 0}) }

fn mapbox_layout(center: (f64, f64)) -> Value {
    json!({
        "style": MAPBOX_STYLE,
        "center": {"lat": center.0, "lon": center.1},
        "zoom": ZOOM,
    })
}

fn latitudes(layer: &PointLayer) -> Vec<f64> { layer.points().iter().map(|p| p.y()).collect() }

fn longitudes(layer: &PointLayer) -> Vec<f64> { layer.points().iter().map(|p| p.x()).collect() }

/// Mean position of the layer as (lat, lon), `fallback` when it is empty.
fn mean_center(layer: &PointLayer, fallback: (f64, f64)) -> (f64, f64) {
    if layer.is_empty() { return fallback }
    let n = layer.len() as f64;
    let (lat, lon) = layer.points().iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.y(), lon + p.x()));
    (lat / n, lon / n)
}

/// Hover rows of `[Type, AddressType, area_in_meters, height_net, vol_2025]`.
/// Columns the table does not have are left out of both the rows and the template.
fn hover_data(layer: &PointLayer) -> Result<(Vec<Value>, String)> {
    let present = HOVER_COLUMNS.iter()
        .copied()
        .filter(|name| layer.data().column(name).is_ok())
        .collect::<Vec<_>>();
    if present.len() < HOVER_COLUMNS.len() {
        debug!("[report::figures] hover columns present: {:?}", present);
    }

    let columns = present.iter()
        .map(|name| column_json(layer.data(), name))
        .collect::<Result<Vec<_>>>()?;
    let rows = (0..layer.len())
        .map(|i| Value::Array(columns.iter().map(|c| c[i].clone()).collect()))
        .collect();

    let mut template = String::from("<b>%{hovertext}</b><br><br>latitude=%{lat}<br>longitude=%{lon}");
    for (k, name) in present.iter().enumerate() {
        template.push_str(&format!("<br>{name}=%{{customdata[{k}]}}"));
    }
    template.push_str("<extra></extra>");

    Ok((rows, template))
}

/// Text per building for `hovertext`; a missing column leaves the hover unlabelled.
fn hover_text(layer: &PointLayer, name: &str) -> Vec<Option<String>> {
    match layer.str_column(name) {
        Ok(values) => values,
        Err(_) => {
            debug!("[report::figures] no {:?} column, hover text left empty", name);
            Vec::new()
        }
    }
}

/// Marker `sizeref` for area sizing so the largest value spans `SIZE_MAX` pixels.
pub(crate) fn size_ref(sizes: &[f64]) -> f64 {
    let max = sizes.iter().copied().filter(|v| v.is_finite()).fold(0.0, f64::max);
    if max > 0.0 { 2.0 * max / (SIZE_MAX * SIZE_MAX) } else { 1.0 }
}

/// Building scatter trace. `colored` adds the confidence colour scale.
fn building_trace(layer: &PointLayer, colored: bool) -> Result<Value> {
    let sizes = layer.f64_column(AREA_COLUMN)?
        .into_iter()
        .map(|v| v.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0))
        .collect::<Vec<_>>();
    let hover_names = hover_text(layer, HOVER_NAME);
    let (customdata, hovertemplate) = hover_data(layer)?;

    let mut marker = json!({
        "size": sizes,
        "sizemode": "area",
        "sizeref": size_ref(&sizes),
    });
    if colored {
        let confidence = column_json(layer.data(), CONFIDENCE_COLUMN)
            .context("[report::figures] buildings need a confidence column")?;
        marker["color"] = Value::Array(confidence);
        marker["colorscale"] = SUNSET.colorscale();
        marker["showscale"] = json!(true);
        marker["colorbar"] = json!({"title": {"text": CONFIDENCE_COLUMN}});
    }

    Ok(json!({
        "type": "scattermapbox",
        "mode": "markers",
        "name": "Buildings",
        "lat": latitudes(layer),
        "lon": longitudes(layer),
        "hovertext": hover_names,
        "customdata": customdata,
        "hovertemplate": hovertemplate,
        "marker": marker,
        "showlegend": false,
    }))
}

/// Building Locations: point per building, colour by confidence, size by area.
pub fn building_locations(layer: &PointLayer) -> Result<Figure> {
    let trace = building_trace(layer, true)?;
    Ok(Figure {
        data: vec![trace],
        layout: json!({
            "mapbox": mapbox_layout(mean_center(layer, (0.0, 0.0))),
            "margin": no_margin(),
            "height": 300,
        }),
    })
}

/// District choropleth of one per-district value.
pub fn district_choropleth(
    summaries: &[DistrictSummary],
    value: impl Fn(&DistrictSummary) -> f64,
    label: &str,
) -> Figure {
    let trace = json!({
        "type": "choropleth",
        "geojson": districts_to_geojson(summaries),
        "featureidkey": "id",
        "locations": summaries.iter().map(feature_id).collect::<Vec<_>>(),
        "z": summaries.iter().map(value).collect::<Vec<_>>(),
        "hovertext": summaries.iter().map(|s| s.district.clone()).collect::<Vec<_>>(),
        "customdata": summaries.iter().map(|s| s.region.clone()).collect::<Vec<_>>(),
        "hovertemplate": format!("<b>%{{hovertext}}</b><br><br>NAME_1=%{{customdata}}<br>{label}=%{{z}}<extra></extra>"),
        "colorscale": PLASMA.colorscale(),
        "colorbar": {"title": {"text": label}},
    });

    Figure {
        data: vec![trace],
        layout: json!({
            "geo": {
                "projection": {"type": "mercator"},
                "fitbounds": "locations",
                "visible": false,
            },
            "margin": no_margin(),
        }),
    }
}

/// Heatmap of Building Areas, centred on the country.
pub fn building_area_heatmap(layer: &PointLayer, center: (f64, f64)) -> Result<Figure> {
    let trace = json!({
        "type": "densitymapbox",
        "lat": latitudes(layer),
        "lon": longitudes(layer),
        "z": column_json(layer.data(), AREA_COLUMN)?,
        "radius": DENSITY_RADIUS,
        "hovertext": hover_text(layer, "Type"),
        "colorscale": SUNSET.colorscale(),
        "colorbar": {"title": {"text": "Area in m2"}},
    });

    Ok(Figure {
        data: vec![trace],
        layout: json!({
            "mapbox": mapbox_layout(center),
            "margin": no_margin(),
        }),
    })
}

/// Storm Traces: one line trace per storm name, then the building overlay.
pub fn storm_traces(trace: &TrackTrace, buildings: &PointLayer, center: (f64, f64)) -> Result<Figure> {
    let groups = trace.split_by_name();

    let mut data = groups.iter().enumerate()
        .map(|(i, (name, group))| storm_line(name, group, RAINBOW_R, i))
        .collect::<Vec<_>>();
    data.push(building_trace(buildings, false)?);
    debug!("[report::figures] {} storm traces", groups.len());

    Ok(Figure {
        data,
        layout: json!({
            "mapbox": mapbox_layout(center),
            "margin": no_margin(),
            "legend": {"title": {"text": "storm"}},
        }),
    })
}

fn storm_line(name: &str, group: &TrackTrace, palette: Ramp, i: usize) -> Value {
    json!({
        "type": "scattermapbox",
        "mode": "lines",
        "name": name,
        "legendgroup": name,
        "lat": group.lats(),
        "lon": group.lons(),
        "hovertext": group.names(),
        "customdata": group.times(),
        "hovertemplate": "<b>%{hovertext}</b><br><br>lat=%{lat}<br>lon=%{lon}<br>time=%{customdata}<extra></extra>",
        "line": {"color": palette.discrete(i).to_string()},
        "connectgaps": false,
    })
}

#[cfg(test)]
mod tests {
    use geo::{line_string, polygon, Geometry, MultiPolygon};

    use super::*;
    use crate::{common::read_csv_str, storms::{flatten_tracks, Track}};

    fn make_test_buildings() -> PointLayer {
        let df = read_csv_str(
            "latitude,longitude,City,Type,AddressType,area_in_meters,confidence,height_net,vol_2025\n\
             -19.8,34.8,Beira,house,road,40.0,0.97,3.0,120.0\n\
             -25.9,32.6,Maputo,shop,suburb,160.0,0.99,,\n",
        ).unwrap();
        PointLayer::from_lat_lon(df).unwrap()
    }

    fn make_test_summary(index: usize, count: u32, area_m2: f64) -> DistrictSummary {
        DistrictSummary {
            index,
            country: Some("Mozambique".to_string()),
            region: Some(format!("Region {index}")),
            district: Some(format!("District {index}")),
            count,
            area_m2,
            population: 0.0,
            geometry: MultiPolygon(vec![polygon![
                (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0),
            ]]),
        }
    }

    #[test]
    fn size_ref_uses_largest_value() {
        assert_eq!(size_ref(&[40.0, 160.0]), 2.0 * 160.0 / 400.0);
        assert_eq!(size_ref(&[]), 1.0);
        assert_eq!(size_ref(&[0.0, f64::NAN]), 1.0);
    }

    #[test]
    fn building_locations_carry_hover_and_colour() {
        let figure = building_locations(&make_test_buildings()).unwrap();
        let trace = &figure.data[0];

        assert_eq!(trace["type"], "scattermapbox");
        assert_eq!(trace["lat"], json!([-19.8, -25.9]));
        assert_eq!(trace["lon"], json!([34.8, 32.6]));
        assert_eq!(trace["hovertext"], json!(["Beira", "Maputo"]));
        assert_eq!(trace["customdata"][0], json!(["house", "road", 40.0, 3.0, 120.0]));
        assert_eq!(trace["customdata"][1][3], Value::Null);
        assert_eq!(trace["marker"]["color"], json!([0.97, 0.99]));
        assert_eq!(trace["marker"]["sizemode"], "area");
        assert_eq!(figure.layout["height"], 300);
        assert_eq!(figure.layout["mapbox"]["style"], "open-street-map");
        assert_eq!(figure.layout["mapbox"]["zoom"], 3.0);
    }

    #[test]
    fn building_locations_need_confidence() {
        let df = read_csv_str("latitude,longitude,area_in_meters\n-19.8,34.8,40.0\n").unwrap();
        let layer = PointLayer::from_lat_lon(df).unwrap();
        assert!(building_locations(&layer).is_err());
    }

    #[test]
    fn missing_hover_columns_are_left_out() {
        let df = read_csv_str("latitude,longitude,area_in_meters,Type\n-19.8,34.8,40.0,house\n").unwrap();
        let layer = PointLayer::from_lat_lon(df).unwrap();
        let (rows, template) = hover_data(&layer).unwrap();

        assert_eq!(rows, vec![json!(["house", 40.0])]);
        assert!(template.contains("Type=%{customdata[0]}"));
        assert!(template.contains("area_in_meters=%{customdata[1]}"));
        assert!(!template.contains("vol_2025"));
    }

    #[test]
    fn missing_hover_name_leaves_hover_text_empty() {
        let df = read_csv_str("latitude,longitude,area_in_meters,confidence\n-19.8,34.8,40.0,0.97\n").unwrap();
        let layer = PointLayer::from_lat_lon(df).unwrap();

        assert!(hover_text(&layer, "City").is_empty());
        let figure = building_locations(&layer).unwrap();
        assert_eq!(figure.data[0]["hovertext"], json!([]));
        let heatmap = building_area_heatmap(&layer, (0.0, 0.0)).unwrap();
        assert_eq!(heatmap.data[0]["hovertext"], json!([]));
    }

    #[test]
    fn choropleth_locations_match_feature_ids() {
        let summaries = [make_test_summary(2, 5, 10.0), make_test_summary(7, 1, 2.5)];
        let figure = district_choropleth(&summaries, |s| s.count as f64, "Building Density");
        let trace = &figure.data[0];

        assert_eq!(trace["type"], "choropleth");
        assert_eq!(trace["locations"], json!(["2", "7"]));
        assert_eq!(trace["geojson"]["features"][1]["id"], "7");
        assert_eq!(trace["z"], json!([5.0, 1.0]));
        assert_eq!(trace["hovertext"], json!(["District 2", "District 7"]));
        assert_eq!(figure.layout["geo"]["fitbounds"], "locations");
        assert_eq!(figure.layout["geo"]["projection"]["type"], "mercator");
    }

    #[test]
    fn empty_choropleth_still_renders() {
        let figure = district_choropleth(&[], |s| s.area_m2, "Building Area Coverage");
        assert_eq!(figure.data[0]["locations"], json!([]));
        assert_eq!(figure.data[0]["geojson"]["features"], json!([]));
    }

    #[test]
    fn heatmap_is_centred_on_country() {
        let figure = building_area_heatmap(&make_test_buildings(), (-18.6657, 35.5296)).unwrap();
        assert_eq!(figure.data[0]["type"], "densitymapbox");
        assert_eq!(figure.data[0]["radius"], 8);
        assert_eq!(figure.data[0]["z"], json!([40.0, 160.0]));
        assert_eq!(figure.layout["mapbox"]["center"], json!({"lat": -18.6657, "lon": 35.5296}));
    }

    #[test]
    fn storm_figure_has_one_trace_per_name_plus_buildings() {
        let track = |name: &str, x: f64| Track {
            season: 2019,
            name: name.to_string(),
            iso_time: "2019-03-14".to_string(),
            geometry: Geometry::LineString(line_string![(x: x, y: -19.0), (x: x + 1.0, y: -20.0)]),
        };
        let tracks = [track("IDAI", 34.0), track("KENNETH", 36.0), track("IDAI", 35.0)];
        let trace = flatten_tracks(&tracks);

        let figure = storm_traces(&trace, &make_test_buildings(), (-18.6657, 35.5296)).unwrap();
        assert_eq!(figure.data.len(), 3);
        assert_eq!(figure.data[0]["name"], "IDAI");
        assert_eq!(figure.data[0]["lat"], json!([-19.0, -20.0, null, -19.0, -20.0, null]));
        assert_eq!(figure.data[0]["customdata"][0], "2019-03-14");
        assert_eq!(figure.data[1]["name"], "KENNETH");
        assert_ne!(figure.data[0]["line"]["color"], figure.data[1]["line"]["color"]);
        assert_eq!(figure.data[2]["mode"], "markers");
        assert!(figure.data[2]["marker"].get("color").is_none());
    }

    #[test]
    fn storm_figure_without_tracks_keeps_buildings() {
        let figure = storm_traces(&TrackTrace::new(), &make_test_buildings(), (0.0, 0.0)).unwrap();
        assert_eq!(figure.data.len(), 1);
    }
}
