use geo::{LineString, MultiPolygon};
use serde_json::{json, Map, Value};

use crate::census::DistrictSummary;

/// Feature id of a district, shared by the GeoJSON and the choropleth `locations`.
#[inline]
pub(crate) fn feature_id(summary: &DistrictSummary) -> String { summary.index.to_string() }

/// Export district summaries as a GeoJSON FeatureCollection.
/// Each feature carries its district names and totals as properties.
pub(crate) fn districts_to_geojson(summaries: &[DistrictSummary]) -> Value {
    let features = summaries.iter()
        .map(|summary| {
            let mut properties = Map::new();
            properties.insert("NAME_0".to_string(), json!(summary.country));
            properties.insert("NAME_1".to_string(), json!(summary.region));
            properties.insert("NAME_2".to_string(), json!(summary.district));
            properties.insert("count".to_string(), json!(summary.count));
            properties.insert("area_in_meters".to_string(), json!(summary.area_m2));
            properties.insert("pop_2025".to_string(), json!(summary.population));

            json!({
                "type": "Feature",
                "id": feature_id(summary),
                "geometry": multipolygon_to_geojson(&summary.geometry),
                "properties": properties,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

fn ring_to_geojson(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

/// GeoJSON geometry for a MultiPolygon: exterior ring first, then holes.
pub(crate) fn multipolygon_to_geojson(mp: &MultiPolygon<f64>) -> Value {
    let polygons = mp.0.iter()
        .map(|polygon| {
            let mut rings = vec![ring_to_geojson(polygon.exterior())];
            rings.extend(polygon.interiors().iter().map(ring_to_geojson));
            Value::Array(rings)
        })
        .collect::<Vec<_>>();

    json!({
        "type": "MultiPolygon",
        "coordinates": polygons,
    })
}
