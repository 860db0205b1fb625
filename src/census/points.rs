use anyhow::{Context, Result};
use geo::Point;
use polars::prelude::*;
use tracing::warn;

use crate::common::WGS84;

/// Tabular rows paired with one WGS84 point each.
///
/// `points[i]` is built from row `i` of `data` with x = longitude and y = latitude,
/// so the two always have the same length and order.
#[derive(Debug, Clone)]
pub struct PointLayer {
    data: DataFrame,
    points: Vec<Point<f64>>,
    epsg: u32,
}

impl PointLayer {
    /// Build points from the `latitude` / `longitude` columns.
    pub fn from_lat_lon(df: DataFrame) -> Result<Self> {
        Self::from_columns(df, "latitude", "longitude")
    }

    /// Build points from the named latitude / longitude columns.
    /// Rows whose coordinates are null, non-numeric or non-finite are dropped.
    pub fn from_columns(df: DataFrame, lat_col: &str, lon_col: &str) -> Result<Self> {
        let lat = df.column(lat_col)
            .with_context(|| format!("[census::points] missing latitude column {:?}", lat_col))?
            .cast(&DataType::Float64)?;
        let lon = df.column(lon_col)
            .with_context(|| format!("[census::points] missing longitude column {:?}", lon_col))?
            .cast(&DataType::Float64)?;

        let coords = lat.f64()?.into_iter()
            .zip(lon.f64()?.into_iter())
            .map(|(lat, lon)| match (lat, lon) {
                (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some(Point::new(lon, lat)),
                _ => None,
            })
            .collect::<Vec<_>>();

        let dropped = coords.iter().filter(|p| p.is_none()).count();
        let data = if dropped > 0 {
            warn!("[census::points] dropping {} of {} rows with unusable coordinates", dropped, df.height());
            let mask = coords.iter().map(Option::is_some).collect::<BooleanChunked>();
            df.filter(&mask)?
        } else {
            df
        };

        Ok(Self {
            data,
            points: coords.into_iter().flatten().collect(),
            epsg: WGS84,
        })
    }

    #[inline] pub fn len(&self) -> usize { self.points.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.points.is_empty() }

    #[inline] pub fn data(&self) -> &DataFrame { &self.data }

    #[inline] pub fn points(&self) -> &[Point<f64>] { &self.points }

    #[inline] pub fn epsg(&self) -> u32 { self.epsg }

    /// Read a column as f64 values, one per point.
    pub fn f64_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self.data.column(name)
            .with_context(|| format!("[census::points] missing column {:?}", name))?
            .cast(&DataType::Float64)?;
        Ok(column.f64()?.into_iter().collect())
    }

    /// Read a column as text, one per point.
    pub fn str_column(&self, name: &str) -> Result<Vec<Option<String>>> {
        let column = self.data.column(name)
            .with_context(|| format!("[census::points] missing column {:?}", name))?
            .cast(&DataType::String)?;
        Ok(column.str()?.into_iter().map(|s| s.map(str::to_string)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::read_csv_str;

    #[test]
    fn points_are_lon_lat_in_row_order() {
        let df = read_csv_str("City,latitude,longitude\nMaputo,-25.97,32.57\nBeira,-19.84,34.84\nNampula,-15.12,39.27\n").unwrap();
        let layer = PointLayer::from_lat_lon(df).unwrap();

        assert_eq!(layer.len(), 3);
        assert_eq!(layer.data().height(), 3);
        assert_eq!(layer.epsg(), 4326);
        assert_eq!(layer.points()[0], Point::new(32.57, -25.97));
        assert_eq!(layer.points()[2], Point::new(39.27, -15.12));
        assert_eq!(
            layer.str_column("City").unwrap(),
            vec![Some("Maputo".to_string()), Some("Beira".to_string()), Some("Nampula".to_string())],
        );
    }

    #[test]
    fn malformed_coordinates_are_dropped_with_their_rows() {
        let df = read_csv_str("City,latitude,longitude\nA,-25.0,32.0\nB,,33.0\nC,abc,34.0\nD,-26.0,35.0\n").unwrap();
        let layer = PointLayer::from_lat_lon(df).unwrap();

        assert_eq!(layer.len(), 2);
        assert_eq!(layer.data().height(), 2);
        assert_eq!(layer.str_column("City").unwrap(), vec![Some("A".to_string()), Some("D".to_string())]);
        assert_eq!(layer.points()[1], Point::new(35.0, -26.0));
    }

    #[test]
    fn malformed_coordinate_deep_in_a_file_drops_only_its_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buildings.csv");
        std::fs::write(&path, crate::common::make_test_long_csv()).unwrap();

        let df = crate::common::read_csv(&path).unwrap();
        let rows = df.height();
        let layer = PointLayer::from_lat_lon(df).unwrap();

        assert_eq!(layer.len(), rows - 1);
        assert_eq!(layer.data().height(), rows - 1);
        assert!(layer.points().iter().all(|p| *p == Point::new(28.0, -26.2)));
    }

    #[test]
    fn missing_coordinate_column_is_an_error() {
        let df = read_csv_str("City,lat,lon\nA,1.0,2.0\n").unwrap();
        assert!(PointLayer::from_lat_lon(df.clone()).is_err());
        assert_eq!(PointLayer::from_columns(df, "lat", "lon").unwrap().len(), 1);
    }

    #[test]
    fn numeric_columns_are_read_as_f64() {
        let df = read_csv_str("latitude,longitude,area_in_meters\n1.0,2.0,10\n3.0,4.0,\n").unwrap();
        let layer = PointLayer::from_lat_lon(df).unwrap();
        assert_eq!(layer.f64_column("area_in_meters").unwrap(), vec![Some(10.0), None]);
        assert!(layer.f64_column("pop_2025").is_err());
    }
}
