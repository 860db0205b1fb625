use std::{collections::BTreeSet, path::Path};

use anyhow::{Context, Result, anyhow, ensure};
use geo::MultiPolygon;
use polars::prelude::*;
use shapefile::dbase::{FieldValue, Record};

use crate::{common, geom::Geometries};

/// Country, region and district name columns of the boundary attribute table.
pub(crate) const NAME_COLUMNS: [&str; 3] = ["NAME_0", "NAME_1", "NAME_2"];

/// Administrative boundary polygons with their attribute table.
#[derive(Debug, Clone)]
pub struct DistrictLayer {
    data: DataFrame,
    geoms: Geometries,
}

impl DistrictLayer {
    /// Pair an attribute table with one MultiPolygon per row.
    pub fn new(data: DataFrame, shapes: Vec<MultiPolygon<f64>>, epsg: Option<u32>) -> Result<Self> {
        ensure!(
            data.height() == shapes.len(),
            "[census::districts] attribute rows ({}) do not match shape count ({})",
            data.height(), shapes.len(),
        );
        Ok(Self { data, geoms: Geometries::new(shapes, epsg) })
    }

    /// Loads polygons and character attributes from a given .shp file path.
    pub fn from_shapefile(path: &Path) -> Result<Self> {
        common::require_file_exists(path)
            .context("[census::districts] Missing boundary shapefile")?;
        let items = common::read_shapefile(path)?;

        let mut shapes = Vec::with_capacity(items.len());
        let mut records = Vec::with_capacity(items.len());
        for (i, (shape, record)) in items.into_iter().enumerate() {
            let polygon = common::shape_to_multipolygon(&shape)
                .ok_or_else(|| anyhow!("[census::districts] shape {} in {} is not a polygon", i, path.display()))?;
            shapes.push(polygon);
            records.push(record);
        }

        let data = records_to_dataframe(&records)
            .with_context(|| format!("[census::districts] Bad attribute table in {}", path.display()))?;
        for name in NAME_COLUMNS {
            ensure!(data.column(name).is_ok(), "[census::districts] {} has no {} attribute", path.display(), name);
        }

        Self::new(data, shapes, common::epsg_from_prj(path))
    }

    /// Get the number of districts.
    #[inline] pub fn len(&self) -> usize { self.geoms.len() }

    /// Check if there are no districts.
    #[inline] pub fn is_empty(&self) -> bool { self.geoms.is_empty() }

    #[inline] pub fn data(&self) -> &DataFrame { &self.data }

    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { self.geoms.shapes() }

    #[inline] pub fn epsg(&self) -> u32 { self.geoms.epsg() }

    #[inline] pub(crate) fn geoms(&self) -> &Geometries { &self.geoms }

    /// Look up a text attribute of one district.
    pub fn attribute(&self, column: &str, idx: usize) -> Option<&str> {
        if idx >= self.data.height() { return None }
        self.data.column(column).ok()?.str().ok()?.get(idx)
    }

    /// District name (`NAME_2`).
    #[inline] pub fn name(&self, idx: usize) -> Option<&str> { self.attribute("NAME_2", idx) }

    /// Parent region name (`NAME_1`).
    #[inline] pub fn region(&self, idx: usize) -> Option<&str> { self.attribute("NAME_1", idx) }

    /// Country name (`NAME_0`).
    #[inline] pub fn country(&self, idx: usize) -> Option<&str> { self.attribute("NAME_0", idx) }

    /// Union of every district polygon.
    pub fn union(&self) -> Option<MultiPolygon<f64>> { self.geoms.union() }

    /// Replace exact cell values in every text column, returning the number of cells changed.
    pub fn apply_name_fixes(&mut self, fixes: &[(&str, &str)]) -> Result<usize> {
        if fixes.is_empty() { return Ok(0) }

        let text_columns = self.data.get_columns().iter()
            .filter(|column| column.dtype() == &DataType::String)
            .map(|column| column.name().clone())
            .collect::<Vec<_>>();

        let mut changed = 0;
        for name in text_columns {
            let values = self.data.column(&name)?.str()?;
            let fixed = values.into_iter()
                .map(|value| value.map(|s| match fixes.iter().find(|(from, _)| *from == s) {
                    Some((_, to)) => { changed += 1; to.to_string() }
                    None => s.to_string(),
                }))
                .collect::<StringChunked>()
                .with_name(name.clone());
            self.data.replace_or_add(name, fixed.into_series())?;
        }

        Ok(changed)
    }
}

/// Convert dBase records to a DataFrame of their character fields, plus an `idx` row index.
fn records_to_dataframe(records: &[Record]) -> Result<DataFrame> {
    let fields = records.iter()
        .flat_map(|record| record.clone().into_iter())
        .filter(|(_, value)| matches!(value, FieldValue::Character(_)))
        .map(|(field, _)| field)
        .collect::<BTreeSet<_>>();

    let index = Column::new("idx".into(), (0..records.len() as u32).collect::<Vec<_>>());
    let columns = std::iter::once(index)
        .chain(fields.iter().map(|field| Column::new(
            field.as_str().into(),
            records.iter()
                .map(|record| common::character_field(record, field))
                .collect::<Vec<_>>(),
        )))
        .collect::<Vec<_>>();

    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn square(x0: f64, y0: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0), (x: x0 + 1.0, y: y0), (x: x0 + 1.0, y: y0 + 1.0), (x: x0, y: y0 + 1.0), (x: x0, y: y0),
        ]])
    }

    fn make_test_layer() -> DistrictLayer {
        let data = DataFrame::new(vec![
            Column::new("NAME_0".into(), vec!["Mozambique", "Mozambique", "Mozambique"]),
            Column::new("NAME_1".into(), vec!["Zambezia", "Niassa", "Sofala"]),
            Column::new("NAME_2".into(), vec!["Alto Molocue", "Lichinga", "Beira"]),
        ]).unwrap();
        DistrictLayer::new(data, vec![square(0.0, 0.0), square(1.0, 0.0), square(5.0, 5.0)], None).unwrap()
    }

    #[test]
    fn attribute_lookup_by_index() {
        let layer = make_test_layer();
        assert_eq!(layer.len(), 3);
        assert_eq!(layer.name(1), Some("Lichinga"));
        assert_eq!(layer.region(0), Some("Zambezia"));
        assert_eq!(layer.country(2), Some("Mozambique"));
        assert_eq!(layer.name(3), None);
        assert_eq!(layer.attribute("NAME_9", 0), None);
    }

    #[test]
    fn name_fixes_replace_exact_cells_only() {
        let mut layer = make_test_layer();
        let changed = layer.apply_name_fixes(&[("Zambezia", "Zambézia"), ("Niassa", "Nassa"), ("Beir", "X")]).unwrap();

        assert_eq!(changed, 2);
        assert_eq!(layer.region(0), Some("Zambézia"));
        assert_eq!(layer.region(1), Some("Nassa"));
        assert_eq!(layer.name(2), Some("Beira"));
    }

    #[test]
    fn no_fixes_is_a_noop() {
        let mut layer = make_test_layer();
        assert_eq!(layer.apply_name_fixes(&[]).unwrap(), 0);
        assert_eq!(layer.region(0), Some("Zambezia"));
    }

    #[test]
    fn shape_count_must_match_rows() {
        let data = DataFrame::new(vec![Column::new("NAME_2".into(), vec!["A"])]).unwrap();
        assert!(DistrictLayer::new(data, vec![], None).is_err());
    }

    #[test]
    fn records_keep_character_fields() {
        let mut a = Record::default();
        a.insert("NAME_2".to_string(), FieldValue::Character(Some("Beira".to_string())));
        a.insert("ID_2".to_string(), FieldValue::Numeric(Some(7.0)));
        let mut b = Record::default();
        b.insert("NAME_2".to_string(), FieldValue::Character(None));
        b.insert("ID_2".to_string(), FieldValue::Numeric(Some(8.0)));

        let df = records_to_dataframe(&[a, b]).unwrap();
        assert_eq!(df.height(), 2);
        assert!(df.column("ID_2").is_err());
        assert_eq!(df.column("NAME_2").unwrap().null_count(), 1);
        assert!(df.column("idx").is_ok());
    }
}
