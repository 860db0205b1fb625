use geo::{BooleanOps, BoundingRect, Contains, Coord, MultiPolygon, Point, Rect};
use rstar::{RTree, AABB};

use crate::{common::WGS84, geom::BoundingBox};

/// Geometries represents a collection of MultiPolygons indexed by an R-tree of their bounding boxes.
#[derive(Debug, Clone)]
pub(crate) struct Geometries {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
    epsg: Option<u32>, // EPSG code, if known
}

impl Geometries {
    /// Construct a Geometries object from a vector of MultiPolygons.
    /// Empty shapes are kept (so indices line up) but never match a query.
    pub(crate) fn new(polygons: Vec<MultiPolygon<f64>>, epsg: Option<u32>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                polygons.iter().enumerate()
                    .filter_map(|(i, polygon)| Some(BoundingBox::new(i, polygon.bounding_rect()?)))
                    .collect()
            ),
            shapes: polygons,
            epsg,
        }
    }

    /// Get the number of MultiPolygons.
    #[inline] pub(crate) fn len(&self) -> usize { self.shapes.len() }

    /// Check if there are no MultiPolygons.
    #[inline] pub(crate) fn is_empty(&self) -> bool { self.shapes.is_empty() }

    /// Get a reference to the list of MultiPolygons.
    #[inline] pub(crate) fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Get the EPSG code, or default to 4326 (WGS84 lon/lat) if unknown.
    #[inline] pub(crate) fn epsg(&self) -> u32 { self.epsg.unwrap_or(WGS84) }

    /// Indices of the MultiPolygons whose interior contains the point.
    /// Candidates come from the R-tree; containment is then tested exactly.
    pub(crate) fn containing(&self, point: &Point<f64>) -> impl Iterator<Item = usize> + '_ {
        let envelope = AABB::from_point([point.x(), point.y()]);
        let point = *point;
        self.rtree.locate_in_envelope_intersecting(&envelope)
            .map(BoundingBox::idx)
            .filter(move |&idx| self.shapes[idx].contains(&point))
    }

    /// Compute the bounding rectangle of all MultiPolygons.
    pub(crate) fn bounds(&self) -> Option<Rect<f64>> {
        self.shapes.iter()
            .filter_map(|polygon| polygon.bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                }
            ))
    }

    /// Compute the union of all MultiPolygons into a single MultiPolygon.
    /// This method may be slow for large numbers of complex polygons.
    pub(crate) fn union(&self) -> Option<MultiPolygon<f64>> {
        self.shapes.iter().cloned().reduce(|a, b| a.union(&b))
    }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, Area};

    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ]])
    }

    fn make_test_geoms() -> Geometries {
        Geometries::new(vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0), MultiPolygon(vec![]), square(5.0, 5.0, 2.0)], None)
    }

    #[test]
    fn containing_tests_exact_geometry() {
        let geoms = make_test_geoms();
        assert_eq!(geoms.len(), 4);
        assert_eq!(geoms.containing(&Point::new(0.5, 0.5)).collect::<Vec<_>>(), vec![0]);
        assert_eq!(geoms.containing(&Point::new(1.5, 0.25)).collect::<Vec<_>>(), vec![1]);
        assert_eq!(geoms.containing(&Point::new(6.0, 6.0)).collect::<Vec<_>>(), vec![3]);
        assert_eq!(geoms.containing(&Point::new(3.0, 3.0)).count(), 0);
    }

    #[test]
    fn epsg_defaults_to_wgs84() {
        assert_eq!(make_test_geoms().epsg(), 4326);
        assert_eq!(Geometries::new(vec![], Some(32735)).epsg(), 32735);
    }

    #[test]
    fn bounds_cover_all_shapes() {
        let bounds = make_test_geoms().bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), Coord { x: 7.0, y: 7.0 });
        assert!(Geometries::new(vec![], None).bounds().is_none());
    }

    #[test]
    fn union_of_adjacent_squares_keeps_area() {
        let geoms = Geometries::new(vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0)], None);
        let union = geoms.union().unwrap();
        assert!((union.unsigned_area() - 2.0).abs() < 1e-9);
        assert!(Geometries::new(vec![], None).union().is_none());
    }
}
