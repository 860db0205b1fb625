use std::{collections::HashMap, ops::Range};

use geo::{Geometry, LineString};
use serde::Serialize;

use super::Track;

/// Storm tracks flattened into four index-aligned arrays for a single line trace.
///
/// Each segment's coordinates are followed by one entry that is `None` in all
/// four arrays, so a plotted line breaks between segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackTrace {
    lats: Vec<Option<f64>>,
    lons: Vec<Option<f64>>,
    names: Vec<Option<String>>,
    times: Vec<Option<String>>,
}

/// The line segments of a track geometry: one for a LineString, one per
/// component for a MultiLineString, none for any other kind.
pub fn line_segments(geometry: &Geometry<f64>) -> Vec<&LineString<f64>> {
    match geometry {
        Geometry::LineString(line) => vec![line],
        Geometry::MultiLineString(lines) => lines.0.iter().collect(),
        _ => Vec::new(),
    }
}

/// Flatten every segment of every track, in order.
pub fn flatten_tracks<'a>(tracks: impl IntoIterator<Item = &'a Track>) -> TrackTrace {
    let mut trace = TrackTrace::new();
    for track in tracks {
        trace.push_track(track);
    }
    trace
}

impl TrackTrace {
    pub fn new() -> Self { Self::default() }

    /// Number of entries, separators included.
    #[inline] pub fn len(&self) -> usize { self.lats.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.lats.is_empty() }

    #[inline] pub fn lats(&self) -> &[Option<f64>] { &self.lats }

    #[inline] pub fn lons(&self) -> &[Option<f64>] { &self.lons }

    #[inline] pub fn names(&self) -> &[Option<String>] { &self.names }

    #[inline] pub fn times(&self) -> &[Option<String>] { &self.times }

    /// Append one segment followed by a separator. Empty segments add nothing.
    pub fn push_segment(&mut self, line: &LineString<f64>, name: &str, time: &str) {
        if line.0.is_empty() { return }

        for coord in line.coords() {
            self.lats.push(Some(coord.y));
            self.lons.push(Some(coord.x));
            self.names.push(Some(name.to_string()));
            self.times.push(Some(time.to_string()));
        }
        self.push_separator();
    }

    /// Append all segments of a track, returning how many were added.
    pub fn push_track(&mut self, track: &Track) -> usize {
        let mut added = 0;
        for line in line_segments(&track.geometry) {
            if line.0.is_empty() { continue }
            self.push_segment(line, &track.name, &track.iso_time);
            added += 1;
        }
        added
    }

    fn push_separator(&mut self) {
        self.lats.push(None);
        self.lons.push(None);
        self.names.push(None);
        self.times.push(None);
    }

    /// Index ranges of each segment's coordinates, separators excluded.
    pub fn segments(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        let mut start = 0;
        (0..self.len())
            .filter(move |&i| self.lats[i].is_none())
            .map(move |end| {
                let range = start..end;
                start = end + 1;
                range
            })
    }

    /// Regroup segments by storm name, keeping first-appearance order and separators.
    pub fn split_by_name(&self) -> Vec<(String, TrackTrace)> {
        let mut groups: Vec<(String, TrackTrace)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for range in self.segments() {
            let name = self.names[range.start].clone().unwrap_or_default();
            let slot = *index.entry(name.clone()).or_insert_with(|| {
                groups.push((name, TrackTrace::new()));
                groups.len() - 1
            });

            let group = &mut groups[slot].1;
            group.lats.extend_from_slice(&self.lats[range.clone()]);
            group.lons.extend_from_slice(&self.lons[range.clone()]);
            group.names.extend_from_slice(&self.names[range.clone()]);
            group.times.extend_from_slice(&self.times[range]);
            group.push_separator();
        }

        groups
    }
}

#[cfg(test)]
mod tests {
    use geo::{line_string, MultiLineString, Point};

    use super::*;

    fn track(name: &str, time: &str, geometry: Geometry<f64>) -> Track {
        Track { season: 2019, name: name.to_string(), iso_time: time.to_string(), geometry }
    }

    fn assert_aligned(trace: &TrackTrace) {
        assert_eq!(trace.lats().len(), trace.len());
        assert_eq!(trace.lons().len(), trace.len());
        assert_eq!(trace.names().len(), trace.len());
        assert_eq!(trace.times().len(), trace.len());
    }

    #[test]
    fn single_linestring_gets_one_separator() {
        let idai = track("IDAI", "2019-03-04", line_string![(x: 40.0, y: -17.0), (x: 38.0, y: -18.0), (x: 34.8, y: -19.8)].into());
        let trace = flatten_tracks([&idai]);

        assert_aligned(&trace);
        assert_eq!(trace.len(), 4);
        assert_eq!(trace.lats()[..3], [Some(-17.0), Some(-18.0), Some(-19.8)]);
        assert_eq!(trace.lons()[..3], [Some(40.0), Some(38.0), Some(34.8)]);
        for i in 0..3 {
            assert_eq!(trace.names()[i].as_deref(), Some("IDAI"));
            assert_eq!(trace.times()[i].as_deref(), Some("2019-03-04"));
        }
        assert_eq!(trace.lats()[3], None);
        assert_eq!(trace.lons()[3], None);
        assert_eq!(trace.names()[3], None);
        assert_eq!(trace.times()[3], None);
    }

    #[test]
    fn multilinestring_separates_each_component() {
        let lines = MultiLineString(vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)],
            line_string![(x: 2.0, y: 2.0), (x: 3.0, y: 3.0), (x: 4.0, y: 4.0)],
        ]);
        let eline = track("ELINE", "2000-02-22", lines.into());
        let mut trace = TrackTrace::new();

        assert_eq!(trace.push_track(&eline), 2);
        assert_aligned(&trace);
        assert_eq!(trace.len(), 7);
        assert_eq!(trace.lats()[2], None);
        assert_eq!(trace.names()[2], None);
        assert_eq!(trace.lats()[6], None);
        assert_eq!(trace.times()[6], None);
        assert_eq!(trace.lats()[3], Some(2.0));
        assert_eq!(trace.segments().collect::<Vec<_>>(), vec![0..2, 3..6]);
    }

    #[test]
    fn other_geometry_kinds_add_nothing() {
        let point = track("POINT", "2001-01-01", Point::new(1.0, 2.0).into());
        let mut trace = TrackTrace::new();

        assert_eq!(trace.push_track(&point), 0);
        assert!(trace.is_empty());
        assert!(line_segments(&point.geometry).is_empty());
    }

    #[test]
    fn empty_segments_add_no_separator() {
        let empty = track("EMPTY", "2002-01-01", MultiLineString::<f64>(vec![]).into());
        let hollow = track("HOLLOW", "2002-01-01", LineString::<f64>(vec![]).into());
        let trace = flatten_tracks([&empty, &hollow]);
        assert!(trace.is_empty());
    }

    #[test]
    fn tracks_are_concatenated_in_order() {
        let a = track("A", "t0", line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)].into());
        let b = track("B", "t1", line_string![(x: 5.0, y: 5.0), (x: 6.0, y: 5.0), (x: 7.0, y: 5.0)].into());
        let trace = flatten_tracks([&a, &b]);

        assert_aligned(&trace);
        assert_eq!(trace.len(), 7);
        assert_eq!(trace.names()[4].as_deref(), Some("B"));
        assert_eq!(trace.segments().count(), 2);
    }

    #[test]
    fn split_by_name_groups_segments() {
        let a1 = track("A", "t0", line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)].into());
        let b = track("B", "t1", line_string![(x: 5.0, y: 5.0), (x: 6.0, y: 5.0)].into());
        let a2 = track("A", "t2", line_string![(x: 2.0, y: 0.0), (x: 3.0, y: 0.0), (x: 4.0, y: 0.0)].into());
        let trace = flatten_tracks([&a1, &b, &a2]);

        let groups = trace.split_by_name();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "A");
        assert_eq!(groups[1].0, "B");

        let a = &groups[0].1;
        assert_aligned(a);
        assert_eq!(a.len(), 7);
        assert_eq!(a.lats()[2], None);
        assert_eq!(a.times()[3].as_deref(), Some("t2"));
        assert_eq!(groups[1].1.len(), 3);
    }

    #[test]
    fn serializes_separators_as_null() {
        let a = track("A", "t0", line_string![(x: 1.0, y: 2.0)].into());
        let json = serde_json::to_value(flatten_tracks([&a])).unwrap();
        assert_eq!(json["lats"], serde_json::json!([2.0, null]));
        assert_eq!(json["names"], serde_json::json!(["A", null]));
    }
}
