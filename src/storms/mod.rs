mod flatten;
mod tracks;

pub use flatten::{flatten_tracks, line_segments, TrackTrace};
pub use tracks::{load_tracks, select_tracks, tracks_from_shapes, Track};
