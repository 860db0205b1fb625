//! Color ramps shared by the plotly figures and the SVG choropleths.

use std::fmt;

use serde_json::{json, Value};

/// Simple RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl fmt::Display for Rgb {
    /// Format as CSS: rgb(r,g,b)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

const fn rgb(r: u8, g: u8, b: u8) -> Rgb { Rgb { r, g, b } }

/// A continuous color ramp through evenly spaced stops.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Ramp(&'static [Rgb]);

/// CARTO "Sunset" sequential ramp.
pub(crate) const SUNSET: Ramp = Ramp(&[
    rgb(243, 231, 155),
    rgb(250, 196, 132),
    rgb(248, 160, 126),
    rgb(235, 127, 134),
    rgb(206, 102, 147),
    rgb(160,  89, 160),
    rgb( 92,  83, 165),
]);

/// Matplotlib "plasma" sequential ramp.
pub(crate) const PLASMA: Ramp = Ramp(&[
    rgb( 13,   8, 135),
    rgb( 70,   3, 159),
    rgb(114,   1, 168),
    rgb(156,  23, 158),
    rgb(189,  55, 134),
    rgb(216,  87, 107),
    rgb(237, 121,  83),
    rgb(251, 159,  58),
    rgb(253, 202,  38),
    rgb(240, 249,  33),
]);

/// Plotly "Rainbow", reversed; used as a discrete palette for storm names.
pub(crate) const RAINBOW_R: Ramp = Ramp(&[
    rgb(255,   0,   0),
    rgb(255, 111,   0),
    rgb(255, 234,   0),
    rgb(151, 255,   0),
    rgb( 44, 255, 150),
    rgb(  0, 152, 255),
    rgb(  0,  25, 255),
    rgb(  0,   0, 200),
    rgb(150,   0,  90),
]);

impl Ramp {
    /// Interpolate the ramp at `t` in [0, 1]; NaN maps to the first stop.
    pub(crate) fn sample(&self, t: f64) -> Rgb {
        let stops = self.0;
        if stops.len() == 1 || !t.is_finite() { return stops[0] }

        let x = t.clamp(0.0, 1.0) * (stops.len() - 1) as f64;
        let i = (x.floor() as usize).min(stops.len() - 2);
        let f = x - i as f64;

        let lerp = |a: u8, b: u8| -> u8 {
            (a as f64 + (b as f64 - a as f64) * f).round().clamp(0.0, 255.0) as u8
        };
        let (a, b) = (stops[i], stops[i + 1]);
        rgb(lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b))
    }

    /// Cycle through the stops as a discrete palette.
    pub(crate) fn discrete(&self, index: usize) -> Rgb { self.0[index % self.0.len()] }

    /// Plotly colorscale: `[[0.0, "rgb(..)"], ..., [1.0, "rgb(..)"]]`.
    pub(crate) fn colorscale(&self) -> Value {
        let n = self.0.len().max(2) - 1;
        Value::Array(self.0.iter().enumerate()
            .map(|(i, color)| json!([i as f64 / n as f64, color.to_string()]))
            .collect())
    }
}
