//! Sequential colour maps and value normalisation for colouring points by
//! one of their coordinates.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    Blues,
    Reds,
    Greens,
    Viridis,
}

// ColorBrewer 9-class sequential ramps, light to dark.
const BLUES: [u32; 9] = [
    0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b,
];
const REDS: [u32; 9] = [
    0xfff5f0, 0xfee0d2, 0xfcbba1, 0xfc9272, 0xfb6a4a, 0xef3b2c, 0xcb181d, 0xa50f15, 0x67000d,
];
const GREENS: [u32; 9] = [
    0xf7fcf5, 0xe5f5e0, 0xc7e9c0, 0xa1d99b, 0x74c476, 0x41ab5d, 0x238b45, 0x006d2c, 0x00441b,
];
const VIRIDIS: [u32; 10] = [
    0x440154, 0x482878, 0x3e4989, 0x31688e, 0x26828e, 0x1f9e89, 0x35b779, 0x6ece58, 0xb5de2b,
    0xfde725,
];

#[inline]
fn unpack(rgb: u32) -> [f64; 3] {
    [
        ((rgb >> 16) & 0xff) as f64,
        ((rgb >> 8) & 0xff) as f64,
        (rgb & 0xff) as f64,
    ]
}

impl Colormap {
    fn stops(self) -> &'static [u32] {
        match self {
            Colormap::Blues => &BLUES,
            Colormap::Reds => &REDS,
            Colormap::Greens => &GREENS,
            Colormap::Viridis => &VIRIDIS,
        }
    }

    /// Colour at `v` in `[0, 1]`; out-of-range input is clamped, NaN maps to 0.
    pub fn sample(self, v: f64) -> [u8; 3] {
        let stops = self.stops();
        let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };

        let pos = v * (stops.len() - 1) as f64;
        let lo = (pos.floor() as usize).min(stops.len() - 2);
        let frac = pos - lo as f64;

        let a = unpack(stops[lo]);
        let b = unpack(stops[lo + 1]);
        let mix = |i: usize| (a[i] + (b[i] - a[i]) * frac).round().clamp(0.0, 255.0) as u8;

        [mix(0), mix(1), mix(2)]
    }

    pub fn name(self) -> &'static str {
        match self {
            Colormap::Blues => "blues",
            Colormap::Reds => "reds",
            Colormap::Greens => "greens",
            Colormap::Viridis => "viridis",
        }
    }
}

/// Linear map from a data range onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub min: f64,
    pub max: f64,
}

impl Normalize {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Range of the finite values in `values`; `[0, 1]` if there are none.
    pub fn from_values<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> Self {
        let (min, max) = values
            .into_iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

        if min > max {
            Self::new(0.0, 1.0)
        } else {
            Self::new(min, max)
        }
    }

    /// A collapsed range sends every value to the middle of the map.
    pub fn apply(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        if span.abs() <= f64::EPSILON * self.max.abs().max(1.0) {
            return 0.5;
        }
        ((v - self.min) / span).clamp(0.0, 1.0)
    }
}
