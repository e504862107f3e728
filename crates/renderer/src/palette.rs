//! Color ramps built from a handful of anchor colors.
//!
//! A [`Palette`] always has [`PALETTE_SIZE`] entries. Anchors are spread evenly
//! over the ramp and every entry in between is linearly interpolated, so a
//! normalized value in `[0, 1]` maps to an entry with `round(v * 255)`.

use serde::{Deserialize, Serialize};
use solar_common::{SolarError, SolarResult};

/// Number of entries in every palette.
pub const PALETTE_SIZE: usize = 256;

/// Anchor sets used by the solar data layers.
pub mod presets {
    /// Roof / no roof.
    pub const BINARY: &[&str] = &["212121", "B3E5FC"];
    /// Elevation.
    pub const RAINBOW: &[&str] = &["3949AB", "81D4FA", "66BB6A", "FFE082", "E53935"];
    /// Solar flux, from shady to sunny.
    pub const IRON: &[&str] = &["00000A", "91009C", "E64616", "FEB400", "FFFFF6"];
    /// Hourly shade / sun.
    pub const SUNLIGHT: &[&str] = &["212121", "FFCA28"];
}

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `0099FF` or `#0099FF`.
    ///
    /// Digits that are not valid hex decode as 0, and short strings leave the
    /// missing channels at 0. This never panics.
    pub fn from_hex(color: &str) -> Self {
        let hex = color.strip_prefix('#').unwrap_or(color);
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .unwrap_or(0)
        };
        Self {
            r: channel(0..2),
            g: channel(2..4),
            b: channel(4..6),
        }
    }

    /// Format as `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A fixed-size interpolated color ramp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Build a palette from hex anchor colors.
    ///
    /// A single anchor produces a constant palette. An empty anchor list is an
    /// `InvalidParameter` error.
    pub fn from_hex<S: AsRef<str>>(anchors: &[S]) -> SolarResult<Self> {
        let rgb: Vec<Rgb> = anchors.iter().map(|c| Rgb::from_hex(c.as_ref())).collect();
        Self::from_anchors(&rgb)
    }

    /// Build a palette from already-decoded anchor colors.
    pub fn from_anchors(anchors: &[Rgb]) -> SolarResult<Self> {
        if anchors.is_empty() {
            return Err(SolarError::invalid_parameter(
                "colors",
                "a palette needs at least one anchor color",
            ));
        }

        let step = (anchors.len() - 1) as f64 / (PALETTE_SIZE - 1) as f64;
        let colors = (0..PALETTE_SIZE)
            .map(|i| {
                let index = i as f64 * step;
                let lower = index.floor() as usize;
                let upper = (index.ceil() as usize).min(anchors.len() - 1);
                let t = index - lower as f64;
                let (a, b) = (anchors[lower], anchors[upper]);
                Rgb {
                    r: lerp_channel(a.r, b.r, t),
                    g: lerp_channel(a.g, b.g, t),
                    b: lerp_channel(a.b, b.b, t),
                }
            })
            .collect();

        Ok(Self { colors })
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn first(&self) -> Rgb {
        self.colors[0]
    }

    pub fn last(&self) -> Rgb {
        self.colors[self.colors.len() - 1]
    }

    /// Palette index for a value already normalized to `[0, 1]`.
    #[inline]
    pub fn index_of(&self, normalized: f64) -> usize {
        let max = (self.colors.len() - 1) as f64;
        (normalized.clamp(0.0, 1.0) * max).round() as usize
    }

    /// Color for a value already normalized to `[0, 1]`.
    #[inline]
    pub fn lookup(&self, normalized: f64) -> Rgb {
        self.colors[self.index_of(normalized)]
    }
}

/// Linear interpolation: `x` when `t == 0`, `y` when `t == 1`.
#[inline]
pub fn lerp(x: f64, y: f64, t: f64) -> f64 {
    x + t * (y - x)
}

#[inline]
fn lerp_channel(x: u8, y: u8, t: f64) -> u8 {
    lerp(x as f64, y as f64, t).round().clamp(0.0, 255.0) as u8
}

/// Normalize `x` into `[0, 1]` against `[min, max]`.
///
/// - Values outside the range clamp to the nearest end.
/// - A degenerate range (`max == min`) maps every value to `0.5`.
/// - `NaN` samples map to `0.0`.
#[inline]
pub fn normalize(x: f64, min: f64, max: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    let span = max - min;
    if span == 0.0 {
        return 0.5;
    }
    let y = (x - min) / span;
    if y.is_nan() {
        return 0.5;
    }
    y.clamp(0.0, 1.0)
}

/// A validated `[min, max]` data range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    min: f64,
    max: f64,
}

impl ValueRange {
    /// Fails with `Arithmetic` when a bound is not finite or `min > max`.
    pub fn new(min: f64, max: f64) -> SolarResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(SolarError::arithmetic(format!(
                "range bounds must be finite, got [{}, {}]",
                min, max
            )));
        }
        if min > max {
            return Err(SolarError::arithmetic(format!(
                "range minimum {} exceeds maximum {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// The `[0, 1]` range.
    pub fn unit() -> Self {
        Self { min: 0.0, max: 1.0 }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// True when `min == max`; every sample then normalizes to `0.5`.
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    #[inline]
    pub fn normalize(&self, x: f64) -> f64 {
        normalize(x, self.min, self.max)
    }

    /// Smallest and largest non-NaN sample of a band.
    pub fn of_samples(samples: &[f64]) -> SolarResult<Self> {
        let (min, max) = samples
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        Self::new(min, max)
    }
}
