//! Per-day sun flags packed into hourly shade rasters.
//!
//! Each hourly shade raster covers one month with 24 bands, one per hour.
//! Every sample is an integer whose bit `day - 1` is set when that pixel is
//! in the sun at that hour on that day.

use rayon::prelude::*;
use solar_common::{RasterImage, SolarResult};

/// Whether `sample` has the sun bit for `day` (1-based) set.
///
/// Samples that are not non-negative integers fitting in 32 bits count as
/// shade.
#[inline]
pub fn is_sunny(sample: f64, day: u32) -> bool {
    if !(1..=32).contains(&day) || !sample.is_finite() || sample < 0.0 || sample.fract() != 0.0 {
        return false;
    }
    if sample > u32::MAX as f64 {
        return false;
    }
    (sample as u32 >> (day - 1)) & 1 == 1
}

/// Binary raster of band `hour`: 1.0 where `day` is sunny, 0.0 elsewhere.
pub fn sun_raster(hourly: &RasterImage, hour: usize, day: u32) -> SolarResult<RasterImage> {
    let band = hourly.band(hour)?;
    let flags = band
        .par_iter()
        .map(|&v| if is_sunny(v, day) { 1.0 } else { 0.0 })
        .collect();
    hourly.with_rasters(vec![flags])
}
