//! Common fixtures shaped like Solar API data layer responses.

use crate::generators::{footprint_band, GeoTiffBuilder, SampleKind};

/// WGS 84 / UTM zone 10N, the zone covering the Bay Area.
pub const UTM_10N: u16 = 32610;

/// Upper-left corner of the fixture rasters in UTM 10N, near
/// (37.42, -122.08).
pub const UTM_ORIGIN: (f64, f64) = (581_600.0, 4_141_800.0);

/// Solar API data layers are served at 0.5 m per pixel.
pub const PIXEL_SIZE: f64 = 0.5;

/// Test location as (lat, lon).
pub const LOCATION: (f64, f64) = (37.4219999, -122.0840575);

/// Bilevel building mask with a footprint in the centre.
///
/// The footprint covers columns and rows `[width/4, 3*width/4)`. Like the
/// provider's masks it is stored at one bit per pixel.
pub fn mask_tiff(width: usize, height: usize) -> Vec<u8> {
    let band = footprint_band(
        width,
        height,
        (width / 4, 3 * width / 4),
        (height / 4, 3 * height / 4),
    );
    GeoTiffBuilder::new(width as u32, height as u32)
        .band(band)
        .sample_kind(SampleKind::Bit1)
        .build()
}

/// Bilevel mask with every pixel set.
pub fn full_mask_tiff(width: usize, height: usize) -> Vec<u8> {
    GeoTiffBuilder::new(width as u32, height as u32)
        .band(vec![1.0; width * height])
        .sample_kind(SampleKind::Bit1)
        .build()
}

/// Surface model with elevations from `min` to `max` meters in row-major order.
pub fn dsm_tiff(width: usize, height: usize, min: f64, max: f64) -> Vec<u8> {
    let n = width * height;
    let step = if n > 1 { (max - min) / (n - 1) as f64 } else { 0.0 };
    let band = (0..n).map(|i| min + step * i as f64).collect();
    GeoTiffBuilder::new(width as u32, height as u32).band(band).build()
}

/// Aerial imagery with constant red, green and blue channels.
pub fn rgb_tiff(width: usize, height: usize, rgb: [u8; 3]) -> Vec<u8> {
    let n = width * height;
    GeoTiffBuilder::new(width as u32, height as u32)
        .bands(rgb.iter().map(|&c| vec![c as f64; n]).collect())
        .sample_kind(SampleKind::U8)
        .build()
}

/// Annual flux in kWh/kW/year with a constant value.
pub fn annual_flux_tiff(width: usize, height: usize, value: f64) -> Vec<u8> {
    GeoTiffBuilder::new(width as u32, height as u32)
        .band(vec![value; width * height])
        .build()
}

/// Twelve monthly flux bands where band `m` holds `m * 10`.
pub fn monthly_flux_tiff(width: usize, height: usize) -> Vec<u8> {
    let n = width * height;
    GeoTiffBuilder::new(width as u32, height as u32)
        .bands((0..12).map(|m| vec![m as f64 * 10.0; n]).collect())
        .build()
}

/// Twenty-four hourly shade bands of 32-bit day masks.
///
/// Bit `d - 1` is set on hours `6..18` for every day `d` of the month, so the
/// daylight hours are sunny and the night hours are shaded.
pub fn hourly_shade_tiff(width: usize, height: usize) -> Vec<u8> {
    hourly_shade_mask_tiff(width, height, u32::MAX)
}

/// Twenty-four hourly shade bands holding `days` on hours `6..18` and zero
/// at night.
pub fn hourly_shade_mask_tiff(width: usize, height: usize, days: u32) -> Vec<u8> {
    let n = width * height;
    GeoTiffBuilder::new(width as u32, height as u32)
        .bands(
            (0..24)
                .map(|hour| {
                    let bits = if (6..18).contains(&hour) { days } else { 0 };
                    vec![bits as f64; n]
                })
                .collect(),
        )
        .sample_kind(SampleKind::U32)
        .build()
}

/// Twelve monthly flux bands stored as separate planes, one strip per row.
pub fn planar_monthly_flux_tiff(width: usize, height: usize) -> Vec<u8> {
    let n = width * height;
    GeoTiffBuilder::new(width as u32, height as u32)
        .bands((0..12).map(|m| vec![m as f64 * 10.0; n]).collect())
        .planar()
        .rows_per_strip(1)
        .build()
}
