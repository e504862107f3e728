//! Palette mapping and RGB compositing into RGBA pixel buffers.

use rayon::prelude::*;
use solar_common::{RasterImage, SolarError, SolarResult};

use crate::palette::{Palette, ValueRange};

/// An RGBA8 image, row-major, 4 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes; `data` must hold exactly `width * height * 4` bytes.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> SolarResult<Self> {
        if data.len() != width * height * 4 {
            return Err(SolarError::invalid_parameter(
                "pixels",
                format!(
                    "expected {} bytes for {}x{} RGBA, got {}",
                    width * height * 4,
                    width,
                    height,
                    data.len()
                ),
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// RGBA of the pixel at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Encode as PNG, choosing indexed color when the image allows it.
    pub fn to_png(&self) -> SolarResult<Vec<u8>> {
        crate::png::create_png_auto(&self.data, self.width, self.height)
    }
}

/// Map one band through a palette and composite it.
///
/// Each sample is normalized against `range`, turned into a palette index with
/// `round(norm * 255)` and replaced by that entry's color. The resulting RGB
/// raster goes through [`composite_rgb`] with the same mask.
pub fn render_palette(
    data: &RasterImage,
    palette: &Palette,
    range: ValueRange,
    mask: Option<&RasterImage>,
    band_index: usize,
) -> SolarResult<PixelBuffer> {
    let band = data.band(band_index)?;

    let colors: Vec<_> = band
        .par_iter()
        .map(|&x| palette.lookup(range.normalize(x)))
        .collect();

    let rgb = data.with_rasters(vec![
        colors.iter().map(|c| c.r as f64).collect(),
        colors.iter().map(|c| c.g as f64).collect(),
        colors.iter().map(|c| c.b as f64).collect(),
    ])?;

    composite_rgb(&rgb, mask)
}

/// Composite a 3-band RGB raster into an RGBA buffer.
///
/// The output takes the mask's dimensions when a mask is given, otherwise the
/// raster's. Color samples are picked by nearest neighbour with independent
/// horizontal and vertical scale factors, so a coarse mask can sit over a
/// finer color raster (and vice versa).
///
/// Alpha is 255 without a mask, else `mask[y * width + x] * 255`. Mask samples
/// are expected to be exactly 0 or 1; other values are clamped into
/// `[0, 255]` and the resulting partial alpha is the caller's concern.
pub fn composite_rgb(rgb: &RasterImage, mask: Option<&RasterImage>) -> SolarResult<PixelBuffer> {
    if rgb.band_count() < 3 {
        return Err(SolarError::invalid_parameter(
            "rgb",
            format!("expected 3 bands (R, G, B), got {}", rgb.band_count()),
        ));
    }
    let (red, green, blue) = (rgb.band(0)?, rgb.band(1)?, rgb.band(2)?);
    let alpha = match mask {
        Some(m) => Some(m.band(0)?),
        None => None,
    };

    let (width, height) = match mask {
        Some(m) => (m.width(), m.height()),
        None => (rgb.width(), rgb.height()),
    };

    let dw = rgb.width() as f64 / width as f64;
    let dh = rgb.height() as f64 / height as f64;
    let src_width = rgb.width();

    let mut data = vec![0u8; width * height * 4];

    data.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = ((y as f64 * dh).floor() as usize).min(rgb.height() - 1);
            for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                let src_col = ((x as f64 * dw).floor() as usize).min(src_width - 1);
                let src = src_row * src_width + src_col;

                pixel[0] = to_channel(red[src]);
                pixel[1] = to_channel(green[src]);
                pixel[2] = to_channel(blue[src]);
                pixel[3] = match alpha {
                    Some(a) => to_channel(a[y * width + x] * 255.0),
                    None => 255,
                };
            }
        });

    PixelBuffer::new(width, height, data)
}

#[inline]
fn to_channel(v: f64) -> u8 {
    // NaN saturates to 0 on the cast
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use solar_common::GeoBoundingBox;

    fn bounds() -> GeoBoundingBox {
        GeoBoundingBox::new(1.0, 0.0, 1.0, 0.0).unwrap()
    }

    fn raster(width: usize, height: usize, bands: Vec<Vec<f64>>) -> RasterImage {
        RasterImage::new(width, height, bands, bounds()).unwrap()
    }

    #[test]
    fn test_no_mask_is_opaque() {
        let rgb = raster(2, 1, vec![vec![10.0, 20.0], vec![30.0, 40.0], vec![50.0, 60.0]]);
        let out = composite_rgb(&rgb, None).unwrap();

        assert_eq!((out.width(), out.height()), (2, 1));
        assert_eq!(out.pixel(0, 0), [10, 30, 50, 255]);
        assert_eq!(out.pixel(1, 0), [20, 40, 60, 255]);
    }

    #[test]
    fn test_mask_sets_alpha() {
        let rgb = raster(2, 1, vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        let mask = raster(2, 1, vec![vec![0.0, 1.0]]);
        let out = composite_rgb(&rgb, Some(&mask)).unwrap();

        assert_eq!(out.pixel(0, 0)[3], 0);
        assert_eq!(out.pixel(1, 0)[3], 255);
    }

    #[test]
    fn test_output_follows_mask_dimensions() {
        // 4x4 color raster under a 2x2 mask: every other sample is picked
        let values: Vec<f64> = (0..16).map(|v| v as f64).collect();
        let rgb = raster(4, 4, vec![values.clone(), values.clone(), values]);
        let mask = raster(2, 2, vec![vec![1.0; 4]]);
        let out = composite_rgb(&rgb, Some(&mask)).unwrap();

        assert_eq!((out.width(), out.height()), (2, 2));
        assert_eq!(out.pixel(0, 0)[0], 0);
        assert_eq!(out.pixel(1, 0)[0], 2);
        assert_eq!(out.pixel(0, 1)[0], 8);
        assert_eq!(out.pixel(1, 1)[0], 10);
    }

    #[test]
    fn test_coarse_raster_under_fine_mask() {
        let rgb = raster(1, 1, vec![vec![7.0], vec![8.0], vec![9.0]]);
        let mask = raster(3, 2, vec![vec![1.0; 6]]);
        let out = composite_rgb(&rgb, Some(&mask)).unwrap();

        assert_eq!((out.width(), out.height()), (3, 2));
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(out.pixel(x, y), [7, 8, 9, 255]);
            }
        }
    }

    #[test]
    fn test_non_binary_mask_clamped() {
        let rgb = raster(2, 1, vec![vec![0.0; 2], vec![0.0; 2], vec![0.0; 2]]);
        let mask = raster(2, 1, vec![vec![0.5, 3.0]]);
        let out = composite_rgb(&rgb, Some(&mask)).unwrap();

        assert_eq!(out.pixel(0, 0)[3], 128);
        assert_eq!(out.pixel(1, 0)[3], 255);
    }

    #[test]
    fn test_rgb_needs_three_bands() {
        let rgb = raster(1, 1, vec![vec![0.0], vec![0.0]]);
        assert!(matches!(
            composite_rgb(&rgb, None),
            Err(SolarError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_render_palette_grayscale() {
        let palette = Palette::from_hex(&["000000", "ffffff"]).unwrap();
        let data = raster(3, 1, vec![vec![0.0, 50.0, 100.0]]);
        let range = ValueRange::new(0.0, 100.0).unwrap();
        let out = render_palette(&data, &palette, range, None, 0).unwrap();

        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(out.pixel(1, 0), [128, 128, 128, 255]);
        assert_eq!(out.pixel(2, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn test_render_palette_selects_band() {
        let palette = Palette::from_hex(&["000000", "ffffff"]).unwrap();
        let data = raster(1, 1, vec![vec![0.0], vec![1.0]]);
        let out = render_palette(&data, &palette, ValueRange::unit(), None, 1).unwrap();
        assert_eq!(out.pixel(0, 0), [255, 255, 255, 255]);

        assert!(render_palette(&data, &palette, ValueRange::unit(), None, 2).is_err());
    }

    #[test]
    fn test_pixel_buffer_length_checked() {
        assert!(PixelBuffer::new(2, 2, vec![0; 15]).is_err());
        assert!(PixelBuffer::new(2, 2, vec![0; 16]).is_ok());
    }
}
