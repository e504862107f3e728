//! Decoded raster images.

use crate::{GeoBoundingBox, SolarError, SolarResult};

/// One scalar channel, row-major, indexed `row * width + col`.
///
/// Samples are `f64` so every integer type the decoder produces (up to 32 bits)
/// is represented exactly. Bit-packed rasters rely on this.
pub type Band = Vec<f64>;

/// A georeferenced multi-band raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: usize,
    height: usize,
    rasters: Vec<Band>,
    bounds: GeoBoundingBox,
}

impl RasterImage {
    /// Create a raster, checking that every band covers `width * height` samples.
    pub fn new(
        width: usize,
        height: usize,
        rasters: Vec<Band>,
        bounds: GeoBoundingBox,
    ) -> SolarResult<Self> {
        if width == 0 || height == 0 {
            return Err(SolarError::decode(format!(
                "raster dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        if rasters.is_empty() {
            return Err(SolarError::decode("raster contains no bands"));
        }
        let expected = width * height;
        if let Some((i, band)) = rasters.iter().enumerate().find(|(_, b)| b.len() != expected) {
            return Err(SolarError::decode(format!(
                "band {} has {} samples, expected {} ({}x{})",
                i,
                band.len(),
                expected,
                width,
                height
            )));
        }

        Ok(Self {
            width,
            height,
            rasters,
            bounds,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> GeoBoundingBox {
        self.bounds
    }

    pub fn rasters(&self) -> &[Band] {
        &self.rasters
    }

    pub fn band_count(&self) -> usize {
        self.rasters.len()
    }

    /// Borrow a band, failing with `InvalidParameter` if it does not exist.
    pub fn band(&self, index: usize) -> SolarResult<&Band> {
        self.rasters.get(index).ok_or_else(|| {
            SolarError::invalid_parameter(
                "band",
                format!("index {} out of range, raster has {} bands", index, self.rasters.len()),
            )
        })
    }

    /// Same shape and bounds, different bands.
    pub fn with_rasters(&self, rasters: Vec<Band>) -> SolarResult<Self> {
        Self::new(self.width, self.height, rasters, self.bounds)
    }
}
