//! GeoTIFF decoding.
//!
//! [`decode`] reads the first image of a (Geo)TIFF into bands and resolves its
//! coordinate reference system and native extent. [`read_raster`] goes one step
//! further and reprojects the extent into WGS84, producing a [`RasterImage`].

pub mod chunks;
pub mod samples;
pub mod tags;

use std::io::Cursor;

use projection::{reproject_bounds, CrsDefinition};
use solar_common::{Band, BoundingBox, RasterImage, SolarError, SolarResult};
use tiff::decoder::{Decoder, Limits};
use tracing::debug;

pub use chunks::ChunkLayout;
pub use tags::GeoTags;

/// A decoded GeoTIFF before reprojection.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGeoTiff {
    pub width: usize,
    pub height: usize,
    pub bands: Vec<Band>,
    pub crs: CrsDefinition,
    /// Extent in the raster's own CRS and units.
    pub native_bounds: BoundingBox,
}

impl DecodedGeoTiff {
    /// Reproject the extent to WGS84 and wrap everything in a [`RasterImage`].
    pub fn into_raster_image(self) -> SolarResult<RasterImage> {
        let bounds = reproject_bounds(&self.native_bounds, &self.crs)?;
        RasterImage::new(self.width, self.height, self.bands, bounds)
    }
}

/// Decode GeoTIFF bytes into bands, CRS and native bounds.
pub fn decode(bytes: &[u8]) -> SolarResult<DecodedGeoTiff> {
    let order = samples::ByteOrder::detect(bytes)?;

    // Offset and byte count arrays of tiled Solar API rasters outgrow the
    // default tag size limit
    let mut limits = Limits::default();
    limits.ifd_value_size = 64_000_000;

    let mut decoder = Decoder::new(Cursor::new(bytes))
        .map_err(|e| SolarError::decode(format!("not a TIFF image: {}", e)))?
        .with_limits(limits);

    let layout = ChunkLayout::read(&mut decoder, order)?;
    let (width, height) = (layout.width, layout.height);
    let geo = GeoTags::read(&mut decoder)?;
    let bands = layout.read_bands(bytes)?;

    let crs = CrsDefinition::from_geokeys(&geo.geokeys()?)?;
    let native_bounds = geo.native_bounds(width, height)?;

    debug!(
        width = width,
        height = height,
        bands = bands.len(),
        bits = layout.encoding.bits,
        planar = layout.planar,
        epsg = ?crs.epsg,
        "Decoded GeoTIFF"
    );

    Ok(DecodedGeoTiff {
        width,
        height,
        bands,
        crs,
        native_bounds,
    })
}

/// Decode GeoTIFF bytes and reproject their extent to WGS84.
pub fn read_raster(bytes: &[u8]) -> SolarResult<RasterImage> {
    decode(bytes)?.into_raster_image()
}
