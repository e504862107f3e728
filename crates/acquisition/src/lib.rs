//! GeoTIFF acquisition.
//!
//! Downloads raster payloads through a [`RasterSource`] and decodes them into
//! georeferenced [`RasterImage`]s with WGS84 bounds.
//!
//! Key points:
//! - The API key is appended only for the configured provider host
//! - Non-success responses keep the provider's error body verbatim
//! - Nothing is retried or cached

pub mod config;
pub mod source;

use solar_common::{RasterImage, SolarError, SolarResult};
use tracing::{debug, instrument};

pub use config::{ApiKey, FetchConfig, DEFAULT_PROVIDER_HOST};
pub use source::{authorize_url, HttpRasterSource, MemoryRasterSource, RasterSource};

/// Fetch `url` from `source` and decode it into a reprojected raster.
#[instrument(skip(source), fields(url = %url))]
pub async fn acquire_raster<S>(source: &S, url: &str) -> SolarResult<RasterImage>
where
    S: RasterSource + ?Sized,
{
    let bytes = source.fetch(url).await?;

    // Decoding and reprojection are CPU-bound
    let raster = tokio::task::spawn_blocking(move || geotiff_reader::read_raster(&bytes))
        .await
        .map_err(|e| SolarError::decode(format!("decode task failed: {}", e)))??;

    debug!(
        width = raster.width(),
        height = raster.height(),
        bands = raster.band_count(),
        "Acquired raster"
    );
    Ok(raster)
}
