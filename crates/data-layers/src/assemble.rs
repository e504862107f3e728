//! Fetching the rasters a layer needs and building it.

use acquisition::{acquire_raster, ApiKey, FetchConfig, HttpRasterSource, RasterSource};
use futures::future::try_join_all;
use solar_common::{LayerId, SolarResult};
use tracing::{info, instrument};

use crate::layer::Layer;
use crate::urls::DataLayerUrls;

/// Fetch and assemble the layer named `layer_id`.
///
/// The mask and data rasters are downloaded concurrently. The first failure
/// aborts the whole assembly and is returned as-is.
pub async fn assemble_layer<S>(source: &S, layer_id: &str, urls: &DataLayerUrls) -> SolarResult<Layer>
where
    S: RasterSource + ?Sized,
{
    let id: LayerId = layer_id.parse()?;
    assemble(source, id, urls).await
}

/// [`assemble_layer`] over HTTP with the given credential.
pub async fn assemble_layer_with_key(
    layer_id: &str,
    urls: &DataLayerUrls,
    api_key: Option<ApiKey>,
    config: FetchConfig,
) -> SolarResult<Layer> {
    let source = HttpRasterSource::new(api_key, config)?;
    assemble_layer(&source, layer_id, urls).await
}

/// Fetch and assemble an already-parsed layer id.
#[instrument(skip(source, urls), fields(layer = %id))]
pub async fn assemble<S>(source: &S, id: LayerId, urls: &DataLayerUrls) -> SolarResult<Layer>
where
    S: RasterSource + ?Sized,
{
    let mask_url = urls.mask()?;

    let layer = match id {
        LayerId::Mask => {
            let mask = acquire_raster(source, mask_url).await?;
            Layer::mask(mask)?
        }
        LayerId::Dsm => {
            let (mask, dsm) = tokio::try_join!(
                acquire_raster(source, mask_url),
                acquire_raster(source, urls.dsm()?),
            )?;
            Layer::dsm(mask, dsm)?
        }
        LayerId::Rgb => {
            let (mask, rgb) = tokio::try_join!(
                acquire_raster(source, mask_url),
                acquire_raster(source, urls.rgb()?),
            )?;
            Layer::rgb(mask, rgb)?
        }
        LayerId::AnnualFlux => {
            let (mask, flux) = tokio::try_join!(
                acquire_raster(source, mask_url),
                acquire_raster(source, urls.annual_flux()?),
            )?;
            Layer::annual_flux(mask, flux)?
        }
        LayerId::MonthlyFlux => {
            let (mask, flux) = tokio::try_join!(
                acquire_raster(source, mask_url),
                acquire_raster(source, urls.monthly_flux()?),
            )?;
            Layer::monthly_flux(mask, flux)?
        }
        LayerId::HourlyShade => {
            let hourly_urls = urls.hourly_shade()?;
            let (mask, months) = tokio::try_join!(
                acquire_raster(source, mask_url),
                try_join_all(hourly_urls.iter().map(|url| acquire_raster(source, url))),
            )?;
            Layer::hourly_shade(mask, months)?
        }
    };

    let bounds = layer.bounds();
    info!(
        north = bounds.north,
        south = bounds.south,
        east = bounds.east,
        west = bounds.west,
        frames = layer.frame_count(),
        "Assembled layer"
    );
    Ok(layer)
}
