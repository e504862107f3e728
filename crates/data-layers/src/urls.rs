//! Raster URLs from a `dataLayers:get` response.

use serde::{Deserialize, Serialize};
use solar_common::{SolarError, SolarResult};

/// Number of hourly shade rasters, one per month.
pub const HOURLY_SHADE_MONTHS: usize = 12;

/// The GeoTIFF URLs of one data-layers response.
///
/// Field names follow the Solar API JSON. URLs the response omitted
/// deserialize as empty and are rejected when a layer needs them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataLayerUrls {
    #[serde(default)]
    pub mask_url: String,
    #[serde(default)]
    pub dsm_url: String,
    #[serde(default)]
    pub rgb_url: String,
    #[serde(default)]
    pub annual_flux_url: String,
    #[serde(default)]
    pub monthly_flux_url: String,
    /// January first.
    #[serde(default)]
    pub hourly_shade_urls: Vec<String>,
}

impl DataLayerUrls {
    pub fn mask(&self) -> SolarResult<&str> {
        required("maskUrl", &self.mask_url)
    }

    pub fn dsm(&self) -> SolarResult<&str> {
        required("dsmUrl", &self.dsm_url)
    }

    pub fn rgb(&self) -> SolarResult<&str> {
        required("rgbUrl", &self.rgb_url)
    }

    pub fn annual_flux(&self) -> SolarResult<&str> {
        required("annualFluxUrl", &self.annual_flux_url)
    }

    pub fn monthly_flux(&self) -> SolarResult<&str> {
        required("monthlyFluxUrl", &self.monthly_flux_url)
    }

    /// The twelve monthly hourly-shade URLs.
    pub fn hourly_shade(&self) -> SolarResult<&[String]> {
        if self.hourly_shade_urls.len() < HOURLY_SHADE_MONTHS {
            return Err(SolarError::invalid_parameter(
                "hourlyShadeUrls",
                format!(
                    "expected {} URLs, got {}",
                    HOURLY_SHADE_MONTHS,
                    self.hourly_shade_urls.len()
                ),
            ));
        }
        let urls = &self.hourly_shade_urls[..HOURLY_SHADE_MONTHS];
        for url in urls {
            required("hourlyShadeUrls", url)?;
        }
        Ok(urls)
    }
}

fn required<'a>(param: &str, url: &'a str) -> SolarResult<&'a str> {
    if url.trim().is_empty() {
        return Err(SolarError::invalid_parameter(param, "URL missing from data layers response"));
    }
    Ok(url)
}
