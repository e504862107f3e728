//! Overlay CLI configuration.

use acquisition::FetchConfig;
use anyhow::{anyhow, Result};
use solar_api::SolarApiConfig;

/// Settings for both remote services the CLI talks to.
#[derive(Debug, Clone, Default)]
pub struct OverlayConfig {
    /// `buildingInsights` and `dataLayers` endpoints.
    pub api: SolarApiConfig,
    /// GeoTIFF downloads.
    pub fetch: FetchConfig,
}

impl OverlayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            api: SolarApiConfig::from_env(),
            fetch: FetchConfig::from_env(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.api
            .validate()
            .map_err(|e| anyhow!("invalid Solar API configuration: {}", e))?;
        self.fetch
            .validate()
            .map_err(|e| anyhow!("invalid raster fetch configuration: {}", e))?;
        Ok(())
    }
}
