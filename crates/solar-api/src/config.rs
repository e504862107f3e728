//! Configuration for the Solar API client.

use std::time::Duration;

/// Production endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://solar.googleapis.com/v1";

/// Query parameters and transport settings for [`SolarApiClient`](crate::SolarApiClient).
#[derive(Debug, Clone, PartialEq)]
pub struct SolarApiConfig {
    /// Endpoint root without a trailing slash.
    pub base_url: String,
    /// Radius used by `data_layers` when the caller does not pass one.
    pub radius_meters: f64,
    pub pixel_size_meters: f64,
    /// `LOW`, `MEDIUM` or `HIGH`.
    pub required_quality: String,
    /// `FULL_LAYERS` is needed for the flux and shade rasters.
    pub view: String,
    pub exact_quality_required: bool,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for SolarApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            radius_meters: 100.0,
            pixel_size_meters: 0.5,
            required_quality: "HIGH".to_string(),
            view: "FULL_LAYERS".to_string(),
            exact_quality_required: true,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl SolarApiConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SOLAR_API_BASE_URL") {
            if !val.trim().is_empty() {
                config.base_url = val.trim().trim_end_matches('/').to_string();
            }
        }

        if let Ok(val) = std::env::var("SOLAR_RADIUS_METERS") {
            if let Ok(radius) = val.parse() {
                config.radius_meters = radius;
            }
        }

        if let Ok(val) = std::env::var("SOLAR_PIXEL_SIZE_METERS") {
            if let Ok(size) = val.parse() {
                config.pixel_size_meters = size;
            }
        }

        if let Ok(val) = std::env::var("SOLAR_REQUIRED_QUALITY") {
            if !val.trim().is_empty() {
                config.required_quality = val.trim().to_uppercase();
            }
        }

        if let Ok(val) = std::env::var("SOLAR_API_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!("base_url must be an http(s) URL, got '{}'", self.base_url));
        }
        if !(self.radius_meters.is_finite() && self.radius_meters > 0.0) {
            return Err("radius_meters must be > 0".to_string());
        }
        if !(self.pixel_size_meters.is_finite() && self.pixel_size_meters > 0.0) {
            return Err("pixel_size_meters must be > 0".to_string());
        }
        if !matches!(self.required_quality.as_str(), "LOW" | "MEDIUM" | "HIGH") {
            return Err(format!(
                "required_quality must be LOW, MEDIUM or HIGH, got '{}'",
                self.required_quality
            ));
        }
        if self.request_timeout.is_zero() {
            return Err("request_timeout must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_provider_defaults() {
        let config = SolarApiConfig::default();
        assert_eq!(config.base_url, "https://solar.googleapis.com/v1");
        assert_eq!(config.pixel_size_meters, 0.5);
        assert_eq!(config.view, "FULL_LAYERS");
        assert!(config.exact_quality_required);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = SolarApiConfig {
            radius_meters: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SolarApiConfig {
            required_quality: "BEST".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SolarApiConfig {
            base_url: "solar.googleapis.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
