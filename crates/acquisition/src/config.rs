//! Configuration for raster downloads.

use std::fmt;
use std::time::Duration;

/// Host that receives the API key.
pub const DEFAULT_PROVIDER_HOST: &str = "solar.googleapis.com";

/// Configuration for [`HttpRasterSource`](crate::HttpRasterSource).
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Only URLs on this host get the `key` query parameter.
    pub provider_host: String,
    /// Whole-request timeout, body included.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            provider_host: DEFAULT_PROVIDER_HOST.to_string(),
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl FetchConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SOLAR_PROVIDER_HOST") {
            if !val.trim().is_empty() {
                config.provider_host = val.trim().to_lowercase();
            }
        }

        if let Ok(val) = std::env::var("SOLAR_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(val) = std::env::var("SOLAR_CONNECT_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.connect_timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.provider_host.is_empty() {
            return Err("provider_host must not be empty".to_string());
        }
        if self.provider_host.contains('/') || self.provider_host.contains(':') {
            return Err(format!(
                "provider_host must be a bare host name, got '{}'",
                self.provider_host
            ));
        }
        if self.request_timeout.is_zero() {
            return Err("request_timeout must be > 0".to_string());
        }
        if self.connect_timeout.is_zero() {
            return Err("connect_timeout must be > 0".to_string());
        }
        Ok(())
    }
}

/// API credential. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = FetchConfig::default();
        assert_eq!(config.provider_host, "solar.googleapis.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_host() {
        let config = FetchConfig {
            provider_host: "https://solar.googleapis.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = FetchConfig {
            provider_host: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = FetchConfig {
            request_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_debug_redacted() {
        let key = ApiKey::new("AIzaSecret");
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
        assert_eq!(key.expose(), "AIzaSecret");
    }
}
