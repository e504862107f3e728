//! Raster sources: where GeoTIFF bytes come from.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url};
use solar_common::{SolarError, SolarResult};
use tracing::{debug, info, instrument, warn};

use crate::config::{ApiKey, FetchConfig};

/// Anything that can hand back the bytes behind a raster URL.
#[async_trait]
pub trait RasterSource: Send + Sync {
    /// Fetch the raw payload of `url`.
    async fn fetch(&self, url: &str) -> SolarResult<Bytes>;
}

/// Add `key=<api key>` to `url` when its host is `provider_host`.
///
/// URLs on any other host are returned unchanged so the credential never
/// leaves the provider.
pub fn authorize_url(url: &str, api_key: Option<&ApiKey>, provider_host: &str) -> SolarResult<Url> {
    let mut parsed = Url::parse(url)
        .map_err(|e| SolarError::fetch(url, None, format!("invalid URL: {}", e)))?;

    let on_provider = parsed
        .host_str()
        .map(|host| host.eq_ignore_ascii_case(provider_host))
        .unwrap_or(false);

    if let (true, Some(key)) = (on_provider, api_key) {
        parsed.query_pairs_mut().append_pair("key", key.expose());
    }
    Ok(parsed)
}

/// Fetches rasters over HTTP(S) with reqwest.
pub struct HttpRasterSource {
    client: Client,
    api_key: Option<ApiKey>,
    config: FetchConfig,
}

impl HttpRasterSource {
    /// Create a source with its own HTTP client.
    pub fn new(api_key: Option<ApiKey>, config: FetchConfig) -> SolarResult<Self> {
        config
            .validate()
            .map_err(|e| SolarError::invalid_parameter("fetch_config", e))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                SolarError::invalid_parameter("http_client", format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self::with_client(client, api_key, config))
    }

    /// Create a source sharing an existing client.
    pub fn with_client(client: Client, api_key: Option<ApiKey>, config: FetchConfig) -> Self {
        Self {
            client,
            api_key,
            config,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl RasterSource for HttpRasterSource {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &str) -> SolarResult<Bytes> {
        let request_url = authorize_url(url, self.api_key.as_ref(), &self.config.provider_host)?;

        debug!("Downloading raster");

        // reqwest errors embed the request URL, which may carry the key
        let response = self
            .client
            .get(request_url)
            .send()
            .await
            .map_err(|e| SolarError::fetch(url, None, e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let payload = response
                .text()
                .await
                .unwrap_or_else(|e| format!("failed to read error body: {}", e.without_url()));
            warn!(status = status.as_u16(), "Raster download failed");
            return Err(SolarError::fetch(url, Some(status.as_u16()), payload));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SolarError::fetch(url, Some(status.as_u16()), e.without_url().to_string()))?;

        info!(size = bytes.len(), "Downloaded raster");
        Ok(bytes)
    }
}

/// Serves rasters from memory, keyed by URL.
///
/// Unknown URLs fail like a provider 404. Useful for offline runs and tests.
#[derive(Debug, Default)]
pub struct MemoryRasterSource {
    rasters: HashMap<String, Bytes>,
    requests: AtomicUsize,
}

impl MemoryRasterSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, bytes: impl Into<Bytes>) {
        self.rasters.insert(url.into(), bytes.into());
    }

    pub fn with(mut self, url: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        self.insert(url, bytes);
        self
    }

    /// Number of `fetch` calls served so far, failed ones included.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RasterSource for MemoryRasterSource {
    async fn fetch(&self, url: &str) -> SolarResult<Bytes> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.rasters.get(url).cloned().ok_or_else(|| {
            SolarError::fetch(
                url,
                Some(404),
                r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "solar.googleapis.com";

    #[test]
    fn test_key_added_for_provider_host() {
        let key = ApiKey::new("secret");
        let url = authorize_url(
            "https://solar.googleapis.com/v1/geoTiff:get?id=abc",
            Some(&key),
            HOST,
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://solar.googleapis.com/v1/geoTiff:get?id=abc&key=secret"
        );
    }

    #[test]
    fn test_key_added_without_existing_query() {
        let key = ApiKey::new("secret");
        let url = authorize_url("https://solar.googleapis.com/v1/x", Some(&key), HOST).unwrap();
        assert_eq!(url.query(), Some("key=secret"));
    }

    #[test]
    fn test_key_withheld_from_other_hosts() {
        let key = ApiKey::new("secret");
        let url = authorize_url("https://storage.example.com/mask.tif?id=1", Some(&key), HOST).unwrap();
        assert_eq!(url.as_str(), "https://storage.example.com/mask.tif?id=1");

        // Host must match exactly, not by suffix
        let url = authorize_url("https://evil-solar.googleapis.com.example/x", Some(&key), HOST).unwrap();
        assert!(url.query().is_none());
    }

    #[test]
    fn test_no_key_no_change() {
        let url = authorize_url("https://solar.googleapis.com/v1/x?id=1", None, HOST).unwrap();
        assert_eq!(url.query(), Some("id=1"));
    }

    #[test]
    fn test_invalid_url_is_fetch_error() {
        let err = authorize_url("not a url", None, HOST).unwrap_err();
        assert!(matches!(err, SolarError::Fetch { status: None, .. }));
    }

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemoryRasterSource::new().with("mem://mask", vec![1u8, 2, 3]);

        assert_eq!(source.fetch("mem://mask").await.unwrap(), Bytes::from(vec![1u8, 2, 3]));
        let err = source.fetch("mem://missing").await.unwrap_err();
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(source.request_count(), 2);
    }
}
