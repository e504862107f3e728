//! HTTP client for `buildingInsights:findClosest` and `dataLayers:get`.

use acquisition::ApiKey;
use reqwest::Client;
use serde::de::DeserializeOwned;
use solar_common::{SolarError, SolarResult};
use tracing::{debug, info, instrument, warn};

use crate::config::SolarApiConfig;
use crate::types::{BuildingInsights, DataLayersResponse, LatLng, LatLngBox};

/// Mean equatorial radius used for the request radius, in meters.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Radius in whole meters that covers `bbox` from its center.
///
/// Half the great-circle distance between the corners, with the distance
/// rounded to the meter first and the half rounded up.
pub fn radius_for(bbox: &LatLngBox) -> f64 {
    let diameter = great_circle_distance(bbox.sw, bbox.ne).round();
    (diameter / 2.0).ceil()
}

fn great_circle_distance(from: LatLng, to: LatLng) -> f64 {
    let (lat1, lat2) = (from.latitude.to_radians(), to.latitude.to_radians());
    let dlon = (from.longitude - to.longitude).to_radians();
    let cos_angle = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * dlon.cos();
    cos_angle.clamp(-1.0, 1.0).acos() * EARTH_RADIUS_M
}

/// Solar API client. The key is sent as the `key` query parameter and is
/// never logged.
pub struct SolarApiClient {
    client: Client,
    api_key: ApiKey,
    config: SolarApiConfig,
}

impl SolarApiClient {
    pub fn new(api_key: ApiKey, config: SolarApiConfig) -> SolarResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| SolarError::fetch(&config.base_url, None, e.without_url().to_string()))?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    pub fn config(&self) -> &SolarApiConfig {
        &self.config
    }

    /// Closest building to a point, with its center and bounding box.
    #[instrument(skip(self))]
    pub async fn building_insights(&self, latitude: f64, longitude: f64) -> SolarResult<BuildingInsights> {
        let query = vec![
            ("location.latitude", latitude.to_string()),
            ("location.longitude", longitude.to_string()),
            ("requiredQuality", self.config.required_quality.clone()),
        ];
        let insights: BuildingInsights = self.get("buildingInsights:findClosest", query).await?;

        info!(
            building = insights.name.as_deref().unwrap_or("unknown"),
            center_lat = insights.center.latitude,
            center_lng = insights.center.longitude,
            "Found building"
        );
        Ok(insights)
    }

    /// Raster URLs around `center`. `radius_meters` defaults to the
    /// configured radius.
    #[instrument(skip(self, center), fields(lat = center.latitude, lng = center.longitude))]
    pub async fn data_layers(
        &self,
        center: LatLng,
        radius_meters: Option<f64>,
    ) -> SolarResult<DataLayersResponse> {
        let radius = radius_meters.unwrap_or(self.config.radius_meters);
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SolarError::invalid_parameter(
                "radiusMeters",
                format!("must be > 0, got {}", radius),
            ));
        }

        let query = vec![
            ("location.latitude", center.latitude.to_string()),
            ("location.longitude", center.longitude.to_string()),
            ("radiusMeters", radius.to_string()),
            ("view", self.config.view.clone()),
            ("requiredQuality", self.config.required_quality.clone()),
            ("exactQualityRequired", self.config.exact_quality_required.to_string()),
            ("pixelSizeMeters", self.config.pixel_size_meters.to_string()),
        ];
        let response: DataLayersResponse = self.get("dataLayers:get", query).await?;

        info!(
            radius,
            hourly = response.urls.hourly_shade_urls.len(),
            quality = response.imagery_quality.as_deref().unwrap_or("unknown"),
            "Listed data layers"
        );
        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, method: &str, query: Vec<(&str, String)>) -> SolarResult<T> {
        // Errors name the endpoint only, never the keyed request URL
        let endpoint = format!("{}/{}", self.config.base_url, method);
        debug!(endpoint = %endpoint, "Calling Solar API");

        let response = self
            .client
            .get(&endpoint)
            .query(&query)
            .query(&[("key", self.api_key.expose())])
            .send()
            .await
            .map_err(|e| SolarError::fetch(&endpoint, None, e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SolarError::fetch(&endpoint, Some(status.as_u16()), e.without_url().to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), endpoint = %endpoint, "Solar API request failed");
            return Err(SolarError::Api {
                status: status.as_u16(),
                payload: body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
