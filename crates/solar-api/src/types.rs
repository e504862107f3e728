//! Response bodies of the Solar API glue endpoints.
//!
//! Only the fields the overlay pipeline reads are modelled; anything else in
//! the JSON is ignored.

use data_layers::DataLayerUrls;
use serde::{Deserialize, Serialize};
use solar_common::{GeoBoundingBox, SolarResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Rectangle given by its south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBox {
    pub sw: LatLng,
    pub ne: LatLng,
}

impl LatLngBox {
    pub fn to_geo_bounds(&self) -> SolarResult<GeoBoundingBox> {
        GeoBoundingBox::from_corners(
            (self.sw.longitude, self.sw.latitude),
            (self.ne.longitude, self.ne.latitude),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Date {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// `buildingInsights:findClosest` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingInsights {
    /// Resource name, `buildings/<id>`.
    #[serde(default)]
    pub name: Option<String>,
    pub center: LatLng,
    pub bounding_box: LatLngBox,
    #[serde(default)]
    pub imagery_date: Option<Date>,
    #[serde(default)]
    pub imagery_quality: Option<String>,
    #[serde(default)]
    pub region_code: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

/// `dataLayers:get` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataLayersResponse {
    #[serde(flatten)]
    pub urls: DataLayerUrls,
    #[serde(default)]
    pub imagery_date: Option<Date>,
    #[serde(default)]
    pub imagery_processed_date: Option<Date>,
    #[serde(default)]
    pub imagery_quality: Option<String>,
}
