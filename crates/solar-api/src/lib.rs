//! Client for the Solar API endpoints that locate a building and list the
//! GeoTIFF rasters covering it.
//!
//! ```text
//! buildingInsights:findClosest  ->  center + bounding box
//! dataLayers:get                ->  DataLayerUrls (fed to data_layers::assemble_layer)
//! ```

pub mod client;
pub mod config;
pub mod types;

pub use client::{radius_for, SolarApiClient};
pub use config::SolarApiConfig;
pub use types::{BuildingInsights, DataLayersResponse, Date, LatLng, LatLngBox};
