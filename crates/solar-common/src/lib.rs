//! Common types and utilities shared across the solar overlay crates.

pub mod bbox;
pub mod error;
pub mod layer;
pub mod raster;

pub use bbox::{BoundingBox, GeoBoundingBox};
pub use error::{SolarError, SolarResult};
pub use layer::LayerId;
pub use raster::{Band, RasterImage};
