//! Coordinate reference system resolution and reprojection.
//!
//! GeoTIFF rasters describe their CRS through GeoKeys. This crate turns those
//! keys into a proj4 definition ([`CrsDefinition`]) and converts raster
//! extents into WGS84 latitude/longitude with `proj4rs`.

pub mod geokeys;
pub mod transform;

pub use geokeys::{CrsDefinition, GeoKeyDirectory, GeoKeyValue};
pub use transform::{reproject_bounds, CoordTransformer};
