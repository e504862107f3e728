//! Image rendering for solar data layers.
//!
//! Implements the pieces that turn decoded rasters into overlay images:
//! - Interpolated color palettes and value normalization
//! - Palette mapping and RGB compositing with an optional mask
//! - PNG encoding

pub mod composite;
pub mod palette;
pub mod png;

pub use composite::{composite_rgb, render_palette, PixelBuffer};
pub use palette::{normalize, Palette, Rgb, ValueRange, PALETTE_SIZE};
