//! Solar API data layers.
//!
//! Turns the GeoTIFF URLs of a `dataLayers:get` response into a [`Layer`]:
//! the rasters are fetched concurrently, checked, and paired with the legend
//! and palette of the requested visualization. Rendering a layer is pure and
//! can be repeated with different [`RenderOptions`].
//!
//! | layer | rasters | range | legend |
//! |---|---|---|---|
//! | `mask` | mask | [0, 1] | No roof / Roof |
//! | `dsm` | mask, dsm | elevation extremes | `{min} m` / `{max} m` |
//! | `rgb` | mask, rgb | - | - |
//! | `annualFlux` | mask, annual flux | [0, 1800] | Shady / Sunny |
//! | `monthlyFlux` | mask, monthly flux | [0, 200] | Shady / Sunny |
//! | `hourlyShade` | mask, 12 hourly shade | [0, 1] | Shade / Sun |

pub mod assemble;
pub mod layer;
pub mod options;
pub mod shade;
pub mod urls;

pub use assemble::{assemble, assemble_layer, assemble_layer_with_key};
pub use layer::{Layer, LayerData, Legend};
pub use options::RenderOptions;
pub use urls::DataLayerUrls;
