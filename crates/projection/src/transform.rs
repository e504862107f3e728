//! Reprojection of raster extents into WGS84 longitude/latitude.

use proj4rs::proj::Proj;
use solar_common::{BoundingBox, GeoBoundingBox, SolarError, SolarResult};
use tracing::debug;

use crate::geokeys::CrsDefinition;

const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Converts coordinates from a raster CRS into WGS84 degrees.
///
/// proj4rs works in radians on the geographic side, so geographic inputs are
/// converted on the way in and outputs on the way out.
pub struct CoordTransformer {
    source: Option<Proj>,
    target: Proj,
    source_is_geographic: bool,
    conversion: (f64, f64),
    definition: String,
}

impl std::fmt::Debug for CoordTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordTransformer")
            .field("definition", &self.definition)
            .field("source_is_geographic", &self.source_is_geographic)
            .field("conversion", &self.conversion)
            .finish_non_exhaustive()
    }
}

impl CoordTransformer {
    /// Build a transformer from `crs` to WGS84 longitude/latitude.
    pub fn to_wgs84(crs: &CrsDefinition) -> SolarResult<Self> {
        let target = Proj::from_proj_string(WGS84)
            .map_err(|e| SolarError::reprojection(format!("invalid WGS84 definition: {:?}", e)))?;

        // Already WGS84 degrees: only the unit conversion applies
        let source = if crs.proj4 == WGS84 {
            None
        } else {
            Some(Proj::from_proj_string(&crs.proj4).map_err(|e| {
                SolarError::reprojection(format!(
                    "invalid projection '{}': {:?}",
                    crs.proj4, e
                ))
            })?)
        };

        Ok(Self {
            source,
            target,
            source_is_geographic: crs.geographic,
            conversion: crs.conversion,
            definition: crs.proj4.clone(),
        })
    }

    /// Transform a raw raster coordinate into (lon, lat) degrees.
    pub fn transform(&self, x: f64, y: f64) -> SolarResult<(f64, f64)> {
        let (x, y) = (x * self.conversion.0, y * self.conversion.1);

        let Some(source) = &self.source else {
            return Ok((x, y));
        };

        let mut point = if self.source_is_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        proj4rs::transform::transform(source, &self.target, &mut point).map_err(|e| {
            SolarError::reprojection(format!(
                "failed to transform ({}, {}) from '{}': {:?}",
                x, y, self.definition, e
            ))
        })?;

        let (lon, lat) = (point.0.to_degrees(), point.1.to_degrees());
        if !lon.is_finite() || !lat.is_finite() {
            return Err(SolarError::reprojection(format!(
                "transform of ({}, {}) produced a non-finite coordinate",
                x, y
            )));
        }
        Ok((lon, lat))
    }
}

/// Reproject a native bounding box into a WGS84 lat/lon box.
///
/// The lower-left and upper-right corners are converted independently and
/// become the south-west and north-east corners of the result. An extent
/// that comes out inverted is a [`SolarError::Reprojection`].
pub fn reproject_bounds(bounds: &BoundingBox, crs: &CrsDefinition) -> SolarResult<GeoBoundingBox> {
    let transformer = CoordTransformer::to_wgs84(crs)?;

    let (min_x, min_y) = bounds.lower_left();
    let (max_x, max_y) = bounds.upper_right();
    let sw = transformer.transform(min_x, min_y)?;
    let ne = transformer.transform(max_x, max_y)?;

    debug!(
        crs = %crs.proj4,
        south = sw.1,
        west = sw.0,
        north = ne.1,
        east = ne.0,
        "Reprojected raster bounds"
    );

    GeoBoundingBox::from_corners(sw, ne)
}
