//! Bounding box types: native CRS extents and reprojected geographic boxes.

use serde::{Deserialize, Serialize};

use crate::{SolarError, SolarResult};

/// A bounding box in a raster's native (usually projected) CRS.
///
/// Units are whatever the raster's CRS uses before unit conversion: meters
/// for UTM, sometimes feet, degrees for geographic rasters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Box spanned by two arbitrary corners.
    pub fn from_points(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            min_x: a.0.min(b.0),
            min_y: a.1.min(b.1),
            max_x: a.0.max(b.0),
            max_y: a.1.max(b.1),
        }
    }

    /// Lower-left corner as (x, y).
    pub fn lower_left(&self) -> (f64, f64) {
        (self.min_x, self.min_y)
    }

    /// Upper-right corner as (x, y).
    pub fn upper_right(&self) -> (f64, f64) {
        (self.max_x, self.max_y)
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// A latitude/longitude rectangle in degrees (WGS84).
///
/// Rasters arrive in a projected CRS; once their corners have been reprojected
/// the box must satisfy `north > south` and `east > west`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBoundingBox {
    /// Create a bounding box, rejecting inverted or non-finite edges.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> SolarResult<Self> {
        let bbox = Self {
            north,
            south,
            east,
            west,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Build a box from the south-west and north-east corners, given as (lon, lat).
    pub fn from_corners(sw: (f64, f64), ne: (f64, f64)) -> SolarResult<Self> {
        Self::new(ne.1, sw.1, ne.0, sw.0)
    }

    /// Check the `north > south`, `east > west` invariant.
    pub fn validate(&self) -> SolarResult<()> {
        let edges = [self.north, self.south, self.east, self.west];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(SolarError::reprojection(format!(
                "bounding box has non-finite edges: {:?}",
                self
            )));
        }
        if self.north <= self.south || self.east <= self.west {
            return Err(SolarError::reprojection(format!(
                "inverted bounding box: north={} south={} east={} west={}",
                self.north, self.south, self.east, self.west
            )));
        }
        Ok(())
    }

    /// Latitude extent in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude extent in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Center point as (lat, lon).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    /// Check if a (lat, lon) point lies within this box.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_box_from_points() {
        let bbox = BoundingBox::from_points((10.0, 200.0), (5.0, 100.0));
        assert_eq!(bbox.lower_left(), (5.0, 100.0));
        assert_eq!(bbox.upper_right(), (10.0, 200.0));
        assert_eq!(bbox.width(), 5.0);
        assert_eq!(bbox.height(), 100.0);
    }

    #[test]
    fn test_from_corners() {
        let bbox = GeoBoundingBox::from_corners((-122.09, 37.41), (-122.07, 37.43)).unwrap();
        assert_eq!(bbox.north, 37.43);
        assert_eq!(bbox.south, 37.41);
        assert_eq!(bbox.east, -122.07);
        assert_eq!(bbox.west, -122.09);
        assert!(bbox.contains(37.42, -122.08));
        assert!(!bbox.contains(37.44, -122.08));
    }

    #[test]
    fn test_inverted_box_rejected() {
        let err = GeoBoundingBox::new(10.0, 20.0, 5.0, 0.0).unwrap_err();
        assert!(matches!(err, SolarError::Reprojection(_)));

        let err = GeoBoundingBox::new(20.0, 10.0, 0.0, 5.0).unwrap_err();
        assert!(matches!(err, SolarError::Reprojection(_)));
    }

    #[test]
    fn test_nan_edges_rejected() {
        assert!(GeoBoundingBox::new(f64::NAN, 10.0, 5.0, 0.0).is_err());
    }

    #[test]
    fn test_center() {
        let bbox = GeoBoundingBox::new(2.0, 0.0, 4.0, 0.0).unwrap();
        assert_eq!(bbox.center(), (1.0, 2.0));
        assert_eq!(bbox.width(), 4.0);
        assert_eq!(bbox.height(), 2.0);
    }
}
