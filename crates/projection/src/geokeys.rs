//! GeoTIFF GeoKey directory parsing and CRS resolution.
//!
//! The GeoKeyDirectoryTag (34735) is a flat `u16` array:
//!
//! ```text
//! [KeyDirectoryVersion, KeyRevision, MinorRevision, NumberOfKeys,
//!  KeyID, TIFFTagLocation, Count, Value_Offset, ...]
//! ```
//!
//! A `TIFFTagLocation` of 0 stores the value inline in `Value_Offset`;
//! 34736 points into GeoDoubleParamsTag and 34737 into GeoAsciiParamsTag.
//!
//! [`CrsDefinition::from_geokeys`] turns the keys into a proj4 definition
//! plus the factors that bring raw raster coordinates into the units that
//! definition expects (meters for projected systems, degrees for geographic).

use std::collections::HashMap;
use std::f64::consts::PI;

use solar_common::{SolarError, SolarResult};

/// TIFF tag holding the GeoKey directory.
pub const GEO_KEY_DIRECTORY_TAG: u16 = 34735;
/// TIFF tag holding double-valued GeoKeys.
pub const GEO_DOUBLE_PARAMS_TAG: u16 = 34736;
/// TIFF tag holding ASCII GeoKeys.
pub const GEO_ASCII_PARAMS_TAG: u16 = 34737;

// GeoKey IDs
pub const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
pub const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
pub const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
pub const GEOG_GEODETIC_DATUM_GEO_KEY: u16 = 2050;
pub const GEOG_ANGULAR_UNITS_GEO_KEY: u16 = 2054;
pub const GEOG_ANGULAR_UNIT_SIZE_GEO_KEY: u16 = 2055;
pub const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;
pub const PROJ_LINEAR_UNITS_GEO_KEY: u16 = 3076;
pub const PROJ_LINEAR_UNIT_SIZE_GEO_KEY: u16 = 3077;

// GeoKey values
pub const MODEL_TYPE_PROJECTED: u16 = 1;
pub const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
pub const USER_DEFINED: u16 = 32767;

const DATUM_WGS84: u16 = 6326;
const DATUM_NAD83: u16 = 6269;
const DATUM_ETRS89: u16 = 6258;

// EPSG unit codes
const UNIT_METER: u16 = 9001;
const UNIT_FOOT: u16 = 9002;
const UNIT_US_SURVEY_FOOT: u16 = 9003;
const UNIT_KILOMETER: u16 = 9036;
const UNIT_RADIAN: u16 = 9101;
const UNIT_DEGREE: u16 = 9102;
const UNIT_ARC_MINUTE: u16 = 9103;
const UNIT_ARC_SECOND: u16 = 9104;
const UNIT_GRAD: u16 = 9105;

const WGS84_LONGLAT: &str = "+proj=longlat +datum=WGS84 +no_defs";
const GRS80_LONGLAT: &str = "+proj=longlat +ellps=GRS80 +towgs84=0,0,0 +no_defs";

/// A single GeoKey value.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoKeyValue {
    Short(u16),
    Double(Vec<f64>),
    Ascii(String),
}

/// Parsed GeoKey directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoKeyDirectory {
    keys: HashMap<u16, GeoKeyValue>,
}

impl GeoKeyDirectory {
    /// Parse the raw directory plus the optional double / ASCII parameter tags.
    pub fn parse(directory: &[u16], doubles: &[f64], ascii: &str) -> SolarResult<Self> {
        if directory.len() < 4 {
            return Err(SolarError::reprojection(format!(
                "GeoKey directory too short: {} values",
                directory.len()
            )));
        }

        let count = directory[3] as usize;
        let entries = &directory[4..];
        if entries.len() < count * 4 {
            return Err(SolarError::reprojection(format!(
                "GeoKey directory declares {} keys but holds {}",
                count,
                entries.len() / 4
            )));
        }

        let mut keys = HashMap::with_capacity(count);
        for entry in entries.chunks_exact(4).take(count) {
            let (key, location, n, offset) = (entry[0], entry[1], entry[2] as usize, entry[3] as usize);
            let value = match location {
                0 => GeoKeyValue::Short(entry[3]),
                GEO_DOUBLE_PARAMS_TAG => {
                    let values = doubles.get(offset..offset + n).ok_or_else(|| {
                        SolarError::reprojection(format!(
                            "GeoKey {} points past GeoDoubleParams ({}..{} of {})",
                            key,
                            offset,
                            offset + n,
                            doubles.len()
                        ))
                    })?;
                    GeoKeyValue::Double(values.to_vec())
                }
                GEO_ASCII_PARAMS_TAG => {
                    let text = ascii.get(offset..offset + n).unwrap_or_default();
                    GeoKeyValue::Ascii(text.trim_end_matches(['|', '\0']).to_string())
                }
                // Keys stored in other tags are not needed for CRS resolution
                _ => continue,
            };
            keys.insert(key, value);
        }

        Ok(Self { keys })
    }

    pub fn get(&self, key: u16) -> Option<&GeoKeyValue> {
        self.keys.get(&key)
    }

    pub fn short(&self, key: u16) -> Option<u16> {
        match self.keys.get(&key) {
            Some(GeoKeyValue::Short(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn double(&self, key: u16) -> Option<f64> {
        match self.keys.get(&key) {
            Some(GeoKeyValue::Double(v)) => v.first().copied(),
            _ => None,
        }
    }

    pub fn ascii(&self, key: u16) -> Option<&str> {
        match self.keys.get(&key) {
            Some(GeoKeyValue::Ascii(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A resolved coordinate reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct CrsDefinition {
    /// proj4 definition understood by `proj4rs`.
    pub proj4: String,
    /// EPSG code when the raster used a registered system.
    pub epsg: Option<u16>,
    /// True for longitude/latitude systems.
    pub geographic: bool,
    /// Multipliers bringing raw (x, y) into the units `proj4` expects.
    pub conversion: (f64, f64),
}

impl CrsDefinition {
    /// Resolve the CRS described by a GeoKey directory.
    pub fn from_geokeys(keys: &GeoKeyDirectory) -> SolarResult<Self> {
        if keys.is_empty() {
            return Err(SolarError::reprojection("raster has no GeoKeys"));
        }

        let model = keys.short(GT_MODEL_TYPE_GEO_KEY);
        let projected = keys.short(PROJECTED_CS_TYPE_GEO_KEY);

        match (model, projected) {
            (Some(MODEL_TYPE_PROJECTED), _) | (None, Some(_)) => Self::projected(keys),
            (Some(MODEL_TYPE_GEOGRAPHIC), _) | (None, None) => Self::geographic(keys),
            (Some(other), _) => Err(SolarError::reprojection(format!(
                "unsupported GeoTIFF model type {}",
                other
            ))),
        }
    }

    /// Look up a registered EPSG code.
    pub fn from_epsg(code: u16) -> SolarResult<Self> {
        let proj4 = epsg_proj_string(code).ok_or_else(|| {
            SolarError::reprojection(format!("EPSG:{} is not supported", code))
        })?;
        Ok(Self {
            proj4,
            epsg: Some(code),
            geographic: is_geographic_epsg(code),
            conversion: (1.0, 1.0),
        })
    }

    fn projected(keys: &GeoKeyDirectory) -> SolarResult<Self> {
        let code = keys.short(PROJECTED_CS_TYPE_GEO_KEY).ok_or_else(|| {
            SolarError::reprojection("projected raster is missing ProjectedCSTypeGeoKey")
        })?;
        if code == USER_DEFINED {
            return Err(SolarError::reprojection(
                "user-defined projected coordinate systems are not supported",
            ));
        }

        let mut crs = Self::from_epsg(code)?;
        let factor = linear_unit_factor(keys)?;
        crs.conversion = (factor, factor);
        Ok(crs)
    }

    fn geographic(keys: &GeoKeyDirectory) -> SolarResult<Self> {
        let code = keys.short(GEOGRAPHIC_TYPE_GEO_KEY).ok_or_else(|| {
            SolarError::reprojection(
                "raster has neither ProjectedCSTypeGeoKey nor GeographicTypeGeoKey",
            )
        })?;

        let mut crs = if code == USER_DEFINED {
            let proj4 = match keys.short(GEOG_GEODETIC_DATUM_GEO_KEY) {
                None | Some(DATUM_WGS84) => WGS84_LONGLAT,
                Some(DATUM_NAD83) | Some(DATUM_ETRS89) => GRS80_LONGLAT,
                Some(datum) => {
                    return Err(SolarError::reprojection(format!(
                        "unsupported geodetic datum {}",
                        datum
                    )))
                }
            };
            Self {
                proj4: proj4.to_string(),
                epsg: None,
                geographic: true,
                conversion: (1.0, 1.0),
            }
        } else {
            Self::from_epsg(code)?
        };

        let factor = angular_unit_factor(keys)?;
        crs.conversion = (factor, factor);
        Ok(crs)
    }
}

/// proj4 definitions for the EPSG codes Solar API rasters come in.
pub fn epsg_proj_string(code: u16) -> Option<String> {
    match code {
        4326 => Some(WGS84_LONGLAT.to_string()),
        4269 | 4258 => Some(GRS80_LONGLAT.to_string()),
        3857 => Some(
            "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs"
                .to_string(),
        ),
        // WGS84 / UTM north and south
        32601..=32660 => Some(format!(
            "+proj=utm +zone={} +datum=WGS84 +units=m +no_defs",
            code - 32600
        )),
        32701..=32760 => Some(format!(
            "+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs",
            code - 32700
        )),
        // NAD83 / UTM
        26901..=26923 => Some(format!(
            "+proj=utm +zone={} +ellps=GRS80 +towgs84=0,0,0 +units=m +no_defs",
            code - 26900
        )),
        // ETRS89 / UTM
        25828..=25838 => Some(format!(
            "+proj=utm +zone={} +ellps=GRS80 +towgs84=0,0,0 +units=m +no_defs",
            code - 25800
        )),
        _ => None,
    }
}

pub fn is_geographic_epsg(code: u16) -> bool {
    matches!(code, 4326 | 4269 | 4258)
}

/// Meters per raw linear unit.
fn linear_unit_factor(keys: &GeoKeyDirectory) -> SolarResult<f64> {
    match keys.short(PROJ_LINEAR_UNITS_GEO_KEY) {
        None | Some(UNIT_METER) => Ok(1.0),
        Some(UNIT_FOOT) => Ok(0.3048),
        Some(UNIT_US_SURVEY_FOOT) => Ok(1200.0 / 3937.0),
        Some(UNIT_KILOMETER) => Ok(1000.0),
        Some(USER_DEFINED) => keys.double(PROJ_LINEAR_UNIT_SIZE_GEO_KEY).ok_or_else(|| {
            SolarError::reprojection("user-defined linear unit without ProjLinearUnitSizeGeoKey")
        }),
        Some(other) => Err(SolarError::reprojection(format!(
            "unsupported linear unit {}",
            other
        ))),
    }
}

/// Degrees per raw angular unit.
fn angular_unit_factor(keys: &GeoKeyDirectory) -> SolarResult<f64> {
    match keys.short(GEOG_ANGULAR_UNITS_GEO_KEY) {
        None | Some(UNIT_DEGREE) => Ok(1.0),
        Some(UNIT_RADIAN) => Ok(180.0 / PI),
        Some(UNIT_ARC_MINUTE) => Ok(1.0 / 60.0),
        Some(UNIT_ARC_SECOND) => Ok(1.0 / 3600.0),
        Some(UNIT_GRAD) => Ok(0.9),
        // GeogAngularUnitSizeGeoKey is expressed in radians
        Some(USER_DEFINED) => keys
            .double(GEOG_ANGULAR_UNIT_SIZE_GEO_KEY)
            .map(f64::to_degrees)
            .ok_or_else(|| {
                SolarError::reprojection(
                    "user-defined angular unit without GeogAngularUnitSizeGeoKey",
                )
            }),
        Some(other) => Err(SolarError::reprojection(format!(
            "unsupported angular unit {}",
            other
        ))),
    }
}
