//! GeoTIFF georeferencing tags.
//!
//! Tag IDs:
//! - 33550 = ModelPixelScaleTag (pixel size in model units)
//! - 33922 = ModelTiepointTag (raster (I, J, K) tied to model (X, Y, Z))
//! - 34264 = ModelTransformationTag (4x4 row-major affine matrix)
//! - 34735 = GeoKeyDirectoryTag
//! - 34736 = GeoDoubleParamsTag
//! - 34737 = GeoAsciiParamsTag

use std::io::{Read, Seek};

use projection::geokeys::{GEO_ASCII_PARAMS_TAG, GEO_DOUBLE_PARAMS_TAG, GEO_KEY_DIRECTORY_TAG};
use projection::GeoKeyDirectory;
use solar_common::{BoundingBox, SolarError, SolarResult};
use tiff::decoder::Decoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;
const MODEL_TRANSFORMATION_TAG: u16 = 34264;

/// Raw georeferencing tags of one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoTags {
    pub pixel_scale: Option<Vec<f64>>,
    pub tiepoint: Option<Vec<f64>>,
    pub transformation: Option<Vec<f64>>,
    pub geokey_directory: Option<Vec<u16>>,
    pub geo_doubles: Vec<f64>,
    pub geo_ascii: String,
}

impl GeoTags {
    /// Read every GeoTIFF tag present on the decoder's current image.
    pub fn read<R: Read + Seek>(decoder: &mut Decoder<R>) -> SolarResult<Self> {
        Ok(Self {
            pixel_scale: find_f64s(decoder, MODEL_PIXEL_SCALE_TAG)?,
            tiepoint: find_f64s(decoder, MODEL_TIEPOINT_TAG)?,
            transformation: find_f64s(decoder, MODEL_TRANSFORMATION_TAG)?,
            geokey_directory: find_u16s(decoder, GEO_KEY_DIRECTORY_TAG)?,
            geo_doubles: find_f64s(decoder, GEO_DOUBLE_PARAMS_TAG)?.unwrap_or_default(),
            geo_ascii: find_ascii(decoder, GEO_ASCII_PARAMS_TAG)?.unwrap_or_default(),
        })
    }

    /// Parse the GeoKey directory; a raster without one cannot be placed.
    pub fn geokeys(&self) -> SolarResult<GeoKeyDirectory> {
        let directory = self.geokey_directory.as_deref().ok_or_else(|| {
            SolarError::reprojection("raster has no GeoKeyDirectoryTag")
        })?;
        GeoKeyDirectory::parse(directory, &self.geo_doubles, &self.geo_ascii)
    }

    /// Extent of a `width` x `height` raster in model coordinates.
    ///
    /// Prefers ModelTiepoint + ModelPixelScale, honouring the tiepoint's
    /// raster offset, and falls back to ModelTransformation.
    pub fn native_bounds(&self, width: usize, height: usize) -> SolarResult<BoundingBox> {
        let (w, h) = (width as f64, height as f64);

        if let (Some(tie), Some(scale)) = (&self.tiepoint, &self.pixel_scale) {
            if tie.len() >= 6 && scale.len() >= 2 {
                let (i, j, x, y) = (tie[0], tie[1], tie[3], tie[4]);
                let (sx, sy) = (scale[0], scale[1]);

                let left = x - i * sx;
                let top = y + j * sy;
                return Ok(BoundingBox::from_points(
                    (left, top - h * sy),
                    (left + w * sx, top),
                ));
            }
        }

        if let Some(m) = &self.transformation {
            if m.len() >= 8 {
                let apply = |i: f64, j: f64| (m[0] * i + m[1] * j + m[3], m[4] * i + m[5] * j + m[7]);
                let corners = [apply(0.0, 0.0), apply(w, 0.0), apply(0.0, h), apply(w, h)];

                let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
                let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
                let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
                let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);
                return Ok(BoundingBox::new(min_x, min_y, max_x, max_y));
            }
        }

        Err(SolarError::reprojection(
            "raster has neither ModelTiepoint/ModelPixelScale nor ModelTransformation",
        ))
    }
}

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

fn tiff_err(code: u16, e: tiff::TiffError) -> SolarError {
    SolarError::decode(format!("failed to read TIFF tag {}: {}", code, e))
}

fn find_f64s<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16) -> SolarResult<Option<Vec<f64>>> {
    decoder
        .find_tag(tag(code))
        .map_err(|e| tiff_err(code, e))?
        .map(|v| v.into_f64_vec().map_err(|e| tiff_err(code, e)))
        .transpose()
}

fn find_u16s<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16) -> SolarResult<Option<Vec<u16>>> {
    decoder
        .find_tag(tag(code))
        .map_err(|e| tiff_err(code, e))?
        .map(|v| v.into_u16_vec().map_err(|e| tiff_err(code, e)))
        .transpose()
}

fn find_ascii<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16) -> SolarResult<Option<String>> {
    decoder
        .find_tag(tag(code))
        .map_err(|e| tiff_err(code, e))?
        .map(|v| v.into_string().map_err(|e| tiff_err(code, e)))
        .transpose()
}
