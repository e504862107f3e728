//! Synthetic GeoTIFF generators.
//!
//! Builds small in-memory GeoTIFFs with the tag layout Solar API rasters use:
//! uncompressed strips, a ModelTiepoint and ModelPixelScale pair, and a GeoKey
//! directory naming an EPSG code. Samples are interleaved by default; planar
//! layout, multiple strips and 1-bit masks are opt-in.

use std::io::Cursor;

use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;
const GEO_KEY_DIRECTORY_TAG: u16 = 34735;

const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;
const PROJ_LINEAR_UNITS_GEO_KEY: u16 = 3076;

/// On-disk sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// Bilevel, packed eight pixels per byte most significant bit first.
    Bit1,
    U8,
    U32,
    F32,
}

impl SampleKind {
    fn bits(self) -> u16 {
        match self {
            SampleKind::Bit1 => 1,
            SampleKind::U8 => 8,
            SampleKind::U32 | SampleKind::F32 => 32,
        }
    }

    fn format(self) -> u16 {
        match self {
            SampleKind::Bit1 | SampleKind::U8 | SampleKind::U32 => 1,
            SampleKind::F32 => 3,
        }
    }

    /// Encode one row of samples. Bilevel rows are padded to a whole byte.
    fn encode_row(self, values: &[f64], out: &mut Vec<u8>) {
        match self {
            SampleKind::Bit1 => {
                for group in values.chunks(8) {
                    let mut packed = 0u8;
                    for (i, &v) in group.iter().enumerate() {
                        if v != 0.0 {
                            packed |= 0x80 >> i;
                        }
                    }
                    out.push(packed);
                }
            }
            SampleKind::U8 => out.extend(values.iter().map(|&v| v as u8)),
            SampleKind::U32 => {
                for &v in values {
                    out.extend_from_slice(&(v as u32).to_le_bytes());
                }
            }
            SampleKind::F32 => {
                for &v in values {
                    out.extend_from_slice(&(v as f32).to_le_bytes());
                }
            }
        }
    }
}

/// Builder for an in-memory GeoTIFF.
///
/// Bands are given band-major (one `Vec` per band, row-major inside) and
/// interleaved on write unless [`GeoTiffBuilder::planar`] is set.
///
/// # Example
///
/// ```
/// use test_utils::{GeoTiffBuilder, SampleKind};
///
/// let bytes = GeoTiffBuilder::new(2, 2)
///     .band(vec![1.0, 0.0, 0.0, 1.0])
///     .sample_kind(SampleKind::U8)
///     .build();
/// assert_eq!(&bytes[0..2], b"II");
/// ```
#[derive(Debug, Clone)]
pub struct GeoTiffBuilder {
    width: u32,
    height: u32,
    bands: Vec<Vec<f64>>,
    kind: SampleKind,
    epsg: u16,
    origin: (f64, f64),
    pixel_size: (f64, f64),
    linear_units: Option<u16>,
    georeferenced: bool,
    planar: bool,
    rows_per_strip: Option<u32>,
}

impl GeoTiffBuilder {
    /// A `width` x `height` float raster in UTM zone 10N with 0.5 m pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bands: Vec::new(),
            kind: SampleKind::F32,
            epsg: crate::fixtures::UTM_10N,
            origin: crate::fixtures::UTM_ORIGIN,
            pixel_size: (crate::fixtures::PIXEL_SIZE, crate::fixtures::PIXEL_SIZE),
            linear_units: None,
            georeferenced: true,
            planar: false,
            rows_per_strip: None,
        }
    }

    pub fn band(mut self, values: Vec<f64>) -> Self {
        self.bands.push(values);
        self
    }

    pub fn bands(mut self, bands: Vec<Vec<f64>>) -> Self {
        self.bands.extend(bands);
        self
    }

    pub fn sample_kind(mut self, kind: SampleKind) -> Self {
        self.kind = kind;
        self
    }

    /// EPSG code written to ProjectedCSTypeGeoKey (or GeographicTypeGeoKey
    /// for 4326).
    pub fn epsg(mut self, code: u16) -> Self {
        self.epsg = code;
        self
    }

    /// Model coordinate of the upper-left corner.
    pub fn origin(mut self, x: f64, y: f64) -> Self {
        self.origin = (x, y);
        self
    }

    pub fn pixel_size(mut self, sx: f64, sy: f64) -> Self {
        self.pixel_size = (sx, sy);
        self
    }

    /// EPSG unit code written to ProjLinearUnitsGeoKey.
    pub fn linear_units(mut self, code: u16) -> Self {
        self.linear_units = Some(code);
        self
    }

    /// Store each band as its own plane (PlanarConfiguration 2).
    pub fn planar(mut self) -> Self {
        self.planar = true;
        self
    }

    /// Split each plane into strips of `rows` rows. Defaults to one strip.
    pub fn rows_per_strip(mut self, rows: u32) -> Self {
        self.rows_per_strip = Some(rows);
        self
    }

    /// Omit every GeoTIFF tag, leaving a plain TIFF.
    pub fn without_georeferencing(mut self) -> Self {
        self.georeferenced = false;
        self
    }

    /// Encode the raster. Panics on inconsistent input.
    pub fn build(&self) -> Vec<u8> {
        assert!(!self.bands.is_empty(), "GeoTiffBuilder needs at least one band");
        let pixels = (self.width * self.height) as usize;
        for band in &self.bands {
            assert_eq!(band.len(), pixels, "band length must be width * height");
        }

        let samples = self.bands.len();
        let width = self.width as usize;
        let rows_per_strip = self.rows_per_strip.unwrap_or(self.height).clamp(1, self.height);

        // one entry per plane, each holding the rows of that plane
        let planes: Vec<Vec<Vec<f64>>> = if self.planar {
            self.bands
                .iter()
                .map(|band| band.chunks(width).map(<[f64]>::to_vec).collect())
                .collect()
        } else {
            let rows = (0..self.height as usize)
                .map(|row| {
                    (row * width..(row + 1) * width)
                        .flat_map(|i| self.bands.iter().map(move |band| band[i]))
                        .collect()
                })
                .collect();
            vec![rows]
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut cursor).expect("create TIFF encoder");
            let mut dir = encoder.new_directory().expect("create TIFF directory");

            dir.write_tag(Tag::ImageWidth, self.width).expect("ImageWidth");
            dir.write_tag(Tag::ImageLength, self.height).expect("ImageLength");
            dir.write_tag(Tag::BitsPerSample, vec![self.kind.bits(); samples].as_slice())
                .expect("BitsPerSample");
            dir.write_tag(Tag::Compression, 1u16).expect("Compression");

            // RGB for 3-band byte imagery, BlackIsZero otherwise
            let photometric: u16 = if samples == 3 && self.kind == SampleKind::U8 { 2 } else { 1 };
            dir.write_tag(Tag::PhotometricInterpretation, photometric)
                .expect("PhotometricInterpretation");
            dir.write_tag(Tag::SamplesPerPixel, samples as u16).expect("SamplesPerPixel");
            dir.write_tag(Tag::SampleFormat, vec![self.kind.format(); samples].as_slice())
                .expect("SampleFormat");
            let planar_config: u16 = if self.planar { 2 } else { 1 };
            dir.write_tag(Tag::PlanarConfiguration, planar_config)
                .expect("PlanarConfiguration");
            dir.write_tag(Tag::RowsPerStrip, rows_per_strip).expect("RowsPerStrip");

            if self.georeferenced {
                let scale = [self.pixel_size.0, self.pixel_size.1, 0.0];
                dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE_TAG), &scale[..])
                    .expect("ModelPixelScale");
                let tiepoint = [0.0, 0.0, 0.0, self.origin.0, self.origin.1, 0.0];
                dir.write_tag(Tag::Unknown(MODEL_TIEPOINT_TAG), &tiepoint[..])
                    .expect("ModelTiepoint");
                dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY_TAG), self.geokeys().as_slice())
                    .expect("GeoKeyDirectory");
            }

            let mut offsets: Vec<u32> = Vec::new();
            let mut byte_counts: Vec<u32> = Vec::new();
            for rows in &planes {
                for strip in rows.chunks(rows_per_strip as usize) {
                    let mut data = Vec::new();
                    for row in strip {
                        self.kind.encode_row(row, &mut data);
                    }
                    let offset = dir.write_data(data.as_slice()).expect("strip data");
                    offsets.push(offset as u32);
                    byte_counts.push(data.len() as u32);
                }
            }
            dir.write_tag(Tag::StripOffsets, offsets.as_slice()).expect("StripOffsets");
            dir.write_tag(Tag::StripByteCounts, byte_counts.as_slice())
                .expect("StripByteCounts");
            dir.finish().expect("finish TIFF directory");
        }
        cursor.into_inner()
    }

    fn geokeys(&self) -> Vec<u16> {
        let geographic = self.epsg == 4326;
        let mut entries: Vec<[u16; 4]> = vec![
            [GT_MODEL_TYPE_GEO_KEY, 0, 1, if geographic { 2 } else { 1 }],
            [GT_RASTER_TYPE_GEO_KEY, 0, 1, 1],
        ];
        if geographic {
            entries.push([GEOGRAPHIC_TYPE_GEO_KEY, 0, 1, self.epsg]);
        } else {
            entries.push([PROJECTED_CS_TYPE_GEO_KEY, 0, 1, self.epsg]);
            if let Some(units) = self.linear_units {
                entries.push([PROJ_LINEAR_UNITS_GEO_KEY, 0, 1, units]);
            }
        }

        let mut keys = vec![1, 1, 0, entries.len() as u16];
        for entry in entries {
            keys.extend_from_slice(&entry);
        }
        keys
    }
}

/// Row-major values `0, 1, 2, ...` for a `width` x `height` band.
pub fn sequential_band(width: usize, height: usize) -> Vec<f64> {
    (0..width * height).map(|v| v as f64).collect()
}

/// A 0/1 band with ones inside the `[x0, x1) x [y0, y1)` rectangle.
pub fn footprint_band(width: usize, height: usize, x: (usize, usize), y: (usize, usize)) -> Vec<f64> {
    let mut band = vec![0.0; width * height];
    for row in y.0..y.1.min(height) {
        for col in x.0..x.1.min(width) {
            band[row * width + col] = 1.0;
        }
    }
    band
}
