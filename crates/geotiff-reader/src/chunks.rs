//! Strip and tile decoding.
//!
//! The `tiff` crate only expands chunks it can map onto a colour type, which
//! excludes many-band grayscale, separate planes and packed bitmasks. Tags
//! are still read through its [`Decoder`]; the chunk bytes are sliced out of
//! the file and decoded here, one band per sample.

use std::borrow::Cow;
use std::io::{Read, Seek};

use flate2::read::ZlibDecoder;
use solar_common::{Band, SolarError, SolarResult};
use tiff::decoder::Decoder;
use tiff::tags::Tag;

use crate::samples::{self, ByteOrder, SampleEncoding, SampleFormat};

/// Upper bound on `width * height * bands`; every sample becomes an `f64`.
pub const MAX_SAMPLES: usize = 256 * 1024 * 1024;

const COMPRESSION_NONE: u16 = 1;
const COMPRESSION_LZW: u16 = 5;
const COMPRESSION_DEFLATE: u16 = 8;
const COMPRESSION_PACKBITS: u16 = 32773;
const COMPRESSION_DEFLATE_LEGACY: u16 = 32946;

const PREDICTOR_NONE: u16 = 1;
const PREDICTOR_HORIZONTAL: u16 = 2;
const PREDICTOR_FLOATING_POINT: u16 = 3;

const PHOTOMETRIC_WHITE_IS_ZERO: u16 = 0;
const PLANAR_SEPARATE: u16 = 2;

/// How the image is cut into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunking {
    Strips { rows_per_strip: usize },
    Tiles { width: usize, length: usize },
}

/// Everything needed to locate and decode the sample data of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkLayout {
    pub width: usize,
    pub height: usize,
    pub samples_per_pixel: usize,
    pub encoding: SampleEncoding,
    pub compression: u16,
    pub predictor: u16,
    pub planar: bool,
    pub white_is_zero: bool,
    pub chunking: Chunking,
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
}

/// Placement of one chunk within the image.
#[derive(Debug, Clone, Copy)]
struct ChunkRegion {
    x: usize,
    y: usize,
    /// Stored width; tiles may extend past the right edge.
    stride_width: usize,
    width: usize,
    height: usize,
}

impl ChunkLayout {
    /// Read the layout tags of the decoder's current image.
    pub fn read<R: Read + Seek>(decoder: &mut Decoder<R>, order: ByteOrder) -> SolarResult<Self> {
        let (width, height) = decoder
            .dimensions()
            .map_err(|e| SolarError::decode(format!("failed to read image dimensions: {}", e)))?;
        let (width, height) = (width as usize, height as usize);

        let samples_per_pixel = find_u16(decoder, Tag::SamplesPerPixel)?.unwrap_or(1) as usize;
        let bits = uniform(decoder, Tag::BitsPerSample)?.unwrap_or(1);
        let format = match uniform(decoder, Tag::SampleFormat)? {
            Some(value) => SampleFormat::from_tag(value)?,
            None => SampleFormat::Uint,
        };
        let encoding = SampleEncoding { bits, format, order };
        encoding.validate()?;

        let compression = find_u16(decoder, Tag::Compression)?.unwrap_or(COMPRESSION_NONE);
        let predictor = find_u16(decoder, Tag::Predictor)?.unwrap_or(PREDICTOR_NONE);
        let planar = find_u16(decoder, Tag::PlanarConfiguration)? == Some(PLANAR_SEPARATE);
        let white_is_zero = find_u16(decoder, Tag::PhotometricInterpretation)?
            == Some(PHOTOMETRIC_WHITE_IS_ZERO)
            && format == SampleFormat::Uint;

        let (chunking, offsets, byte_counts) = match find_u64s(decoder, Tag::TileOffsets)? {
            Some(offsets) => {
                let chunking = Chunking::Tiles {
                    width: find_u16_or_u32(decoder, Tag::TileWidth)?,
                    length: find_u16_or_u32(decoder, Tag::TileLength)?,
                };
                (chunking, offsets, require_u64s(decoder, Tag::TileByteCounts)?)
            }
            None => {
                let rows_per_strip = match decoder.find_tag_unsigned::<u64>(Tag::RowsPerStrip) {
                    Ok(Some(rows)) => (rows as usize).min(height),
                    Ok(None) => height,
                    Err(e) => return Err(tag_error(Tag::RowsPerStrip, e)),
                };
                (
                    Chunking::Strips { rows_per_strip },
                    require_u64s(decoder, Tag::StripOffsets)?,
                    require_u64s(decoder, Tag::StripByteCounts)?,
                )
            }
        };

        let layout = Self {
            width,
            height,
            samples_per_pixel,
            encoding,
            compression,
            predictor,
            planar,
            white_is_zero,
            chunking,
            offsets,
            byte_counts,
        };
        layout.validate()?;
        Ok(layout)
    }

    fn validate(&self) -> SolarResult<()> {
        if self.width == 0 || self.height == 0 || self.samples_per_pixel == 0 {
            return Err(SolarError::decode(format!(
                "raster dimensions must be positive, got {}x{}x{}",
                self.width, self.height, self.samples_per_pixel
            )));
        }
        let total = self
            .width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(self.samples_per_pixel));
        if total.map_or(true, |n| n > MAX_SAMPLES) {
            return Err(SolarError::decode(format!(
                "{}x{} raster with {} bands exceeds the decoding limit",
                self.width, self.height, self.samples_per_pixel
            )));
        }

        match self.chunking {
            Chunking::Strips { rows_per_strip: 0 } => {
                return Err(SolarError::decode("RowsPerStrip must be positive"))
            }
            Chunking::Tiles { width, length } if width == 0 || length == 0 => {
                return Err(SolarError::decode("tile dimensions must be positive"))
            }
            _ => {}
        }

        match self.predictor {
            PREDICTOR_NONE => {}
            PREDICTOR_HORIZONTAL
                if self.encoding.bits >= 8 && self.encoding.format != SampleFormat::Float => {}
            PREDICTOR_FLOATING_POINT if self.encoding.format == SampleFormat::Float => {}
            other => {
                return Err(SolarError::decode(format!(
                    "predictor {} does not apply to {}-bit {:?} samples",
                    other, self.encoding.bits, self.encoding.format
                )))
            }
        }

        let expected = self.chunks_per_plane() * self.planes();
        if self.offsets.len() != expected || self.byte_counts.len() != expected {
            return Err(SolarError::decode(format!(
                "expected {} chunks, found {} offsets and {} byte counts",
                expected,
                self.offsets.len(),
                self.byte_counts.len()
            )));
        }
        Ok(())
    }

    fn planes(&self) -> usize {
        if self.planar {
            self.samples_per_pixel
        } else {
            1
        }
    }

    /// Samples stored per pixel within one chunk.
    fn chunk_samples(&self) -> usize {
        if self.planar {
            1
        } else {
            self.samples_per_pixel
        }
    }

    fn chunks_across(&self) -> usize {
        match self.chunking {
            Chunking::Strips { .. } => 1,
            Chunking::Tiles { width, .. } => (self.width + width - 1) / width,
        }
    }

    fn chunks_per_plane(&self) -> usize {
        let rows = match self.chunking {
            Chunking::Strips { rows_per_strip } => rows_per_strip,
            Chunking::Tiles { length, .. } => length,
        };
        self.chunks_across() * ((self.height + rows - 1) / rows)
    }

    fn region(&self, index: usize) -> ChunkRegion {
        match self.chunking {
            Chunking::Strips { rows_per_strip } => {
                let y = index * rows_per_strip;
                ChunkRegion {
                    x: 0,
                    y,
                    stride_width: self.width,
                    width: self.width,
                    height: rows_per_strip.min(self.height - y),
                }
            }
            Chunking::Tiles { width, length } => {
                let across = self.chunks_across();
                let (x, y) = ((index % across) * width, (index / across) * length);
                ChunkRegion {
                    x,
                    y,
                    stride_width: width,
                    width: width.min(self.width - x),
                    height: length.min(self.height - y),
                }
            }
        }
    }

    /// Decode every chunk in `file` into one band per sample.
    pub fn read_bands(&self, file: &[u8]) -> SolarResult<Vec<Band>> {
        let pixels = self.width * self.height;
        let mut bands: Vec<Band> = vec![vec![0.0; pixels]; self.samples_per_pixel];
        let per_plane = self.chunks_per_plane();

        for plane in 0..self.planes() {
            for index in 0..per_plane {
                let chunk = plane * per_plane + index;
                let raw = self.chunk_bytes(file, chunk)?;
                let data = decompress(self.compression, raw)
                    .map_err(|e| SolarError::decode(format!("chunk {}: {}", chunk, e)))?;
                self.place(&data, self.region(index), plane, &mut bands)
                    .map_err(|e| SolarError::decode(format!("chunk {}: {}", chunk, e)))?;
            }
        }
        Ok(bands)
    }

    fn chunk_bytes<'a>(&self, file: &'a [u8], chunk: usize) -> SolarResult<&'a [u8]> {
        let start = self.offsets[chunk] as usize;
        let end = start.checked_add(self.byte_counts[chunk] as usize);
        end.and_then(|end| file.get(start..end)).ok_or_else(|| {
            SolarError::decode(format!(
                "chunk {} at offset {} runs past the end of the file",
                chunk, start
            ))
        })
    }

    /// Unpack the decompressed bytes of one chunk into `bands`.
    fn place(
        &self,
        data: &[u8],
        region: ChunkRegion,
        plane: usize,
        bands: &mut [Band],
    ) -> Result<(), String> {
        let spp = self.chunk_samples();
        let row_samples = region.stride_width * spp;
        let row_bytes = self.encoding.row_bytes(row_samples);
        let needed = row_bytes * region.height;
        if data.len() < needed {
            return Err(format!(
                "expected {} bytes of sample data, got {}",
                needed,
                data.len()
            ));
        }

        let float_prediction = self.predictor == PREDICTOR_FLOATING_POINT;
        let encoding = if float_prediction {
            SampleEncoding {
                order: ByteOrder::Big,
                ..self.encoding
            }
        } else {
            self.encoding
        };
        let max = encoding.max_uint();

        for (r, row) in data[..needed].chunks_exact(row_bytes).enumerate() {
            let row: Cow<[u8]> = if float_prediction {
                Cow::Owned(samples::undo_floating_point(
                    row,
                    spp,
                    encoding.bits as usize / 8,
                ))
            } else {
                Cow::Borrowed(row)
            };
            let mut raw = encoding.unpack_row(&row, row_samples);
            if self.predictor == PREDICTOR_HORIZONTAL {
                samples::undo_horizontal(&mut raw, spp, encoding.bits);
            }

            let base = (region.y + r) * self.width + region.x;
            for c in 0..region.width {
                for s in 0..spp {
                    let mut value = raw[c * spp + s];
                    if self.white_is_zero {
                        value = max - value;
                    }
                    let band = if self.planar { plane } else { s };
                    bands[band][base + c] = encoding.to_f64(value);
                }
            }
        }
        Ok(())
    }
}

/// Decompress one chunk.
pub fn decompress(compression: u16, data: &[u8]) -> Result<Cow<'_, [u8]>, String> {
    match compression {
        COMPRESSION_NONE => Ok(Cow::Borrowed(data)),
        COMPRESSION_LZW => {
            let mut out = Vec::new();
            let mut lzw = weezl::decode::Decoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8);
            // Some writers omit the end-of-information code
            lzw.into_vec(&mut out)
                .decode(data)
                .status
                .map_err(|e| format!("LZW: {}", e))?;
            Ok(Cow::Owned(out))
        }
        COMPRESSION_DEFLATE | COMPRESSION_DEFLATE_LEGACY => {
            let mut out = Vec::new();
            ZlibDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(|e| format!("Deflate: {}", e))?;
            Ok(Cow::Owned(out))
        }
        COMPRESSION_PACKBITS => unpack_bits(data).map(Cow::Owned),
        other => Err(format!("unsupported TIFF compression {}", other)),
    }
}

/// PackBits run-length decoding.
fn unpack_bits(data: &[u8]) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut i = 0;
    while i < data.len() {
        let header = data[i] as i8;
        i += 1;
        match header {
            0..=127 => {
                let count = header as usize + 1;
                let literal = data
                    .get(i..i + count)
                    .ok_or_else(|| "PackBits literal runs past the chunk".to_string())?;
                out.extend_from_slice(literal);
                i += count;
            }
            -127..=-1 => {
                let byte = *data
                    .get(i)
                    .ok_or_else(|| "PackBits run is missing its byte".to_string())?;
                out.extend(std::iter::repeat(byte).take((1 - header as isize) as usize));
                i += 1;
            }
            // -128 is a no-op
            _ => {}
        }
    }
    Ok(out)
}

fn tag_error(tag: Tag, e: tiff::TiffError) -> SolarError {
    SolarError::decode(format!("failed to read {:?}: {}", tag, e))
}

fn find_u16<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> SolarResult<Option<u16>> {
    decoder.find_tag_unsigned(tag).map_err(|e| tag_error(tag, e))
}

fn find_u16_or_u32<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> SolarResult<usize> {
    decoder
        .find_tag_unsigned::<u32>(tag)
        .map_err(|e| tag_error(tag, e))?
        .map(|v| v as usize)
        .ok_or_else(|| SolarError::decode(format!("tiled image is missing {:?}", tag)))
}

fn find_u64s<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> SolarResult<Option<Vec<u64>>> {
    decoder.find_tag_unsigned_vec(tag).map_err(|e| tag_error(tag, e))
}

fn require_u64s<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> SolarResult<Vec<u64>> {
    find_u64s(decoder, tag)?
        .ok_or_else(|| SolarError::decode(format!("image is missing {:?}", tag)))
}

/// A per-sample tag that must hold the same value for every sample.
fn uniform<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> SolarResult<Option<u16>> {
    let values: Option<Vec<u16>> = decoder
        .find_tag_unsigned_vec(tag)
        .map_err(|e| tag_error(tag, e))?;
    match values.as_deref() {
        None | Some([]) => Ok(None),
        Some([first, rest @ ..]) => {
            if rest.iter().any(|v| v != first) {
                Err(SolarError::decode(format!(
                    "mixed {:?} values are not supported: {:?}",
                    tag, values
                )))
            } else {
                Ok(Some(*first))
            }
        }
    }
}
