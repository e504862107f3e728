//! Sample-level decoding: unpacking rows of raw bytes into values.

use solar_common::{SolarError, SolarResult};

/// Numeric interpretation of a sample (TIFF SampleFormat).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    Uint,
    Int,
    Float,
}

impl SampleFormat {
    pub fn from_tag(value: u16) -> SolarResult<Self> {
        match value {
            1 => Ok(SampleFormat::Uint),
            2 => Ok(SampleFormat::Int),
            3 => Ok(SampleFormat::Float),
            other => Err(SolarError::decode(format!(
                "unsupported TIFF sample format {}",
                other
            ))),
        }
    }
}

/// Byte order of the file, taken from its `II`/`MM` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub fn detect(bytes: &[u8]) -> SolarResult<Self> {
        match bytes.get(0..2) {
            Some(b"II") => Ok(ByteOrder::Little),
            Some(b"MM") => Ok(ByteOrder::Big),
            _ => Err(SolarError::decode("missing TIFF byte order mark")),
        }
    }
}

/// How one sample is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleEncoding {
    pub bits: u16,
    pub format: SampleFormat,
    pub order: ByteOrder,
}

impl SampleEncoding {
    /// Reject bit depths and format combinations that cannot be widened to
    /// `f64` sample by sample.
    pub fn validate(&self) -> SolarResult<()> {
        let supported = matches!(
            (self.format, self.bits),
            (SampleFormat::Uint, 1 | 2 | 4 | 8 | 16 | 32 | 64)
                | (SampleFormat::Int, 8 | 16 | 32 | 64)
                | (SampleFormat::Float, 32 | 64)
        );
        if supported {
            Ok(())
        } else {
            Err(SolarError::decode(format!(
                "unsupported TIFF sample layout: {}-bit {:?}",
                self.bits, self.format
            )))
        }
    }

    /// Bytes needed for a row of `count` samples. Sub-byte rows are padded
    /// to a whole byte.
    pub fn row_bytes(&self, count: usize) -> usize {
        (count * self.bits as usize + 7) / 8
    }

    /// Raw bit patterns of the first `count` samples of `row`.
    ///
    /// Sub-byte samples are packed most significant bit first.
    pub fn unpack_row(&self, row: &[u8], count: usize) -> Vec<u64> {
        match self.bits {
            1 | 2 | 4 => {
                let bits = self.bits as usize;
                let per_byte = 8 / bits;
                let mask = (1u8 << bits) - 1;
                (0..count)
                    .map(|i| {
                        let shift = 8 - bits * (i % per_byte + 1);
                        u64::from((row[i / per_byte] >> shift) & mask)
                    })
                    .collect()
            }
            _ => {
                let width = self.bits as usize / 8;
                row.chunks_exact(width)
                    .take(count)
                    .map(|b| read_uint(b, self.order))
                    .collect()
            }
        }
    }

    /// Widen one raw bit pattern to `f64`.
    ///
    /// Unsigned and signed integers up to 32 bits convert exactly.
    pub fn to_f64(&self, raw: u64) -> f64 {
        match (self.format, self.bits) {
            (SampleFormat::Float, 32) => f64::from(f32::from_bits(raw as u32)),
            (SampleFormat::Float, _) => f64::from_bits(raw),
            (SampleFormat::Int, 8) => f64::from(raw as u8 as i8),
            (SampleFormat::Int, 16) => f64::from(raw as u16 as i16),
            (SampleFormat::Int, 32) => f64::from(raw as u32 as i32),
            (SampleFormat::Int, _) => raw as i64 as f64,
            (SampleFormat::Uint, _) => raw as f64,
        }
    }

    /// Largest value an unsigned sample can hold.
    pub fn max_uint(&self) -> u64 {
        if self.bits >= 64 {
            u64::MAX
        } else {
            (1u64 << self.bits) - 1
        }
    }
}

fn read_uint(bytes: &[u8], order: ByteOrder) -> u64 {
    let fold = |acc: u64, &b: &u8| (acc << 8) | u64::from(b);
    match order {
        ByteOrder::Big => bytes.iter().fold(0, fold),
        ByteOrder::Little => bytes.iter().rev().fold(0, fold),
    }
}

/// Undo horizontal differencing (Predictor 2) on one row of raw samples.
///
/// Each sample is stored as the difference from the same channel of the
/// previous pixel, modulo the sample width.
pub fn undo_horizontal(raw: &mut [u64], samples_per_pixel: usize, bits: u16) {
    let mask = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
    for i in samples_per_pixel..raw.len() {
        raw[i] = raw[i].wrapping_add(raw[i - samples_per_pixel]) & mask;
    }
}

/// Undo floating point prediction (Predictor 3) on one row of bytes.
///
/// The encoder splits every sample into byte planes (most significant
/// plane first) and then differences the bytes. The returned row holds the
/// samples in big-endian order.
pub fn undo_floating_point(row: &[u8], samples_per_pixel: usize, bytes_per_sample: usize) -> Vec<u8> {
    let mut planes = row.to_vec();
    for i in samples_per_pixel..planes.len() {
        planes[i] = planes[i].wrapping_add(planes[i - samples_per_pixel]);
    }

    let count = planes.len() / bytes_per_sample;
    let mut out = vec![0u8; count * bytes_per_sample];
    for sample in 0..count {
        for byte in 0..bytes_per_sample {
            out[sample * bytes_per_sample + byte] = planes[byte * count + sample];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoding(bits: u16, format: SampleFormat) -> SampleEncoding {
        SampleEncoding {
            bits,
            format,
            order: ByteOrder::Little,
        }
    }

    #[test]
    fn test_one_bit_rows_unpack_msb_first() {
        let enc = encoding(1, SampleFormat::Uint);
        let raw = enc.unpack_row(&[0b1011_0000, 0b1000_0000], 9);
        assert_eq!(raw, vec![1, 0, 1, 1, 0, 0, 0, 0, 1]);
        assert_eq!(enc.row_bytes(9), 2);
    }

    #[test]
    fn test_four_bit_rows_unpack() {
        let enc = encoding(4, SampleFormat::Uint);
        assert_eq!(enc.unpack_row(&[0xA5, 0xF0], 3), vec![0xA, 0x5, 0xF]);
        assert_eq!(enc.max_uint(), 15);
    }

    #[test]
    fn test_u32_widened_exactly() {
        let enc = encoding(32, SampleFormat::Uint);
        let mut row = Vec::new();
        row.extend_from_slice(&u32::MAX.to_le_bytes());
        row.extend_from_slice(&(1u32 << 31).to_le_bytes());
        let values: Vec<f64> = enc.unpack_row(&row, 2).into_iter().map(|r| enc.to_f64(r)).collect();
        assert_eq!(values, vec![4_294_967_295.0, 2_147_483_648.0]);
    }

    #[test]
    fn test_big_endian_signed() {
        let enc = SampleEncoding {
            bits: 16,
            format: SampleFormat::Int,
            order: ByteOrder::Big,
        };
        let raw = enc.unpack_row(&[0xFF, 0xFE, 0x01, 0x00], 2);
        assert_eq!(enc.to_f64(raw[0]), -2.0);
        assert_eq!(enc.to_f64(raw[1]), 256.0);
    }

    #[test]
    fn test_float_samples() {
        let enc = encoding(32, SampleFormat::Float);
        let raw = enc.unpack_row(&1.5f32.to_le_bytes(), 1);
        assert_eq!(enc.to_f64(raw[0]), 1.5);
    }

    #[test]
    fn test_unsupported_layouts_rejected() {
        assert!(encoding(12, SampleFormat::Uint).validate().is_err());
        assert!(encoding(1, SampleFormat::Int).validate().is_err());
        assert!(encoding(16, SampleFormat::Float).validate().is_err());
        assert!(encoding(1, SampleFormat::Uint).validate().is_ok());
    }

    #[test]
    fn test_horizontal_predictor_wraps() {
        // two interleaved channels, 8-bit
        let mut raw = vec![10, 200, 5, 100, 255, 1];
        undo_horizontal(&mut raw, 2, 8);
        assert_eq!(raw, vec![10, 200, 15, 44, 14, 45]);
    }

    #[test]
    fn test_floating_point_predictor() {
        let values = [1.0f32, 2.5, -3.0];
        let be: Vec<[u8; 4]> = values.iter().map(|v| v.to_be_bytes()).collect();

        // split into byte planes, then difference
        let mut planes = Vec::new();
        for byte in 0..4 {
            for sample in &be {
                planes.push(sample[byte]);
            }
        }
        let mut encoded = planes.clone();
        for i in (1..encoded.len()).rev() {
            encoded[i] = planes[i].wrapping_sub(planes[i - 1]);
        }

        let decoded = undo_floating_point(&encoded, 1, 4);
        let floats: Vec<f32> = decoded
            .chunks_exact(4)
            .map(|b| f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(floats, values);
    }
}
