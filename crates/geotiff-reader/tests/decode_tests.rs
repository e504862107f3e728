//! Tests for GeoTIFF decoding and reprojection.
//!
//! Covers:
//! - Band splitting for single, RGB and many-band rasters
//! - Bilevel masks, separate planes and multi-strip layouts
//! - Extent resolution in UTM, feet-based UTM and geographic CRSs
//! - Error classification for broken or ungeoreferenced input

use geotiff_reader::{decode, read_raster};
use solar_common::SolarError;
use test_utils::fixtures::{self, LOCATION};
use test_utils::{assert_approx_eq, footprint_band, sequential_band, GeoTiffBuilder, SampleKind};

// ============================================================================
// Band decoding
// ============================================================================

#[test]
fn test_decode_single_band_float() {
    let bytes = fixtures::dsm_tiff(4, 2, 10.0, 17.0);
    let decoded = decode(&bytes).unwrap();

    assert_eq!((decoded.width, decoded.height), (4, 2));
    assert_eq!(decoded.bands.len(), 1);
    assert_eq!(decoded.bands[0][0], 10.0);
    assert_eq!(decoded.bands[0][7], 17.0);
}

#[test]
fn test_decode_rgb_splits_channels() {
    let bytes = fixtures::rgb_tiff(3, 3, [200, 100, 50]);
    let raster = read_raster(&bytes).unwrap();

    assert_eq!(raster.band_count(), 3);
    assert!(raster.band(0).unwrap().iter().all(|&v| v == 200.0));
    assert!(raster.band(1).unwrap().iter().all(|&v| v == 100.0));
    assert!(raster.band(2).unwrap().iter().all(|&v| v == 50.0));
}

#[test]
fn test_decode_monthly_flux_twelve_bands() {
    let raster = read_raster(&fixtures::monthly_flux_tiff(2, 2)).unwrap();

    assert_eq!(raster.band_count(), 12);
    assert_eq!(raster.band(5).unwrap(), &vec![50.0; 4]);
    assert_eq!(raster.band(11).unwrap(), &vec![110.0; 4]);
}

#[test]
fn test_decode_hourly_shade_keeps_bitmasks_exact() {
    let raster = read_raster(&fixtures::hourly_shade_tiff(2, 2)).unwrap();

    assert_eq!(raster.band_count(), 24);
    assert_eq!(raster.band(0).unwrap()[0], 0.0);
    assert_eq!(raster.band(12).unwrap()[0], u32::MAX as f64);
}

#[test]
fn test_decode_hourly_shade_high_day_bits() {
    // days 1, 25, 31 and 32
    let days: u32 = 1 | (1 << 24) | (1 << 30) | (1 << 31);
    let raster = read_raster(&fixtures::hourly_shade_mask_tiff(2, 2, days)).unwrap();

    assert_eq!(raster.band(12).unwrap(), &vec![days as f64; 4]);
    assert_eq!(raster.band(12).unwrap()[0] as u32, days);
    assert_eq!(raster.band(23).unwrap(), &vec![0.0; 4]);
}

#[test]
fn test_decode_bilevel_rows() {
    let values = vec![
        1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0,
    ];
    let bytes = GeoTiffBuilder::new(8, 2)
        .band(values.clone())
        .sample_kind(SampleKind::Bit1)
        .build();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded.bands, vec![values]);
}

#[test]
fn test_decode_bilevel_rows_padded_to_byte() {
    // 5 pixels per row leaves 3 padding bits in every row
    let band = footprint_band(5, 3, (1, 4), (1, 3));
    let bytes = GeoTiffBuilder::new(5, 3)
        .band(band.clone())
        .sample_kind(SampleKind::Bit1)
        .build();

    assert_eq!(decode(&bytes).unwrap().bands, vec![band]);
}

#[test]
fn test_decode_mask_fixture_is_zero_or_one() {
    let decoded = decode(&fixtures::mask_tiff(8, 8)).unwrap();

    assert_eq!(decoded.bands.len(), 1);
    assert_eq!(decoded.bands[0], footprint_band(8, 8, (2, 6), (2, 6)));
}

#[test]
fn test_decode_planar_bands() {
    let raster = read_raster(&fixtures::planar_monthly_flux_tiff(3, 2)).unwrap();

    assert_eq!(raster.band_count(), 12);
    for month in 0..12 {
        assert_eq!(raster.band(month).unwrap(), &vec![month as f64 * 10.0; 6]);
    }
}

#[test]
fn test_decode_interleaved_strips() {
    let (width, height) = (3, 5);
    let bands = vec![
        sequential_band(width, height),
        vec![7.0; width * height],
        sequential_band(width, height).iter().map(|v| v * 2.0).collect(),
    ];
    let bytes = GeoTiffBuilder::new(width as u32, height as u32)
        .bands(bands.clone())
        .rows_per_strip(2)
        .build();

    assert_eq!(decode(&bytes).unwrap().bands, bands);
}

#[test]
fn test_decode_planar_bilevel_strips() {
    let bands = vec![footprint_band(9, 4, (0, 3), (0, 4)), footprint_band(9, 4, (6, 9), (1, 2))];
    let bytes = GeoTiffBuilder::new(9, 4)
        .bands(bands.clone())
        .sample_kind(SampleKind::Bit1)
        .planar()
        .rows_per_strip(3)
        .build();

    assert_eq!(decode(&bytes).unwrap().bands, bands);
}

// ============================================================================
// Georeferencing
// ============================================================================

#[test]
fn test_utm_raster_lands_near_location() {
    let raster = read_raster(&fixtures::mask_tiff(8, 8)).unwrap();
    let bounds = raster.bounds();

    assert!(bounds.north > bounds.south);
    assert!(bounds.east > bounds.west);
    assert_approx_eq!(bounds.north, LOCATION.0, 0.02);
    assert_approx_eq!(bounds.west, LOCATION.1, 0.02);
    // 8 pixels of 0.5 m is about 3.6e-5 degrees of latitude
    assert_approx_eq!(bounds.height(), 4.0 / 111_000.0, 5e-6);
}

#[test]
fn test_native_bounds_from_tiepoint() {
    let bytes = GeoTiffBuilder::new(10, 4)
        .band(vec![0.0; 40])
        .origin(500_000.0, 4_000_000.0)
        .pixel_size(0.5, 0.5)
        .build();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded.native_bounds.min_x, 500_000.0);
    assert_eq!(decoded.native_bounds.max_x, 500_005.0);
    assert_eq!(decoded.native_bounds.min_y, 3_999_998.0);
    assert_eq!(decoded.native_bounds.max_y, 4_000_000.0);
    assert_eq!(decoded.crs.epsg, Some(fixtures::UTM_10N));
}

#[test]
fn test_feet_units_match_meters() {
    const FOOT: f64 = 0.3048;
    let (x, y) = fixtures::UTM_ORIGIN;

    let meters = GeoTiffBuilder::new(4, 4).band(vec![0.0; 16]).build();
    let feet = GeoTiffBuilder::new(4, 4)
        .band(vec![0.0; 16])
        .origin(x / FOOT, y / FOOT)
        .pixel_size(0.5 / FOOT, 0.5 / FOOT)
        .linear_units(9002)
        .build();

    let a = read_raster(&meters).unwrap().bounds();
    let b = read_raster(&feet).unwrap().bounds();
    assert_approx_eq!(a.north, b.north, 1e-7);
    assert_approx_eq!(a.south, b.south, 1e-7);
    assert_approx_eq!(a.east, b.east, 1e-7);
    assert_approx_eq!(a.west, b.west, 1e-7);
}

#[test]
fn test_geographic_raster_passes_through() {
    let bytes = GeoTiffBuilder::new(10, 10)
        .band(vec![1.0; 100])
        .epsg(4326)
        .origin(-122.09, 37.43)
        .pixel_size(0.001, 0.001)
        .build();
    let bounds = read_raster(&bytes).unwrap().bounds();

    assert_approx_eq!(bounds.north, 37.43, 1e-9);
    assert_approx_eq!(bounds.south, 37.42, 1e-9);
    assert_approx_eq!(bounds.west, -122.09, 1e-9);
    assert_approx_eq!(bounds.east, -122.08, 1e-9);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_not_a_tiff() {
    let err = decode(b"{\"error\": \"not found\"}").unwrap_err();
    assert!(matches!(err, SolarError::Decode(_)), "got {:?}", err);
}

#[test]
fn test_missing_georeference() {
    let bytes = GeoTiffBuilder::new(2, 2)
        .band(vec![1.0; 4])
        .sample_kind(SampleKind::U8)
        .without_georeferencing()
        .build();
    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, SolarError::Reprojection(_)), "got {:?}", err);
}

#[test]
fn test_unsupported_bit_depth() {
    use std::io::Cursor;
    use tiff::encoder::TiffEncoder;
    use tiff::tags::Tag;

    // 12-bit samples, two pixels packed into three bytes
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut cursor).unwrap();
        let mut dir = encoder.new_directory().unwrap();
        dir.write_tag(Tag::ImageWidth, 2u32).unwrap();
        dir.write_tag(Tag::ImageLength, 1u32).unwrap();
        dir.write_tag(Tag::BitsPerSample, 12u16).unwrap();
        dir.write_tag(Tag::Compression, 1u16).unwrap();
        dir.write_tag(Tag::PhotometricInterpretation, 1u16).unwrap();
        let offset = dir.write_data(&[0xABu8, 0xCD, 0xEF][..]).unwrap();
        dir.write_tag(Tag::StripOffsets, offset as u32).unwrap();
        dir.write_tag(Tag::StripByteCounts, 3u32).unwrap();
        dir.finish().unwrap();
    }

    let err = decode(&cursor.into_inner()).unwrap_err();
    assert!(matches!(err, SolarError::Decode(_)), "got {:?}", err);
    assert!(err.to_string().contains("12-bit"));
}

#[test]
fn test_unsupported_crs() {
    let bytes = GeoTiffBuilder::new(2, 2).band(vec![1.0; 4]).epsg(2154).build();
    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, SolarError::Reprojection(_)));
    assert!(err.to_string().contains("2154"));
}
