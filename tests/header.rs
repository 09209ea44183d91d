mod common;

use mapsforge::{BoundingBox, GeoPoint, MapFile, MapFileError};

use common::{
    golden_header_file, into_temp_file, BOUNDING_BOX_OFFSET, FILE_VERSION_OFFSET, MAGIC,
    MAP_DATE_OFFSET, TILE_PIXEL_SIZE_OFFSET,
};

const COMMENT: &str = "testcomment";
const CREATED_BY: &str = "mapsforge-map-writer-0.3.0-SNAPSHOT";
const FILE_SIZE: i64 = 709;
const FILE_VERSION: i32 = 3;
const LANGUAGE_PREFERENCE: &str = "en";
const MAP_DATE: i64 = 1_332_081_126_944;
const NUMBER_OF_SUBFILES: u8 = 3;
const PROJECTION_NAME: &str = "Mercator";
const START_ZOOM_LEVEL: u8 = 16;
const TILE_PIXEL_SIZE: i32 = 256;

#[test]
fn map_file_info_of_golden_header() {
    let file = into_temp_file(&golden_header_file());
    let map_file = MapFile::open(file.path()).expect("open golden header");

    let info = map_file.map_file_info();

    assert_eq!(
        info.bounding_box,
        BoundingBox::new(100_000, 200_000, 300_000, 400_000).expect("bounding box")
    );
    assert_eq!(info.file_size, FILE_SIZE);
    assert_eq!(info.file_version, FILE_VERSION);
    assert_eq!(info.map_date, MAP_DATE);
    assert_eq!(info.number_of_sub_files, NUMBER_OF_SUBFILES);
    assert_eq!(info.projection_name, PROJECTION_NAME);
    assert_eq!(info.tile_pixel_size, TILE_PIXEL_SIZE);

    assert_eq!(info.poi_tags.len(), 0);
    assert_eq!(info.way_tags.len(), 0);

    assert!(!info.debug_file);
    assert_eq!(info.start_position, Some(GeoPoint::new(150_000, 250_000)));
    assert_eq!(info.start_zoom_level, Some(START_ZOOM_LEVEL));
    assert_eq!(
        info.language_preference.as_deref(),
        Some(LANGUAGE_PREFERENCE)
    );
    assert_eq!(info.comment.as_deref(), Some(COMMENT));
    assert_eq!(info.created_by.as_deref(), Some(CREATED_BY));

    assert_eq!(info.zoom_level_min, 0);
    assert_eq!(info.zoom_level_max, 21);
}

#[test]
fn start_position_and_zoom_come_from_the_header() {
    let file = into_temp_file(&golden_header_file());
    let map_file = MapFile::open(file.path()).expect("open golden header");

    let start = map_file.start_position();
    assert!((start.latitude - 0.15).abs() < 1e-9);
    assert!((start.longitude - 0.25).abs() < 1e-9);
    assert_eq!(map_file.start_zoom_level(), START_ZOOM_LEVEL);
}

#[test]
fn wrong_magic_is_rejected() {
    let mut bytes = golden_header_file();
    bytes[..MAGIC.len()].copy_from_slice(b"not a mapsforge file");
    let file = into_temp_file(&bytes);

    let error = MapFile::open(file.path()).expect_err("open must fail");
    assert!(matches!(error, MapFileError::InvalidMagic(_)));
    assert_eq!(error.to_string(), "invalid magic byte: not a mapsforge file");
}

#[test]
fn unsupported_version_is_rejected() {
    let mut bytes = golden_header_file();
    bytes[FILE_VERSION_OFFSET..FILE_VERSION_OFFSET + 4].copy_from_slice(&2i32.to_be_bytes());
    let file = into_temp_file(&bytes);

    let error = MapFile::open(file.path()).expect_err("open must fail");
    assert_eq!(error.to_string(), "unsupported file version: 2");
}

#[test]
fn invalid_header_size_is_rejected() {
    let mut bytes = golden_header_file();
    bytes[MAGIC.len()..MAGIC.len() + 4].copy_from_slice(&10i32.to_be_bytes());
    let file = into_temp_file(&bytes);

    let error = MapFile::open(file.path()).expect_err("open must fail");
    assert_eq!(error.to_string(), "invalid remaining header size: 10");
}

#[test]
fn file_size_mismatch_is_rejected() {
    let mut bytes = golden_header_file();
    bytes.push(0); // actual length no longer matches the header field
    let file = into_temp_file(&bytes);

    let error = MapFile::open(file.path()).expect_err("open must fail");
    assert_eq!(error.to_string(), "invalid file size: 709");
}

#[test]
fn invalid_map_date_is_rejected() {
    let mut bytes = golden_header_file();
    bytes[MAP_DATE_OFFSET..MAP_DATE_OFFSET + 8].copy_from_slice(&1_000i64.to_be_bytes());
    let file = into_temp_file(&bytes);

    let error = MapFile::open(file.path()).expect_err("open must fail");
    assert_eq!(error.to_string(), "invalid map date: 1000");
}

#[test]
fn inverted_bounding_box_is_rejected() {
    let mut bytes = golden_header_file();
    // Swap min and max latitude.
    bytes[BOUNDING_BOX_OFFSET..BOUNDING_BOX_OFFSET + 4].copy_from_slice(&300_000i32.to_be_bytes());
    bytes[BOUNDING_BOX_OFFSET + 8..BOUNDING_BOX_OFFSET + 12]
        .copy_from_slice(&100_000i32.to_be_bytes());
    let file = into_temp_file(&bytes);

    let error = MapFile::open(file.path()).expect_err("open must fail");
    assert!(matches!(error, MapFileError::InvalidBoundingBox(_)));
}

#[test]
fn unsupported_tile_pixel_size_is_rejected() {
    let mut bytes = golden_header_file();
    bytes[TILE_PIXEL_SIZE_OFFSET..TILE_PIXEL_SIZE_OFFSET + 2]
        .copy_from_slice(&128i16.to_be_bytes());
    let file = into_temp_file(&bytes);

    let error = MapFile::open(file.path()).expect_err("open must fail");
    assert_eq!(error.to_string(), "unsupported tile pixel size: 128");
}

#[test]
fn truncated_header_is_rejected() {
    let bytes = golden_header_file();
    let file = into_temp_file(&bytes[..10]);

    let error = MapFile::open(file.path()).expect_err("open must fail");
    assert!(matches!(error, MapFileError::InvalidMagic(_)));
}
