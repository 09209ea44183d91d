//! Helpers that assemble synthetic map files byte by byte, so the tests
//! control every header clause and record field exactly.

#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

pub const MAGIC: &[u8] = b"mapsforge binary OSM";

/// Offset of the file-size field: magic, header-size word, version.
pub const FILE_SIZE_OFFSET: usize = MAGIC.len() + 4 + 4;
/// Offset of the version field.
pub const FILE_VERSION_OFFSET: usize = MAGIC.len() + 4;
/// Offset of the map-date field.
pub const MAP_DATE_OFFSET: usize = FILE_SIZE_OFFSET + 8;
/// Offset of the bounding box (4 x i32 microdegrees).
pub const BOUNDING_BOX_OFFSET: usize = MAP_DATE_OFFSET + 8;
/// Offset of the tile pixel size (i16).
pub const TILE_PIXEL_SIZE_OFFSET: usize = BOUNDING_BOX_OFFSET + 16;

pub fn write_i16(out: &mut Vec<u8>, value: i16) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn write_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn write_i64(out: &mut Vec<u8>, value: i64) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Variable-length unsigned integer: 7 value bits per byte, high bit set on
/// every byte except the last.
pub fn write_varint_unsigned(out: &mut Vec<u8>, mut value: u32) {
    while value > 0x7f {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Variable-length signed integer: sign-magnitude with the sign in bit 6 of
/// the final byte.
pub fn write_varint_signed(out: &mut Vec<u8>, value: i32) {
    let mut magnitude = value.unsigned_abs();
    while magnitude > 0x3f {
        out.push((magnitude as u8 & 0x7f) | 0x80);
        magnitude >>= 7;
    }
    let mut last = magnitude as u8;
    if value < 0 {
        last |= 0x40;
    }
    out.push(last);
}

pub fn write_string(out: &mut Vec<u8>, value: &str) {
    write_varint_unsigned(out, value.len() as u32);
    out.extend_from_slice(value.as_bytes());
}

/// Packs a 5-byte tile index entry: water flag in the top bit, block offset
/// in the low 39 bits.
pub fn write_index_entry(out: &mut Vec<u8>, offset: i64, water: bool) {
    let mut entry = offset & 0x7f_ffff_ffff;
    if water {
        entry |= 0x80_0000_0000;
    }
    out.extend_from_slice(&entry.to_be_bytes()[3..8]);
}

pub fn into_temp_file(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(bytes).expect("write map bytes");
    file.flush().expect("flush map bytes");
    file
}

/// The 709-byte reference header file: empty tag vocabularies, three
/// sub-files, every optional field populated, no debug info.
pub fn golden_header_file() -> Vec<u8> {
    let mut header = Vec::new();
    write_i32(&mut header, 3); // file version
    write_i64(&mut header, 709); // file size
    write_i64(&mut header, 1_332_081_126_944); // map date
    write_i32(&mut header, 100_000); // min latitude
    write_i32(&mut header, 200_000); // min longitude
    write_i32(&mut header, 300_000); // max latitude
    write_i32(&mut header, 400_000); // max longitude
    write_i16(&mut header, 256); // tile pixel size
    write_string(&mut header, "Mercator");
    header.push(0x40 | 0x20 | 0x10 | 0x08 | 0x04); // all optionals, no debug
    write_i32(&mut header, 150_000); // start latitude
    write_i32(&mut header, 250_000); // start longitude
    header.push(16); // start zoom level
    write_string(&mut header, "en");
    write_string(&mut header, "testcomment");
    write_string(&mut header, "mapsforge-map-writer-0.3.0-SNAPSHOT");
    write_i16(&mut header, 0); // POI tags
    write_i16(&mut header, 0); // way tags
    header.push(3); // number of sub-files
    for (base_zoom, zoom_min, zoom_max, start, size) in [
        (5u8, 0u8, 7u8, 200i64, 100i64),
        (10, 8, 11, 300, 100),
        (14, 12, 21, 400, 100),
    ] {
        header.push(base_zoom);
        header.push(zoom_min);
        header.push(zoom_max);
        write_i64(&mut header, start);
        write_i64(&mut header, size);
    }

    let mut file = MAGIC.to_vec();
    write_i32(&mut file, header.len() as i32);
    file.extend_from_slice(&header);
    assert!(file.len() <= 709, "header grew past the fixed file size");
    file.resize(709, 0);
    file
}

/// Knobs for the single-sub-file payload map used by the tile decode tests.
#[derive(Default)]
pub struct PayloadMap {
    pub double_delta: bool,
    pub water: bool,
    /// Adds `amenity=fountain` / `highway=residential` vocabularies and one
    /// tag reference on the POI and the way.
    pub with_vocabulary: bool,
    /// Overrides the POI's tag id to provoke a decode failure.
    pub poi_tag_id_override: Option<u32>,
}

/// Builds a map with one sub-file (base zoom 8, zoom interval 6..=10) over a
/// tiny bounding box, holding one POI and one way in the block of tile
/// (128, 128). The other three blocks of the 2x2 grid are empty.
pub fn payload_map(options: &PayloadMap) -> Vec<u8> {
    let mut block = Vec::new();

    // Zoom table rows 6..=10: the data sits on zoom 8.
    for zoom in 6u8..=10 {
        let on_level = u32::from(zoom == 8);
        write_varint_unsigned(&mut block, on_level); // POIs
        write_varint_unsigned(&mut block, on_level); // ways
    }

    let mut poi_section = Vec::new();
    write_varint_signed(&mut poi_section, -40_000); // latitude delta
    write_varint_signed(&mut poi_section, 80_000); // longitude delta
    if options.with_vocabulary || options.poi_tag_id_override.is_some() {
        poi_section.push(0x71); // layer 7, one tag
        write_varint_unsigned(&mut poi_section, options.poi_tag_id_override.unwrap_or(0));
    } else {
        poi_section.push(0x70); // layer 7, no tags
    }
    poi_section.push(0x80 | 0x20); // name and elevation
    write_string(&mut poi_section, "City Fountain");
    write_varint_signed(&mut poi_section, 320);

    let mut way_body = Vec::new();
    way_body.extend_from_slice(&[0xff, 0xff]); // subtile bitmap: full coverage
    if options.with_vocabulary {
        way_body.push(0x41); // layer 4, one tag
        write_varint_unsigned(&mut way_body, 0);
    } else {
        way_body.push(0x40); // layer 4, no tags
    }
    let mut feature_byte = 0x80; // name
    if options.double_delta {
        feature_byte |= 0x04;
    }
    way_body.push(feature_byte);
    write_string(&mut way_body, "Ring Road");
    write_varint_unsigned(&mut way_body, 1); // coordinate blocks
    write_varint_unsigned(&mut way_body, 5); // way nodes
    let deltas: [(i32, i32); 5] = if options.double_delta {
        [
            (0, 0),
            (0, 100_000),
            (-100_000, -100_000),
            (100_000, -100_000),
            (100_000, 100_000),
        ]
    } else {
        [
            (0, 0),
            (0, 100_000),
            (-100_000, 0),
            (0, -100_000),
            (100_000, 0),
        ]
    };
    for (latitude_delta, longitude_delta) in deltas {
        write_varint_signed(&mut way_body, latitude_delta);
        write_varint_signed(&mut way_body, longitude_delta);
    }

    write_varint_unsigned(&mut block, poi_section.len() as u32); // first way offset
    block.extend_from_slice(&poi_section);
    write_varint_unsigned(&mut block, way_body.len() as u32); // way data size
    block.extend_from_slice(&way_body);

    // 2x2 block grid; only block 3 (bottom right) holds data.
    let index_size = 4 * 5;
    let mut sub_file = Vec::new();
    for _ in 0..3 {
        write_index_entry(&mut sub_file, index_size, options.water);
    }
    write_index_entry(&mut sub_file, index_size, options.water);
    sub_file.extend_from_slice(&block);

    let mut header = Vec::new();
    write_i32(&mut header, 3); // file version
    write_i64(&mut header, 0); // file size, patched below
    write_i64(&mut header, 1_332_081_126_944); // map date
    write_i32(&mut header, -200_000); // min latitude
    write_i32(&mut header, -200_000); // min longitude
    write_i32(&mut header, 200_000); // max latitude
    write_i32(&mut header, 200_000); // max longitude
    write_i16(&mut header, 256); // tile pixel size
    write_string(&mut header, "Mercator");
    header.push(0); // no optional fields
    if options.with_vocabulary || options.poi_tag_id_override.is_some() {
        write_i16(&mut header, 1);
        write_string(&mut header, "amenity=fountain");
        write_i16(&mut header, 1);
        write_string(&mut header, "highway=residential");
    } else {
        write_i16(&mut header, 0); // POI tags
        write_i16(&mut header, 0); // way tags
    }
    header.push(1); // number of sub-files

    let start_address = (MAGIC.len() + 4 + header.len() + 19) as i64;
    header.push(8); // base zoom level
    header.push(6); // minimum zoom level
    header.push(10); // maximum zoom level
    write_i64(&mut header, start_address);
    write_i64(&mut header, sub_file.len() as i64);

    let mut file = MAGIC.to_vec();
    write_i32(&mut file, header.len() as i32);
    file.extend_from_slice(&header);
    assert_eq!(file.len() as i64, start_address);
    file.extend_from_slice(&sub_file);

    let total = file.len() as i64;
    file[FILE_SIZE_OFFSET..FILE_SIZE_OFFSET + 8].copy_from_slice(&total.to_be_bytes());
    file
}
