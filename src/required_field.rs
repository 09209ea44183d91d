use std::io::{Read, Seek};

use crate::header::MapFileInfoBuilder;
use crate::reader::ReadBuffer;
use crate::types::{BoundingBox, Tag};
use crate::MapFileError;

const BINARY_OSM_MAGIC_BYTE: &str = "mapsforge binary OSM";
const HEADER_SIZE_MAX: i32 = 1_000_000;
const HEADER_SIZE_MIN: i32 = 70;
const MERCATOR: &str = "Mercator";
const SUPPORTED_FILE_VERSION: i32 = 3;
const SUPPORTED_TILE_PIXEL_SIZE: i32 = 256;
const SUPPORTED_MAP_DATE_MIN: i64 = 1_200_000_000_000;

/// Readers for the mandatory header clauses, applied in file order.
pub struct RequiredFields;

impl RequiredFields {
    pub fn read_magic_byte<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
    ) -> Result<(), MapFileError> {
        let magic_byte_length = BINARY_OSM_MAGIC_BYTE.len();

        // Magic plus the 4-byte remaining-header size in one refill.
        if !read_buffer.read_from_file(magic_byte_length + 4)? {
            return Err(MapFileError::InvalidMagic(
                "reading magic byte has failed".to_string(),
            ));
        }

        let magic_byte = read_buffer.read_utf8_encoded_string_with_length(magic_byte_length)?;
        if magic_byte != BINARY_OSM_MAGIC_BYTE {
            return Err(MapFileError::InvalidMagic(magic_byte));
        }

        Ok(())
    }

    pub fn read_remaining_header<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
    ) -> Result<(), MapFileError> {
        let remaining_header_size = read_buffer.read_int()?;
        if !(HEADER_SIZE_MIN..=HEADER_SIZE_MAX).contains(&remaining_header_size) {
            return Err(MapFileError::InvalidHeaderSize(remaining_header_size));
        }

        if !read_buffer.read_from_file(remaining_header_size as usize)? {
            return Err(MapFileError::InvalidHeaderSize(remaining_header_size));
        }

        Ok(())
    }

    pub fn read_file_version<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        let file_version = read_buffer.read_int()?;
        if file_version != SUPPORTED_FILE_VERSION {
            return Err(MapFileError::UnsupportedVersion(file_version));
        }
        builder.file_version = file_version;
        Ok(())
    }

    pub fn read_file_size<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        file_size: i64,
        builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        let header_file_size = read_buffer.read_long()?;
        if header_file_size != file_size {
            return Err(MapFileError::InvalidFileSize(header_file_size));
        }
        builder.file_size = file_size;
        Ok(())
    }

    pub fn read_map_date<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        let map_date = read_buffer.read_long()?;
        if map_date < SUPPORTED_MAP_DATE_MIN {
            return Err(MapFileError::InvalidMapDate(map_date));
        }
        builder.map_date = map_date;
        Ok(())
    }

    pub fn read_bounding_box<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        let min_latitude_e6 = read_buffer.read_int()?;
        let min_longitude_e6 = read_buffer.read_int()?;
        let max_latitude_e6 = read_buffer.read_int()?;
        let max_longitude_e6 = read_buffer.read_int()?;

        builder.bounding_box = Some(BoundingBox::new(
            min_latitude_e6,
            min_longitude_e6,
            max_latitude_e6,
            max_longitude_e6,
        )?);
        Ok(())
    }

    pub fn read_tile_pixel_size<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        let tile_pixel_size = i32::from(read_buffer.read_short()?);
        if tile_pixel_size != SUPPORTED_TILE_PIXEL_SIZE {
            return Err(MapFileError::InvalidTilePixelSize(tile_pixel_size));
        }
        builder.tile_pixel_size = tile_pixel_size;
        Ok(())
    }

    pub fn read_projection_name<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        let projection_name = read_buffer.read_utf8_encoded_string()?;
        if projection_name != MERCATOR {
            return Err(MapFileError::UnsupportedProjection(projection_name));
        }
        builder.projection_name = projection_name;
        Ok(())
    }

    pub fn read_poi_tags<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        builder.poi_tags = Self::read_tag_vocabulary(read_buffer, "POI")?;
        Ok(())
    }

    pub fn read_way_tags<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        builder.way_tags = Self::read_tag_vocabulary(read_buffer, "way")?;
        Ok(())
    }

    fn read_tag_vocabulary<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        kind: &'static str,
    ) -> Result<Vec<Tag>, MapFileError> {
        let number_of_tags = i32::from(read_buffer.read_short()?);
        if number_of_tags < 0 {
            return Err(MapFileError::InvalidTagCount {
                kind,
                count: number_of_tags,
            });
        }

        let mut tags = Vec::with_capacity(number_of_tags as usize);
        for tag_id in 0..number_of_tags {
            let tag = read_buffer.read_utf8_encoded_string()?;
            if tag.is_empty() {
                return Err(MapFileError::NullTag { kind, id: tag_id });
            }
            tags.push(Tag::from_string(tag));
        }
        Ok(tags)
    }
}
