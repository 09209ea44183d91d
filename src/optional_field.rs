use std::io::{Read, Seek};

use crate::reader::ReadBuffer;
use crate::types::GeoPoint;
use crate::MapFileError;

const START_ZOOM_LEVEL_MAX: u8 = 22;

const FLAG_DEBUG_FILE: u8 = 0x80;
const FLAG_START_POSITION: u8 = 0x40;
const FLAG_START_ZOOM_LEVEL: u8 = 0x20;
const FLAG_LANGUAGE_PREFERENCE: u8 = 0x10;
const FLAG_COMMENT: u8 = 0x08;
const FLAG_CREATED_BY: u8 = 0x04;

/// Flag-driven optional header fields, read in flag-bit order.
#[derive(Default)]
pub struct OptionalFields {
    pub comment: Option<String>,
    pub created_by: Option<String>,
    pub is_debug_file: bool,
    pub language_preference: Option<String>,
    pub start_position: Option<GeoPoint>,
    pub start_zoom_level: Option<u8>,
    has_start_position: bool,
    has_start_zoom_level: bool,
    has_language_preference: bool,
    has_comment: bool,
    has_created_by: bool,
}

impl OptionalFields {
    pub fn new(flags: u8) -> Self {
        Self {
            is_debug_file: flags & FLAG_DEBUG_FILE != 0,
            has_start_position: flags & FLAG_START_POSITION != 0,
            has_start_zoom_level: flags & FLAG_START_ZOOM_LEVEL != 0,
            has_language_preference: flags & FLAG_LANGUAGE_PREFERENCE != 0,
            has_comment: flags & FLAG_COMMENT != 0,
            has_created_by: flags & FLAG_CREATED_BY != 0,
            ..Self::default()
        }
    }

    pub fn read_optional_fields<R: Read + Seek>(
        &mut self,
        read_buffer: &mut ReadBuffer<R>,
    ) -> Result<(), MapFileError> {
        if self.has_start_position {
            let latitude_e6 = read_buffer.read_int()?;
            let longitude_e6 = read_buffer.read_int()?;
            self.start_position = Some(GeoPoint::new(latitude_e6, longitude_e6));
        }

        if self.has_start_zoom_level {
            let start_zoom_level = read_buffer.read_byte()?;
            if start_zoom_level > START_ZOOM_LEVEL_MAX {
                return Err(MapFileError::InvalidSubFiles(format!(
                    "invalid map start zoom level: {}",
                    start_zoom_level
                )));
            }
            self.start_zoom_level = Some(start_zoom_level);
        }

        if self.has_language_preference {
            self.language_preference = Some(read_buffer.read_utf8_encoded_string()?);
        }

        if self.has_comment {
            self.comment = Some(read_buffer.read_utf8_encoded_string()?);
        }

        if self.has_created_by {
            self.created_by = Some(read_buffer.read_utf8_encoded_string()?);
        }

        Ok(())
    }
}
