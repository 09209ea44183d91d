use std::io::{Read, Seek, SeekFrom};

use crate::types::Tag;
use crate::MapFileError;

/// Hard ceiling for a single buffer refill, guarding against corrupt block
/// sizes in the tile index.
const MAXIMUM_BUFFER_SIZE: usize = 2_500_000;

/// Bounded in-memory view over a region of the map file.
///
/// The file cursor and the buffer cursor are distinct: `read_from_file`
/// advances the former and resets the latter, all other reads only move the
/// buffer cursor. Reads past the active region fail with
/// [`MapFileError::BufferUnderflow`] and never partially consume the buffer.
pub struct ReadBuffer<R: Read + Seek> {
    buffer_data: Vec<u8>,
    buffer_position: usize,
    input_channel: R,
}

impl<R: Read + Seek> ReadBuffer<R> {
    pub fn new(input_channel: R) -> Self {
        Self {
            buffer_data: Vec::new(),
            buffer_position: 0,
            input_channel,
        }
    }

    /// Replaces the buffer with the next `length` bytes of the file.
    ///
    /// Returns `Ok(false)` when the file has fewer bytes left or `length`
    /// exceeds the configured maximum.
    pub fn read_from_file(&mut self, length: usize) -> Result<bool, MapFileError> {
        if length > MAXIMUM_BUFFER_SIZE {
            return Ok(false);
        }

        self.buffer_data.resize(length, 0);
        self.buffer_position = 0;

        Ok(self.input_channel.read_exact(&mut self.buffer_data).is_ok())
    }

    /// Seeking variant of [`read_from_file`](Self::read_from_file), used for
    /// tile blocks addressed through the index.
    pub fn read_from_file_at_offset(
        &mut self,
        offset: u64,
        length: usize,
    ) -> Result<bool, MapFileError> {
        if length > MAXIMUM_BUFFER_SIZE {
            return Ok(false);
        }

        self.buffer_data.resize(length, 0);
        self.buffer_position = 0;

        self.input_channel.seek(SeekFrom::Start(offset))?;
        Ok(self.input_channel.read_exact(&mut self.buffer_data).is_ok())
    }

    pub fn read_byte(&mut self) -> Result<u8, MapFileError> {
        self.require_byte("byte")
    }

    pub fn read_short(&mut self) -> Result<i16, MapFileError> {
        let bytes = self.take::<2>("short")?;
        Ok(i16::from_be_bytes(bytes))
    }

    pub fn read_int(&mut self) -> Result<i32, MapFileError> {
        let bytes = self.take::<4>("int")?;
        Ok(i32::from_be_bytes(bytes))
    }

    pub fn read_long(&mut self) -> Result<i64, MapFileError> {
        let bytes = self.take::<8>("long")?;
        Ok(i64::from_be_bytes(bytes))
    }

    /// Variable-length unsigned integer: 7 value bits per byte, high bit set
    /// on every byte except the last.
    pub fn read_unsigned_int(&mut self) -> Result<u32, MapFileError> {
        let mut value: u32 = 0;
        let mut shift: u32 = 0;

        loop {
            let byte = self.require_byte("unsigned int")?;
            if byte & 0x80 == 0 {
                return Ok(value | u32::from(byte).wrapping_shl(shift));
            }
            value |= u32::from(byte & 0x7f).wrapping_shl(shift);
            shift += 7;
        }
    }

    /// Variable-length signed integer: same framing as
    /// [`read_unsigned_int`](Self::read_unsigned_int), with the sign in bit 6
    /// of the final byte and the magnitude in the remaining bits.
    pub fn read_signed_int(&mut self) -> Result<i32, MapFileError> {
        let mut magnitude: i32 = 0;
        let mut shift: u32 = 0;

        loop {
            let byte = self.require_byte("signed int")?;
            if byte & 0x80 == 0 {
                magnitude |= i32::from(byte & 0x3f).wrapping_shl(shift);
                return Ok(if byte & 0x40 != 0 {
                    magnitude.wrapping_neg()
                } else {
                    magnitude
                });
            }
            magnitude |= i32::from(byte & 0x7f).wrapping_shl(shift);
            shift += 7;
        }
    }

    /// Resolves `number_of_tags` variable-length tag ids against the header
    /// vocabulary; an id outside the vocabulary fails the record.
    pub fn read_tags(
        &mut self,
        tags_array: &[Tag],
        number_of_tags: u8,
    ) -> Result<Vec<Tag>, MapFileError> {
        let mut tags = Vec::with_capacity(number_of_tags as usize);
        for _ in 0..number_of_tags {
            let tag_id = self.read_unsigned_int()? as usize;
            let tag = tags_array.get(tag_id).ok_or_else(|| {
                MapFileError::TruncatedTileBlock(format!("invalid tag ID: {}", tag_id))
            })?;
            tags.push(tag.clone());
        }
        Ok(tags)
    }

    /// String with a variable-length byte-count prefix. A zero length yields
    /// the empty string; vocabulary readers reject it downstream.
    pub fn read_utf8_encoded_string(&mut self) -> Result<String, MapFileError> {
        let length = self.read_unsigned_int()? as usize;
        self.read_utf8_encoded_string_with_length(length)
    }

    /// Fixed-length string, used for the magic byte and debug signatures.
    pub fn read_utf8_encoded_string_with_length(
        &mut self,
        string_length: usize,
    ) -> Result<String, MapFileError> {
        if self.buffer_position + string_length > self.buffer_data.len() {
            return Err(MapFileError::BufferUnderflow("UTF-8 string"));
        }
        let start = self.buffer_position;
        self.buffer_position += string_length;
        Ok(String::from_utf8(
            self.buffer_data[start..self.buffer_position].to_vec(),
        )?)
    }

    pub fn position(&self) -> usize {
        self.buffer_position
    }

    pub fn size(&self) -> usize {
        self.buffer_data.len()
    }

    pub fn set_position(&mut self, position: usize) {
        self.buffer_position = position;
    }

    pub fn skip_bytes(&mut self, bytes: usize) {
        self.buffer_position += bytes;
    }

    fn require_byte(&mut self, what: &'static str) -> Result<u8, MapFileError> {
        let byte = self
            .buffer_data
            .get(self.buffer_position)
            .copied()
            .ok_or(MapFileError::BufferUnderflow(what))?;
        self.buffer_position += 1;
        Ok(byte)
    }

    fn take<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], MapFileError> {
        if self.buffer_position + N > self.buffer_data.len() {
            return Err(MapFileError::BufferUnderflow(what));
        }
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.buffer_data[self.buffer_position..self.buffer_position + N]);
        self.buffer_position += N;
        Ok(bytes)
    }
}
