use std::io::{Read, Seek};

use tracing::debug;

use crate::optional_field::OptionalFields;
use crate::reader::ReadBuffer;
use crate::required_field::RequiredFields;
use crate::types::{BoundingBox, GeoPoint, Tag};
use crate::MapFileError;
use crate::MercatorProjection;

/// Width of one entry of the tile index.
pub const BYTES_PER_INDEX_ENTRY: u8 = 5;

/// Length of the index signature preceding the tile index in debug files.
pub const SIGNATURE_LENGTH_INDEX: i64 = 16;

const BASE_ZOOM_LEVEL_MAX: u8 = 20;
const HEADER_SIZE_MIN: i64 = 70;
const ZOOM_LEVEL_MAX: u8 = 22;

/// One zoom interval of the map file: a contiguous sub-file with its own
/// tile index, laid out on the base-zoom grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubFileParameter {
    pub base_zoom_level: u8,
    pub blocks_height: i64,
    pub blocks_width: i64,
    pub boundary_tile_bottom: i64,
    pub boundary_tile_left: i64,
    pub boundary_tile_right: i64,
    pub boundary_tile_top: i64,
    pub index_end_address: i64,
    pub index_start_address: i64,
    pub number_of_blocks: i64,
    pub start_address: i64,
    pub sub_file_size: i64,
    pub zoom_level_max: u8,
    pub zoom_level_min: u8,
}

#[derive(Default)]
struct SubFileParameterBuilder {
    base_zoom_level: u8,
    index_start_address: i64,
    start_address: i64,
    sub_file_size: i64,
    zoom_level_max: u8,
    zoom_level_min: u8,
}

impl SubFileParameterBuilder {
    /// Projects the global bounding box onto the base-zoom tile grid to
    /// derive the boundary rectangle and index extent.
    fn build(self, bounding_box: &BoundingBox) -> SubFileParameter {
        let boundary_tile_bottom =
            MercatorProjection::latitude_to_tile_y(bounding_box.min_latitude(), self.base_zoom_level);
        let boundary_tile_left =
            MercatorProjection::longitude_to_tile_x(bounding_box.min_longitude(), self.base_zoom_level);
        let boundary_tile_top =
            MercatorProjection::latitude_to_tile_y(bounding_box.max_latitude(), self.base_zoom_level);
        let boundary_tile_right =
            MercatorProjection::longitude_to_tile_x(bounding_box.max_longitude(), self.base_zoom_level);

        let blocks_width = boundary_tile_right - boundary_tile_left + 1;
        let blocks_height = boundary_tile_bottom - boundary_tile_top + 1;
        let number_of_blocks = blocks_width * blocks_height;

        let index_end_address =
            self.index_start_address + number_of_blocks * i64::from(BYTES_PER_INDEX_ENTRY);

        SubFileParameter {
            base_zoom_level: self.base_zoom_level,
            blocks_height,
            blocks_width,
            boundary_tile_bottom,
            boundary_tile_left,
            boundary_tile_right,
            boundary_tile_top,
            index_end_address,
            index_start_address: self.index_start_address,
            number_of_blocks,
            start_address: self.start_address,
            sub_file_size: self.sub_file_size,
            zoom_level_max: self.zoom_level_max,
            zoom_level_min: self.zoom_level_min,
        }
    }
}

/// Decoded header metadata, immutable for the lifetime of an open file.
#[derive(Debug)]
pub struct MapFileInfo {
    pub bounding_box: BoundingBox,
    pub comment: Option<String>,
    pub created_by: Option<String>,
    pub debug_file: bool,
    pub file_size: i64,
    pub file_version: i32,
    pub language_preference: Option<String>,
    pub map_date: i64,
    pub number_of_sub_files: u8,
    pub poi_tags: Vec<Tag>,
    pub projection_name: String,
    pub start_position: Option<GeoPoint>,
    pub start_zoom_level: Option<u8>,
    pub tile_pixel_size: i32,
    pub way_tags: Vec<Tag>,
    pub zoom_level_min: u8,
    pub zoom_level_max: u8,
}

/// Accumulates header fields in file order before the final
/// [`MapFileInfo`] is assembled.
#[derive(Default)]
pub struct MapFileInfoBuilder {
    pub bounding_box: Option<BoundingBox>,
    pub file_size: i64,
    pub file_version: i32,
    pub map_date: i64,
    pub number_of_sub_files: u8,
    pub optional_fields: OptionalFields,
    pub poi_tags: Vec<Tag>,
    pub projection_name: String,
    pub tile_pixel_size: i32,
    pub way_tags: Vec<Tag>,
    pub zoom_level_min: u8,
    pub zoom_level_max: u8,
}

impl MapFileInfoBuilder {
    fn build(self, bounding_box: BoundingBox) -> MapFileInfo {
        MapFileInfo {
            bounding_box,
            comment: self.optional_fields.comment,
            created_by: self.optional_fields.created_by,
            debug_file: self.optional_fields.is_debug_file,
            file_size: self.file_size,
            file_version: self.file_version,
            language_preference: self.optional_fields.language_preference,
            map_date: self.map_date,
            number_of_sub_files: self.number_of_sub_files,
            poi_tags: self.poi_tags,
            projection_name: self.projection_name,
            start_position: self.optional_fields.start_position,
            start_zoom_level: self.optional_fields.start_zoom_level,
            tile_pixel_size: self.tile_pixel_size,
            way_tags: self.way_tags,
            zoom_level_min: self.zoom_level_min,
            zoom_level_max: self.zoom_level_max,
        }
    }
}

/// Validated header plus the per-zoom sub-file lookup table.
pub struct MapFileHeader {
    map_file_info: MapFileInfo,
    sub_file_parameters: Vec<SubFileParameter>,
    zoom_level_minimum: u8,
    zoom_level_maximum: u8,
}

impl MapFileHeader {
    /// Runs the full header sequence: magic byte, remaining-header refill,
    /// required fields, optional fields, tag vocabularies, sub-file
    /// descriptors. Stops at the first failing clause.
    pub fn read<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        file_size: i64,
    ) -> Result<Self, MapFileError> {
        RequiredFields::read_magic_byte(read_buffer)?;
        RequiredFields::read_remaining_header(read_buffer)?;

        let mut builder = MapFileInfoBuilder::default();

        RequiredFields::read_file_version(read_buffer, &mut builder)?;
        RequiredFields::read_file_size(read_buffer, file_size, &mut builder)?;
        RequiredFields::read_map_date(read_buffer, &mut builder)?;
        RequiredFields::read_bounding_box(read_buffer, &mut builder)?;
        RequiredFields::read_tile_pixel_size(read_buffer, &mut builder)?;
        RequiredFields::read_projection_name(read_buffer, &mut builder)?;

        let mut optional_fields = OptionalFields::new(read_buffer.read_byte()?);
        optional_fields.read_optional_fields(read_buffer)?;
        builder.optional_fields = optional_fields;

        RequiredFields::read_poi_tags(read_buffer, &mut builder)?;
        RequiredFields::read_way_tags(read_buffer, &mut builder)?;

        Self::read_sub_file_parameters(read_buffer, file_size, builder)
    }

    pub fn map_file_info(&self) -> &MapFileInfo {
        &self.map_file_info
    }

    /// Clamps a requested zoom level into the range the file covers.
    pub fn query_zoom_level(&self, zoom_level: u8) -> u8 {
        zoom_level.clamp(self.zoom_level_minimum, self.zoom_level_maximum)
    }

    /// Sub-file serving the given (already clamped) zoom level.
    pub fn sub_file_parameter(&self, query_zoom_level: u8) -> Option<&SubFileParameter> {
        self.sub_file_parameters.get(query_zoom_level as usize)
    }

    fn read_sub_file_parameters<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        file_size: i64,
        mut builder: MapFileInfoBuilder,
    ) -> Result<Self, MapFileError> {
        let number_of_sub_files = read_buffer.read_byte()?;
        if number_of_sub_files < 1 {
            return Err(MapFileError::InvalidSubFiles(format!(
                "invalid number of sub-files: {}",
                number_of_sub_files
            )));
        }
        builder.number_of_sub_files = number_of_sub_files;

        let bounding_box = builder
            .bounding_box
            .ok_or_else(|| MapFileError::InvalidBoundingBox("missing".to_string()))?;

        let mut zoom_level_minimum = u8::MAX;
        let mut zoom_level_maximum = 0;
        let mut temp_parameters = Vec::with_capacity(number_of_sub_files as usize);

        for _ in 0..number_of_sub_files {
            let mut sub_file_builder = SubFileParameterBuilder::default();

            let base_zoom_level = read_buffer.read_byte()?;
            if base_zoom_level > BASE_ZOOM_LEVEL_MAX {
                return Err(MapFileError::InvalidSubFiles(format!(
                    "invalid base zoom level: {}",
                    base_zoom_level
                )));
            }
            sub_file_builder.base_zoom_level = base_zoom_level;

            let zoom_level_min = read_buffer.read_byte()?;
            if zoom_level_min > ZOOM_LEVEL_MAX {
                return Err(MapFileError::InvalidSubFiles(format!(
                    "invalid minimum zoom level: {}",
                    zoom_level_min
                )));
            }
            sub_file_builder.zoom_level_min = zoom_level_min;

            let zoom_level_max = read_buffer.read_byte()?;
            if zoom_level_max > ZOOM_LEVEL_MAX {
                return Err(MapFileError::InvalidSubFiles(format!(
                    "invalid maximum zoom level: {}",
                    zoom_level_max
                )));
            }
            sub_file_builder.zoom_level_max = zoom_level_max;

            if zoom_level_min > zoom_level_max {
                return Err(MapFileError::InvalidSubFiles(format!(
                    "invalid zoom level range: {} {}",
                    zoom_level_min, zoom_level_max
                )));
            }

            let start_address = read_buffer.read_long()?;
            if start_address < HEADER_SIZE_MIN || start_address >= file_size {
                return Err(MapFileError::InvalidSubFiles(format!(
                    "invalid start address: {}",
                    start_address
                )));
            }
            sub_file_builder.start_address = start_address;

            // The tile index is preceded by a 16-byte signature in debug files.
            sub_file_builder.index_start_address = if builder.optional_fields.is_debug_file {
                start_address + SIGNATURE_LENGTH_INDEX
            } else {
                start_address
            };

            let sub_file_size = read_buffer.read_long()?;
            if sub_file_size < 1 {
                return Err(MapFileError::InvalidSubFiles(format!(
                    "invalid sub-file size: {}",
                    sub_file_size
                )));
            }
            sub_file_builder.sub_file_size = sub_file_size;

            zoom_level_minimum = zoom_level_minimum.min(zoom_level_min);
            zoom_level_maximum = zoom_level_maximum.max(zoom_level_max);

            let parameter = sub_file_builder.build(&bounding_box);
            debug!(
                base_zoom_level,
                zoom_level_min, zoom_level_max, "decoded sub-file descriptor"
            );
            temp_parameters.push(parameter);
        }

        builder.zoom_level_min = zoom_level_minimum;
        builder.zoom_level_max = zoom_level_maximum;

        // Dense lookup table: one descriptor per zoom level up to the
        // maximum; levels no interval claims fall back to the last one.
        let mut sub_file_parameters = Vec::with_capacity(zoom_level_maximum as usize + 1);
        for zoom_level in 0..=zoom_level_maximum {
            let matching = temp_parameters
                .iter()
                .find(|p| zoom_level >= p.zoom_level_min && zoom_level <= p.zoom_level_max)
                .or(temp_parameters.last())
                .ok_or_else(|| {
                    MapFileError::InvalidSubFiles("no valid sub-file parameters".to_string())
                })?;
            sub_file_parameters.push(matching.clone());
        }

        Ok(Self {
            map_file_info: builder.build(bounding_box),
            sub_file_parameters,
            zoom_level_minimum,
            zoom_level_maximum,
        })
    }
}
