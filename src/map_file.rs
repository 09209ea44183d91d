use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::header::{MapFileHeader, MapFileInfo, SubFileParameter};
use crate::index_cache::IndexCache;
use crate::map_data::{MapReadResult, PointOfInterest, Way};
use crate::mercator::MercatorProjection;
use crate::query_parameters::QueryParameters;
use crate::reader::ReadBuffer;
use crate::tile::Tile;
use crate::types::{BoundingBox, LatLong, LatLongUtils, Tag};
use crate::MapFileError;

const INDEX_CACHE_SIZE: usize = 64;
const DEFAULT_START_ZOOM_LEVEL: u8 = 12;

// POI record layout.
const POI_FEATURE_ELEVATION: u8 = 0x20;
const POI_FEATURE_HOUSE_NUMBER: u8 = 0x40;
const POI_FEATURE_NAME: u8 = 0x80;
const POI_LAYER_BITMASK: u8 = 0xf0;
const POI_LAYER_SHIFT: u8 = 4;
const POI_NUMBER_OF_TAGS_BITMASK: u8 = 0x0f;

// Way record layout.
const WAY_FEATURE_DATA_BLOCKS_BYTE: u8 = 0x08;
const WAY_FEATURE_DOUBLE_DELTA_ENCODING: u8 = 0x04;
const WAY_FEATURE_HOUSE_NUMBER: u8 = 0x40;
const WAY_FEATURE_LABEL_POSITION: u8 = 0x10;
const WAY_FEATURE_NAME: u8 = 0x80;
const WAY_FEATURE_REF: u8 = 0x20;
const WAY_LAYER_BITMASK: u8 = 0xf0;
const WAY_LAYER_SHIFT: u8 = 4;
const WAY_NUMBER_OF_TAGS_BITMASK: u8 = 0x0f;

// Debug signatures written by the map writer in debug mode.
const SIGNATURE_LENGTH_BLOCK: usize = 32;
const SIGNATURE_LENGTH_POI: usize = 32;
const SIGNATURE_LENGTH_WAY: usize = 32;

const TAG_KEY_ELE: &str = "ele";
const TAG_KEY_HOUSE_NUMBER: &str = "addr:housenumber";
const TAG_KEY_NAME: &str = "name";
const TAG_KEY_REF: &str = "ref";

// 5-byte index entry: top bit water flag, low 39 bits block offset.
const BITMASK_INDEX_OFFSET: i64 = 0x7f_ffff_ffff;
const BITMASK_INDEX_WATER: i64 = 0x80_0000_0000;

// Decoded ways are clipped against the query box extended by this margin.
const WAY_FILTER_ENABLED: bool = true;
const WAY_FILTER_DISTANCE_METERS: i32 = 20;

/// Which record classes a query decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Every POI and way on the query zoom level.
    All,
    /// POIs only; the way section is not visited.
    Pois,
    /// POIs plus ways that carry a name, house number or ref.
    Labels,
}

/// An open map file: validated header, lazily cached tile index, and
/// per-request tile payload decoding.
pub struct MapFile {
    file: File,
    header: MapFileHeader,
    index_cache: IndexCache<File>,
    file_size: i64,
}

impl MapFile {
    /// Opens and validates a map file. Any failing header clause aborts with
    /// the error naming that clause; the handle is released on drop.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MapFileError> {
        let file = File::open(&path)?;
        let file_size = file.metadata()?.len() as i64;

        let mut read_buffer = ReadBuffer::new(file.try_clone()?);
        let header = MapFileHeader::read(&mut read_buffer, file_size)?;

        let index_cache = IndexCache::new(file.try_clone()?, INDEX_CACHE_SIZE);

        info!(
            file_size,
            map_date = header.map_file_info().map_date,
            sub_files = header.map_file_info().number_of_sub_files,
            "opened map file"
        );

        Ok(Self {
            file,
            header,
            index_cache,
            file_size,
        })
    }

    /// Releases the file handle and the cached index.
    pub fn close(mut self) {
        self.index_cache.destroy();
    }

    pub fn map_file_info(&self) -> &MapFileInfo {
        self.header.map_file_info()
    }

    pub fn map_languages(&self) -> Option<Vec<String>> {
        self.map_file_info()
            .language_preference
            .as_ref()
            .map(|languages| languages.split(',').map(str::to_string).collect())
    }

    /// Start position from the header, falling back to the coverage centre.
    pub fn start_position(&self) -> LatLong {
        let info = self.map_file_info();
        match info.start_position {
            Some(position) => position.to_lat_long(),
            None => info.bounding_box.center_point(),
        }
    }

    pub fn start_zoom_level(&self) -> u8 {
        self.map_file_info()
            .start_zoom_level
            .unwrap_or(DEFAULT_START_ZOOM_LEVEL)
    }

    /// All POIs and ways for a tile. Empty result outside coverage.
    pub fn read_map_data(&mut self, tile: &Tile) -> Result<MapReadResult, MapFileError> {
        self.read_map_data_range(tile, tile, Selector::All)
    }

    /// POIs only.
    pub fn read_poi_data(&mut self, tile: &Tile) -> Result<MapReadResult, MapFileError> {
        self.read_map_data_range(tile, tile, Selector::Pois)
    }

    /// POIs plus labelled ways.
    pub fn read_labels(&mut self, tile: &Tile) -> Result<MapReadResult, MapFileError> {
        self.read_map_data_range(tile, tile, Selector::Labels)
    }

    /// Reads a rectangle of tiles in one pass over the touched blocks.
    pub fn read_map_data_range(
        &mut self,
        upper_left: &Tile,
        lower_right: &Tile,
        selector: Selector,
    ) -> Result<MapReadResult, MapFileError> {
        if upper_left.tile_x > lower_right.tile_x || upper_left.tile_y > lower_right.tile_y {
            return Err(MapFileError::TruncatedTileBlock(
                "upper left tile must be above and left of lower right tile".to_string(),
            ));
        }

        let query_zoom_level = i32::from(self.header.query_zoom_level(upper_left.zoom_level));
        let sub_file_parameter = self
            .header
            .sub_file_parameter(query_zoom_level as u8)
            .ok_or_else(|| {
                MapFileError::InvalidSubFiles(format!(
                    "no sub-file for zoom level: {}",
                    query_zoom_level
                ))
            })?
            .clone();

        let mut query_parameters = QueryParameters::new();
        query_parameters.query_zoom_level = query_zoom_level;
        query_parameters.calculate_base_tiles(upper_left, lower_right, &sub_file_parameter);
        query_parameters.calculate_blocks(&sub_file_parameter);

        let bounding_box = Tile::bounding_box_range(upper_left, lower_right);

        self.process_blocks(&query_parameters, &sub_file_parameter, &bounding_box, selector)
    }

    fn process_blocks(
        &mut self,
        query_parameters: &QueryParameters,
        sub_file_parameter: &SubFileParameter,
        bounding_box: &BoundingBox,
        selector: Selector,
    ) -> Result<MapReadResult, MapFileError> {
        let mut query_is_water = true;
        let mut query_read_water_info = false;
        let mut result = MapReadResult::new();

        debug!(
            from_x = query_parameters.from_block_x,
            to_x = query_parameters.to_block_x,
            from_y = query_parameters.from_block_y,
            to_y = query_parameters.to_block_y,
            "processing blocks"
        );

        for row in query_parameters.from_block_y..=query_parameters.to_block_y {
            for column in query_parameters.from_block_x..=query_parameters.to_block_x {
                let block_number = row * sub_file_parameter.blocks_width + column;

                let block_index_entry =
                    match self.index_cache.index_entry(sub_file_parameter, block_number) {
                        Ok(entry) => entry,
                        Err(error) => {
                            warn!(block_number, %error, "skipping block with unreadable index entry");
                            continue;
                        }
                    };

                if query_is_water {
                    query_is_water &= block_index_entry & BITMASK_INDEX_WATER != 0;
                    query_read_water_info = true;
                }

                let block_pointer = block_index_entry & BITMASK_INDEX_OFFSET;
                if block_pointer == 0 || block_pointer > sub_file_parameter.sub_file_size {
                    warn!(block_number, block_pointer, "skipping block with invalid pointer");
                    continue;
                }

                let next_block_pointer = if block_number + 1 == sub_file_parameter.number_of_blocks
                {
                    sub_file_parameter.sub_file_size
                } else {
                    match self
                        .index_cache
                        .index_entry(sub_file_parameter, block_number + 1)
                    {
                        Ok(next_entry) => {
                            let next_pointer = next_entry & BITMASK_INDEX_OFFSET;
                            if next_pointer > sub_file_parameter.sub_file_size {
                                warn!(block_number, next_pointer, "skipping block with invalid successor pointer");
                                continue;
                            }
                            next_pointer
                        }
                        Err(error) => {
                            warn!(block_number, %error, "skipping block with unreadable successor entry");
                            continue;
                        }
                    }
                };

                let block_size = (next_block_pointer - block_pointer) as usize;
                if block_size == 0 {
                    continue;
                }

                let mut read_buffer = ReadBuffer::new(self.file.try_clone()?);
                let file_position = (sub_file_parameter.start_address + block_pointer) as u64;
                match read_buffer.read_from_file_at_offset(file_position, block_size) {
                    Ok(true) => {}
                    Ok(false) => {
                        warn!(file_position, block_size, "skipping unreadable block");
                        continue;
                    }
                    Err(error) => {
                        warn!(file_position, %error, "skipping block after read error");
                        continue;
                    }
                }

                let tile_latitude = MercatorProjection::tile_y_to_latitude(
                    sub_file_parameter.boundary_tile_top + row,
                    sub_file_parameter.base_zoom_level,
                );
                let tile_longitude = MercatorProjection::tile_x_to_longitude(
                    sub_file_parameter.boundary_tile_left + column,
                    sub_file_parameter.base_zoom_level,
                );

                match self.process_block(
                    query_parameters,
                    sub_file_parameter,
                    bounding_box,
                    tile_latitude,
                    tile_longitude,
                    selector,
                    &mut read_buffer,
                ) {
                    Ok((pois, ways)) => result.add_block(pois, ways),
                    Err(error) => {
                        // Half-parsed records of the block are discarded.
                        warn!(block_number, %error, "skipping undecodable block");
                        continue;
                    }
                }
            }
        }

        if query_is_water && query_read_water_info {
            result.is_water = true;
        }

        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    fn process_block(
        &self,
        query_parameters: &QueryParameters,
        sub_file_parameter: &SubFileParameter,
        bounding_box: &BoundingBox,
        tile_latitude: f64,
        tile_longitude: f64,
        selector: Selector,
        read_buffer: &mut ReadBuffer<impl Read + Seek>,
    ) -> Result<(Vec<PointOfInterest>, Vec<Way>), MapFileError> {
        self.process_block_signature(read_buffer)?;

        let zoom_table = Self::read_zoom_table(sub_file_parameter, read_buffer)?;
        let zoom_table_row =
            (query_parameters.query_zoom_level - i32::from(sub_file_parameter.zoom_level_min)) as usize;
        let (pois_on_query_zoom_level, ways_on_query_zoom_level) =
            *zoom_table.get(zoom_table_row).ok_or_else(|| {
                MapFileError::TruncatedTileBlock(format!(
                    "invalid zoom table row: {}",
                    zoom_table_row
                ))
            })?;

        // Offset of the way section, relative to the position after this field.
        let first_way_offset = read_buffer.read_unsigned_int()? as usize + read_buffer.position();
        if first_way_offset > read_buffer.size() {
            return Err(MapFileError::TruncatedTileBlock(format!(
                "invalid first way offset: {}",
                first_way_offset
            )));
        }

        let filter_required =
            query_parameters.query_zoom_level > i32::from(sub_file_parameter.base_zoom_level);

        let pois = self.process_pois(
            tile_latitude,
            tile_longitude,
            pois_on_query_zoom_level as usize,
            bounding_box,
            filter_required,
            read_buffer,
        )?;

        let ways = if selector == Selector::Pois {
            Vec::new()
        } else {
            if read_buffer.position() > first_way_offset {
                return Err(MapFileError::TruncatedTileBlock(format!(
                    "invalid buffer position: {}",
                    read_buffer.position()
                )));
            }
            read_buffer.set_position(first_way_offset);

            self.process_ways(
                query_parameters,
                ways_on_query_zoom_level as usize,
                bounding_box,
                filter_required,
                tile_latitude,
                tile_longitude,
                selector,
                read_buffer,
            )?
        };

        Ok((pois, ways))
    }

    fn process_block_signature(
        &self,
        read_buffer: &mut ReadBuffer<impl Read + Seek>,
    ) -> Result<(), MapFileError> {
        if self.map_file_info().debug_file {
            let signature =
                read_buffer.read_utf8_encoded_string_with_length(SIGNATURE_LENGTH_BLOCK)?;
            if !signature.starts_with("###TileStart") {
                return Err(MapFileError::TruncatedTileBlock(format!(
                    "invalid block signature: {}",
                    signature
                )));
            }
        }
        Ok(())
    }

    /// Cumulative (poi, way) counts per zoom level of the interval.
    fn read_zoom_table(
        sub_file_parameter: &SubFileParameter,
        read_buffer: &mut ReadBuffer<impl Read + Seek>,
    ) -> Result<Vec<(u32, u32)>, MapFileError> {
        let rows =
            (sub_file_parameter.zoom_level_max - sub_file_parameter.zoom_level_min + 1) as usize;
        let mut zoom_table = Vec::with_capacity(rows);

        let mut cumulated_pois = 0u32;
        let mut cumulated_ways = 0u32;
        for _ in 0..rows {
            cumulated_pois = cumulated_pois.wrapping_add(read_buffer.read_unsigned_int()?);
            cumulated_ways = cumulated_ways.wrapping_add(read_buffer.read_unsigned_int()?);
            zoom_table.push((cumulated_pois, cumulated_ways));
        }

        Ok(zoom_table)
    }

    fn process_pois(
        &self,
        tile_latitude: f64,
        tile_longitude: f64,
        number_of_pois: usize,
        bounding_box: &BoundingBox,
        filter_required: bool,
        read_buffer: &mut ReadBuffer<impl Read + Seek>,
    ) -> Result<Vec<PointOfInterest>, MapFileError> {
        let mut pois = Vec::new();
        let poi_tags = &self.map_file_info().poi_tags;
        let debug_file = self.map_file_info().debug_file;

        for _ in 0..number_of_pois {
            if debug_file {
                let signature =
                    read_buffer.read_utf8_encoded_string_with_length(SIGNATURE_LENGTH_POI)?;
                if !signature.starts_with("***POIStart") {
                    return Err(MapFileError::TruncatedTileBlock(format!(
                        "invalid POI signature: {}",
                        signature
                    )));
                }
            }

            // Position is delta-encoded against the block's top-left corner.
            let latitude = tile_latitude
                + LatLongUtils::microdegrees_to_degrees(read_buffer.read_signed_int()?);
            let longitude = tile_longitude
                + LatLongUtils::microdegrees_to_degrees(read_buffer.read_signed_int()?);

            let special_byte = read_buffer.read_byte()?;
            let layer = ((special_byte & POI_LAYER_BITMASK) >> POI_LAYER_SHIFT) as i8;
            let number_of_tags = special_byte & POI_NUMBER_OF_TAGS_BITMASK;

            let mut tags = read_buffer.read_tags(poi_tags, number_of_tags)?;

            let feature_byte = read_buffer.read_byte()?;
            if feature_byte & POI_FEATURE_NAME != 0 {
                tags.push(Tag::new(
                    TAG_KEY_NAME.to_string(),
                    read_buffer.read_utf8_encoded_string()?,
                ));
            }
            if feature_byte & POI_FEATURE_HOUSE_NUMBER != 0 {
                tags.push(Tag::new(
                    TAG_KEY_HOUSE_NUMBER.to_string(),
                    read_buffer.read_utf8_encoded_string()?,
                ));
            }
            if feature_byte & POI_FEATURE_ELEVATION != 0 {
                tags.push(Tag::new(
                    TAG_KEY_ELE.to_string(),
                    read_buffer.read_signed_int()?.to_string(),
                ));
            }

            if !filter_required || bounding_box.contains(latitude, longitude) {
                pois.push(PointOfInterest::new(
                    layer,
                    tags,
                    LatLong::new(latitude, longitude),
                ));
            }
        }

        Ok(pois)
    }

    #[allow(clippy::too_many_arguments)]
    fn process_ways(
        &self,
        query_parameters: &QueryParameters,
        number_of_ways: usize,
        bounding_box: &BoundingBox,
        filter_required: bool,
        tile_latitude: f64,
        tile_longitude: f64,
        selector: Selector,
        read_buffer: &mut ReadBuffer<impl Read + Seek>,
    ) -> Result<Vec<Way>, MapFileError> {
        let mut ways = Vec::new();
        let way_tags = &self.map_file_info().way_tags;
        let debug_file = self.map_file_info().debug_file;

        let way_filter_bbox = if WAY_FILTER_ENABLED {
            bounding_box.extend_meters(WAY_FILTER_DISTANCE_METERS)
        } else {
            *bounding_box
        };

        for _ in 0..number_of_ways {
            if debug_file {
                let signature =
                    read_buffer.read_utf8_encoded_string_with_length(SIGNATURE_LENGTH_WAY)?;
                if !signature.starts_with("---WayStart") {
                    return Err(MapFileError::TruncatedTileBlock(format!(
                        "invalid way signature: {}",
                        signature
                    )));
                }
            }

            let way_data_size = read_buffer.read_unsigned_int()? as usize;
            if way_data_size < 2 {
                return Err(MapFileError::TruncatedTileBlock(format!(
                    "invalid way data size: {}",
                    way_data_size
                )));
            }

            if query_parameters.use_tile_bitmask {
                let tile_bitmask = i32::from(read_buffer.read_short()?);
                if query_parameters.query_tile_bitmask & tile_bitmask == 0 {
                    // The way does not touch the requested subtile.
                    read_buffer.skip_bytes(way_data_size - 2);
                    continue;
                }
            } else {
                read_buffer.skip_bytes(2);
            }

            let special_byte = read_buffer.read_byte()?;
            let layer = ((special_byte & WAY_LAYER_BITMASK) >> WAY_LAYER_SHIFT) as i8;
            let number_of_tags = special_byte & WAY_NUMBER_OF_TAGS_BITMASK;

            let mut tags = read_buffer.read_tags(way_tags, number_of_tags)?;

            let feature_byte = read_buffer.read_byte()?;
            let feature_name = feature_byte & WAY_FEATURE_NAME != 0;
            let feature_house_number = feature_byte & WAY_FEATURE_HOUSE_NUMBER != 0;
            let feature_ref = feature_byte & WAY_FEATURE_REF != 0;
            let feature_label_position = feature_byte & WAY_FEATURE_LABEL_POSITION != 0;
            let feature_way_data_blocks_byte = feature_byte & WAY_FEATURE_DATA_BLOCKS_BYTE != 0;
            let feature_double_delta_encoding =
                feature_byte & WAY_FEATURE_DOUBLE_DELTA_ENCODING != 0;

            if feature_name {
                tags.push(Tag::new(
                    TAG_KEY_NAME.to_string(),
                    read_buffer.read_utf8_encoded_string()?,
                ));
            }
            if feature_house_number {
                tags.push(Tag::new(
                    TAG_KEY_HOUSE_NUMBER.to_string(),
                    read_buffer.read_utf8_encoded_string()?,
                ));
            }
            if feature_ref {
                tags.push(Tag::new(
                    TAG_KEY_REF.to_string(),
                    read_buffer.read_utf8_encoded_string()?,
                ));
            }

            let label_position = if feature_label_position {
                // Lat/lon offsets relative to the first way node.
                let latitude_offset = read_buffer.read_signed_int()?;
                let longitude_offset = read_buffer.read_signed_int()?;
                Some((latitude_offset, longitude_offset))
            } else {
                None
            };

            let way_data_blocks = if feature_way_data_blocks_byte {
                read_buffer.read_unsigned_int()?
            } else {
                1
            };
            if way_data_blocks < 1 {
                return Err(MapFileError::TruncatedTileBlock(format!(
                    "invalid number of way data blocks: {}",
                    way_data_blocks
                )));
            }

            for _ in 0..way_data_blocks {
                let way_nodes = Self::process_way_data_block(
                    tile_latitude,
                    tile_longitude,
                    feature_double_delta_encoding,
                    read_buffer,
                )?;

                if filter_required
                    && WAY_FILTER_ENABLED
                    && !Self::way_intersects(&way_nodes, &way_filter_bbox)
                {
                    continue;
                }

                let keep = selector == Selector::All
                    || feature_name
                    || feature_house_number
                    || feature_ref
                    || Self::has_label_tag(&tags);
                if keep {
                    let label_position = label_position.map(|(latitude_offset, longitude_offset)| {
                        LatLong::new(
                            way_nodes[0][0].latitude
                                + LatLongUtils::microdegrees_to_degrees(latitude_offset),
                            way_nodes[0][0].longitude
                                + LatLongUtils::microdegrees_to_degrees(longitude_offset),
                        )
                    });

                    ways.push(Way::new(layer, tags.clone(), way_nodes, label_position));
                }
            }
        }

        Ok(ways)
    }

    fn process_way_data_block(
        tile_latitude: f64,
        tile_longitude: f64,
        double_delta_encoding: bool,
        read_buffer: &mut ReadBuffer<impl Read + Seek>,
    ) -> Result<Vec<Vec<LatLong>>, MapFileError> {
        let number_of_coordinate_blocks = read_buffer.read_unsigned_int()? as usize;
        if number_of_coordinate_blocks < 1 || number_of_coordinate_blocks > i16::MAX as usize {
            return Err(MapFileError::TruncatedTileBlock(format!(
                "invalid number of way coordinate blocks: {}",
                number_of_coordinate_blocks
            )));
        }

        let mut way_coordinates = Vec::with_capacity(number_of_coordinate_blocks);
        for _ in 0..number_of_coordinate_blocks {
            let number_of_way_nodes = read_buffer.read_unsigned_int()? as usize;
            if number_of_way_nodes < 2 || number_of_way_nodes > i16::MAX as usize {
                return Err(MapFileError::TruncatedTileBlock(format!(
                    "invalid number of way nodes: {}",
                    number_of_way_nodes
                )));
            }

            let mut way_segment = vec![LatLong::new(0.0, 0.0); number_of_way_nodes];
            if double_delta_encoding {
                Self::decode_way_nodes_double_delta(
                    &mut way_segment,
                    tile_latitude,
                    tile_longitude,
                    read_buffer,
                )?;
            } else {
                Self::decode_way_nodes_single_delta(
                    &mut way_segment,
                    tile_latitude,
                    tile_longitude,
                    read_buffer,
                )?;
            }
            way_coordinates.push(way_segment);
        }

        Ok(way_coordinates)
    }

    fn decode_way_nodes_single_delta(
        way_segment: &mut [LatLong],
        tile_latitude: f64,
        tile_longitude: f64,
        read_buffer: &mut ReadBuffer<impl Read + Seek>,
    ) -> Result<(), MapFileError> {
        let mut way_node_latitude =
            tile_latitude + LatLongUtils::microdegrees_to_degrees(read_buffer.read_signed_int()?);
        let mut way_node_longitude =
            tile_longitude + LatLongUtils::microdegrees_to_degrees(read_buffer.read_signed_int()?);

        way_segment[0] = LatLong::new(way_node_latitude, way_node_longitude);

        for way_node in way_segment.iter_mut().skip(1) {
            way_node_latitude +=
                LatLongUtils::microdegrees_to_degrees(read_buffer.read_signed_int()?);
            way_node_longitude +=
                LatLongUtils::microdegrees_to_degrees(read_buffer.read_signed_int()?);
            way_node_longitude = Self::clamp_date_line(way_node_longitude);
            *way_node = LatLong::new(way_node_latitude, way_node_longitude);
        }

        Ok(())
    }

    fn decode_way_nodes_double_delta(
        way_segment: &mut [LatLong],
        tile_latitude: f64,
        tile_longitude: f64,
        read_buffer: &mut ReadBuffer<impl Read + Seek>,
    ) -> Result<(), MapFileError> {
        let mut way_node_latitude =
            tile_latitude + LatLongUtils::microdegrees_to_degrees(read_buffer.read_signed_int()?);
        let mut way_node_longitude =
            tile_longitude + LatLongUtils::microdegrees_to_degrees(read_buffer.read_signed_int()?);

        way_segment[0] = LatLong::new(way_node_latitude, way_node_longitude);

        let mut previous_single_delta_latitude = 0.0;
        let mut previous_single_delta_longitude = 0.0;

        for way_node in way_segment.iter_mut().skip(1) {
            let double_delta_latitude =
                LatLongUtils::microdegrees_to_degrees(read_buffer.read_signed_int()?);
            let double_delta_longitude =
                LatLongUtils::microdegrees_to_degrees(read_buffer.read_signed_int()?);

            let single_delta_latitude = double_delta_latitude + previous_single_delta_latitude;
            let single_delta_longitude = double_delta_longitude + previous_single_delta_longitude;

            way_node_latitude += single_delta_latitude;
            way_node_longitude += single_delta_longitude;
            way_node_longitude = Self::clamp_date_line(way_node_longitude);
            *way_node = LatLong::new(way_node_latitude, way_node_longitude);

            previous_single_delta_latitude = single_delta_latitude;
            previous_single_delta_longitude = single_delta_longitude;
        }

        Ok(())
    }

    /// Accumulated rounding can push a node a hair past the date line.
    fn clamp_date_line(longitude: f64) -> f64 {
        if longitude < LatLongUtils::LONGITUDE_MIN
            && (LatLongUtils::LONGITUDE_MIN - longitude).abs() < 0.001
        {
            LatLongUtils::LONGITUDE_MIN
        } else if longitude > LatLongUtils::LONGITUDE_MAX
            && (longitude - LatLongUtils::LONGITUDE_MAX).abs() < 0.001
        {
            LatLongUtils::LONGITUDE_MAX
        } else {
            longitude
        }
    }

    fn has_label_tag(tags: &[Tag]) -> bool {
        tags.iter()
            .any(|tag| tag.key == TAG_KEY_NAME || tag.key == TAG_KEY_REF)
    }

    fn way_intersects(way_nodes: &[Vec<LatLong>], bounding_box: &BoundingBox) -> bool {
        way_nodes.iter().any(|segment| {
            segment
                .iter()
                .any(|node| bounding_box.contains(node.latitude, node.longitude))
        })
    }
}

impl Drop for MapFile {
    fn drop(&mut self) {
        self.index_cache.destroy();
    }
}

impl std::fmt::Debug for MapFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapFile")
            .field("file_size", &self.file_size)
            .field("map_date", &self.map_file_info().map_date)
            .finish()
    }
}
