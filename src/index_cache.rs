use std::io::{Read, Seek, SeekFrom};
use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::warn;

use crate::header::{SubFileParameter, BYTES_PER_INDEX_ENTRY};
use crate::MapFileError;

const INDEX_ENTRIES_PER_BLOCK: i64 = 128;
const SIZE_OF_INDEX_BLOCK: i64 = INDEX_ENTRIES_PER_BLOCK * BYTES_PER_INDEX_ENTRY as i64;

/// Converts a 5-byte big-endian index entry to its numeric value; the top
/// bit is the water flag, the low 39 bits the block offset.
fn five_bytes_to_long(buffer: &[u8], offset: usize) -> i64 {
    buffer[offset..offset + BYTES_PER_INDEX_ENTRY as usize]
        .iter()
        .fold(0i64, |value, &byte| (value << 8) | i64::from(byte))
}

#[derive(PartialEq, Eq, Hash)]
struct IndexCacheKey {
    sub_file_parameter: SubFileParameter,
    index_block_number: i64,
}

/// LRU cache over 128-entry slices of a sub-file's tile index, so repeated
/// tile queries touch the file once per slice.
pub struct IndexCache<R: Read + Seek> {
    map: LruCache<IndexCacheKey, Vec<u8>>,
    file_channel: R,
}

impl<R: Read + Seek> IndexCache<R> {
    pub fn new(file_channel: R, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            map: LruCache::new(capacity),
            file_channel,
        }
    }

    pub fn destroy(&mut self) {
        self.map.clear();
    }

    /// Raw index entry for `block_number`, fetched from the cache or the
    /// file. Returns 0 when the index is shorter than the entry demands.
    pub fn index_entry(
        &mut self,
        sub_file_parameter: &SubFileParameter,
        block_number: i64,
    ) -> Result<i64, MapFileError> {
        if block_number >= sub_file_parameter.number_of_blocks {
            return Err(MapFileError::TruncatedTileBlock(format!(
                "invalid block number: {}",
                block_number
            )));
        }

        let index_block_number = block_number / INDEX_ENTRIES_PER_BLOCK;
        let key = IndexCacheKey {
            sub_file_parameter: sub_file_parameter.clone(),
            index_block_number,
        };

        let Self { map, file_channel } = self;
        let index_block = map.try_get_or_insert(key, || {
            let index_block_position =
                sub_file_parameter.index_start_address + index_block_number * SIZE_OF_INDEX_BLOCK;
            let remaining_index_size = sub_file_parameter.index_end_address - index_block_position;
            let index_block_size = SIZE_OF_INDEX_BLOCK.min(remaining_index_size);

            if index_block_size <= 0 {
                return Err(MapFileError::TruncatedTileBlock(
                    "invalid index block size".to_string(),
                ));
            }

            let mut index_block = vec![0u8; index_block_size as usize];
            file_channel.seek(SeekFrom::Start(index_block_position as u64))?;
            if let Err(error) = file_channel.read_exact(&mut index_block) {
                if error.kind() == std::io::ErrorKind::UnexpectedEof {
                    warn!(index_block_position, "tile index shorter than expected");
                    index_block.clear();
                } else {
                    return Err(error.into());
                }
            }
            Ok(index_block)
        })?;

        let index_entry_in_block = block_number % INDEX_ENTRIES_PER_BLOCK;
        let address_in_index_block =
            (index_entry_in_block * i64::from(BYTES_PER_INDEX_ENTRY)) as usize;

        // A truncated slice resolves to entry 0, mirroring a sparse index.
        if address_in_index_block + BYTES_PER_INDEX_ENTRY as usize > index_block.len() {
            return Ok(0);
        }

        Ok(five_bytes_to_long(index_block, address_in_index_block))
    }
}
