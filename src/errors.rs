use std::io;

use thiserror::Error;

/// Errors raised while opening a map file or decoding tile payloads.
///
/// Header validation stops at the first failing clause; the variant carries
/// the offending value so the rendered message names it.
#[derive(Debug, Error)]
pub enum MapFileError {
    #[error("invalid magic byte: {0}")]
    InvalidMagic(String),

    #[error("unsupported file version: {0}")]
    UnsupportedVersion(i32),

    #[error("invalid remaining header size: {0}")]
    InvalidHeaderSize(i32),

    #[error("invalid file size: {0}")]
    InvalidFileSize(i64),

    #[error("invalid map date: {0}")]
    InvalidMapDate(i64),

    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("unsupported tile pixel size: {0}")]
    InvalidTilePixelSize(i32),

    #[error("unsupported projection: {0}")]
    UnsupportedProjection(String),

    #[error("invalid number of {kind} tags: {count}")]
    InvalidTagCount { kind: &'static str, count: i32 },

    #[error("{kind} tag must not be empty: {id}")]
    NullTag { kind: &'static str, id: i32 },

    #[error("buffer underflow while reading {0}")]
    BufferUnderflow(&'static str),

    #[error("{0}")]
    InvalidSubFiles(String),

    #[error("truncated tile block: {0}")]
    TruncatedTileBlock(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
