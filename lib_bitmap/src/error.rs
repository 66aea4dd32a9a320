use std::io;

use thiserror::Error;

use crate::compression::filter::FilterError;
use crate::compression::inflate::InflateError;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Invalid signature or header: {0}")]
    InvalidSignature(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Truncated data while reading {context}: needed {needed} bytes, {available} available")]
    TruncatedData {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("coordinates ({x}, {y}) are out of bounds for a {width}x{height} bitmap")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("Invalid palette index: {index} exceeds palette size of {size}")]
    InvalidPaletteIndex { index: usize, size: usize },

    #[error("Scanline reconstruction failed")]
    Filter(#[from] FilterError),

    #[error("Decompression failed")]
    Decompression(#[from] InflateError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;

impl CodecError {
    pub(crate) fn truncated(context: &'static str, needed: usize, available: usize) -> Self {
        CodecError::TruncatedData {
            context,
            needed,
            available,
        }
    }
}
