use std::path::Path;

use super::Codec;
use crate::error::{CodecError, Result};

/// Lower-case file extensions and the codec that handles them.
pub const REGISTRY: &[(&str, Codec)] = &[
    ("bmp", Codec::Bmp),
    ("png", Codec::Png),
    ("ico", Codec::Ico),
    ("ppm", Codec::Ppm),
    ("txt", Codec::Text),
];

impl Codec {
    /// Looks up `extension`, with or without its leading dot, ignoring case.
    pub fn from_extension(extension: &str) -> Result<Self> {
        let wanted = extension.strip_prefix('.').unwrap_or(extension);
        REGISTRY
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(wanted))
            .map(|&(_, codec)| codec)
            .ok_or_else(|| {
                CodecError::UnsupportedFormat(format!("unknown file extension {extension:?}"))
            })
    }

    pub fn for_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .ok_or_else(|| {
                CodecError::UnsupportedFormat(format!("{} has no file extension", path.display()))
            })?;
        Self::from_extension(extension)
    }
}
