//! File-level entry points: pick a codec from the file extension and run it.

use std::fs;
use std::path::Path;

use log::{error, info};

use crate::codecs::Codec;
use crate::error::Result;
use crate::image::{Bitmap, PixelFormat};

/// Reads and decodes the image at `path`, tagging it with `depth`.
pub fn decode(path: impl AsRef<Path>, depth: PixelFormat) -> Result<Bitmap> {
    let path = path.as_ref();
    let codec = Codec::for_path(path)?;
    info!("Decoding {} as {}", path.display(), codec.name());

    let data = fs::read(path).map_err(|e| {
        error!("Failed to read {}: {}", path.display(), e);
        e
    })?;
    codec.decode(&data, depth)
}

/// Encodes `bitmap` in the format named by the extension of `path`.
///
/// The file is only written once the whole encoding succeeded.
pub fn encode(bitmap: &Bitmap, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let codec = Codec::for_path(path)?;
    info!(
        "Encoding {}x{} bitmap to {} as {}",
        bitmap.width(),
        bitmap.height(),
        path.display(),
        codec.name()
    );

    let data = codec.encode(bitmap)?;
    fs::write(path, &data).map_err(|e| {
        error!("Failed to write {}: {}", path.display(), e);
        e
    })?;
    info!("Wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}
