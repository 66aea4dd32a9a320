pub mod codecs;
pub mod compression;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod image;
pub mod metrics;

use log::*;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

pub use crate::codecs::Codec;
pub use crate::compression::Palette;
pub use crate::constants::LOG_TARGET;
pub use crate::dispatch::{decode, encode};
pub use crate::error::{CodecError, Result};
pub use crate::image::{Bitmap, Color, PixelFormat};
pub use crate::metrics::{compression_rate, entropy, redundancy, CompressionReport};

/// Sends this crate's log records at debug level and above to `path`.
pub fn init_logging(path: impl AsRef<Path>) -> io::Result<()> {
    let target = Box::new(File::create(path)?);

    env_logger::Builder::new()
        .target(env_logger::Target::Pipe(target))
        .filter(Some(LOG_TARGET), LevelFilter::Debug)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .try_init()
        .map_err(io::Error::other)
}
