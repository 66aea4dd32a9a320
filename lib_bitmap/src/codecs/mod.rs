//! Container formats. Every codec turns bytes into a [`Bitmap`] tagged with
//! the requested depth, and (except ICO) a bitmap back into bytes at the
//! bitmap's own depth.

pub mod bmp;
pub mod ico;
pub mod png;
pub mod ppm;
mod reader;
mod registry;
pub mod text;

pub use registry::REGISTRY;

use crate::error::{CodecError, Result};
use crate::image::{Bitmap, PixelFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    Bmp,
    Png,
    Ico,
    Ppm,
    Text,
}

impl Codec {
    pub fn name(self) -> &'static str {
        match self {
            Codec::Bmp => "BMP",
            Codec::Png => "PNG",
            Codec::Ico => "ICO",
            Codec::Ppm => "PPM",
            Codec::Text => "text dump",
        }
    }

    pub fn can_encode(self) -> bool {
        self != Codec::Ico
    }

    pub fn decode(self, data: &[u8], depth: PixelFormat) -> Result<Bitmap> {
        match self {
            Codec::Bmp => bmp::decode(data, depth),
            Codec::Png => png::decode(data, depth),
            Codec::Ico => ico::decode(data, depth),
            Codec::Ppm => ppm::decode(data, depth),
            Codec::Text => text::decode(data, depth),
        }
    }

    pub fn encode(self, bitmap: &Bitmap) -> Result<Vec<u8>> {
        match self {
            Codec::Bmp => bmp::encode(bitmap),
            Codec::Png => png::encode(bitmap),
            Codec::Ico => Err(CodecError::UnsupportedFormat(
                "ICO files can only be decoded".into(),
            )),
            Codec::Ppm => ppm::encode(bitmap),
            Codec::Text => text::encode(bitmap),
        }
    }
}
