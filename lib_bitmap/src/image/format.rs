use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Bits-per-pixel target for a [`Bitmap`](super::Bitmap).
///
/// The depth decides how many bytes a [`Color`](super::Color) occupies when
/// serialized and which on-disk layout a codec picks when encoding
/// (palette or direct).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    OneBit,
    EightBit,
    SixteenBit,
    TwentyFourBit,
    ThirtyTwoBit,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 5] = [
        PixelFormat::OneBit,
        PixelFormat::EightBit,
        PixelFormat::SixteenBit,
        PixelFormat::TwentyFourBit,
        PixelFormat::ThirtyTwoBit,
    ];

    pub fn bits_per_pixel(self) -> u16 {
        match self {
            PixelFormat::OneBit => 1,
            PixelFormat::EightBit => 8,
            PixelFormat::SixteenBit => 16,
            PixelFormat::TwentyFourBit => 24,
            PixelFormat::ThirtyTwoBit => 32,
        }
    }

    /// Serialized width of one pixel. One-bit pixels still take a whole byte.
    pub fn bytes_per_pixel(self) -> usize {
        (self.bits_per_pixel() as usize + 7) / 8
    }

    pub fn from_bits(bits: u16) -> Result<Self> {
        match bits {
            1 => Ok(PixelFormat::OneBit),
            8 => Ok(PixelFormat::EightBit),
            16 => Ok(PixelFormat::SixteenBit),
            24 => Ok(PixelFormat::TwentyFourBit),
            32 => Ok(PixelFormat::ThirtyTwoBit),
            other => Err(CodecError::UnsupportedFormat(format!(
                "{other} bits per pixel"
            ))),
        }
    }

    /// Depths that the BMP encoder writes through a palette.
    pub fn is_indexed(self) -> bool {
        matches!(self, PixelFormat::OneBit | PixelFormat::EightBit)
    }
}
