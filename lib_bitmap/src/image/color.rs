use serde::{Deserialize, Serialize};

use super::format::PixelFormat;
use crate::error::{CodecError, Result};

/// An RGBA color with 8 bits per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub const fn gray(value: u8) -> Self {
        Self::rgb(value, value, value)
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Reads one pixel serialized at `depth` starting at `offset`.
    ///
    /// The one-bit and sixteen-bit layouts are this engine's own contract,
    /// not the conventional ones: a one-bit pixel only carries `r` (alpha
    /// stays 0), and a sixteen-bit pixel is the raw `r`, `g` pair rather
    /// than a packed 5-6-5 value.
    pub fn from_bytes(buffer: &[u8], offset: usize, depth: PixelFormat) -> Result<Self> {
        let len = depth.bytes_per_pixel();
        let bytes = offset
            .checked_add(len)
            .and_then(|end| buffer.get(offset..end))
            .ok_or_else(|| {
                CodecError::truncated("pixel", len, buffer.len().saturating_sub(offset))
            })?;

        Ok(match depth {
            PixelFormat::OneBit => Color::rgba(bytes[0], 0, 0, 0),
            PixelFormat::EightBit => Color::gray(bytes[0]),
            PixelFormat::SixteenBit => Color::rgb(bytes[0], bytes[1], 0),
            PixelFormat::TwentyFourBit => Color::rgb(bytes[0], bytes[1], bytes[2]),
            PixelFormat::ThirtyTwoBit => Color::rgba(bytes[0], bytes[1], bytes[2], bytes[3]),
        })
    }

    /// Inverse of [`Color::from_bytes`].
    pub fn to_bytes(&self, depth: PixelFormat) -> Vec<u8> {
        match depth {
            PixelFormat::OneBit => vec![u8::from(self.r > 127)],
            PixelFormat::EightBit => vec![self.r],
            PixelFormat::SixteenBit => vec![self.r, self.g],
            PixelFormat::TwentyFourBit => vec![self.r, self.g, self.b],
            PixelFormat::ThirtyTwoBit => vec![self.r, self.g, self.b, self.a],
        }
    }

    /// Squared euclidean distance over the RGB channels; alpha is ignored.
    pub fn distance_squared(&self, other: &Color) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_24bit_round_trip() {
        let color = Color::rgb(10, 20, 30);
        let bytes = color.to_bytes(PixelFormat::TwentyFourBit);
        assert_eq!(bytes, vec![10, 20, 30]);
        assert_eq!(
            Color::from_bytes(&bytes, 0, PixelFormat::TwentyFourBit).unwrap(),
            color
        );
    }

    #[test]
    fn test_32bit_keeps_alpha() {
        let color = Color::rgba(1, 2, 3, 4);
        let bytes = color.to_bytes(PixelFormat::ThirtyTwoBit);
        assert_eq!(
            Color::from_bytes(&bytes, 0, PixelFormat::ThirtyTwoBit).unwrap(),
            color
        );
    }

    #[test]
    fn test_8bit_is_gray_from_red() {
        let color = Color::rgb(200, 10, 10);
        assert_eq!(color.to_bytes(PixelFormat::EightBit), vec![200]);
        assert_eq!(
            Color::from_bytes(&[200], 0, PixelFormat::EightBit).unwrap(),
            Color::rgba(200, 200, 200, 255)
        );
    }

    // Diverges from conventional 1-bit formats: no white expansion, alpha 0.
    #[test]
    fn test_1bit_only_carries_red() {
        assert_eq!(Color::rgb(128, 0, 0).to_bytes(PixelFormat::OneBit), vec![1]);
        assert_eq!(Color::rgb(127, 255, 255).to_bytes(PixelFormat::OneBit), vec![0]);
        assert_eq!(
            Color::from_bytes(&[1], 0, PixelFormat::OneBit).unwrap(),
            Color::rgba(1, 0, 0, 0)
        );
    }

    // Diverges from conventional 16-bit formats: raw R,G bytes, not 5-6-5.
    #[test]
    fn test_16bit_is_raw_red_green() {
        let color = Color::rgba(12, 34, 56, 78);
        assert_eq!(color.to_bytes(PixelFormat::SixteenBit), vec![12, 34]);
        assert_eq!(
            Color::from_bytes(&[12, 34], 0, PixelFormat::SixteenBit).unwrap(),
            Color::rgba(12, 34, 0, 255)
        );
    }

    #[test]
    fn test_from_bytes_with_offset() {
        let buffer = [0, 0, 7, 8, 9];
        assert_eq!(
            Color::from_bytes(&buffer, 2, PixelFormat::TwentyFourBit).unwrap(),
            Color::rgb(7, 8, 9)
        );
    }

    #[test]
    fn test_from_bytes_truncated() {
        let result = Color::from_bytes(&[1, 2], 0, PixelFormat::ThirtyTwoBit);
        assert!(matches!(
            result,
            Err(CodecError::TruncatedData {
                needed: 4,
                available: 2,
                ..
            })
        ));
        assert!(Color::from_bytes(&[1, 2], 5, PixelFormat::EightBit).is_err());
    }

    #[test]
    fn test_distance_ignores_alpha() {
        let a = Color::rgba(0, 0, 0, 0);
        let b = Color::rgba(3, 4, 0, 255);
        assert_eq!(a.distance_squared(&b), 25);
    }
}
