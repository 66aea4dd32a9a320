//! Netpbm pixmap (PPM) codec, plain (P3) and raw (P6).
//!
//! Only a max value of 255 is accepted. Decoded bitmaps are always 24-bit.

use log::{debug, error, info};

use crate::constants::PPM_MAX_VALUE;
use crate::error::{CodecError, Result};
use crate::image::{Bitmap, Color, PixelFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Plain,
    Raw,
}

/// Whitespace separated tokens with `#` comments running to end of line.
struct Tokens<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn next_token(&mut self) -> Option<&'a [u8]> {
        loop {
            while self.pos < self.data.len() && self.data[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.data.get(self.pos) == Some(&b'#') {
                while self.pos < self.data.len() && self.data[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            break;
        }

        let start = self.pos;
        while self.pos < self.data.len() && !self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        (self.pos > start).then(|| &self.data[start..self.pos])
    }

    fn number(&mut self, context: &'static str) -> Result<u32> {
        let token = self
            .next_token()
            .ok_or_else(|| CodecError::truncated(context, 1, 0))?;
        std::str::from_utf8(token)
            .ok()
            .and_then(|text| text.parse().ok())
            .ok_or_else(|| {
                error!("Malformed PPM {}: {:?}", context, String::from_utf8_lossy(token));
                CodecError::InvalidSignature(format!(
                    "malformed {context} {:?}",
                    String::from_utf8_lossy(token)
                ))
            })
    }
}

fn sample(tokens: &mut Tokens<'_>) -> Result<u8> {
    let value = tokens.number("sample")?;
    u8::try_from(value)
        .map_err(|_| CodecError::InvalidSignature(format!("sample {value} exceeds 255")))
}

/// Decodes a P3 or P6 file into a 24-bit bitmap. `_depth` is accepted for
/// symmetry with the other codecs.
pub fn decode(data: &[u8], _depth: PixelFormat) -> Result<Bitmap> {
    let variant = match data.get(..2) {
        Some(b"P3") => Variant::Plain,
        Some(b"P6") => Variant::Raw,
        _ => {
            error!("Invalid PPM magic number");
            return Err(CodecError::InvalidSignature("missing P3/P6 magic".into()));
        }
    };

    let mut tokens = Tokens::new(data, 2);
    let width = tokens.number("width")?;
    let height = tokens.number("height")?;
    let max_value = tokens.number("max value")?;
    debug!(
        "PPM header: {:?} {}x{} max={}",
        variant, width, height, max_value
    );

    if max_value != PPM_MAX_VALUE {
        error!("Unsupported PPM max value {}", max_value);
        return Err(CodecError::UnsupportedFormat(format!(
            "PPM max value {max_value}"
        )));
    }

    let pixel_count = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| CodecError::UnsupportedFormat("PPM dimensions overflow".into()))?;
    let bitmap = match variant {
        Variant::Raw => {
            // A single whitespace byte separates the header from the samples.
            let start = tokens.pos + 1;
            let needed = pixel_count.saturating_mul(3);
            let available = data.len().saturating_sub(start);
            if available < needed {
                error!("PPM pixel data needs {} bytes, got {}", needed, available);
                return Err(CodecError::truncated("PPM pixel data", needed, available));
            }
            let mut bitmap = Bitmap::new(width, height, PixelFormat::TwentyFourBit);
            for i in 0..pixel_count {
                let color = Color::from_bytes(data, start + 3 * i, PixelFormat::TwentyFourBit)?;
                let (x, y) = ((i % width as usize) as u32, (i / width as usize) as u32);
                bitmap.set_pixel(x, y, color)?;
            }
            bitmap
        }
        Variant::Plain => {
            // Every sample takes at least one digit and one separator.
            let needed = pixel_count.saturating_mul(6).saturating_sub(1);
            let available = data.len().saturating_sub(tokens.pos);
            if available < needed {
                error!("PPM samples need at least {} bytes, got {}", needed, available);
                return Err(CodecError::truncated("PPM samples", needed, available));
            }
            let mut bitmap = Bitmap::new(width, height, PixelFormat::TwentyFourBit);
            for y in 0..height {
                for x in 0..width {
                    let r = sample(&mut tokens)?;
                    let g = sample(&mut tokens)?;
                    let b = sample(&mut tokens)?;
                    bitmap.set_pixel(x, y, Color::rgb(r, g, b))?;
                }
            }
            bitmap
        }
    };

    info!("Decoded {}x{} PPM ({:?})", width, height, variant);
    Ok(bitmap)
}

fn header(magic: &str, bitmap: &Bitmap) -> String {
    format!(
        "{}\n{} {}\n{}\n",
        magic,
        bitmap.width(),
        bitmap.height(),
        PPM_MAX_VALUE
    )
}

/// Encodes `bitmap` as raw P6. Alpha is dropped.
pub fn encode(bitmap: &Bitmap) -> Result<Vec<u8>> {
    let mut out = header("P6", bitmap).into_bytes();
    out.reserve(bitmap.pixel_count() * 3);
    for color in bitmap.pixels() {
        out.extend_from_slice(&[color.r, color.g, color.b]);
    }
    info!(
        "Encoded {}x{} bitmap as P6 PPM: {} bytes",
        bitmap.width(),
        bitmap.height(),
        out.len()
    );
    Ok(out)
}

/// Encodes `bitmap` as plain P3 with one sample per line.
pub fn encode_ascii(bitmap: &Bitmap) -> Result<Vec<u8>> {
    let mut out = header("P3", bitmap);
    for color in bitmap.pixels() {
        for value in [color.r, color.g, color.b] {
            out.push_str(&value.to_string());
            out.push('\n');
        }
    }
    info!(
        "Encoded {}x{} bitmap as P3 PPM: {} bytes",
        bitmap.width(),
        bitmap.height(),
        out.len()
    );
    Ok(out.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_with_comments() {
        let data = b"P3\n# made by hand\n2 1 # trailing\n255\n255 0 0\n0 0 255\n";
        let bitmap = decode(data, PixelFormat::EightBit).unwrap();
        assert_eq!(bitmap.depth(), PixelFormat::TwentyFourBit);
        assert_eq!(bitmap.get_pixel(0, 0).unwrap(), Color::rgb(255, 0, 0));
        assert_eq!(bitmap.get_pixel(1, 0).unwrap(), Color::rgb(0, 0, 255));
    }

    #[test]
    fn test_raw() {
        let mut data = b"P6\n1 2\n255\n".to_vec();
        data.extend_from_slice(&[1, 2, 3, 10, 11, 12]);
        let bitmap = decode(&data, PixelFormat::TwentyFourBit).unwrap();
        assert_eq!(bitmap.get_pixel(0, 0).unwrap(), Color::rgb(1, 2, 3));
        assert_eq!(bitmap.get_pixel(0, 1).unwrap(), Color::rgb(10, 11, 12));
    }

    #[test]
    fn test_raw_sample_that_looks_like_whitespace() {
        let mut data = b"P6 1 1 255\n".to_vec();
        data.extend_from_slice(&[b'\n', b' ', b'#']);
        let bitmap = decode(&data, PixelFormat::TwentyFourBit).unwrap();
        assert_eq!(bitmap.get_pixel(0, 0).unwrap(), Color::rgb(b'\n', b' ', b'#'));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            decode(b"P5\n1 1\n255\n\0", PixelFormat::TwentyFourBit),
            Err(CodecError::InvalidSignature(_))
        ));
        assert!(matches!(
            decode(b"P3\n1 1\n65535\n0 0 0\n", PixelFormat::TwentyFourBit),
            Err(CodecError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            decode(b"P3\n1 x\n255\n", PixelFormat::TwentyFourBit),
            Err(CodecError::InvalidSignature(_))
        ));
        assert!(matches!(
            decode(b"P3\n1 1\n255\n0 0\n", PixelFormat::TwentyFourBit),
            Err(CodecError::TruncatedData { .. })
        ));
        assert!(matches!(
            decode(b"P6\n2 1\n255\n\x01\x02\x03", PixelFormat::TwentyFourBit),
            Err(CodecError::TruncatedData { needed: 6, available: 3, .. })
        ));
    }

    #[test]
    fn test_encode_layouts() {
        let mut bitmap = Bitmap::new(1, 1, PixelFormat::ThirtyTwoBit);
        bitmap.set_pixel(0, 0, Color::rgba(7, 8, 9, 0)).unwrap();
        assert_eq!(encode(&bitmap).unwrap(), b"P6\n1 1\n255\n\x07\x08\x09".to_vec());
        assert_eq!(
            encode_ascii(&bitmap).unwrap(),
            b"P3\n1 1\n255\n7\n8\n9\n".to_vec()
        );
    }
}
