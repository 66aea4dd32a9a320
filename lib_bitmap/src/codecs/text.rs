//! Plain-text pixel dump.
//!
//! ```text
//! 2 1
//! 255,0,0 0,0,255
//! ```
//!
//! The first line holds `width height`, every following line one row of
//! space separated `R,G,B` triples. Alpha is not stored.

use log::{debug, error, info};

use crate::error::{CodecError, Result};
use crate::image::{Bitmap, Color, PixelFormat};

fn malformed(what: &str, token: &str) -> CodecError {
    error!("Malformed {} in text dump: {:?}", what, token);
    CodecError::InvalidSignature(format!("malformed {what} {token:?}"))
}

fn parse_dimension(token: Option<&str>, what: &'static str) -> Result<u32> {
    let token = token.ok_or_else(|| CodecError::truncated(what, 1, 0))?;
    token.parse().map_err(|_| malformed(what, token))
}

fn parse_pixel(token: &str) -> Result<Color> {
    let mut channels = token.split(',').map(|channel| channel.parse::<u8>());
    match (channels.next(), channels.next(), channels.next(), channels.next()) {
        (Some(Ok(r)), Some(Ok(g)), Some(Ok(b)), None) => Ok(Color::rgb(r, g, b)),
        _ => Err(malformed("pixel", token)),
    }
}

/// Decodes a text dump. The returned bitmap is tagged with `depth`.
pub fn decode(data: &[u8], depth: PixelFormat) -> Result<Bitmap> {
    let text = std::str::from_utf8(data)
        .map_err(|_| CodecError::InvalidSignature("text dump is not UTF-8".into()))?;
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

    let mut size = lines.next().unwrap_or_default().split_whitespace();
    let width = parse_dimension(size.next(), "width")?;
    let height = parse_dimension(size.next(), "height")?;
    debug!("Text dump header: {}x{}", width, height);

    let mut pixels = Vec::new();
    // Rows of a zero-width dump are blank lines.
    let rows = if width == 0 { 0 } else { height };
    for y in 0..rows {
        let line = lines
            .next()
            .ok_or_else(|| CodecError::truncated("text dump rows", height as usize, y as usize))?;
        let row = line
            .split_whitespace()
            .take(width as usize)
            .map(parse_pixel)
            .collect::<Result<Vec<_>>>()?;
        if row.len() < width as usize {
            error!("Row {} has {} of {} pixels", y, row.len(), width);
            return Err(CodecError::truncated("text dump row", width as usize, row.len()));
        }
        pixels.extend(row);
    }

    let mut bitmap = Bitmap::new(width, height, depth);
    for (i, color) in pixels.into_iter().enumerate() {
        let (x, y) = ((i % width as usize) as u32, (i / width as usize) as u32);
        bitmap.set_pixel(x, y, color)?;
    }

    info!("Decoded {}x{} text dump", width, height);
    Ok(bitmap)
}

/// Encodes `bitmap` as a text dump.
pub fn encode(bitmap: &Bitmap) -> Result<Vec<u8>> {
    let mut out = format!("{} {}\n", bitmap.width(), bitmap.height());
    for row in bitmap.rows() {
        let line = row
            .iter()
            .map(|color| format!("{},{},{}", color.r, color.g, color.b))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&line);
        out.push('\n');
    }
    info!(
        "Encoded {}x{} bitmap as text dump: {} bytes",
        bitmap.width(),
        bitmap.height(),
        out.len()
    );
    Ok(out.into_bytes())
}
