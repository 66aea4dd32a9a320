//! Windows bitmap (BMP) codec.
//!
//! Reads uncompressed files with a core (12 byte) or any of the
//! BITMAPINFOHEADER-family (40+ byte) headers at 1, 4, 8, 16, 24 or 32 bits
//! per pixel. Writes a 40 byte header; 1 and 8 bit targets go through a
//! palette, the rest are written directly.

use log::{debug, error, info};

use super::reader::ByteReader;
use crate::compression::Palette;
use crate::constants::{
    BMP_CORE_HEADER_SIZE, BMP_FILE_HEADER_SIZE, BMP_INFO_HEADER_SIZE, BMP_SIGNATURE,
    MAX_PALETTE_SIZE,
};
use crate::error::{CodecError, Result};
use crate::image::{Bitmap, Color, PixelFormat};

const SUPPORTED_INFO_HEADER_SIZES: [u32; 5] = [40, 52, 56, 108, 124];
const BI_RGB: u32 = 0;

/// The part of a DIB header this codec acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DibHeader {
    pub header_size: u32,
    pub width: i32,
    pub height: i32,
    pub bit_count: u16,
    pub compression: u32,
    pub colors_used: u32,
}

impl DibHeader {
    pub fn is_core(&self) -> bool {
        self.header_size as usize == BMP_CORE_HEADER_SIZE
    }

    /// Entries in the color table that follows the header.
    pub fn palette_len(&self) -> usize {
        if self.bit_count > 8 {
            return 0;
        }
        let max = 1usize << self.bit_count;
        match self.colors_used as usize {
            0 => max,
            n if self.is_core() || n > max => max,
            n => n,
        }
    }
}

/// Byte length of one stored row, padded to a multiple of four.
pub fn row_stride(width: u32, bits_per_pixel: u16) -> usize {
    let bits = width as usize * bits_per_pixel as usize;
    bits.div_ceil(32) * 4
}

pub(crate) fn read_dib_header(reader: &mut ByteReader<'_>) -> Result<DibHeader> {
    let start = reader.position();
    let header_size = reader.u32_le("DIB header size")?;

    let header = if header_size as usize == BMP_CORE_HEADER_SIZE {
        let width = reader.u16_le("core header width")?;
        let height = reader.u16_le("core header height")?;
        let _planes = reader.u16_le("core header planes")?;
        let bit_count = reader.u16_le("core header bit count")?;
        DibHeader {
            header_size,
            width: width as i32,
            height: height as i32,
            bit_count,
            compression: BI_RGB,
            colors_used: 0,
        }
    } else if SUPPORTED_INFO_HEADER_SIZES.contains(&header_size) {
        let width = reader.i32_le("info header width")?;
        let height = reader.i32_le("info header height")?;
        let _planes = reader.u16_le("info header planes")?;
        let bit_count = reader.u16_le("info header bit count")?;
        let compression = reader.u32_le("info header compression")?;
        let _image_size = reader.u32_le("info header image size")?;
        let _x_resolution = reader.i32_le("info header x resolution")?;
        let _y_resolution = reader.i32_le("info header y resolution")?;
        let colors_used = reader.u32_le("info header colors used")?;
        let _colors_important = reader.u32_le("info header important colors")?;
        DibHeader {
            header_size,
            width,
            height,
            bit_count,
            compression,
            colors_used,
        }
    } else {
        error!("Unsupported DIB header size {}", header_size);
        return Err(CodecError::UnsupportedFormat(format!(
            "DIB header size {header_size}"
        )));
    };

    // Skip whatever the V4/V5 headers carry past the first 40 bytes.
    reader.seek(start);
    reader.skip(header_size as usize, "DIB header")?;

    debug!(
        "DIB header: size={} width={} height={} bits={} compression={} colors_used={}",
        header.header_size,
        header.width,
        header.height,
        header.bit_count,
        header.compression,
        header.colors_used
    );

    if header.compression != BI_RGB {
        error!("Compressed BMP (method {}) is not supported", header.compression);
        return Err(CodecError::UnsupportedFormat(format!(
            "BMP compression method {}",
            header.compression
        )));
    }
    if !matches!(header.bit_count, 1 | 4 | 8 | 16 | 24 | 32) {
        error!("Unsupported BMP bit count {}", header.bit_count);
        return Err(CodecError::UnsupportedFormat(format!(
            "{} bits per pixel BMP",
            header.bit_count
        )));
    }
    if header.width < 0 {
        return Err(CodecError::InvalidSignature(format!(
            "negative BMP width {}",
            header.width
        )));
    }

    Ok(header)
}

/// Reads `len` color table entries: B,G,R for core headers, B,G,R,reserved
/// otherwise. Table colors are opaque.
pub(crate) fn read_color_table(
    reader: &mut ByteReader<'_>,
    len: usize,
    core: bool,
) -> Result<Palette> {
    let entry_size = if core { 3 } else { 4 };
    let table = reader.bytes(len * entry_size, "color table")?;
    let colors = table
        .chunks_exact(entry_size)
        .map(|entry| Color::rgb(entry[2], entry[1], entry[0]))
        .collect();
    Ok(Palette::from_colors(colors))
}

fn scale_5bit(value: u16) -> u8 {
    (value as u32 * 255 / 31) as u8
}

fn decode_pixel(row: &[u8], x: usize, bit_count: u16, palette: &Palette) -> Result<Color> {
    let color = match bit_count {
        1 => palette.color(((row[x / 8] >> (7 - x % 8)) & 0x01) as usize)?,
        4 => {
            let shift = if x % 2 == 0 { 4 } else { 0 };
            palette.color(((row[x / 2] >> shift) & 0x0F) as usize)?
        }
        8 => palette.color(row[x] as usize)?,
        16 => {
            let value = u16::from_le_bytes([row[2 * x], row[2 * x + 1]]);
            Color::rgb(
                scale_5bit((value >> 10) & 0x1F),
                scale_5bit((value >> 5) & 0x1F),
                scale_5bit(value & 0x1F),
            )
        }
        24 => Color::rgb(row[3 * x + 2], row[3 * x + 1], row[3 * x]),
        32 => Color::rgba(row[4 * x + 2], row[4 * x + 1], row[4 * x], row[4 * x + 3]),
        other => {
            return Err(CodecError::UnsupportedFormat(format!(
                "{other} bits per pixel BMP"
            )))
        }
    };
    Ok(color)
}

/// Reads `height` padded rows into a fresh bitmap. Rows are stored
/// bottom-up unless `top_down` is set.
pub(crate) fn read_pixel_rows(
    reader: &mut ByteReader<'_>,
    width: u32,
    height: u32,
    bit_count: u16,
    palette: &Palette,
    top_down: bool,
    depth: PixelFormat,
) -> Result<Bitmap> {
    let stride = row_stride(width, bit_count);
    let needed = stride
        .checked_mul(height as usize)
        .ok_or_else(|| CodecError::UnsupportedFormat("BMP dimensions overflow".into()))?;
    if needed > reader.remaining() {
        error!(
            "Pixel data needs {} bytes, only {} available",
            needed,
            reader.remaining()
        );
        return Err(CodecError::truncated("pixel data", needed, reader.remaining()));
    }

    let mut bitmap = Bitmap::new(width, height, depth);
    for stored_row in 0..height {
        let row = reader.bytes(stride, "pixel row")?;
        let y = if top_down {
            stored_row
        } else {
            height - 1 - stored_row
        };
        for x in 0..width {
            let color = decode_pixel(row, x as usize, bit_count, palette)?;
            bitmap.set_pixel(x, y, color)?;
        }
    }
    Ok(bitmap)
}

/// Decodes a BMP file. The returned bitmap is tagged with `depth`.
pub fn decode(data: &[u8], depth: PixelFormat) -> Result<Bitmap> {
    let mut reader = ByteReader::new(data);

    if data.len() < BMP_SIGNATURE.len() || !data.starts_with(&BMP_SIGNATURE) {
        error!("Invalid BMP signature");
        return Err(CodecError::InvalidSignature("missing 'BM' signature".into()));
    }
    reader.skip(2, "BMP signature")?;
    let _file_size = reader.u32_le("file size")?;
    let _reserved = reader.u32_le("reserved")?;
    let data_offset = reader.u32_le("pixel data offset")? as usize;

    let header = read_dib_header(&mut reader)?;
    let palette = read_color_table(&mut reader, header.palette_len(), header.is_core())?;
    debug!("Color table: {} entries", palette.len());

    let top_down = header.height < 0;
    let width = header.width as u32;
    let height = header.height.unsigned_abs();

    reader.seek(data_offset);
    let bitmap = read_pixel_rows(
        &mut reader,
        width,
        height,
        header.bit_count,
        &palette,
        top_down,
        depth,
    )?;

    info!(
        "Decoded {}x{} BMP ({} bits per pixel{})",
        width,
        height,
        header.bit_count,
        if top_down { ", top-down" } else { "" }
    );
    Ok(bitmap)
}

fn encode_row(row: &[Color], depth: PixelFormat, palette: Option<&Palette>, out: &mut Vec<u8>) {
    match (depth, palette) {
        (PixelFormat::OneBit, Some(palette)) => {
            for indices in palette.map_indices(row).chunks(8) {
                let mut byte = 0u8;
                for (bit, &index) in indices.iter().enumerate() {
                    byte |= (index & 0x01) << (7 - bit);
                }
                out.push(byte);
            }
        }
        (PixelFormat::EightBit, Some(palette)) => out.extend(palette.map_indices(row)),
        (PixelFormat::SixteenBit, _) => {
            for color in row {
                let value = (color.r as u16 >> 3) << 10 | (color.g as u16 >> 3) << 5 | color.b as u16 >> 3;
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
        (PixelFormat::ThirtyTwoBit, _) => {
            for color in row {
                out.extend_from_slice(&[color.b, color.g, color.r, color.a]);
            }
        }
        _ => {
            for color in row {
                out.extend_from_slice(&[color.b, color.g, color.r]);
            }
        }
    }
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| CodecError::UnsupportedFormat(format!("{value} bytes exceed BMP limits")))
}

/// Encodes `bitmap` at its own depth.
pub fn encode(bitmap: &Bitmap) -> Result<Vec<u8>> {
    let depth = bitmap.depth();
    let bits = depth.bits_per_pixel();
    info!(
        "Encoding {}x{} bitmap as {}-bit BMP",
        bitmap.width(),
        bitmap.height(),
        bits
    );

    let width = i32::try_from(bitmap.width())
        .map_err(|_| CodecError::UnsupportedFormat("BMP width exceeds i32".into()))?;
    let height = i32::try_from(bitmap.height())
        .map_err(|_| CodecError::UnsupportedFormat("BMP height exceeds i32".into()))?;

    let palette = depth.is_indexed().then(|| {
        let max_colors = if depth == PixelFormat::OneBit { 2 } else { MAX_PALETTE_SIZE };
        let palette = Palette::from_bitmap(bitmap, max_colors);
        // Readers take a color count of 0 to mean a full table.
        if palette.is_empty() {
            Palette::from_colors(vec![Color::BLACK])
        } else {
            palette
        }
    });
    let palette_len = palette.as_ref().map_or(0, Palette::len);

    let stride = row_stride(bitmap.width(), bits);
    let image_size = to_u32(stride * bitmap.height() as usize)?;
    let data_offset = to_u32(BMP_FILE_HEADER_SIZE + BMP_INFO_HEADER_SIZE + palette_len * 4)?;
    let file_size = data_offset
        .checked_add(image_size)
        .ok_or_else(|| CodecError::UnsupportedFormat("BMP file exceeds 4 GiB".into()))?;
    debug!(
        "BMP layout: stride={} image_size={} palette={} offset={} file_size={}",
        stride, image_size, palette_len, data_offset, file_size
    );

    let mut out = Vec::with_capacity(file_size as usize);

    // File header
    out.extend_from_slice(&BMP_SIGNATURE);
    out.extend_from_slice(&file_size.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // Reserved1
    out.extend_from_slice(&0u16.to_le_bytes()); // Reserved2
    out.extend_from_slice(&data_offset.to_le_bytes());

    // BITMAPINFOHEADER
    out.extend_from_slice(&(BMP_INFO_HEADER_SIZE as u32).to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // Planes
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(&BI_RGB.to_le_bytes());
    out.extend_from_slice(&image_size.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes()); // Horizontal resolution
    out.extend_from_slice(&0i32.to_le_bytes()); // Vertical resolution
    out.extend_from_slice(&(palette_len as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // Important colors

    if let Some(palette) = &palette {
        for color in palette.colors() {
            out.extend_from_slice(&[color.b, color.g, color.r, 0]);
        }
    }

    let mut row_bytes = Vec::with_capacity(stride);
    for row in bitmap.rows().rev() {
        row_bytes.clear();
        encode_row(row, depth, palette.as_ref(), &mut row_bytes);
        row_bytes.resize(stride, 0);
        out.extend_from_slice(&row_bytes);
    }

    debug_assert_eq!(out.len(), file_size as usize);
    info!("BMP encoding completed: {} bytes", out.len());
    Ok(out)
}
