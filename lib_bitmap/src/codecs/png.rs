//! PNG codec for non-interlaced grayscale and truecolor images.
//!
//! Decoding accepts gray, gray+alpha, truecolor and truecolor+alpha at every
//! bit depth the format allows for them. Indexed PNGs are rejected.
//! Encoding always writes 8-bit samples (1-bit for [`PixelFormat::OneBit`])
//! with filter type 0 on every scanline.

use log::{debug, error, info};

use super::reader::ByteReader;
use crate::compression::crc32::Crc32;
use crate::compression::{
    deflate_zlib, filter_scanline, inflate_zlib, unfilter_scanline, FilterType,
};
use crate::constants::PNG_SIGNATURE;
use crate::error::{CodecError, Result};
use crate::image::{Bitmap, Color, PixelFormat};

const IHDR: [u8; 4] = *b"IHDR";
const IDAT: [u8; 4] = *b"IDAT";
const IEND: [u8; 4] = *b"IEND";
const IHDR_LEN: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorType {
    Gray = 0,
    Truecolor = 2,
    Indexed = 3,
    GrayAlpha = 4,
    TruecolorAlpha = 6,
}

impl ColorType {
    fn from_byte(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ColorType::Gray),
            2 => Ok(ColorType::Truecolor),
            3 => Ok(ColorType::Indexed),
            4 => Ok(ColorType::GrayAlpha),
            6 => Ok(ColorType::TruecolorAlpha),
            other => Err(CodecError::UnsupportedFormat(format!(
                "PNG color type {other}"
            ))),
        }
    }

    fn samples(self) -> usize {
        match self {
            ColorType::Gray | ColorType::Indexed => 1,
            ColorType::GrayAlpha => 2,
            ColorType::Truecolor => 3,
            ColorType::TruecolorAlpha => 4,
        }
    }

    fn allows_bit_depth(self, bit_depth: u8) -> bool {
        match self {
            ColorType::Gray => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
            ColorType::Indexed => matches!(bit_depth, 1 | 2 | 4 | 8),
            _ => matches!(bit_depth, 8 | 16),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ImageHeader {
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: ColorType,
}

impl ImageHeader {
    fn parse(data: &[u8]) -> Result<Self> {
        if data.len() != IHDR_LEN {
            error!("IHDR chunk has length {}", data.len());
            return Err(CodecError::InvalidSignature(format!(
                "IHDR length {}",
                data.len()
            )));
        }
        let mut reader = ByteReader::new(data);
        let width = reader.u32_be("IHDR width")?;
        let height = reader.u32_be("IHDR height")?;
        let bit_depth = reader.u8("IHDR bit depth")?;
        let color_type = ColorType::from_byte(reader.u8("IHDR color type")?)?;
        let compression = reader.u8("IHDR compression method")?;
        let filter = reader.u8("IHDR filter method")?;
        let interlace = reader.u8("IHDR interlace method")?;
        debug!(
            "IHDR: {}x{} bit_depth={} color_type={:?} compression={} filter={} interlace={}",
            width, height, bit_depth, color_type, compression, filter, interlace
        );

        if width == 0 || height == 0 {
            return Err(CodecError::InvalidSignature(format!(
                "PNG dimensions {width}x{height}"
            )));
        }
        if color_type == ColorType::Indexed {
            error!("Indexed PNG images are not supported");
            return Err(CodecError::UnsupportedFormat("indexed PNG".into()));
        }
        if !color_type.allows_bit_depth(bit_depth) {
            error!(
                "Invalid bit depth {} for color type {:?}",
                bit_depth, color_type
            );
            return Err(CodecError::UnsupportedFormat(format!(
                "PNG bit depth {bit_depth} with color type {color_type:?}"
            )));
        }
        if compression != 0 || filter != 0 {
            return Err(CodecError::UnsupportedFormat(format!(
                "PNG compression method {compression}, filter method {filter}"
            )));
        }
        if interlace != 0 {
            error!("Interlaced PNG images are not supported");
            return Err(CodecError::UnsupportedFormat("interlaced PNG".into()));
        }

        Ok(Self {
            width,
            height,
            bit_depth,
            color_type,
        })
    }

    /// Bytes between a byte and the one it is filtered against.
    fn filter_bytes_per_pixel(&self) -> usize {
        self.color_type.samples() * (self.bit_depth as usize).div_ceil(8)
    }

    fn stride(&self) -> usize {
        (self.width as usize * self.color_type.samples() * self.bit_depth as usize).div_ceil(8)
    }
}

/// Sample `index` of a reconstructed scanline, scaled to 8 bits.
fn sample(row: &[u8], index: usize, bit_depth: u8) -> u8 {
    match bit_depth {
        8 => row[index],
        16 => row[2 * index],
        depth => {
            let depth = depth as usize;
            let bit = index * depth;
            let shift = 8 - depth - bit % 8;
            let max = (1u16 << depth) - 1;
            let value = (row[bit / 8] >> shift) as u16 & max;
            (value * 255 / max) as u8
        }
    }
}

fn row_colors(row: &[u8], header: ImageHeader) -> impl Iterator<Item = Color> + '_ {
    let bit_depth = header.bit_depth;
    let color_type = header.color_type;
    let samples = color_type.samples();
    (0..header.width as usize).map(move |x| {
        let s = |channel: usize| sample(row, x * samples + channel, bit_depth);
        match color_type {
            ColorType::Gray | ColorType::Indexed => Color::gray(s(0)),
            ColorType::GrayAlpha => Color::gray(s(0)).with_alpha(s(1)),
            ColorType::Truecolor => Color::rgb(s(0), s(1), s(2)),
            ColorType::TruecolorAlpha => Color::rgba(s(0), s(1), s(2), s(3)),
        }
    })
}

/// Decodes a PNG file. The returned bitmap is tagged with `depth`.
pub fn decode(data: &[u8], depth: PixelFormat) -> Result<Bitmap> {
    if !data.starts_with(&PNG_SIGNATURE) {
        error!("Invalid PNG signature");
        return Err(CodecError::InvalidSignature("missing PNG signature".into()));
    }

    let mut reader = ByteReader::new(data);
    reader.skip(PNG_SIGNATURE.len(), "PNG signature")?;

    let mut header: Option<ImageHeader> = None;
    let mut compressed = Vec::new();
    let mut chunk_count = 0usize;

    loop {
        if reader.remaining() == 0 {
            error!("PNG stream ended before IEND");
            return Err(CodecError::truncated("IEND chunk", 12, 0));
        }
        let length = reader.u32_be("chunk length")? as usize;
        let chunk_type: [u8; 4] = reader
            .bytes(4, "chunk type")?
            .try_into()
            .map_err(|_| CodecError::truncated("chunk type", 4, 0))?;
        let payload = reader.bytes(length, "chunk data")?;
        let _crc = reader.u32_be("chunk CRC")?;
        chunk_count += 1;
        debug!(
            "Chunk {} ({} bytes)",
            String::from_utf8_lossy(&chunk_type),
            length
        );

        match (chunk_type, header.is_some()) {
            (IHDR, false) => header = Some(ImageHeader::parse(payload)?),
            (IHDR, _) => {
                error!("Unexpected IHDR chunk at position {}", chunk_count);
                return Err(CodecError::InvalidSignature("duplicate IHDR chunk".into()));
            }
            (_, false) => {
                error!("First chunk is not IHDR");
                return Err(CodecError::InvalidSignature("IHDR must come first".into()));
            }
            (IDAT, true) => compressed.extend_from_slice(payload),
            (IEND, true) => break,
            _ => {}
        }
    }

    let header = header.ok_or_else(|| CodecError::InvalidSignature("missing IHDR".into()))?;
    let stride = header.stride();
    let raw_len = (stride + 1)
        .checked_mul(header.height as usize)
        .ok_or_else(|| CodecError::UnsupportedFormat("PNG dimensions overflow".into()))?;

    // Anything past the scanlines is rejected by the inflater.
    let raw = inflate_zlib(&compressed, Some(raw_len))?;
    debug!(
        "Inflated {} bytes of image data into {} (expected {})",
        compressed.len(),
        raw.len(),
        raw_len
    );
    if raw.len() < raw_len {
        error!("Image data too short: {} < {}", raw.len(), raw_len);
        return Err(CodecError::truncated("image data", raw_len, raw.len()));
    }

    let bpp = header.filter_bytes_per_pixel();
    let mut bitmap = Bitmap::new(header.width, header.height, depth);
    let mut prev = vec![0u8; stride];
    let mut line = vec![0u8; stride];

    for (y, scanline) in raw[..raw_len].chunks_exact(stride + 1).enumerate() {
        let filter = FilterType::try_from(scanline[0])?;
        line.copy_from_slice(&scanline[1..]);
        unfilter_scanline(filter, &mut line, &prev, bpp);
        for (x, color) in row_colors(&line, header).enumerate() {
            bitmap.set_pixel(x as u32, y as u32, color)?;
        }
        std::mem::swap(&mut prev, &mut line);
    }

    info!(
        "Decoded {}x{} PNG ({:?}, {} bit)",
        header.width, header.height, header.color_type, header.bit_depth
    );
    Ok(bitmap)
}

fn write_chunk(out: &mut Vec<u8>, chunk_type: [u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(&chunk_type);
    out.extend_from_slice(data);

    let mut crc = Crc32::new();
    crc.update(&chunk_type);
    crc.update(data);
    out.extend_from_slice(&crc.finish().to_be_bytes());
}

fn layout(depth: PixelFormat) -> (ColorType, u8) {
    match depth {
        PixelFormat::OneBit => (ColorType::Gray, 1),
        PixelFormat::EightBit => (ColorType::Gray, 8),
        PixelFormat::SixteenBit => (ColorType::GrayAlpha, 8),
        PixelFormat::TwentyFourBit => (ColorType::Truecolor, 8),
        PixelFormat::ThirtyTwoBit => (ColorType::TruecolorAlpha, 8),
    }
}

fn encode_row(row: &[Color], depth: PixelFormat, out: &mut Vec<u8>) {
    match depth {
        PixelFormat::OneBit => {
            for pixels in row.chunks(8) {
                let mut byte = 0u8;
                for (bit, color) in pixels.iter().enumerate() {
                    byte |= color.to_bytes(PixelFormat::OneBit)[0] << (7 - bit);
                }
                out.push(byte);
            }
        }
        PixelFormat::SixteenBit => {
            for color in row {
                out.extend_from_slice(&[color.r, color.a]);
            }
        }
        PixelFormat::EightBit | PixelFormat::TwentyFourBit | PixelFormat::ThirtyTwoBit => {
            for color in row {
                out.extend(color.to_bytes(depth));
            }
        }
    }
}

/// Encodes `bitmap` at its own depth.
pub fn encode(bitmap: &Bitmap) -> Result<Vec<u8>> {
    let depth = bitmap.depth();
    let (color_type, bit_depth) = layout(depth);
    info!(
        "Encoding {}x{} bitmap as PNG ({:?}, {} bit)",
        bitmap.width(),
        bitmap.height(),
        color_type,
        bit_depth
    );

    let mut ihdr = Vec::with_capacity(IHDR_LEN);
    ihdr.extend_from_slice(&bitmap.width().to_be_bytes());
    ihdr.extend_from_slice(&bitmap.height().to_be_bytes());
    ihdr.push(bit_depth);
    ihdr.push(color_type as u8);
    ihdr.push(0); // Compression method
    ihdr.push(0); // Filter method
    ihdr.push(0); // Interlace method

    let bpp = depth.bytes_per_pixel();
    let mut raw = Vec::new();
    let mut prev = Vec::new();
    let mut line = Vec::new();
    for row in bitmap.rows() {
        line.clear();
        encode_row(row, depth, &mut line);
        prev.resize(line.len(), 0);
        raw.push(FilterType::None as u8);
        raw.extend(filter_scanline(FilterType::None, &line, &prev, bpp));
        std::mem::swap(&mut prev, &mut line);
    }
    let compressed = deflate_zlib(&raw);
    debug!(
        "Compressed {} bytes of scanlines into {}",
        raw.len(),
        compressed.len()
    );

    let mut out = Vec::with_capacity(PNG_SIGNATURE.len() + compressed.len() + 3 * 12 + IHDR_LEN);
    out.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut out, IHDR, &ihdr);
    write_chunk(&mut out, IDAT, &compressed);
    write_chunk(&mut out, IEND, &[]);

    info!("PNG encoding completed: {} bytes", out.len());
    Ok(out)
}
