#![allow(dead_code)]

use lib_bitmap::compression::crc32;
use lib_bitmap::{Bitmap, Color, PixelFormat};

/// Deterministic pseudo-random opaque colors.
pub fn random_bitmap(width: u32, height: u32, depth: PixelFormat, seed: u32) -> Bitmap {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state
    };

    let mut bitmap = Bitmap::new(width, height, depth);
    for y in 0..height {
        for x in 0..width {
            let [r, g, b, _] = next().to_le_bytes();
            bitmap.set_pixel(x, y, Color::rgb(r, g, b)).unwrap();
        }
    }
    bitmap
}

pub fn gradient(width: u32, height: u32, depth: PixelFormat) -> Bitmap {
    let mut bitmap = Bitmap::new(width, height, depth);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width.max(2).saturating_sub(1)) as u8;
            let g = (y * 255 / height.max(2).saturating_sub(1)) as u8;
            bitmap.set_pixel(x, y, Color::rgb(r, g, 128)).unwrap();
        }
    }
    bitmap
}

pub fn chunk(chunk_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = (data.len() as u32).to_be_bytes().to_vec();
    let mut crc_input = chunk_type.to_vec();
    crc_input.extend_from_slice(data);
    out.extend_from_slice(&crc_input);
    out.extend_from_slice(&crc32(&crc_input).to_be_bytes());
    out
}

/// A 1x1 8-bit grayscale PNG holding a single white pixel, stored without
/// compression.
pub fn white_png() -> Vec<u8> {
    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&1u32.to_be_bytes());
    ihdr.extend_from_slice(&1u32.to_be_bytes());
    ihdr.extend_from_slice(&[8, 0, 0, 0, 0]);

    let idat = [
        0x78, 0x01, // zlib header
        0x01, 0x02, 0x00, 0xFD, 0xFF, // final stored block, 2 bytes
        0x00, 0xFF, // filter None, white
        0x01, 0x01, 0x01, 0x00, // adler32
    ];

    let mut out = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    out.extend(chunk(b"IHDR", &ihdr));
    out.extend(chunk(b"IDAT", &idat));
    out.extend(chunk(b"IEND", &[]));
    out
}

/// Wraps `payload` in a single-entry icon directory.
pub fn icon_file(width: u8, height: u8, bit_count: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&[width, height, 0, 0]);
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&bit_count.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&22u32.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// BITMAPINFOHEADER as stored inside an icon: the height covers the color
/// rows and the mask rows.
pub fn icon_dib_header(width: i32, height: i32, bit_count: u16, colors_used: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&(height * 2).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&bit_count.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // BI_RGB
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&colors_used.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out
}

/// Decodes the encoding of `bitmap` with `codec` at the bitmap's depth.
pub fn reencode(codec: lib_bitmap::Codec, bitmap: &Bitmap) -> Bitmap {
    let encoded = codec.encode(bitmap).unwrap();
    codec.decode(&encoded, bitmap.depth()).unwrap()
}
