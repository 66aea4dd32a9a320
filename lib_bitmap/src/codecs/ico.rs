//! Windows icon (ICO) decoder.
//!
//! Only the first image of the directory is decoded. Its payload is either
//! a complete PNG file or a headerless DIB whose height covers both the
//! color (XOR) rows and the 1-bit transparency (AND) mask.

use log::{debug, error, info};

use super::reader::ByteReader;
use super::{bmp, png};
use crate::constants::{ICO_DIR_ENTRY_SIZE, ICO_DIR_SIZE, PNG_SIGNATURE};
use crate::error::{CodecError, Result};
use crate::image::{Bitmap, PixelFormat};

const ICON_TYPE: u16 = 1;

/// One ICONDIRENTRY record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconDirEntry {
    /// Width in pixels; the stored 0 means 256.
    pub width: u32,
    pub height: u32,
    pub color_count: u8,
    pub planes: u16,
    pub bit_count: u16,
    pub byte_size: u32,
    pub data_offset: u32,
}

impl IconDirEntry {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let dimension = |value: u8| if value == 0 { 256 } else { value as u32 };
        let width = dimension(reader.u8("icon entry width")?);
        let height = dimension(reader.u8("icon entry height")?);
        let color_count = reader.u8("icon entry color count")?;
        let _reserved = reader.u8("icon entry reserved")?;
        Ok(Self {
            width,
            height,
            color_count,
            planes: reader.u16_le("icon entry planes")?,
            bit_count: reader.u16_le("icon entry bit count")?,
            byte_size: reader.u32_le("icon entry size")?,
            data_offset: reader.u32_le("icon entry offset")?,
        })
    }

    /// The payload bytes this entry points at.
    fn payload<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        let mut reader = ByteReader::new(data);
        reader.seek(self.data_offset as usize);
        reader.bytes(self.byte_size as usize, "icon image data")
    }
}

/// Parses the ICONDIR header and all of its entries.
pub fn read_directory(data: &[u8]) -> Result<Vec<IconDirEntry>> {
    let mut reader = ByteReader::new(data);
    let reserved = reader.u16_le("icon directory reserved")?;
    let image_type = reader.u16_le("icon directory type")?;
    let count = reader.u16_le("icon directory count")?;
    debug!(
        "ICONDIR: reserved={} type={} count={}",
        reserved, image_type, count
    );

    if reserved != 0 || image_type != ICON_TYPE || count == 0 {
        error!("Invalid icon directory header");
        return Err(CodecError::InvalidSignature(format!(
            "icon directory reserved={reserved} type={image_type} count={count}"
        )));
    }

    let needed = ICO_DIR_SIZE + count as usize * ICO_DIR_ENTRY_SIZE;
    if data.len() < needed {
        error!("Icon directory needs {} bytes, got {}", needed, data.len());
        return Err(CodecError::truncated("icon directory entries", needed, data.len()));
    }

    (0..count)
        .map(|_| IconDirEntry::read(&mut reader))
        .collect()
}

fn decode_dib(payload: &[u8], depth: PixelFormat) -> Result<Bitmap> {
    let mut reader = ByteReader::new(payload);
    let header = bmp::read_dib_header(&mut reader)?;
    if header.bit_count == 16 {
        error!("16-bit icon images are not supported");
        return Err(CodecError::UnsupportedFormat("16 bits per pixel icon".into()));
    }

    let palette = bmp::read_color_table(&mut reader, header.palette_len(), header.is_core())?;
    let width = header.width as u32;
    let height = header.height.unsigned_abs() / 2;
    debug!(
        "Icon DIB: {}x{} at {} bits, {} palette entries",
        width,
        height,
        header.bit_count,
        palette.len()
    );

    let mut bitmap = bmp::read_pixel_rows(
        &mut reader,
        width,
        height,
        header.bit_count,
        &palette,
        false,
        depth,
    )?;

    let mask_stride = bmp::row_stride(width, 1);
    let mask = reader.bytes(mask_stride * height as usize, "icon AND mask")?;
    for (stored_row, bits) in mask.chunks_exact(mask_stride.max(1)).enumerate() {
        let y = height - 1 - stored_row as u32;
        for x in 0..width {
            let transparent = (bits[x as usize / 8] >> (7 - x % 8)) & 0x01 == 1;
            let color = bitmap.get_pixel(x, y)?;
            bitmap.set_pixel(x, y, color.with_alpha(if transparent { 0 } else { 255 }))?;
        }
    }

    Ok(bitmap)
}

/// Decodes the first image of an ICO file. The returned bitmap is tagged
/// with `depth`.
pub fn decode(data: &[u8], depth: PixelFormat) -> Result<Bitmap> {
    let entries = read_directory(data)?;
    let entry = entries[0];
    debug!("Selected icon entry {:?}", entry);

    let payload = entry.payload(data)?;
    let bitmap = if payload.starts_with(&PNG_SIGNATURE) {
        debug!("Icon payload is PNG");
        png::decode(payload, depth)?
    } else {
        decode_dib(payload, depth)?
    };

    info!(
        "Decoded {}x{} icon ({} entries in directory)",
        bitmap.width(),
        bitmap.height(),
        entries.len()
    );
    Ok(bitmap)
}
