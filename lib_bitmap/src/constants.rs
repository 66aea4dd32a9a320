pub const BMP_SIGNATURE: [u8; 2] = *b"BM";
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub const BMP_FILE_HEADER_SIZE: usize = 14;
pub const BMP_INFO_HEADER_SIZE: usize = 40;
pub const BMP_CORE_HEADER_SIZE: usize = 12;

pub const ICO_DIR_SIZE: usize = 6;
pub const ICO_DIR_ENTRY_SIZE: usize = 16;

/// Largest palette an indexed encoding may carry.
pub const MAX_PALETTE_SIZE: usize = 256;

pub const PPM_MAX_VALUE: u32 = 255;

/// Log target used by [`crate::init_logging`].
pub const LOG_TARGET: &str = "lib_bitmap";
