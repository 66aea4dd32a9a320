//! Compression building blocks shared by the codecs: PNG scanline filters,
//! zlib/DEFLATE, checksums, and the palette quantizer used by indexed BMPs.

pub mod adler32;
pub mod crc32;
pub mod deflate;
pub mod filter;
pub mod inflate;
pub mod palette;

pub use crc32::crc32;
pub use deflate::deflate_zlib;
pub use filter::{filter_scanline, unfilter_scanline, FilterError, FilterType};
pub use inflate::{inflate_zlib, InflateError};
pub use palette::Palette;
