pub mod bitmap;
pub mod color;
pub mod format;

pub use bitmap::Bitmap;
pub use color::Color;
pub use format::PixelFormat;
