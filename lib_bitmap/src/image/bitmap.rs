use super::color::Color;
use super::format::PixelFormat;
use crate::error::{CodecError, Result};

/// In-memory pixel grid, independent of any on-disk format.
///
/// Pixels are stored row-major. The depth does not change what is stored,
/// only how codecs serialize the pixels on encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    depth: PixelFormat,
    pixels: Vec<Color>,
}

impl Bitmap {
    /// Creates a bitmap with every pixel set to [`Color::TRANSPARENT`].
    pub fn new(width: u32, height: u32, depth: PixelFormat) -> Self {
        Self {
            width,
            height,
            depth,
            pixels: vec![Color::TRANSPARENT; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> PixelFormat {
        self.depth
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Re-tags the bitmap with another depth. Pixels are left untouched.
    pub fn with_depth(self, depth: PixelFormat) -> Self {
        Self { depth, ..self }
    }

    fn index(&self, x: u32, y: u32) -> Result<usize> {
        if x >= self.width || y >= self.height {
            return Err(CodecError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y as usize * self.width as usize + x as usize)
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Result<Color> {
        let index = self.index(x, y)?;
        Ok(self.pixels[index])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) -> Result<()> {
        let index = self.index(x, y)?;
        self.pixels[index] = color;
        Ok(())
    }

    /// All pixels in raster order.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Row `y`, left to right, or `None` past the last row.
    pub fn row(&self, y: u32) -> Option<&[Color]> {
        (y < self.height).then(|| self.row_at(y))
    }

    /// Rows top to bottom. A zero-width bitmap still yields `height` empty rows.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[Color]> {
        (0..self.height).map(move |y| self.row_at(y))
    }

    fn row_at(&self, y: u32) -> &[Color] {
        let start = y as usize * self.width as usize;
        &self.pixels[start..start + self.width as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_transparent() {
        let bitmap = Bitmap::new(3, 2, PixelFormat::TwentyFourBit);
        assert_eq!(bitmap.pixel_count(), 6);
        assert!(bitmap.pixels().iter().all(|&c| c == Color::TRANSPARENT));
    }

    #[test]
    fn test_set_get_pixel() {
        let mut bitmap = Bitmap::new(4, 4, PixelFormat::ThirtyTwoBit);
        bitmap.set_pixel(3, 1, Color::rgb(1, 2, 3)).unwrap();
        assert_eq!(bitmap.get_pixel(3, 1).unwrap(), Color::rgb(1, 2, 3));
        assert_eq!(bitmap.row(1).unwrap()[3], Color::rgb(1, 2, 3));
        assert_eq!(bitmap.pixels()[4 + 3], Color::rgb(1, 2, 3));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut bitmap = Bitmap::new(2, 2, PixelFormat::EightBit);
        assert!(matches!(
            bitmap.get_pixel(2, 0),
            Err(CodecError::OutOfBounds {
                x: 2,
                y: 0,
                width: 2,
                height: 2
            })
        ));
        assert!(matches!(
            bitmap.set_pixel(0, 5, Color::WHITE),
            Err(CodecError::OutOfBounds { .. })
        ));
        assert_eq!(bitmap.row(2), None);
        assert_eq!(bitmap.row(u32::MAX), None);
    }

    #[test]
    fn test_with_depth_keeps_pixels() {
        let mut bitmap = Bitmap::new(1, 1, PixelFormat::TwentyFourBit);
        bitmap.set_pixel(0, 0, Color::rgb(9, 9, 9)).unwrap();
        let bitmap = bitmap.with_depth(PixelFormat::OneBit);
        assert_eq!(bitmap.depth(), PixelFormat::OneBit);
        assert_eq!(bitmap.get_pixel(0, 0).unwrap(), Color::rgb(9, 9, 9));
    }

    #[test]
    fn test_rows_of_zero_width() {
        let bitmap = Bitmap::new(0, 3, PixelFormat::EightBit);
        assert_eq!(bitmap.rows().count(), 3);
        assert!(bitmap.rows().all(|row| row.is_empty()));
    }
}
