use std::collections::{HashMap, HashSet};

use log::debug;

use crate::constants::MAX_PALETTE_SIZE;
use crate::error::{CodecError, Result};
use crate::image::{Bitmap, Color};

/// Ordered table of unique colors used by indexed encodings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    colors: Vec<Color>,
    lookup: HashMap<Color, u8>,
}

impl Palette {
    /// Wraps an existing color table, e.g. one read from a file.
    ///
    /// Duplicate entries are kept so that file indices stay valid; exact
    /// lookups resolve to the first occurrence.
    pub fn from_colors(colors: Vec<Color>) -> Self {
        let mut lookup = HashMap::with_capacity(colors.len());
        for (index, &color) in colors.iter().enumerate().take(MAX_PALETTE_SIZE) {
            lookup.entry(color).or_insert(index as u8);
        }
        Self { colors, lookup }
    }

    /// Builds a palette of at most `max_colors` entries from the colors
    /// observed in `bitmap`.
    ///
    /// Up to 256 distinct colors are collected in raster order; later new
    /// colors are left to nearest-match lookup. When more than `max_colors`
    /// were collected, the insertion-ordered list is cut into `max_colors`
    /// contiguous buckets and every bucket collapses into its channel-wise
    /// average. Neighboring buckets are not perceptually related, so quality
    /// depends on the order colors first appear.
    pub fn from_bitmap(bitmap: &Bitmap, max_colors: usize) -> Self {
        let max_colors = max_colors.clamp(1, MAX_PALETTE_SIZE);

        let mut seen = HashSet::new();
        let mut distinct = Vec::new();
        for &color in bitmap.pixels() {
            if distinct.len() == MAX_PALETTE_SIZE {
                break;
            }
            if seen.insert(color) {
                distinct.push(color);
            }
        }
        debug!(
            "Collected {} distinct colors, palette limit {}",
            distinct.len(),
            max_colors
        );

        if distinct.len() <= max_colors {
            return Self::from_colors(distinct);
        }

        let reduced = reduce(&distinct, max_colors);
        debug!("Reduced palette to {} colors", reduced.len());
        Self::from_colors(reduced)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn color(&self, index: usize) -> Result<Color> {
        self.colors
            .get(index)
            .copied()
            .ok_or(CodecError::InvalidPaletteIndex {
                index,
                size: self.colors.len(),
            })
    }

    /// Index of `color`, or of the nearest entry by RGB distance.
    ///
    /// Ties keep the lowest index. An empty palette maps everything to 0.
    pub fn index_of(&self, color: Color) -> u8 {
        if let Some(&index) = self.lookup.get(&color) {
            return index;
        }

        let mut best_index = 0;
        let mut best_distance = u32::MAX;
        for (index, candidate) in self.colors.iter().enumerate().take(MAX_PALETTE_SIZE) {
            let distance = color.distance_squared(candidate);
            if distance < best_distance {
                best_distance = distance;
                best_index = index;
            }
        }
        best_index as u8
    }

    /// Palette index for every color in `pixels`, in order.
    pub fn map_indices(&self, pixels: &[Color]) -> Vec<u8> {
        pixels.iter().map(|&color| self.index_of(color)).collect()
    }
}

fn reduce(colors: &[Color], buckets: usize) -> Vec<Color> {
    let total = colors.len();
    let mut reduced: Vec<Color> = Vec::with_capacity(buckets);

    for bucket in 0..buckets {
        let start = bucket * total / buckets;
        let end = (bucket + 1) * total / buckets;
        let chunk = &colors[start..end];
        if chunk.is_empty() {
            continue;
        }

        let (r, g, b) = chunk.iter().fold((0u32, 0u32, 0u32), |(r, g, b), c| {
            (r + c.r as u32, g + c.g as u32, b + c.b as u32)
        });
        let len = chunk.len() as u32;
        let average = Color::rgb((r / len) as u8, (g / len) as u8, (b / len) as u8);

        if !reduced.contains(&average) {
            reduced.push(average);
        }
    }

    reduced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelFormat;

    fn bitmap_from(colors: &[Color]) -> Bitmap {
        let mut bitmap = Bitmap::new(colors.len() as u32, 1, PixelFormat::EightBit);
        for (x, &color) in colors.iter().enumerate() {
            bitmap.set_pixel(x as u32, 0, color).unwrap();
        }
        bitmap
    }

    #[test]
    fn test_palette_rrgb() {
        let red = Color::rgb(255, 0, 0);
        let green = Color::rgb(0, 255, 0);
        let blue = Color::rgb(0, 0, 255);
        let bitmap = bitmap_from(&[red, red, green, blue]);

        let palette = Palette::from_bitmap(&bitmap, 256);
        assert_eq!(palette.colors(), &[red, green, blue]);

        let indices = palette.map_indices(bitmap.pixels());
        assert_eq!(indices, vec![0, 0, 1, 2]);
    }

    #[test]
    fn test_palette_reduces_by_bucket_average() {
        let colors = [
            Color::rgb(0, 0, 0),
            Color::rgb(10, 20, 30),
            Color::rgb(200, 200, 200),
            Color::rgb(250, 250, 250),
        ];
        let palette = Palette::from_bitmap(&bitmap_from(&colors), 2);
        assert_eq!(
            palette.colors(),
            &[Color::rgb(5, 10, 15), Color::rgb(225, 225, 225)]
        );
    }

    #[test]
    fn test_reduction_follows_insertion_order() {
        // Dark and light colors interleaved land in the same buckets.
        let colors = [
            Color::rgb(0, 0, 0),
            Color::rgb(254, 254, 254),
            Color::rgb(2, 2, 2),
            Color::rgb(252, 252, 252),
        ];
        let palette = Palette::from_bitmap(&bitmap_from(&colors), 2);
        assert_eq!(
            palette.colors(),
            &[Color::rgb(127, 127, 127)],
            "identical bucket averages collapse into one entry"
        );
    }

    #[test]
    fn test_reduced_alpha_is_opaque() {
        let colors = [
            Color::rgba(10, 10, 10, 0),
            Color::rgba(20, 20, 20, 0),
            Color::rgba(30, 30, 30, 0),
        ];
        let palette = Palette::from_bitmap(&bitmap_from(&colors), 2);
        assert!(palette.colors().iter().all(|c| c.a == 255));
    }

    #[test]
    fn test_nearest_match() {
        let palette = Palette::from_colors(vec![Color::BLACK, Color::WHITE]);
        assert_eq!(palette.index_of(Color::rgb(30, 30, 30)), 0);
        assert_eq!(palette.index_of(Color::rgb(200, 200, 200)), 1);
    }

    #[test]
    fn test_tie_keeps_lowest_index() {
        let palette = Palette::from_colors(vec![Color::rgb(0, 0, 0), Color::rgb(2, 0, 0)]);
        assert_eq!(palette.index_of(Color::rgb(1, 0, 0)), 0);
    }

    #[test]
    fn test_exact_match_includes_alpha() {
        let translucent = Color::rgba(50, 50, 50, 10);
        let palette = Palette::from_colors(vec![Color::rgb(50, 50, 50), translucent]);
        assert_eq!(palette.index_of(translucent), 1);
        // No exact entry: the RGB distance ties, first entry wins.
        assert_eq!(palette.index_of(Color::rgba(50, 50, 50, 99)), 0);
    }

    #[test]
    fn test_palette_invalid_index() {
        let palette = Palette::from_colors(vec![Color::WHITE]);
        assert!(matches!(
            palette.color(1),
            Err(CodecError::InvalidPaletteIndex { index: 1, size: 1 })
        ));
    }

    #[test]
    fn test_palette_empty_input() {
        let bitmap = Bitmap::new(0, 0, PixelFormat::EightBit);
        let palette = Palette::from_bitmap(&bitmap, 256);
        assert!(palette.is_empty());
        assert!(palette.map_indices(bitmap.pixels()).is_empty());
        assert_eq!(palette.index_of(Color::WHITE), 0);
    }

    #[test]
    fn test_collection_stops_at_256_colors() {
        let colors: Vec<Color> = (0..300u32)
            .map(|i| Color::rgb((i * 7 % 256) as u8, (i / 256) as u8, 7))
            .collect();
        let bitmap = bitmap_from(&colors);

        let palette = Palette::from_bitmap(&bitmap, 256);
        assert_eq!(palette.colors(), &colors[..256]);
    }

    #[test]
    fn test_one_bit_reduces_only_first_256_colors() {
        let mut colors: Vec<Color> = (0..=255).map(|i| Color::gray(i as u8)).collect();
        colors.extend((0..50).map(|i| Color::rgb(i, 255, 255)));
        let bitmap = bitmap_from(&colors);

        let palette = Palette::from_bitmap(&bitmap, 2);
        // Averages of 0..=127 and 128..=255 only
        assert_eq!(palette.colors(), &[Color::gray(63), Color::gray(191)]);
    }

    #[test]
    fn test_palette_gradients() {
        let colors: Vec<Color> = (0..=255).map(|i| Color::gray(i as u8)).collect();
        let bitmap = bitmap_from(&colors);
        let palette = Palette::from_bitmap(&bitmap, 256);
        assert_eq!(palette.len(), 256);

        let indices = palette.map_indices(bitmap.pixels());
        for (i, &index) in indices.iter().enumerate() {
            assert_eq!(palette.color(index as usize).unwrap(), colors[i]);
        }
    }
}
