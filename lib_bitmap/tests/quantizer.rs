mod common;

use std::collections::HashSet;

use lib_bitmap::{Bitmap, Color, Palette, PixelFormat};
use proptest::prelude::*;

#[test]
fn test_few_colors_keep_insertion_order() {
    let mut bitmap = Bitmap::new(3, 2, PixelFormat::EightBit);
    let colors = [Color::WHITE, Color::rgb(1, 2, 3), Color::WHITE, Color::BLACK];
    for (i, &color) in colors.iter().enumerate() {
        bitmap.set_pixel(i as u32 % 3, i as u32 / 3, color).unwrap();
    }

    let palette = Palette::from_bitmap(&bitmap, 256);

    assert_eq!(
        palette.colors(),
        &[Color::WHITE, Color::rgb(1, 2, 3), Color::BLACK, Color::TRANSPARENT]
    );
    assert_eq!(palette.index_of(Color::BLACK), 2);
    assert_eq!(palette.index_of(Color::TRANSPARENT), 3);
}

#[test]
fn test_reduction_averages_buckets() {
    let mut bitmap = Bitmap::new(4, 1, PixelFormat::OneBit);
    bitmap.set_pixel(0, 0, Color::rgb(0, 0, 0)).unwrap();
    bitmap.set_pixel(1, 0, Color::rgb(10, 20, 30)).unwrap();
    bitmap.set_pixel(2, 0, Color::rgb(200, 200, 200)).unwrap();
    bitmap.set_pixel(3, 0, Color::rgba(255, 255, 255, 0)).unwrap();

    let palette = Palette::from_bitmap(&bitmap, 2);

    assert_eq!(palette.colors(), &[Color::rgb(5, 10, 15), Color::rgb(227, 227, 227)]);
    assert_eq!(palette.map_indices(bitmap.pixels()), vec![0, 0, 1, 1]);
}

#[test]
fn test_nearest_match_prefers_first_minimum() {
    let palette = Palette::from_colors(vec![Color::rgb(0, 0, 0), Color::rgb(20, 0, 0)]);
    assert_eq!(palette.index_of(Color::rgb(10, 0, 0)), 0);
    assert_eq!(palette.index_of(Color::rgb(11, 0, 0)), 1);
    // Alpha only matters for exact hits
    assert_eq!(palette.index_of(Color::rgba(20, 0, 0, 3)), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]
    #[test]
    fn prop_palette_is_bounded_and_unique(
        width in 1u32..48,
        height in 1u32..48,
        seed in any::<u32>(),
        max_colors in prop::sample::select(vec![2usize, 16, 256]),
    ) {
        let bitmap = common::random_bitmap(width, height, PixelFormat::EightBit, seed);
        let palette = Palette::from_bitmap(&bitmap, max_colors);

        prop_assert!(!palette.is_empty());
        prop_assert!(palette.len() <= max_colors);
        let unique: HashSet<_> = palette.colors().iter().collect();
        prop_assert_eq!(unique.len(), palette.len());

        for index in palette.map_indices(bitmap.pixels()) {
            prop_assert!((index as usize) < palette.len());
        }
    }

    #[test]
    fn prop_exact_colors_map_to_themselves(
        colors in prop::collection::vec(any::<(u8, u8, u8)>(), 1..64),
    ) {
        let mut bitmap = Bitmap::new(colors.len() as u32, 1, PixelFormat::EightBit);
        for (x, &(r, g, b)) in colors.iter().enumerate() {
            bitmap.set_pixel(x as u32, 0, Color::rgb(r, g, b)).unwrap();
        }

        let palette = Palette::from_bitmap(&bitmap, 256);
        let indices = palette.map_indices(bitmap.pixels());
        for (&color, index) in bitmap.pixels().iter().zip(indices) {
            prop_assert_eq!(palette.color(index as usize).unwrap(), color);
        }
    }
}
