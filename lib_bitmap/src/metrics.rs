//! Information-theoretic measures of a bitmap and of a conversion.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::Serialize;

use crate::dispatch;
use crate::error::Result;
use crate::image::{Bitmap, Color, PixelFormat};

/// The color `color` reads back as after being stored at `depth`.
fn stored(color: Color, depth: PixelFormat) -> Color {
    Color::from_bytes(&color.to_bytes(depth), 0, depth).unwrap_or(color)
}

/// Shannon entropy in bits per pixel over the histogram of exact colors,
/// each taken as the bitmap's depth stores it.
///
/// An empty bitmap has entropy 0. The result never exceeds
/// `bits_per_pixel`.
pub fn entropy(bitmap: &Bitmap) -> f64 {
    let total = bitmap.pixel_count();
    if total == 0 {
        return 0.0;
    }

    let depth = bitmap.depth();
    let mut histogram = HashMap::new();
    for &color in bitmap.pixels() {
        *histogram.entry(stored(color, depth)).or_insert(0usize) += 1;
    }
    debug!("Entropy over {} distinct colors", histogram.len());

    histogram
        .values()
        .map(|&count| {
            let p = count as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

/// `1 - entropy / bits_per_pixel`.
pub fn redundancy(bitmap: &Bitmap) -> f64 {
    1.0 - entropy(bitmap) / f64::from(bitmap.depth().bits_per_pixel())
}

/// Size reduction in percent. Negative when the output grew; 0 when the
/// original is empty.
pub fn compression_rate(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    (1.0 - compressed_size as f64 / original_size as f64) * 100.0
}

/// Sizes and measures of one input → output conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionReport {
    pub original_size: u64,
    pub compressed_size: u64,
    pub entropy: f64,
    pub redundancy: f64,
    pub compression_rate: f64,
}

impl CompressionReport {
    /// Compares the file sizes of `input` and `output` and measures the
    /// bitmap decoded from `output` at `depth`.
    pub fn from_paths(
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        depth: PixelFormat,
    ) -> Result<Self> {
        let original_size = fs::metadata(input.as_ref())?.len();
        let compressed_size = fs::metadata(output.as_ref())?.len();
        let bitmap = dispatch::decode(output, depth)?;

        let report = Self {
            original_size,
            compressed_size,
            entropy: entropy(&bitmap),
            redundancy: redundancy(&bitmap),
            compression_rate: compression_rate(original_size, compressed_size),
        };
        info!("{:?}", report);
        Ok(report)
    }
}
