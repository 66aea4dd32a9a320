//! PNG scanline filters (filter method 0).
//!
//! Every filter predicts a byte from its neighbors: `a` is the byte
//! `bytes_per_pixel` to the left, `b` the byte above and `c` the byte above
//! `a`. Positions outside the image read as zero, as does the row above the
//! first scanline.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown scanline filter type {0}")]
    UnknownFilterType(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl FilterType {
    pub const ALL: [FilterType; 5] = [
        FilterType::None,
        FilterType::Sub,
        FilterType::Up,
        FilterType::Average,
        FilterType::Paeth,
    ];
}

impl TryFrom<u8> for FilterType {
    type Error = FilterError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FilterType::None),
            1 => Ok(FilterType::Sub),
            2 => Ok(FilterType::Up),
            3 => Ok(FilterType::Average),
            4 => Ok(FilterType::Paeth),
            other => Err(FilterError::UnknownFilterType(other)),
        }
    }
}

#[inline]
pub fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let a = a as i16;
    let b = b as i16;
    let c = c as i16;

    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

#[inline]
fn predict(filter: FilterType, a: u8, b: u8, c: u8) -> u8 {
    match filter {
        FilterType::None => 0,
        FilterType::Sub => a,
        FilterType::Up => b,
        FilterType::Average => ((a as u16 + b as u16) / 2) as u8,
        FilterType::Paeth => paeth_predictor(a, b, c),
    }
}

/// Filters `line` against the unfiltered `prev` line.
///
/// `prev` must be as long as `line`; pass zeros for the first scanline.
pub fn filter_scanline(
    filter: FilterType,
    line: &[u8],
    prev: &[u8],
    bytes_per_pixel: usize,
) -> Vec<u8> {
    debug_assert_eq!(line.len(), prev.len());
    let bpp = bytes_per_pixel.max(1);

    line.iter()
        .enumerate()
        .map(|(i, &x)| {
            let a = if i >= bpp { line[i - bpp] } else { 0 };
            let b = prev[i];
            let c = if i >= bpp { prev[i - bpp] } else { 0 };
            x.wrapping_sub(predict(filter, a, b, c))
        })
        .collect()
}

/// Reverses [`filter_scanline`] in place, using the already reconstructed
/// `prev` line.
pub fn unfilter_scanline(
    filter: FilterType,
    line: &mut [u8],
    prev: &[u8],
    bytes_per_pixel: usize,
) {
    debug_assert_eq!(line.len(), prev.len());
    let bpp = bytes_per_pixel.max(1);

    if filter == FilterType::None {
        return;
    }

    for i in 0..line.len() {
        let a = if i >= bpp { line[i - bpp] } else { 0 };
        let b = prev[i];
        let c = if i >= bpp { prev[i - bpp] } else { 0 };
        line[i] = line[i].wrapping_add(predict(filter, a, b, c));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paeth_prefers_left_on_ties() {
        assert_eq!(paeth_predictor(10, 10, 10), 10);
        assert_eq!(paeth_predictor(1, 2, 3), 1);
        assert_eq!(paeth_predictor(50, 100, 50), 100);
        assert_eq!(paeth_predictor(100, 50, 50), 100);
    }

    #[test]
    fn test_sub_filter_values() {
        let line = [10, 20, 30, 15, 25, 35];
        let prev = [0; 6];
        let filtered = filter_scanline(FilterType::Sub, &line, &prev, 3);
        assert_eq!(filtered, vec![10, 20, 30, 5, 5, 5]);
    }

    #[test]
    fn test_up_filter_values() {
        let line = [5, 5, 5];
        let prev = [1, 2, 3];
        assert_eq!(filter_scanline(FilterType::Up, &line, &prev, 1), vec![4, 3, 2]);
    }

    #[test]
    fn test_average_uses_floor() {
        let line = [0, 0];
        let prev = [3, 3];
        // floor((0 + 3) / 2) == 1 for both bytes
        let filtered = filter_scanline(FilterType::Average, &line, &prev, 1);
        assert_eq!(filtered, vec![255, 255]);

        let mut restored = filtered.clone();
        unfilter_scanline(FilterType::Average, &mut restored, &prev, 1);
        assert_eq!(restored, line);
    }

    #[test]
    fn test_all_filters_round_trip() {
        let prev: Vec<u8> = (0..32).map(|i| (i * 7 + 3) as u8).collect();
        let line: Vec<u8> = (0..32).map(|i| (255 - i * 5) as u8).collect();
        for filter in FilterType::ALL {
            for bpp in [1, 2, 3, 4] {
                let mut restored = filter_scanline(filter, &line, &prev, bpp);
                unfilter_scanline(filter, &mut restored, &prev, bpp);
                assert_eq!(restored, line, "filter {:?} bpp {}", filter, bpp);
            }
        }
    }

    #[test]
    fn test_unknown_filter_type() {
        assert_eq!(
            FilterType::try_from(5),
            Err(FilterError::UnknownFilterType(5))
        );
        assert_eq!(FilterType::try_from(4), Ok(FilterType::Paeth));
    }
}
