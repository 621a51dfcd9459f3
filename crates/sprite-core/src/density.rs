//! Alpha density profiling.
//!
//! A density profile counts, for every column (or row) of an RGBA image,
//! how many pixels along the other axis are visibly opaque. Frame detection
//! works entirely on this 1-D signal.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Alpha value a pixel must exceed to count as content.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 10;

/// Axis a profile is taken along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// One entry per column (x axis).
    #[default]
    Columns,
    /// One entry per row (y axis).
    Rows,
}

/// Per-column or per-row count of opaque pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensityProfile {
    pub axis: Axis,
    pub values: Vec<u32>,
}

impl DensityProfile {
    pub fn new(axis: Axis, values: Vec<u32>) -> Self {
        Self { axis, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Total number of opaque pixels in the image.
    pub fn total(&self) -> u64 {
        self.values.iter().map(|&v| v as u64).sum()
    }

    /// Largest single entry.
    pub fn peak(&self) -> u32 {
        self.values.iter().copied().max().unwrap_or(0)
    }

    /// Half-open span from the first to one past the last non-zero entry.
    pub fn content_span(&self) -> Option<(u32, u32)> {
        let first = self.values.iter().position(|&v| v > 0)?;
        let last = self.values.iter().rposition(|&v| v > 0)?;
        Some((first as u32, last as u32 + 1))
    }
}

/// Compute the alpha density profile of `image` along `axis`.
///
/// Each entry is the number of pixels across the opposite axis whose alpha
/// is strictly greater than `threshold`.
pub fn alpha_profile(image: &RgbaImage, axis: Axis, threshold: u8) -> DensityProfile {
    let (width, height) = image.dimensions();
    let len = match axis {
        Axis::Columns => width,
        Axis::Rows => height,
    };
    let mut values = vec![0u32; len as usize];

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] > threshold {
            let idx = match axis {
                Axis::Columns => x,
                Axis::Rows => y,
            };
            values[idx as usize] += 1;
        }
    }

    DensityProfile { axis, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn transparent_image_profiles_to_zero() {
        let img = RgbaImage::new(8, 4);
        let profile = alpha_profile(&img, Axis::Columns, DEFAULT_ALPHA_THRESHOLD);
        assert_eq!(profile.len(), 8);
        assert!(profile.values.iter().all(|&v| v == 0));
        assert_eq!(profile.content_span(), None);
        assert_eq!(profile.total(), 0);
    }

    #[test]
    fn counts_along_both_axes() {
        let mut img = RgbaImage::new(6, 4);
        for y in 1..3 {
            for x in 2..5 {
                img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }

        let cols = alpha_profile(&img, Axis::Columns, DEFAULT_ALPHA_THRESHOLD);
        assert_eq!(cols.values, vec![0, 0, 2, 2, 2, 0]);
        assert_eq!(cols.content_span(), Some((2, 5)));

        let rows = alpha_profile(&img, Axis::Rows, DEFAULT_ALPHA_THRESHOLD);
        assert_eq!(rows.values, vec![0, 3, 3, 0]);
        assert_eq!(rows.peak(), 3);
    }

    #[test]
    fn faint_pixels_below_threshold_are_ignored() {
        let mut img = RgbaImage::new(3, 1);
        img.put_pixel(0, 0, Rgba([255, 255, 255, 10]));
        img.put_pixel(1, 0, Rgba([255, 255, 255, 11]));
        let profile = alpha_profile(&img, Axis::Columns, 10);
        assert_eq!(profile.values, vec![0, 1, 0]);
    }
}
