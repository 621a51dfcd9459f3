//! Content bounding boxes and frame extraction.

use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::boundary::FrameRegion;

/// Tight rectangle around visible content. `right` and `bottom` are
/// exclusive, so the box covers `left..right` × `top..bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl BoundingBox {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Geometric centre in continuous pixel coordinates.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.left + self.right) as f64 / 2.0,
            (self.top + self.bottom) as f64 / 2.0,
        )
    }
}

/// Find the tight box around all pixels whose alpha exceeds `threshold`.
///
/// Returns `None` for a fully transparent image.
pub fn content_bbox(image: &RgbaImage, threshold: u8) -> Option<BoundingBox> {
    let mut bbox: Option<BoundingBox> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] <= threshold {
            continue;
        }
        bbox = Some(match bbox {
            None => BoundingBox::new(x, y, x + 1, y + 1),
            Some(b) => BoundingBox::new(
                b.left.min(x),
                b.top.min(y),
                b.right.max(x + 1),
                b.bottom.max(y + 1),
            ),
        });
    }

    bbox
}

/// Copy one frame region (full image height) out of a sheet.
///
/// The region is clamped to the image width.
pub fn extract_region(sheet: &RgbaImage, region: FrameRegion) -> RgbaImage {
    let width = sheet.width();
    let start = region.start.min(width);
    let end = region.end.min(width).max(start);
    imageops::crop_imm(sheet, start, 0, end - start, sheet.height()).to_image()
}

/// Copy the pixels inside `bbox`.
pub fn crop_to(image: &RgbaImage, bbox: BoundingBox) -> RgbaImage {
    imageops::crop_imm(image, bbox.left, bbox.top, bbox.width(), bbox.height()).to_image()
}
