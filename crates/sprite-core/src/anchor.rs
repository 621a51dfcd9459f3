//! Alignment anchors.
//!
//! Both anchor kinds use continuous pixel coordinates: pixel `i` spans
//! `[i, i + 1)` and its centre is `i + 0.5`. With that convention a
//! symmetric shape has the same bounding-box centre and alpha centroid.
//!
//! The anchor kind must stay the same for every frame of an animation,
//! otherwise frames drift relative to each other.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::bbox::{content_bbox, BoundingBox};

/// How a frame's alignment point is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnchorKind {
    /// Centre of the content bounding box.
    #[default]
    BboxCenter,
    /// Alpha-weighted centroid. Robust to lopsided glows and particles.
    Centroid,
}

impl std::str::FromStr for AnchorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bbox" | "bbox_center" | "center" => Ok(Self::BboxCenter),
            "centroid" | "alpha" => Ok(Self::Centroid),
            other => Err(format!("unknown anchor kind '{other}' (expected bbox|centroid)")),
        }
    }
}

/// A point in a frame's local coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

impl Anchor {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Anchor) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Centre of a bounding box.
pub fn bbox_center(bbox: &BoundingBox) -> Anchor {
    let (x, y) = bbox.center();
    Anchor::new(x, y)
}

/// Alpha-weighted centroid of all pixels whose alpha exceeds `threshold`.
///
/// Returns `None` when no pixel qualifies.
pub fn alpha_centroid(image: &RgbaImage, threshold: u8) -> Option<Anchor> {
    let mut weight = 0.0_f64;
    let mut sum_x = 0.0_f64;
    let mut sum_y = 0.0_f64;

    for (x, y, pixel) in image.enumerate_pixels() {
        let alpha = pixel[3];
        if alpha <= threshold {
            continue;
        }
        let a = alpha as f64;
        weight += a;
        sum_x += (x as f64 + 0.5) * a;
        sum_y += (y as f64 + 0.5) * a;
    }

    if weight <= 0.0 {
        return None;
    }
    Some(Anchor::new(sum_x / weight, sum_y / weight))
}

/// Compute the anchor of `image` with the given kind.
pub fn compute_anchor(image: &RgbaImage, kind: AnchorKind, threshold: u8) -> Option<Anchor> {
    match kind {
        AnchorKind::BboxCenter => content_bbox(image, threshold).map(|b| bbox_center(&b)),
        AnchorKind::Centroid => alpha_centroid(image, threshold),
    }
}
