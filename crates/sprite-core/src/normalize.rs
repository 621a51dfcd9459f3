//! Frame normalization: crop, rescale and re-anchor each frame onto a fixed
//! square canvas.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::anchor::{compute_anchor, Anchor, AnchorKind};
use crate::assemble::blit_masked;
use crate::bbox::{content_bbox, crop_to, BoundingBox};
use crate::density::DEFAULT_ALPHA_THRESHOLD;

/// Where the anchor lands on the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Placement {
    /// Anchor on the canvas centre. For symmetric effects.
    #[default]
    Center,
    /// Anchor column on the horizontal centre, content bottom `margin`
    /// pixels above the canvas bottom. Keeps walk-cycle feet on the ground.
    BottomCenter { margin: u32 },
}

/// Resampling filter used when scaling content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Frame normalizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Output canvas edge length `S`.
    pub frame_size: u32,

    /// Largest edge the content may occupy (`C ≤ S`). Defaults to `S`.
    pub content_size: Option<u32>,

    /// Permit scale factors above 1.0. Off by default to keep small
    /// sprites crisp.
    pub allow_upscale: bool,

    pub anchor: AnchorKind,
    pub placement: Placement,
    pub filter: ResampleFilter,
    pub alpha_threshold: u8,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            frame_size: 64,
            content_size: None,
            allow_upscale: false,
            anchor: AnchorKind::default(),
            placement: Placement::default(),
            filter: ResampleFilter::default(),
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
        }
    }
}

/// One normalized frame and how it was produced.
#[derive(Debug, Clone)]
pub struct NormalizedFrame {
    /// The `S×S` output canvas.
    pub image: RgbaImage,
    /// Content bounding box in the source frame, `None` for an empty frame.
    pub source_bbox: Option<BoundingBox>,
    /// Anchor in scaled content coordinates.
    pub anchor: Option<Anchor>,
    /// Uniform scale applied to the content.
    pub scale: f64,
    /// Top-left corner of the pasted content on the canvas.
    pub offset: Option<(i64, i64)>,
}

impl NormalizedFrame {
    fn empty(size: u32) -> Self {
        Self {
            image: RgbaImage::new(size, size),
            source_bbox: None,
            anchor: None,
            scale: 1.0,
            offset: None,
        }
    }

    /// Whether the source frame had no visible content.
    pub fn is_empty(&self) -> bool {
        self.source_bbox.is_none()
    }
}

/// Normalizes frames according to a fixed [`NormalizeConfig`].
#[derive(Debug, Clone)]
pub struct FrameNormalizer {
    config: NormalizeConfig,
}

impl FrameNormalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Uniform scale for content of the given size.
    pub fn scale_for(&self, width: u32, height: u32) -> f64 {
        if width == 0 || height == 0 {
            return 1.0;
        }
        let target = self
            .config
            .content_size
            .unwrap_or(self.config.frame_size)
            .min(self.config.frame_size) as f64;
        let scale = (target / width as f64).min(target / height as f64);
        if self.config.allow_upscale {
            scale
        } else {
            scale.min(1.0)
        }
    }

    /// Normalize one extracted frame.
    ///
    /// A frame with no visible content yields a fully transparent canvas.
    pub fn normalize(&self, frame: &RgbaImage) -> NormalizedFrame {
        let size = self.config.frame_size;
        let threshold = self.config.alpha_threshold;

        let Some(bbox) = content_bbox(frame, threshold) else {
            return NormalizedFrame::empty(size);
        };

        let content = crop_to(frame, bbox);
        let (w, h) = content.dimensions();
        let scale = self.scale_for(w, h);
        let new_w = ((w as f64 * scale).round() as u32).max(1);
        let new_h = ((h as f64 * scale).round() as u32).max(1);

        let local = compute_anchor(&content, self.config.anchor, threshold)
            .unwrap_or_else(|| Anchor::new(w as f64 / 2.0, h as f64 / 2.0));
        let anchor = Anchor::new(
            local.x * new_w as f64 / w as f64,
            local.y * new_h as f64 / h as f64,
        );

        let half = size as f64 / 2.0;
        let offset_x = (half - anchor.x).round() as i64;
        let offset_y = match self.config.placement {
            Placement::Center => (half - anchor.y).round() as i64,
            Placement::BottomCenter { margin } => {
                size as i64 - margin as i64 - new_h as i64
            }
        };

        let mut canvas = RgbaImage::new(size, size);
        if (new_w, new_h) == (w, h) {
            blit_masked(&mut canvas, &content, offset_x, offset_y);
        } else {
            let scaled = imageops::resize(&content, new_w, new_h, self.config.filter.into());
            blit_masked(&mut canvas, &scaled, offset_x, offset_y);
        }

        tracing::trace!(
            ?bbox,
            scale,
            offset_x,
            offset_y,
            "Normalized frame"
        );

        NormalizedFrame {
            image: canvas,
            source_bbox: Some(bbox),
            anchor: Some(anchor),
            scale,
            offset: Some((offset_x, offset_y)),
        }
    }
}
