//! The frame extraction and alignment pipeline.
//!
//! ```text
//! sheet.png ─► density profile ─► boundaries ─► per-frame crop
//!                                                    │
//!                     output.png ◄─ assemble ◄─ normalize (scale + anchor)
//! ```
//!
//! Anchor kind and boundary policy are plain configuration, so one pipeline
//! covers centred VFX, grounded characters and forced-grid re-runs alike.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use framesmith_common::error::{FramesmithError, FramesmithResult};

use crate::anchor::Anchor;
use crate::assemble::{assemble_strip, load_rgba, save_png};
use crate::bbox::{extract_region, BoundingBox};
use crate::boundary::{
    detect_regions, square_frame_count, BoundaryPolicy, Detection, DetectionConfig, FrameRegion,
};
use crate::density::{alpha_profile, Axis, DEFAULT_ALPHA_THRESHOLD};
use crate::normalize::{FrameNormalizer, NormalizeConfig, NormalizedFrame};

/// Full job description. Every field has a default, so a JSON job file
/// only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Alpha value a pixel must exceed to count as content.
    pub alpha_threshold: u8,

    pub boundary: BoundaryPolicy,

    /// Number of frames in the source, if known.
    pub expected_frames: Option<u32>,

    /// Column densities at or below this count as empty.
    pub noise_floor: u32,

    pub normalize: NormalizeConfig,

    /// Pixels between frames in the assembled sheet.
    pub padding: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            boundary: BoundaryPolicy::default(),
            expected_frames: None,
            noise_floor: 0,
            normalize: NormalizeConfig::default(),
            padding: 0,
        }
    }
}

impl PipelineConfig {
    /// Load a job file.
    pub fn from_json_file(path: &Path) -> FramesmithResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FramesmithError::config(format!("Failed to read job {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            FramesmithError::config(format!("Failed to parse job {}: {e}", path.display()))
        })
    }
}

/// Per-frame summary for logs and JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub index: usize,
    pub region: FrameRegion,
    pub source_bbox: Option<BoundingBox>,
    /// Anchor position on the output canvas.
    pub canvas_anchor: Option<Anchor>,
    pub scale: f64,
    pub empty: bool,
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub sheet: RgbaImage,
    pub frames: Vec<NormalizedFrame>,
    pub detection: Detection,
}

impl PipelineOutput {
    pub fn reports(&self) -> Vec<FrameReport> {
        self.frames
            .iter()
            .zip(&self.detection.regions)
            .enumerate()
            .map(|(index, (frame, region))| FrameReport {
                index,
                region: *region,
                source_bbox: frame.source_bbox,
                canvas_anchor: canvas_anchor(frame),
                scale: frame.scale,
                empty: frame.is_empty(),
            })
            .collect()
    }

    /// Largest distance between any frame's canvas anchor and the mean
    /// canvas anchor. Zero means no drift between frames.
    pub fn anchor_spread(&self) -> f64 {
        let anchors: Vec<Anchor> = self.frames.iter().filter_map(canvas_anchor).collect();
        if anchors.is_empty() {
            return 0.0;
        }
        let n = anchors.len() as f64;
        let mean = Anchor::new(
            anchors.iter().map(|a| a.x).sum::<f64>() / n,
            anchors.iter().map(|a| a.y).sum::<f64>() / n,
        );
        anchors
            .iter()
            .map(|a| a.distance(&mean))
            .fold(0.0, f64::max)
    }
}

fn canvas_anchor(frame: &NormalizedFrame) -> Option<Anchor> {
    let anchor = frame.anchor?;
    let (ox, oy) = frame.offset?;
    Some(Anchor::new(ox as f64 + anchor.x, oy as f64 + anchor.y))
}

/// Options for [`SpritePipeline::run_file`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Do everything except writing files.
    pub dry_run: bool,
    /// Also write each normalized frame as `frame_NN.png` here.
    pub frames_dir: Option<PathBuf>,
}

/// Runs detection, normalization and assembly with one configuration.
#[derive(Debug, Clone)]
pub struct SpritePipeline {
    config: PipelineConfig,
    normalizer: FrameNormalizer,
}

impl SpritePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let normalizer = FrameNormalizer::new(NormalizeConfig {
            alpha_threshold: config.alpha_threshold,
            ..config.normalize
        });
        Self { config, normalizer }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Detect frame regions in a sheet.
    pub fn detect(&self, sheet: &RgbaImage) -> Detection {
        let profile = alpha_profile(sheet, Axis::Columns, self.config.alpha_threshold);
        let expected = match (self.config.expected_frames, self.config.boundary) {
            (Some(n), _) => Some(n),
            (None, BoundaryPolicy::Grid) => {
                Some(square_frame_count(sheet.width(), sheet.height()))
            }
            (None, _) => None,
        };
        detect_regions(
            &profile,
            &DetectionConfig {
                policy: self.config.boundary,
                expected_frames: expected,
                noise_floor: self.config.noise_floor,
            },
        )
    }

    /// Run the whole pipeline on an in-memory sheet.
    pub fn run(&self, sheet: &RgbaImage) -> FramesmithResult<PipelineOutput> {
        let detection = self.detect(sheet);

        let frames: Vec<NormalizedFrame> = detection
            .regions
            .iter()
            .map(|region| self.normalizer.normalize(&extract_region(sheet, *region)))
            .collect();

        let empty = frames.iter().filter(|f| f.is_empty()).count();
        if empty > 0 {
            tracing::info!(empty, "Some frames had no visible content");
        }

        let images: Vec<RgbaImage> = frames.iter().map(|f| f.image.clone()).collect();
        let sheet = assemble_strip(&images, self.config.padding)?;

        Ok(PipelineOutput {
            sheet,
            frames,
            detection,
        })
    }

    /// Load `input`, run the pipeline and write the assembled sheet to `output`.
    pub fn run_file(
        &self,
        input: &Path,
        output: &Path,
        options: &RunOptions,
    ) -> FramesmithResult<PipelineOutput> {
        let sheet = load_rgba(input)?;
        tracing::info!(
            "Processing {} ({}x{})",
            input.display(),
            sheet.width(),
            sheet.height()
        );

        let result = self.run(&sheet)?;
        tracing::info!(
            frames = result.frames.len(),
            method = ?result.detection.method,
            spread = result.anchor_spread(),
            "Aligned frames"
        );

        if options.dry_run {
            tracing::info!("Dry run, not writing {}", output.display());
            return Ok(result);
        }

        save_png(&result.sheet, output)?;
        if let Some(dir) = &options.frames_dir {
            for (i, frame) in result.frames.iter().enumerate() {
                save_png(&frame.image, &dir.join(format!("frame_{i:02}.png")))?;
            }
        }
        Ok(result)
    }
}
