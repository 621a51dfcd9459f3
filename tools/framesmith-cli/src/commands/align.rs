//! Run the full extraction and alignment pipeline on one spritesheet.

use std::path::PathBuf;

use clap::Args;

use framesmith_common::config::{SpriteDefaults, ToolConfig};
use framesmith_sprite_core::normalize::{NormalizeConfig, Placement};
use framesmith_sprite_core::{BoundaryPolicy, PipelineConfig, RunOptions, SpritePipeline};

use super::{parse_anchor, parse_policy};

#[derive(Debug, Args)]
pub struct AlignArgs {
    /// Source spritesheet
    pub input: PathBuf,

    /// Output strip
    pub output: PathBuf,

    /// Number of frames in the source
    #[arg(long)]
    pub frames: Option<u32>,

    /// Boundary policy: gap|valley|grid
    #[arg(long)]
    pub policy: Option<String>,

    /// Minimum transparent run separating two frames (gap policy)
    #[arg(long)]
    pub min_gap: Option<u32>,

    /// Gaussian smoothing sigma (valley policy)
    #[arg(long)]
    pub sigma: Option<f64>,

    /// Anchor: bbox|centroid
    #[arg(long)]
    pub anchor: Option<String>,

    /// Output frame edge length
    #[arg(long)]
    pub size: Option<u32>,

    /// Largest edge the content may occupy inside a frame
    #[arg(long)]
    pub content_size: Option<u32>,

    /// Ground the content this many pixels above the frame bottom
    #[arg(long)]
    pub bottom_margin: Option<u32>,

    /// Allow scaling content up
    #[arg(long)]
    pub allow_upscale: bool,

    /// Pixels between frames in the output
    #[arg(long)]
    pub padding: Option<u32>,

    /// Alpha value a pixel must exceed to count as content
    #[arg(long)]
    pub threshold: Option<u8>,

    /// JSON job file; flags given on the command line override it
    #[arg(long)]
    pub job: Option<PathBuf>,

    /// Also write each normalized frame to this directory
    #[arg(long)]
    pub frames_dir: Option<PathBuf>,

    /// Run everything but write nothing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: AlignArgs, config: &ToolConfig) -> anyhow::Result<()> {
    let pipeline_config = build_config(&args, &config.sprite)?;
    tracing::debug!(?pipeline_config, "Pipeline configuration");

    let pipeline = SpritePipeline::new(pipeline_config);
    let output = pipeline.run_file(
        &args.input,
        &args.output,
        &RunOptions {
            dry_run: args.dry_run,
            frames_dir: args.frames_dir.clone(),
        },
    )?;

    println!(
        "{} frame(s), method {:?}, anchor spread {:.2}px",
        output.frames.len(),
        output.detection.method,
        output.anchor_spread()
    );
    for report in output.reports() {
        let bbox = report
            .source_bbox
            .map(|b| format!("{}x{} at ({}, {})", b.width(), b.height(), b.left, b.top))
            .unwrap_or_else(|| "empty".to_string());
        let anchor = report
            .canvas_anchor
            .map(|a| format!("({:.1}, {:.1})", a.x, a.y))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  #{:<3} cols {:>5}..{:<5} content {:<22} scale {:.3} anchor {}",
            report.index, report.region.start, report.region.end, bbox, report.scale, anchor
        );
    }

    if args.dry_run {
        println!("Dry run: nothing written");
    } else {
        println!(
            "Wrote {} ({}x{})",
            args.output.display(),
            output.sheet.width(),
            output.sheet.height()
        );
    }
    Ok(())
}

/// Job file (or config defaults), then command-line overrides.
fn build_config(args: &AlignArgs, defaults: &SpriteDefaults) -> anyhow::Result<PipelineConfig> {
    let mut cfg = match &args.job {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig {
            alpha_threshold: defaults.alpha_threshold,
            boundary: parse_policy(&defaults.boundary, defaults.min_gap, defaults.smoothing_sigma)?,
            padding: defaults.padding,
            normalize: NormalizeConfig {
                frame_size: defaults.frame_size,
                anchor: parse_anchor(&defaults.anchor)?,
                ..Default::default()
            },
            ..Default::default()
        },
    };

    if let Some(name) = &args.policy {
        cfg.boundary = parse_policy(
            name,
            args.min_gap.unwrap_or(defaults.min_gap),
            args.sigma.unwrap_or(defaults.smoothing_sigma),
        )?;
    } else {
        match (&mut cfg.boundary, args.min_gap, args.sigma) {
            (BoundaryPolicy::Gap { min_gap }, Some(g), _) => *min_gap = g,
            (BoundaryPolicy::Valley { sigma }, _, Some(s)) => *sigma = s,
            _ => {}
        }
    }

    if args.frames.is_some() {
        cfg.expected_frames = args.frames;
    }
    if let Some(t) = args.threshold {
        cfg.alpha_threshold = t;
    }
    if let Some(p) = args.padding {
        cfg.padding = p;
    }
    if let Some(name) = &args.anchor {
        cfg.normalize.anchor = parse_anchor(name)?;
    }
    if let Some(size) = args.size {
        cfg.normalize.frame_size = size;
    }
    if args.content_size.is_some() {
        cfg.normalize.content_size = args.content_size;
    }
    if let Some(margin) = args.bottom_margin {
        cfg.normalize.placement = Placement::BottomCenter { margin };
    }
    if args.allow_upscale {
        cfg.normalize.allow_upscale = true;
    }

    if cfg.normalize.frame_size == 0 {
        anyhow::bail!("Frame size must be greater than zero");
    }
    if let Some(c) = cfg.normalize.content_size {
        if c > cfg.normalize.frame_size {
            anyhow::bail!(
                "Content size {c} exceeds frame size {}",
                cfg.normalize.frame_size
            );
        }
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use framesmith_sprite_core::AnchorKind;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: AlignArgs,
    }

    fn parse(argv: &[&str]) -> AlignArgs {
        let mut full = vec!["align", "in.png", "out.png"];
        full.extend_from_slice(argv);
        Wrapper::parse_from(full).args
    }

    #[test]
    fn defaults_come_from_config() {
        let defaults = SpriteDefaults {
            frame_size: 48,
            anchor: "centroid".to_string(),
            boundary: "valley".to_string(),
            smoothing_sigma: 3.0,
            ..Default::default()
        };
        let cfg = build_config(&parse(&[]), &defaults).unwrap();
        assert_eq!(cfg.normalize.frame_size, 48);
        assert_eq!(cfg.normalize.anchor, AnchorKind::Centroid);
        assert_eq!(cfg.boundary, BoundaryPolicy::Valley { sigma: 3.0 });
    }

    #[test]
    fn flags_override_config() {
        let cfg = build_config(
            &parse(&[
                "--policy",
                "grid",
                "--frames",
                "6",
                "--anchor",
                "centroid",
                "--size",
                "32",
                "--bottom-margin",
                "2",
            ]),
            &SpriteDefaults::default(),
        )
        .unwrap();
        assert_eq!(cfg.boundary, BoundaryPolicy::Grid);
        assert_eq!(cfg.expected_frames, Some(6));
        assert_eq!(cfg.normalize.frame_size, 32);
        assert_eq!(cfg.normalize.placement, Placement::BottomCenter { margin: 2 });
    }

    #[test]
    fn min_gap_tunes_current_gap_policy() {
        let cfg = build_config(&parse(&["--min-gap", "5"]), &SpriteDefaults::default()).unwrap();
        assert_eq!(cfg.boundary, BoundaryPolicy::Gap { min_gap: 5 });
    }

    #[test]
    fn job_file_is_overridden_by_flags() {
        let dir = tempfile::tempdir().unwrap();
        let job = dir.path().join("job.json");
        std::fs::write(
            &job,
            r#"{ "expected_frames": 8, "normalize": { "frame_size": 96, "anchor": "centroid" } }"#,
        )
        .unwrap();

        let cfg = build_config(
            &parse(&["--job", job.to_str().unwrap(), "--size", "64"]),
            &SpriteDefaults::default(),
        )
        .unwrap();
        assert_eq!(cfg.expected_frames, Some(8));
        assert_eq!(cfg.normalize.anchor, AnchorKind::Centroid);
        assert_eq!(cfg.normalize.frame_size, 64);
    }

    #[test]
    fn oversized_content_is_rejected() {
        let err = build_config(
            &parse(&["--size", "32", "--content-size", "40"]),
            &SpriteDefaults::default(),
        );
        assert!(err.is_err());
    }
}
