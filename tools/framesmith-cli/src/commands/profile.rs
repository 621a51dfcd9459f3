//! Print an image's alpha density profile and the frames detected in it.

use std::path::PathBuf;

use framesmith_common::config::ToolConfig;
use framesmith_sprite_core::assemble::load_rgba;
use framesmith_sprite_core::boundary::{detect_regions, square_frame_count, DetectionConfig};
use framesmith_sprite_core::density::{alpha_profile, Axis};
use framesmith_sprite_core::BoundaryPolicy;

use super::parse_policy;

pub fn run(
    image: PathBuf,
    axis: String,
    threshold: Option<u8>,
    frames: Option<u32>,
    policy: Option<String>,
    config: &ToolConfig,
) -> anyhow::Result<()> {
    let defaults = &config.sprite;
    let sheet = load_rgba(&image)?;
    let axis = match axis.to_ascii_lowercase().as_str() {
        "columns" | "x" => Axis::Columns,
        "rows" | "y" => Axis::Rows,
        other => anyhow::bail!("Unknown axis '{other}' (expected columns|rows)"),
    };
    let threshold = threshold.unwrap_or(defaults.alpha_threshold);
    let policy = parse_policy(
        policy.as_deref().unwrap_or(&defaults.boundary),
        defaults.min_gap,
        defaults.smoothing_sigma,
    )?;

    let profile = alpha_profile(&sheet, axis, threshold);

    println!("Image: {} ({}x{})", image.display(), sheet.width(), sheet.height());
    println!("  Axis: {axis:?}, threshold: {threshold}");
    println!("  Entries: {}", profile.len());
    println!("  Opaque pixels: {}", profile.total());
    println!("  Peak density: {}", profile.peak());
    match profile.content_span() {
        Some((start, end)) => println!("  Content span: {start}..{end}"),
        None => {
            println!("  Content span: none (image is fully transparent)");
            return Ok(());
        }
    }
    println!();

    let expected = match (frames, policy) {
        (Some(n), _) => Some(n),
        (None, BoundaryPolicy::Grid) => Some(match axis {
            Axis::Columns => square_frame_count(sheet.width(), sheet.height()),
            Axis::Rows => square_frame_count(sheet.height(), sheet.width()),
        }),
        (None, _) => None,
    };
    let detection = detect_regions(
        &profile,
        &DetectionConfig {
            policy,
            expected_frames: expected,
            noise_floor: 0,
        },
    );

    println!(
        "Frames: {} (method: {:?}{})",
        detection.regions.len(),
        detection.method,
        if detection.method.is_fallback() {
            ", fallback"
        } else {
            ""
        }
    );
    for (i, region) in detection.regions.iter().enumerate() {
        println!(
            "  #{i:<3} {:>5}..{:<5} width {}",
            region.start,
            region.end,
            region.width()
        );
    }

    Ok(())
}
