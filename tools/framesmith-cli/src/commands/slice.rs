//! Split an assembled strip back into frame PNGs.

use std::path::PathBuf;

use framesmith_sprite_core::assemble::{load_rgba, save_png, slice_strip};

pub fn run(sheet: PathBuf, out_dir: PathBuf, frame_width: u32, padding: u32) -> anyhow::Result<()> {
    if frame_width == 0 {
        anyhow::bail!("--frame-width must be greater than zero");
    }
    let image = load_rgba(&sheet)?;

    let stride = u64::from(frame_width) + u64::from(padding);
    if (u64::from(image.width()) + u64::from(padding)) % stride != 0 {
        tracing::warn!(
            "Sheet width {} is not a whole number of {}px frames (padding {}); trailing columns ignored",
            image.width(),
            frame_width,
            padding
        );
    }

    let frames = slice_strip(&image, frame_width, padding);
    for (i, frame) in frames.iter().enumerate() {
        save_png(frame, &out_dir.join(format!("frame_{i:02}.png")))?;
    }
    println!("Wrote {} frame(s) to {}", frames.len(), out_dir.display());
    Ok(())
}
