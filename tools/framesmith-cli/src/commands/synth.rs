//! Write a synthetic test sheet.

use std::path::PathBuf;

use framesmith_sprite_core::assemble::save_png;
use framesmith_sprite_core::synthetic::synthetic_sheet;

pub fn run(out: PathBuf, frames: u32, size: u32, square: u32) -> anyhow::Result<()> {
    if frames == 0 || size == 0 {
        anyhow::bail!("--frames and --size must be greater than zero");
    }
    let sheet = synthetic_sheet(frames, size, square);
    save_png(&sheet.image, &out)?;

    println!(
        "Wrote {} ({}x{}, {} frame(s))",
        out.display(),
        sheet.image.width(),
        sheet.image.height(),
        frames
    );
    for (i, sq) in sheet.squares.iter().enumerate() {
        println!("  #{i:<3} square at ({}, {})", sq.left, sq.top);
    }
    Ok(())
}
