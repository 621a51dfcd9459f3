//! Strip baked-in backgrounds from generated sprite art.

use std::path::{Path, PathBuf};

use clap::Args;

use framesmith_sprite_core::assemble::{load_rgba, save_png};
use framesmith_sprite_core::background::{
    parse_hex_color, remove_checkerboard, remove_chroma_key, CheckerboardConfig,
};

/// Chroma-key tolerance when none is given.
const DEFAULT_CHROMA_TOLERANCE: u8 = 30;

#[derive(Debug, Args)]
pub struct RemoveBgArgs {
    /// Image to clean
    pub input: PathBuf,

    /// Write here instead of overwriting the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Background kind: chroma|checkerboard (chroma when --key is given)
    #[arg(long)]
    pub mode: Option<String>,

    /// Chroma-key colour as #rrggbb
    #[arg(long)]
    pub key: Option<String>,

    /// Colour distance still treated as background
    #[arg(long)]
    pub tolerance: Option<u8>,

    /// Report what would be removed without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the .bak copy when overwriting the input
    #[arg(long)]
    pub no_backup: bool,
}

pub fn run(args: RemoveBgArgs) -> anyhow::Result<()> {
    let mut image = load_rgba(&args.input)?;
    let total = image.width() as usize * image.height() as usize;

    let mode = match (&args.mode, &args.key) {
        (Some(mode), _) => mode.to_ascii_lowercase(),
        (None, Some(_)) => "chroma".to_string(),
        (None, None) => "checkerboard".to_string(),
    };

    let cleared = match mode.as_str() {
        "chroma" => {
            let key = parse_hex_color(args.key.as_deref().unwrap_or("#00ff00"))
                .map_err(anyhow::Error::msg)?;
            let tolerance = args.tolerance.unwrap_or(DEFAULT_CHROMA_TOLERANCE);
            let cleared = remove_chroma_key(&mut image, key, tolerance);
            println!(
                "Chroma key #{:02x}{:02x}{:02x} (tolerance {tolerance}): {cleared} of {total} pixel(s)",
                key[0], key[1], key[2]
            );
            cleared
        }
        "checkerboard" => {
            let mut config = CheckerboardConfig::default();
            if let Some(t) = args.tolerance {
                config.tolerance = t;
            }
            match remove_checkerboard(&mut image, &config) {
                Some(removal) => {
                    println!(
                        "Checkerboard tones {} / {}: {} of {total} pixel(s)",
                        removal.tones[0], removal.tones[1], removal.cleared
                    );
                    removal.cleared
                }
                None => {
                    println!("No checkerboard detected in {}", args.input.display());
                    return Ok(());
                }
            }
        }
        other => anyhow::bail!("Unknown mode '{other}' (expected chroma|checkerboard)"),
    };

    if args.dry_run {
        println!("Dry run: nothing written");
        return Ok(());
    }
    if cleared == 0 {
        println!("Nothing to remove; {} left untouched", args.input.display());
        return Ok(());
    }

    let target = args.output.clone().unwrap_or_else(|| args.input.clone());
    if target == args.input && !args.no_backup {
        let backup = backup_path(&args.input);
        std::fs::copy(&args.input, &backup)?;
        println!("Backup: {}", backup.display());
    }
    save_png(&image, &target)?;
    println!("Wrote {}", target.display());
    Ok(())
}

/// `hero.png` becomes `hero.png.20261017-093000.bak`.
fn backup_path(path: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    path.with_file_name(format!("{name}.{stamp}.bak"))
}
