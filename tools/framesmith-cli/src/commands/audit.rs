//! Audit the audio manifest against the project tree.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use framesmith_asset_audit::{
    AmbiguousPolicy, AssetStatus, AudioManifest, Auditor, FileListing, SourceScanner,
};
use framesmith_common::config::ToolConfig;

#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Audio manifest JSON
    #[arg(long)]
    pub manifest: PathBuf,

    /// Project root scanned for sources and files
    #[arg(long)]
    pub root: PathBuf,

    /// Audio directory (relative to the root) checked for orphan files
    #[arg(long)]
    pub audio_dir: Option<PathBuf>,

    /// Text file listing existing files, one per line, instead of walking the root
    #[arg(long)]
    pub file_list: Option<PathBuf>,

    /// Dynamic-only references: report|used|unused
    #[arg(long)]
    pub policy: Option<String>,

    /// Write the full JSON report here
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write missing paths here, one per line
    #[arg(long)]
    pub export_missing: Option<PathBuf>,

    /// Write a cleaned manifest here
    #[arg(long)]
    pub regenerate: Option<PathBuf>,

    /// With --regenerate, also drop unused entries
    #[arg(long = "final")]
    pub final_pass: bool,
}

pub fn run(args: AuditArgs, config: &ToolConfig) -> anyhow::Result<()> {
    let defaults = &config.audit;
    let policy: AmbiguousPolicy = args
        .policy
        .as_deref()
        .unwrap_or(&defaults.ambiguous_policy)
        .parse()?;

    let manifest = AudioManifest::load(&args.manifest)
        .with_context(|| format!("Failed to load manifest {}", args.manifest.display()))?;

    let scan = SourceScanner::new(defaults.source_extensions.iter().cloned()).scan_dir(&args.root)?;

    let listing = match &args.file_list {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file list {}", path.display()))?;
            FileListing::from_paths(text.lines().map(str::trim).filter(|l| !l.is_empty()))
        }
        None => FileListing::from_dir(&args.root)?,
    };

    let audio_dir = args
        .audio_dir
        .clone()
        .unwrap_or_else(|| defaults.audio_dir.clone());
    let report = Auditor::new(policy)
        .with_audio_dir(audio_dir.to_string_lossy())
        .audit(&manifest, &scan.literals, &listing);

    let s = &report.summary;
    println!("Audit of {} ({:?} policy)", args.manifest.display(), policy);
    println!(
        "  Sounds: {}  File refs: {}  Sources scanned: {} ({} skipped)",
        s.sound_ids,
        s.file_refs,
        scan.files_scanned,
        scan.files_failed.len()
    );
    println!(
        "  Used: {}  Unused: {}  Ambiguous: {}  Missing: {}",
        s.used, s.unused, s.ambiguous, s.missing
    );
    println!("  Unreferenced files under {}: {}", audio_dir.display(), s.unreferenced_files);

    for (label, status) in [
        ("Missing", AssetStatus::Missing),
        ("Ambiguous", AssetStatus::Ambiguous),
        ("Unused", AssetStatus::Unused),
    ] {
        let rows: Vec<_> = report.rows_with(status).collect();
        if rows.is_empty() {
            continue;
        }
        println!();
        println!("{label}:");
        for row in rows {
            let at = row.locations.first().map(String::as_str).unwrap_or("");
            println!("  {:<24} {} {}", row.sound_id, row.original_path, at);
        }
    }

    if let Some(path) = &args.report {
        report.save_json(path)?;
        println!("\nReport: {}", path.display());
    }
    if let Some(path) = &args.export_missing {
        report.export_missing(path)?;
        println!("Missing list: {}", path.display());
    }
    match &args.regenerate {
        Some(path) => {
            let cleaned = report.regenerate_manifest(&manifest, args.final_pass);
            cleaned
                .save(path)
                .with_context(|| format!("Failed to write manifest {}", path.display()))?;
            println!(
                "Regenerated manifest: {} ({} of {} sounds kept)",
                path.display(),
                cleaned.sounds.len(),
                manifest.sounds.len()
            );
        }
        None if args.final_pass => tracing::warn!("--final has no effect without --regenerate"),
        None => {}
    }

    Ok(())
}
