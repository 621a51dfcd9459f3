//! Framesmith CLI: asset pipeline tooling for sprites, audio and telemetry.
//!
//! Usage:
//!   framesmith profile <IMAGE>         Print the alpha density profile and detected frames
//!   framesmith align <IN> <OUT>        Extract, align and reassemble spritesheet frames
//!   framesmith slice <SHEET> <DIR>     Split a strip into frame PNGs
//!   framesmith remove-bg <IMAGE>       Strip a chroma key or baked checkerboard
//!   framesmith audit                   Find missing and dead audio assets
//!   framesmith telemetry <LOG>         Summarize a JSON-Lines telemetry log
//!   framesmith synth <OUT>             Write a synthetic test sheet

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use framesmith_common::config::{config_file_path, ToolConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "framesmith",
    about = "Spritesheet alignment and asset pipeline tooling",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/framesmith/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the alpha density profile of an image and the frames found in it
    Profile {
        /// Spritesheet image
        image: PathBuf,

        /// Profile axis: columns|rows
        #[arg(long, default_value = "columns")]
        axis: String,

        /// Alpha value a pixel must exceed to count as content
        #[arg(long)]
        threshold: Option<u8>,

        /// Expected number of frames
        #[arg(long)]
        frames: Option<u32>,

        /// Boundary policy: gap|valley|grid
        #[arg(long)]
        policy: Option<String>,
    },

    /// Extract, normalize and reassemble the frames of a spritesheet
    Align(commands::align::AlignArgs),

    /// Split a horizontal strip into individual frame PNGs
    Slice {
        /// Assembled strip
        sheet: PathBuf,

        /// Output directory for frame_NN.png files
        out_dir: PathBuf,

        /// Width of one frame in pixels
        #[arg(long)]
        frame_width: u32,

        /// Pixels between frames
        #[arg(long, default_value = "0")]
        padding: u32,
    },

    /// Remove a chroma-key colour or a baked-in checkerboard background
    RemoveBg(commands::remove_bg::RemoveBgArgs),

    /// Audit the audio manifest for missing and unused assets
    Audit(commands::audit::AuditArgs),

    /// Summarize a JSON-Lines telemetry log
    Telemetry {
        /// Log file
        log: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a synthetic sheet of jittered red squares
    Synth {
        /// Output PNG
        out: PathBuf,

        /// Number of frames
        #[arg(long, default_value = "4")]
        frames: u32,

        /// Frame edge length
        #[arg(long, default_value = "64")]
        size: u32,

        /// Square edge length
        #[arg(long, default_value = "40")]
        square: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config_file_path);
    let (mut config, config_error) = match ToolConfig::load_from(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (ToolConfig::default(), Some(e)),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    framesmith_common::logging::init_logging(&config.logging);
    if let Some(e) = config_error {
        tracing::warn!("{e}; using defaults");
    }

    match cli.command {
        Commands::Profile {
            image,
            axis,
            threshold,
            frames,
            policy,
        } => commands::profile::run(image, axis, threshold, frames, policy, &config),
        Commands::Align(args) => commands::align::run(args, &config),
        Commands::Slice {
            sheet,
            out_dir,
            frame_width,
            padding,
        } => commands::slice::run(sheet, out_dir, frame_width, padding),
        Commands::RemoveBg(args) => commands::remove_bg::run(args),
        Commands::Audit(args) => commands::audit::run(args, &config),
        Commands::Telemetry { log, json } => commands::telemetry::run(log, json),
        Commands::Synth {
            out,
            frames,
            size,
            square,
        } => commands::synth::run(out, frames, size, square),
    }
}
