//! Tool configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FramesmithError, FramesmithResult};

/// Global tool configuration.
///
/// Every section is optional in the file; missing fields take their defaults
/// so a config only needs to name what it changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Sprite pipeline defaults.
    pub sprite: SpriteDefaults,

    /// Asset audit defaults.
    pub audit: AuditDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default sprite pipeline parameters, used when a CLI flag is not given.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteDefaults {
    /// Alpha value a pixel must exceed to count as content.
    pub alpha_threshold: u8,

    /// Output frame edge length in pixels.
    pub frame_size: u32,

    /// Minimum width of a transparent run that separates two frames.
    pub min_gap: u32,

    /// Gaussian sigma for the valley detector.
    pub smoothing_sigma: f64,

    /// Boundary policy name: "gap", "valley" or "grid".
    pub boundary: String,

    /// Anchor kind name: "bbox" or "centroid".
    pub anchor: String,

    /// Horizontal padding between frames in assembled sheets.
    pub padding: u32,
}

/// Default asset audit parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditDefaults {
    /// Source file extensions scanned for string literals.
    pub source_extensions: Vec<String>,

    /// How dynamically-built references are counted: "report", "used" or "unused".
    pub ambiguous_policy: String,

    /// Audio directory (relative to the project root) checked for orphan files.
    pub audio_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "framesmith=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for SpriteDefaults {
    fn default() -> Self {
        Self {
            alpha_threshold: 10,
            frame_size: 64,
            min_gap: 2,
            smoothing_sigma: 2.0,
            boundary: "gap".to_string(),
            anchor: "bbox".to_string(),
            padding: 0,
        }
    }
}

impl Default for AuditDefaults {
    fn default() -> Self {
        Self {
            source_extensions: vec!["gd".to_string(), "tscn".to_string(), "tres".to_string()],
            ambiguous_policy: "report".to_string(),
            audio_dir: PathBuf::from("assets/audio"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ToolConfig {
    /// Load config from `config_path`.
    ///
    /// A missing file yields the defaults. An unreadable or malformed one is
    /// an error; callers usually log it and carry on with the defaults.
    pub fn load_from(config_path: &Path) -> FramesmithResult<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(config_path).map_err(|e| {
            FramesmithError::config(format!("Failed to read {}: {e}", config_path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            FramesmithError::config(format!("Failed to parse {}: {e}", config_path.display()))
        })
    }

    /// Save config to `config_path`, creating parent directories.
    pub fn save_to(&self, config_path: &Path) -> FramesmithResult<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("framesmith").join("config.json")
}
