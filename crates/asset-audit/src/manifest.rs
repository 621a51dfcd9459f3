//! Audio manifest model.
//!
//! The manifest maps a logical sound id to the physical files it may play
//! plus playback metadata:
//!
//! ```json
//! {
//!   "sword_swing": {
//!     "files": ["res://assets/audio/sfx/sword_swing_01.ogg"],
//!     "volume_db": -3.0,
//!     "bus": "SFX",
//!     "pitch_scale": { "min": 0.95, "max": 1.05 }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The whole manifest, ordered by sound id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioManifest {
    pub sounds: BTreeMap<String, SoundEntry>,
}

/// One logical sound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundEntry {
    /// Candidate files, one picked at random on playback.
    pub files: Vec<String>,

    #[serde(default)]
    pub volume_db: f32,

    #[serde(default = "default_bus")]
    pub bus: String,

    #[serde(default)]
    pub pitch_scale: PitchScale,
}

/// Random pitch range applied on playback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchScale {
    pub min: f32,
    pub max: f32,
}

impl Default for PitchScale {
    fn default() -> Self {
        Self { min: 1.0, max: 1.0 }
    }
}

fn default_bus() -> String {
    "SFX".to_string()
}

impl SoundEntry {
    pub fn new(files: Vec<String>) -> Self {
        Self {
            files,
            volume_db: 0.0,
            bus: default_bus(),
            pitch_scale: PitchScale::default(),
        }
    }
}

impl AudioManifest {
    /// Load a manifest from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ManifestError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let manifest: Self =
            serde_json::from_str(&json).map_err(|e| ManifestError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Save as pretty-printed JSON, overwriting `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| ManifestError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ManifestError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(path, json).map_err(|e| ManifestError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Reject entries that cannot be played at all.
    pub fn validate(&self) -> Result<(), ManifestError> {
        for (id, entry) in &self.sounds {
            if id.trim().is_empty() {
                return Err(ManifestError::ValidationError {
                    message: "empty sound id".to_string(),
                });
            }
            if entry.pitch_scale.min > entry.pitch_scale.max {
                return Err(ManifestError::ValidationError {
                    message: format!(
                        "{id}: pitch_scale.min {} exceeds max {}",
                        entry.pitch_scale.min, entry.pitch_scale.max
                    ),
                });
            }
        }
        Ok(())
    }

    /// Iterate `(sound_id, file_path)` pairs in id order.
    pub fn file_refs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sounds.iter().flat_map(|(id, entry)| {
            entry
                .files
                .iter()
                .map(move |file| (id.as_str(), file.as_str()))
        })
    }

    pub fn file_count(&self) -> usize {
        self.sounds.values().map(|e| e.files.len()).sum()
    }
}

/// Errors that can occur when loading or saving a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid manifest: {message}")]
    ValidationError { message: String },
}
