//! Error types shared across Framesmith crates.

use std::path::PathBuf;

/// Top-level error type for Framesmith operations.
#[derive(Debug, thiserror::Error)]
pub enum FramesmithError {
    #[error("Processing error: {message}")]
    Processing { message: String },

    #[error("Audit error: {message}")]
    Audit { message: String },

    #[error("Telemetry error: {message}")]
    Telemetry { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Image error at {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using FramesmithError.
pub type FramesmithResult<T> = Result<T, FramesmithError>;

impl FramesmithError {
    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }

    pub fn audit(msg: impl Into<String>) -> Self {
        Self::Audit {
            message: msg.into(),
        }
    }

    pub fn telemetry(msg: impl Into<String>) -> Self {
        Self::Telemetry {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }
}
