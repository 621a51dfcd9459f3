//! Framesmith Asset Audit
//!
//! Finds dead and missing audio assets by cross-referencing the audio
//! manifest, the files that actually exist, and the string literals used
//! in game scripts and scenes.

pub mod audit;
pub mod listing;
pub mod manifest;
pub mod scan;

pub use audit::{AmbiguousPolicy, AssetStatus, AuditReport, AuditRow, Auditor, EvidenceType};
pub use listing::FileListing;
pub use manifest::{AudioManifest, ManifestError, SoundEntry};
pub use scan::{SourceScanner, StringLiteral};
