//! Framesmith Telemetry
//!
//! Reads the JSON-Lines gameplay logs written by debug builds and reduces
//! them to a summary: event counts, sessions, time span and basic statistics
//! for every numeric field.

pub mod event;
pub mod summary;

pub use event::{parse_line, parse_log, ParsedLog, TelemetryEvent};
pub use summary::{summarize, summarize_file, FieldStats, TelemetrySummary};
