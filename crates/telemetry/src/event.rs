//! Telemetry events.
//!
//! One JSON object per line:
//!
//! ```text
//! {"event":"player_hit","t":12.5,"session":"a1","damage":7,"source":"slime"}
//! ```
//!
//! `type` is accepted in place of `event` and `timestamp` in place of `t`.
//! When both spellings are present the canonical one wins and the other is
//! kept as an ordinary field.

use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryEvent {
    pub event: String,
    /// Seconds since session start.
    pub timestamp: Option<f64>,
    pub session: Option<String>,
    /// Every other field of the line.
    pub fields: Map<String, Value>,
}

impl TelemetryEvent {
    /// Numeric fields, in key order.
    pub fn numeric_fields(&self) -> impl Iterator<Item = (&str, f64)> {
        self.fields
            .iter()
            .filter_map(|(k, v)| v.as_f64().map(|n| (k.as_str(), n)))
    }
}

/// Parse one line. Returns `None` for anything that is not a JSON object
/// with a string event name.
pub fn parse_line(line: &str) -> Option<TelemetryEvent> {
    let Value::Object(mut fields) = serde_json::from_str::<Value>(line).ok()? else {
        return None;
    };

    let event = take_string(&mut fields, "event").or_else(|| take_string(&mut fields, "type"))?;
    let timestamp = take_number(&mut fields, "t").or_else(|| take_number(&mut fields, "timestamp"));
    let session = take_string(&mut fields, "session");

    Some(TelemetryEvent {
        event,
        timestamp,
        session,
        fields,
    })
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !matches!(fields.get(key), Some(Value::String(_))) {
        return None;
    }
    match fields.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

fn take_number(fields: &mut Map<String, Value>, key: &str) -> Option<f64> {
    let n = fields.get(key)?.as_f64()?;
    fields.remove(key);
    Some(n)
}

/// Result of parsing a whole log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLog {
    pub events: Vec<TelemetryEvent>,
    /// Non-blank, non-comment lines seen.
    pub lines: usize,
    /// 1-based line numbers that failed to parse.
    pub malformed: Vec<usize>,
}

/// Parse a JSONL log. Blank lines and `#` comments are ignored; malformed
/// lines are recorded and skipped.
pub fn parse_log(text: &str) -> ParsedLog {
    let mut log = ParsedLog::default();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        log.lines += 1;
        match parse_line(line) {
            Some(event) => log.events.push(event),
            None => {
                tracing::debug!("Malformed telemetry line {}", idx + 1);
                log.malformed.push(idx + 1);
            }
        }
    }
    if !log.malformed.is_empty() {
        tracing::warn!(
            "{} of {} telemetry line(s) were malformed",
            log.malformed.len(),
            log.lines
        );
    }
    log
}
