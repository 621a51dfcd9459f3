//! Log summaries.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use framesmith_common::error::{FramesmithError, FramesmithResult};

use crate::event::{parse_log, ParsedLog};

/// Running statistics for one numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl FieldStats {
    fn new(value: f64) -> Self {
        Self {
            count: 1,
            min: value,
            max: value,
            mean: value,
        }
    }

    fn push(&mut self, value: f64) {
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.mean += (value - self.mean) / self.count as f64;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySummary {
    /// Non-blank, non-comment lines.
    pub lines: usize,
    pub parsed: usize,
    pub malformed: usize,
    pub by_event: BTreeMap<String, usize>,
    /// Events per session id.
    pub sessions: BTreeMap<String, usize>,
    pub first_ts: Option<f64>,
    pub last_ts: Option<f64>,
    pub numeric_fields: BTreeMap<String, FieldStats>,
}

impl TelemetrySummary {
    /// Seconds between the earliest and latest timestamp.
    pub fn span_secs(&self) -> Option<f64> {
        Some(self.last_ts? - self.first_ts?)
    }
}

pub fn summarize(log: &ParsedLog) -> TelemetrySummary {
    let mut summary = TelemetrySummary {
        lines: log.lines,
        parsed: log.events.len(),
        malformed: log.malformed.len(),
        ..Default::default()
    };

    for event in &log.events {
        *summary.by_event.entry(event.event.clone()).or_default() += 1;
        if let Some(session) = &event.session {
            *summary.sessions.entry(session.clone()).or_default() += 1;
        }
        if let Some(t) = event.timestamp {
            summary.first_ts = Some(summary.first_ts.map_or(t, |f| f.min(t)));
            summary.last_ts = Some(summary.last_ts.map_or(t, |l| l.max(t)));
        }
        for (name, value) in event.numeric_fields() {
            summary
                .numeric_fields
                .entry(name.to_string())
                .and_modify(|s| s.push(value))
                .or_insert_with(|| FieldStats::new(value));
        }
    }
    summary
}

/// Read and summarize a log file.
pub fn summarize_file(path: &Path) -> FramesmithResult<TelemetrySummary> {
    if !path.exists() {
        return Err(FramesmithError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|e| {
        FramesmithError::telemetry(format!("{} is not UTF-8: {e}", path.display()))
    })?;
    let summary = summarize(&parse_log(&text));
    tracing::info!(
        parsed = summary.parsed,
        malformed = summary.malformed,
        "Summarized {}",
        path.display()
    );
    Ok(summary)
}

impl fmt::Display for TelemetrySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Lines: {} ({} parsed, {} malformed)",
            self.lines, self.parsed, self.malformed
        )?;
        if let (Some(first), Some(last)) = (self.first_ts, self.last_ts) {
            writeln!(f, "Time span: {first:.2}s .. {last:.2}s ({:.2}s)", last - first)?;
        }
        writeln!(f, "Sessions: {}", self.sessions.len())?;

        writeln!(f, "Events:")?;
        let mut events: Vec<_> = self.by_event.iter().collect();
        events.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (name, count) in events {
            writeln!(f, "  {name:<24} {count:>6}")?;
        }

        if !self.numeric_fields.is_empty() {
            writeln!(f, "Numeric fields:")?;
            for (name, s) in &self.numeric_fields {
                writeln!(
                    f,
                    "  {name:<24} n={:<6} min={:<10.3} max={:<10.3} mean={:.3}",
                    s.count, s.min, s.max, s.mean
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const LOG: &str = r#"{"event":"run_start","t":0.0,"session":"a1"}
{"event":"player_hit","t":4.0,"session":"a1","damage":6}
{"event":"player_hit","t":9.5,"session":"a1","damage":10}
{"event":"run_start","t":1.0,"session":"b2"}
{"event":"player_hit","t":2.0,"session":"b2","damage":2,"crit":true}
not json at all
"#;

    #[test]
    fn counts_events_sessions_and_span() {
        let s = summarize(&parse_log(LOG));
        assert_eq!(s.lines, 6);
        assert_eq!(s.parsed, 5);
        assert_eq!(s.malformed, 1);
        assert_eq!(s.by_event["player_hit"], 3);
        assert_eq!(s.sessions["a1"], 3);
        assert_eq!(s.sessions["b2"], 2);
        assert_eq!(s.first_ts, Some(0.0));
        assert_eq!(s.last_ts, Some(9.5));
        assert_eq!(s.span_secs(), Some(9.5));
    }

    #[test]
    fn numeric_field_stats() {
        let s = summarize(&parse_log(LOG));
        let damage = s.numeric_fields["damage"];
        assert_eq!(damage.count, 3);
        assert_eq!(damage.min, 2.0);
        assert_eq!(damage.max, 10.0);
        assert!((damage.mean - 6.0).abs() < 1e-9);
        assert!(!s.numeric_fields.contains_key("crit"));
    }

    #[test]
    fn display_lists_busiest_event_first() {
        let text = summarize(&parse_log(LOG)).to_string();
        let hit = text.find("player_hit").unwrap();
        let start = text.find("run_start").unwrap();
        assert!(hit < start, "{text}");
        assert!(text.contains("1 malformed"));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = summarize_file(Path::new("/nonexistent/telemetry.jsonl")).unwrap_err();
        assert!(matches!(err, FramesmithError::FileNotFound { .. }));
    }

    proptest! {
        #[test]
        fn mean_stays_within_bounds(values in prop::collection::vec(-1.0e6f64..1.0e6, 1..50)) {
            let text: String = values
                .iter()
                .map(|v| format!("{{\"event\":\"tick\",\"v\":{v}}}\n"))
                .collect();
            let s = summarize(&parse_log(&text));
            let stats = s.numeric_fields["v"];
            prop_assert_eq!(stats.count, values.len());
            prop_assert!(stats.min <= stats.mean + 1e-6);
            prop_assert!(stats.mean <= stats.max + 1e-6);
        }
    }
}
