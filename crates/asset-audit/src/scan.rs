//! String literal scanning over project source files.
//!
//! Audio ids and resource paths show up in scripts and scene files as plain
//! string literals. Some are built at runtime (`"footstep_" + surface`,
//! `"hit_%d" % n`); those are recorded as *dynamic* with the static prefix
//! that precedes the variable part.

use std::path::Path;

use serde::{Deserialize, Serialize};

use framesmith_common::error::{FramesmithError, FramesmithResult};

use crate::listing::walk_files;

/// A string literal found in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringLiteral {
    pub value: String,
    /// Source file, relative to the scan root.
    pub file: String,
    /// 1-based line of the opening quote.
    pub line: usize,
    /// For runtime-built strings, the text before the variable part.
    pub dynamic_prefix: Option<String>,
}

impl StringLiteral {
    pub fn is_dynamic(&self) -> bool {
        self.dynamic_prefix.is_some()
    }

    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

/// Extract every string literal from `source`.
///
/// `line_comment` starts a comment running to end of line (`#` for
/// GDScript). Single, double and triple quotes of either kind are recognised;
/// backslash escapes are honoured. A single-quoted literal left open at end
/// of line is discarded.
pub fn extract_literals(file: &str, source: &str, line_comment: Option<char>) -> Vec<StringLiteral> {
    let chars: Vec<char> = source.chars().collect();
    let mut literals = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\n' {
            line += 1;
            i += 1;
            continue;
        }
        if Some(c) == line_comment {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        if c != '"' && c != '\'' {
            i += 1;
            continue;
        }

        let start_line = line;
        let triple = chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c);
        i += if triple { 3 } else { 1 };

        let mut value = String::new();
        let mut closed = false;
        while i < chars.len() {
            let ch = chars[i];
            if triple {
                if ch == c && chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c) {
                    i += 3;
                    closed = true;
                    break;
                }
            } else if ch == c {
                i += 1;
                closed = true;
                break;
            } else if ch == '\n' {
                break;
            }

            if ch == '\\' && i + 1 < chars.len() {
                let escaped = chars[i + 1];
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
                if escaped == '\n' {
                    line += 1;
                }
                i += 2;
                continue;
            }
            if ch == '\n' {
                line += 1;
            }
            value.push(ch);
            i += 1;
        }

        if !closed {
            continue;
        }

        let next = chars[i..]
            .iter()
            .find(|ch| **ch != ' ' && **ch != '\t')
            .copied();
        let placeholder = PLACEHOLDERS.iter().filter_map(|p| value.find(*p)).min();
        let dynamic_prefix = match placeholder {
            Some(pos) => Some(value[..pos].to_string()),
            None if matches!(next, Some('+') | Some('%')) => Some(value.clone()),
            None => None,
        };

        literals.push(StringLiteral {
            value,
            file: file.to_string(),
            line: start_line,
            dynamic_prefix,
        });
    }

    literals
}

const PLACEHOLDERS: [&str; 5] = ["%s", "%d", "%f", "%02d", "{"];

/// Result of scanning a source tree.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub literals: Vec<StringLiteral>,
    pub files_scanned: usize,
    /// Files that could not be read, with the reason.
    pub files_failed: Vec<(String, String)>,
}

/// Recursively scans source files with the configured extensions.
#[derive(Debug, Clone)]
pub struct SourceScanner {
    extensions: Vec<String>,
}

impl SourceScanner {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    fn wants(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|want| want.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    /// Scan one file's text.
    pub fn scan_text(&self, file: &str, text: &str) -> Vec<StringLiteral> {
        let comment = if file.ends_with(".gd") { Some('#') } else { None };
        extract_literals(file, text, comment)
    }

    /// Scan every matching file under `root`, following symlinks. Unreadable
    /// files and directories are logged and skipped.
    pub fn scan_dir(&self, root: &Path) -> FramesmithResult<ScanResult> {
        if !root.is_dir() {
            return Err(FramesmithError::audit(format!(
                "source root {} is not a directory",
                root.display()
            )));
        }
        let walked = walk_files(root);
        let mut result = ScanResult {
            files_failed: walked.failed,
            ..Default::default()
        };
        for (path, rel) in walked.files {
            if !self.wants(&path) {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    result.literals.extend(self.scan_text(&rel, &text));
                    result.files_scanned += 1;
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", rel, e);
                    result.files_failed.push((rel, e.to_string()));
                }
            }
        }
        tracing::info!(
            files = result.files_scanned,
            literals = result.literals.len(),
            failed = result.files_failed.len(),
            "Scanned sources under {}",
            root.display()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(literals: &[StringLiteral]) -> Vec<&str> {
        literals.iter().map(|l| l.value.as_str()).collect()
    }

    #[test]
    fn extracts_quoted_literals_with_lines() {
        let src = "var a = \"sword_swing\"\n\nplay('ui_click')\n";
        let lits = extract_literals("player.gd", src, Some('#'));
        assert_eq!(values(&lits), vec!["sword_swing", "ui_click"]);
        assert_eq!(lits[0].line, 1);
        assert_eq!(lits[1].line, 3);
        assert_eq!(lits[1].location(), "player.gd:3");
        assert!(lits.iter().all(|l| !l.is_dynamic()));
    }

    #[test]
    fn comments_and_escapes() {
        let src = "# play(\"commented_out\")\nvar s = \"say \\\"hi\\\"\" # \"trailing\"\n";
        let lits = extract_literals("a.gd", src, Some('#'));
        assert_eq!(values(&lits), vec!["say \"hi\""]);
    }

    #[test]
    fn hash_inside_string_is_not_a_comment() {
        let lits = extract_literals("a.gd", "var c = \"#ff0000\"\n", Some('#'));
        assert_eq!(values(&lits), vec!["#ff0000"]);
    }

    #[test]
    fn detects_dynamic_construction() {
        let src = concat!(
            "play(\"footstep_\" + surface)\n",
            "play(\"hit_%d\" % n)\n",
            "play(\"{0}_{1}\".format([a, b]))\n",
            "play(\"plain\")\n",
        );
        let lits = extract_literals("a.gd", src, Some('#'));
        let prefixes: Vec<Option<&str>> =
            lits.iter().map(|l| l.dynamic_prefix.as_deref()).collect();
        assert_eq!(
            prefixes,
            vec![Some("footstep_"), Some("hit_"), Some(""), None]
        );
    }

    #[test]
    fn triple_quoted_spans_lines() {
        let src = "var doc = \"\"\"line one\nline two\"\"\"\nvar x = \"after\"\n";
        let lits = extract_literals("a.gd", src, Some('#'));
        assert_eq!(values(&lits), vec!["line one\nline two", "after"]);
        assert_eq!(lits[1].line, 3);
    }

    #[test]
    fn single_quoted_triple_spans_lines() {
        let src = "var doc = '''it's \"quoted\"\nstill doc'''\nplay('after')\n";
        let lits = extract_literals("a.gd", src, Some('#'));
        assert_eq!(values(&lits), vec!["it's \"quoted\"\nstill doc", "after"]);
        assert_eq!(lits[1].line, 3);
    }

    #[test]
    fn unterminated_literal_is_dropped() {
        let lits = extract_literals("a.gd", "var x = \"oops\nvar y = \"ok\"\n", Some('#'));
        assert_eq!(values(&lits), vec!["ok"]);
    }

    #[test]
    fn scene_files_keep_hash_characters() {
        let scanner = SourceScanner::new(["gd", "tscn"]);
        let lits = scanner.scan_text(
            "level.tscn",
            "[ext_resource path=\"res://assets/audio/wind.ogg\" id=\"1_ab#c\"]\n",
        );
        assert_eq!(values(&lits), vec!["res://assets/audio/wind.ogg", "1_ab#c"]);
    }

    #[test]
    fn scans_matching_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("scripts")).unwrap();
        std::fs::write(dir.path().join("scripts").join("enemy.gd"), "play(\"growl\")\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "\"ignored\"\n").unwrap();
        std::fs::write(dir.path().join("bad.gd"), [0xff, 0xfe, 0x00]).unwrap();

        let scanner = SourceScanner::new([".GD"]);
        let result = scanner.scan_dir(dir.path()).unwrap();
        assert_eq!(result.files_scanned, 1);
        assert_eq!(result.files_failed.len(), 1);
        assert_eq!(values(&result.literals), vec!["growl"]);
        assert_eq!(result.literals[0].file, "scripts/enemy.gd");
    }

    #[cfg(unix)]
    #[test]
    fn scans_through_symlinked_script_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("scripts_real");
        std::fs::create_dir_all(&real).unwrap();
        std::fs::write(real.join("p.gd"), "play(\"jump\")\n").unwrap();
        std::os::unix::fs::symlink(&real, dir.path().join("scripts")).unwrap();

        let result = SourceScanner::new(["gd"]).scan_dir(dir.path()).unwrap();
        let files: Vec<&str> = result.literals.iter().map(|l| l.file.as_str()).collect();
        assert_eq!(files, vec!["scripts/p.gd", "scripts_real/p.gd"]);
        assert!(result.files_failed.is_empty());
    }

    #[test]
    fn missing_root_is_an_audit_error() {
        let err = SourceScanner::new(["gd"])
            .scan_dir(Path::new("/nonexistent/project"))
            .unwrap_err();
        assert!(matches!(err, FramesmithError::Audit { .. }));
    }
}
