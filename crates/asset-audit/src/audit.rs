//! Dead/missing asset auditor.
//!
//! Cross-references every file a manifest entry points at with the physical
//! file listing and with the string literals found in source. Missing files
//! always win: a referenced path that does not exist is reported as
//! [`AssetStatus::Missing`] regardless of evidence.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use framesmith_common::error::{FramesmithError, FramesmithResult};

use crate::listing::{normalize_asset_path, FileListing};
use crate::manifest::AudioManifest;
use crate::scan::StringLiteral;

/// How references that are only reachable through runtime-built strings
/// are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguousPolicy {
    /// Keep them as [`AssetStatus::Ambiguous`] for a human to decide.
    #[default]
    Report,
    CountAsUsed,
    CountAsUnused,
}

impl FromStr for AmbiguousPolicy {
    type Err = FramesmithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "report" | "ambiguous" => Ok(Self::Report),
            "used" | "count_as_used" => Ok(Self::CountAsUsed),
            "unused" | "count_as_unused" => Ok(Self::CountAsUnused),
            other => Err(FramesmithError::config(format!(
                "unknown ambiguous policy '{other}' (expected report, used or unused)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetStatus {
    Used,
    Unused,
    Ambiguous,
    Missing,
}

/// Strongest kind of reference found for a sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    None,
    DynamicPrefix,
    PathLiteral,
    DirectId,
}

/// One manifest file reference and its verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRow {
    /// Path as written in the manifest.
    pub original_path: String,
    pub sound_id: String,
    pub status: AssetStatus,
    pub evidence_type: EvidenceType,
    /// `file:line` locations backing the evidence.
    pub locations: Vec<String>,
    pub exists_physically: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub sound_ids: usize,
    pub file_refs: usize,
    pub used: usize,
    pub unused: usize,
    pub ambiguous: usize,
    pub missing: usize,
    pub unreferenced_files: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    pub policy: AmbiguousPolicy,
    pub rows: Vec<AuditRow>,
    pub summary: AuditSummary,
    /// Files under the audio directory that no manifest entry points at.
    pub unreferenced_files: Vec<String>,
}

impl AuditReport {
    pub fn rows_with(&self, status: AssetStatus) -> impl Iterator<Item = &AuditRow> {
        self.rows.iter().filter(move |r| r.status == status)
    }

    /// Manifest paths that do not exist, deduplicated, in manifest order.
    pub fn missing_paths(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rows_with(AssetStatus::Missing)
            .map(|r| r.original_path.as_str())
            .filter(|p| seen.insert(*p))
            .collect()
    }

    /// Write the missing list, one path per line. The file is written even
    /// when nothing is missing so downstream tooling can rely on it.
    pub fn export_missing(&self, path: &Path) -> FramesmithResult<()> {
        let mut out = String::new();
        for p in self.missing_paths() {
            out.push_str(p);
            out.push('\n');
        }
        write_creating_parent(path, out.as_bytes())?;
        tracing::info!(
            "Wrote {} missing path(s) to {}",
            self.summary.missing,
            path.display()
        );
        Ok(())
    }

    pub fn save_json(&self, path: &Path) -> FramesmithResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_creating_parent(path, json.as_bytes())
    }

    /// Build a cleaned manifest: missing files are dropped, and with
    /// `final_pass` unused files too. Ids left without files are removed.
    pub fn regenerate_manifest(&self, manifest: &AudioManifest, final_pass: bool) -> AudioManifest {
        let dropped: HashSet<(&str, &str)> = self
            .rows
            .iter()
            .filter(|r| {
                r.status == AssetStatus::Missing || (final_pass && r.status == AssetStatus::Unused)
            })
            .map(|r| (r.sound_id.as_str(), r.original_path.as_str()))
            .collect();

        let mut sounds = BTreeMap::new();
        for (id, entry) in &manifest.sounds {
            let mut entry = entry.clone();
            entry
                .files
                .retain(|f| !dropped.contains(&(id.as_str(), f.as_str())));
            if entry.files.is_empty() {
                tracing::info!("Dropping sound '{}' (no files left)", id);
                continue;
            }
            sounds.insert(id.clone(), entry);
        }
        AudioManifest { sounds }
    }
}

fn write_creating_parent(path: &Path, bytes: &[u8]) -> FramesmithResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Source literals indexed for lookup.
struct Evidence<'a> {
    exact: BTreeMap<&'a str, Vec<&'a StringLiteral>>,
    paths: BTreeMap<String, Vec<&'a StringLiteral>>,
    /// Raw prefix, its normalized path form, and the literal.
    dynamic: Vec<(&'a str, String, &'a StringLiteral)>,
}

impl<'a> Evidence<'a> {
    fn index(literals: &'a [StringLiteral]) -> Self {
        let mut exact: BTreeMap<&str, Vec<&StringLiteral>> = BTreeMap::new();
        let mut paths: BTreeMap<String, Vec<&StringLiteral>> = BTreeMap::new();
        let mut dynamic = Vec::new();

        for lit in literals {
            match lit.dynamic_prefix.as_deref() {
                Some(prefix) if !prefix.is_empty() => {
                    dynamic.push((prefix, normalize_asset_path(prefix), lit))
                }
                Some(_) => {}
                None => {
                    exact.entry(lit.value.as_str()).or_default().push(lit);
                    paths
                        .entry(normalize_asset_path(&lit.value))
                        .or_default()
                        .push(lit);
                }
            }
        }
        Self {
            exact,
            paths,
            dynamic,
        }
    }

    fn lookup(&self, id: &str, file: &str) -> (EvidenceType, Vec<String>) {
        if let Some(lits) = self.exact.get(id) {
            return (EvidenceType::DirectId, locations(lits.iter().copied()));
        }
        let file = normalize_asset_path(file);
        if let Some(lits) = self.paths.get(&file) {
            return (EvidenceType::PathLiteral, locations(lits.iter().copied()));
        }
        // A runtime-built string may name either the id or the resource path.
        let prefixed: Vec<&StringLiteral> = self
            .dynamic
            .iter()
            .filter(|(prefix, path_prefix, _)| {
                id.starts_with(*prefix)
                    || (!path_prefix.is_empty() && file.starts_with(path_prefix.as_str()))
            })
            .map(|(_, _, lit)| *lit)
            .collect();
        if !prefixed.is_empty() {
            return (EvidenceType::DynamicPrefix, locations(prefixed.into_iter()));
        }
        (EvidenceType::None, Vec::new())
    }
}

fn locations<'a>(lits: impl Iterator<Item = &'a StringLiteral>) -> Vec<String> {
    lits.map(StringLiteral::location)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Runs the audit.
#[derive(Debug, Clone, Default)]
pub struct Auditor {
    policy: AmbiguousPolicy,
    audio_dir: Option<String>,
}

impl Auditor {
    pub fn new(policy: AmbiguousPolicy) -> Self {
        Self {
            policy,
            audio_dir: None,
        }
    }

    /// Report files under `dir` that the manifest never mentions.
    pub fn with_audio_dir(mut self, dir: impl Into<String>) -> Self {
        self.audio_dir = Some(dir.into());
        self
    }

    pub fn policy(&self) -> AmbiguousPolicy {
        self.policy
    }

    pub fn audit(
        &self,
        manifest: &AudioManifest,
        literals: &[StringLiteral],
        listing: &FileListing,
    ) -> AuditReport {
        let evidence = Evidence::index(literals);
        let mut rows = Vec::with_capacity(manifest.file_count());

        for (id, file) in manifest.file_refs() {
            let exists = listing.contains(file);
            let (evidence_type, locations) = evidence.lookup(id, file);
            let status = if !exists {
                tracing::warn!("{}: {} does not exist", id, file);
                AssetStatus::Missing
            } else {
                match evidence_type {
                    EvidenceType::DirectId | EvidenceType::PathLiteral => AssetStatus::Used,
                    EvidenceType::DynamicPrefix => match self.policy {
                        AmbiguousPolicy::Report => AssetStatus::Ambiguous,
                        AmbiguousPolicy::CountAsUsed => AssetStatus::Used,
                        AmbiguousPolicy::CountAsUnused => AssetStatus::Unused,
                    },
                    EvidenceType::None => AssetStatus::Unused,
                }
            };
            tracing::debug!(?status, ?evidence_type, "{} -> {}", id, file);

            rows.push(AuditRow {
                original_path: file.to_string(),
                sound_id: id.to_string(),
                status,
                evidence_type,
                locations,
                exists_physically: exists,
            });
        }

        let unreferenced_files = match &self.audio_dir {
            Some(dir) => {
                let referenced: HashSet<String> = manifest
                    .file_refs()
                    .map(|(_, f)| normalize_asset_path(f))
                    .collect();
                listing
                    .under(dir)
                    .filter(|p| !referenced.contains(*p))
                    .map(str::to_string)
                    .collect()
            }
            None => Vec::new(),
        };

        let count = |status| rows.iter().filter(|r| r.status == status).count();
        let summary = AuditSummary {
            sound_ids: manifest.sounds.len(),
            file_refs: rows.len(),
            used: count(AssetStatus::Used),
            unused: count(AssetStatus::Unused),
            ambiguous: count(AssetStatus::Ambiguous),
            missing: count(AssetStatus::Missing),
            unreferenced_files: unreferenced_files.len(),
        };
        tracing::info!(
            used = summary.used,
            unused = summary.unused,
            ambiguous = summary.ambiguous,
            missing = summary.missing,
            "Audited {} file reference(s)",
            summary.file_refs
        );

        AuditReport {
            generated_at: Utc::now(),
            policy: self.policy,
            rows,
            summary,
            unreferenced_files,
        }
    }
}
