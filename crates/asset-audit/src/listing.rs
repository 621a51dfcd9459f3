//! Physical file listings.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use framesmith_common::error::{FramesmithError, FramesmithResult};

/// Normalize an asset path for comparison: drop `res://` and `./`
/// prefixes and use forward slashes.
pub fn normalize_asset_path(path: &str) -> String {
    let mut p = path.trim().replace('\\', "/");
    if let Some(rest) = p.strip_prefix("res://") {
        p = rest.to_string();
    }
    while let Some(rest) = p.strip_prefix("./") {
        p = rest.to_string();
    }
    p.trim_start_matches('/').to_string()
}

/// Set of files known to exist, as normalized relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileListing {
    paths: BTreeSet<String>,
}

impl FileListing {
    /// Build a listing from explicit paths (e.g. a file list exported from
    /// version control).
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            paths: paths
                .into_iter()
                .map(|p| normalize_asset_path(p.as_ref()))
                .collect(),
        }
    }

    /// Walk `root` recursively, following symlinks. Hidden entries (`.git`,
    /// `.godot`, ...) are skipped, and entries that cannot be read are
    /// logged and left out.
    pub fn from_dir(root: &Path) -> FramesmithResult<Self> {
        if !root.is_dir() {
            return Err(FramesmithError::audit(format!(
                "asset root {} is not a directory",
                root.display()
            )));
        }
        let walked = walk_files(root);
        let paths: BTreeSet<String> = walked
            .files
            .iter()
            .map(|(_, rel)| normalize_asset_path(rel))
            .collect();
        tracing::debug!("Indexed {} files under {}", paths.len(), root.display());
        Ok(Self { paths })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(&normalize_asset_path(path))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Files under `prefix` (a normalized directory path).
    pub fn under(&self, prefix: &str) -> impl Iterator<Item = &str> + '_ {
        let prefix = normalize_asset_path(prefix);
        let prefix = if prefix.is_empty() || prefix.ends_with('/') {
            prefix
        } else {
            format!("{prefix}/")
        };
        self.paths
            .iter()
            .filter(move |p| p.starts_with(&prefix))
            .map(String::as_str)
    }
}

/// Regular files found under a root, in file name order.
#[derive(Debug, Default)]
pub(crate) struct WalkedFiles {
    /// Absolute path and `/`-separated path relative to the root.
    pub files: Vec<(PathBuf, String)>,
    /// Entries that could not be read, with the reason.
    pub failed: Vec<(String, String)>,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Walk `root`, following symlinked directories and files. Hidden entries
/// are pruned; unreadable entries and link loops are logged and recorded.
pub(crate) fn walk_files(root: &Path) -> WalkedFiles {
    let mut walked = WalkedFiles::default();
    let entries = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in entries {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let rel = relative(root, entry.path());
                walked.files.push((entry.into_path(), rel));
            }
            Ok(_) => {}
            Err(e) => {
                let rel = e.path().map(|p| relative(root, p)).unwrap_or_default();
                tracing::warn!("Skipping {}: {}", rel, e);
                walked.failed.push((rel, e.to_string()));
            }
        }
    }
    walked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_engine_and_windows_paths() {
        assert_eq!(
            normalize_asset_path("res://assets/audio/hit.ogg"),
            "assets/audio/hit.ogg"
        );
        assert_eq!(
            normalize_asset_path(".\\assets\\audio\\hit.ogg"),
            "assets/audio/hit.ogg"
        );
        assert_eq!(normalize_asset_path("/assets/a.wav"), "assets/a.wav");
    }

    #[test]
    fn explicit_listing_matches_any_spelling() {
        let listing = FileListing::from_paths(["assets/audio/hit.ogg"]);
        assert!(listing.contains("res://assets/audio/hit.ogg"));
        assert!(listing.contains("./assets/audio/hit.ogg"));
        assert!(!listing.contains("assets/audio/miss.ogg"));
    }

    #[test]
    fn walks_directories_and_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("assets").join("audio");
        std::fs::create_dir_all(&audio).unwrap();
        std::fs::create_dir_all(dir.path().join(".godot")).unwrap();
        std::fs::write(audio.join("hit.ogg"), b"").unwrap();
        std::fs::write(dir.path().join(".godot").join("cache.bin"), b"").unwrap();

        let listing = FileListing::from_dir(dir.path()).unwrap();
        assert_eq!(listing.len(), 1);
        assert!(listing.contains("assets/audio/hit.ogg"));
        assert_eq!(listing.under("assets/audio").count(), 1);
        assert_eq!(listing.under("assets/aud").count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn follows_symlinked_directories() {
        let dir = tempfile::tempdir().unwrap();
        let shared = dir.path().join("shared_audio");
        std::fs::create_dir_all(&shared).unwrap();
        std::fs::write(shared.join("jump.ogg"), b"").unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::os::unix::fs::symlink(&shared, dir.path().join("assets").join("audio")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("nowhere"),
            dir.path().join("dangling.ogg"),
        )
        .unwrap();

        let listing = FileListing::from_dir(dir.path()).unwrap();
        assert!(listing.contains("assets/audio/jump.ogg"));
        assert!(listing.contains("shared_audio/jump.ogg"));
        assert!(!listing.contains("assets/audio"));
        assert!(!listing.contains("dangling.ogg"));
        assert_eq!(listing.len(), 2);

        let walked = walk_files(dir.path());
        assert_eq!(walked.failed.len(), 1);
        assert_eq!(walked.failed[0].0, "dangling.ogg");
    }

    proptest::proptest! {
        #[test]
        fn normalization_is_idempotent(path in "(res://|\\./|/)?[a-z_]{1,8}([/\\\\][a-z_]{1,8}){0,3}") {
            let once = normalize_asset_path(&path);
            proptest::prop_assert_eq!(normalize_asset_path(&once), once.clone());
            proptest::prop_assert!(!once.contains('\\'));
        }
    }
}
