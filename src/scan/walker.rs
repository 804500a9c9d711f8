//! Category directory walker for flat-file components (ACPI tables, drivers, tools)

use crate::scan::path::relative_slash_path;
use crate::scan::SkippedPath;
use std::path::PathBuf;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Category walker configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Whether to follow symbolic links (default: false for determinism)
    pub follow_symlinks: bool,
    /// Accepted file extensions, lowercase and without the dot
    pub extensions: Vec<String>,
    /// Maximum depth to traverse below the category directory (None = unlimited)
    pub max_depth: Option<usize>,
}

impl WalkerConfig {
    pub fn for_extensions(extensions: &[&str]) -> Self {
        Self {
            follow_symlinks: false,
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
            max_depth: None,
        }
    }
}

/// Files found under one category directory
#[derive(Debug, Clone, Default)]
pub struct WalkOutcome {
    /// `/`-separated paths relative to the category directory, sorted
    pub files: Vec<String>,
    pub skipped: Vec<SkippedPath>,
}

/// Category directory walker
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    pub fn new(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Walk the category directory and collect matching files.
    ///
    /// Unreadable entries become skips rather than errors. Returned paths are
    /// sorted for determinism.
    pub fn walk(&self) -> WalkOutcome {
        let mut outcome = WalkOutcome::default();

        let walker = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .max_depth(self.config.max_depth.unwrap_or(usize::MAX))
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .and_then(|p| relative_slash_path(&self.root, p))
                        .unwrap_or_else(|| self.root.display().to_string());
                    warn!(path = %path, error = %e, "Skipping unreadable entry");
                    outcome.skipped.push(SkippedPath::new(path, e.to_string()));
                    continue;
                }
            };

            if !self.accepts(&entry) {
                continue;
            }
            if !entry.file_type().is_file() {
                // Unfollowed links still count when they resolve to a regular file.
                if !entry.path_is_symlink() {
                    continue;
                }
                match std::fs::metadata(entry.path()) {
                    Ok(meta) if meta.is_file() => {}
                    Ok(_) => continue,
                    Err(e) => {
                        let path = relative_slash_path(&self.root, entry.path())
                            .unwrap_or_else(|| entry.path().display().to_string());
                        warn!(path = %path, error = %e, "Skipping broken symbolic link");
                        outcome
                            .skipped
                            .push(SkippedPath::new(path, format!("broken symbolic link: {}", e)));
                        continue;
                    }
                }
            }

            match relative_slash_path(&self.root, entry.path()) {
                Some(rel) => outcome.files.push(rel),
                None => outcome.skipped.push(SkippedPath::new(
                    entry.path().display().to_string(),
                    "path is outside the category directory",
                )),
            }
        }

        outcome.files.sort();
        outcome.files.dedup();
        outcome.skipped.sort();
        debug!(
            root = %self.root.display(),
            files = outcome.files.len(),
            skipped = outcome.skipped.len(),
            "Walked category directory"
        );
        outcome
    }

    fn accepts(&self, entry: &DirEntry) -> bool {
        entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .map(|ext| self.config.extensions.iter().any(|e| *e == ext))
            .unwrap_or(false)
    }
}

/// Names starting with `.` (including `._` resource forks) are never components.
pub(crate) fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
