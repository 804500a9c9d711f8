//! Filesystem Scanner
//!
//! Walks an OC directory, classifies components by category, and parses kext
//! bundle descriptors. The four category walks and the per-bundle descriptor
//! parses run concurrently on a bounded [`pool::WorkerPool`]; results are
//! joined and then sorted so identical trees always produce identical output.

pub mod bundle;
pub mod path;
pub mod pool;
pub mod walker;

use crate::codec::{DocumentCodec, PlistCodec};
use crate::error::ScanError;
use bundle::{discover_bundles, inspect_bundle};
use futures::future::join_all;
use pool::{CancelToken, PoolHandle, WorkerPool};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use walker::{Walker, WalkerConfig};

/// Component category. Declaration order is the scan output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Acpi,
    Kext,
    Driver,
    Tool,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Acpi, Category::Kext, Category::Driver, Category::Tool];

    /// Subdirectory of the OC root holding this category.
    pub fn directory(self) -> &'static str {
        match self {
            Category::Acpi => "ACPI",
            Category::Kext => "Kexts",
            Category::Driver => "Drivers",
            Category::Tool => "Tools",
        }
    }

    /// File extensions for flat-file categories (empty for bundles).
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Category::Acpi => &["aml", "bin"],
            Category::Driver | Category::Tool => &["efi"],
            Category::Kext => &[],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Acpi => "ACPI",
            Category::Kext => "Kext",
            Category::Driver => "Driver",
            Category::Tool => "Tool",
        };
        write!(f, "{}", name)
    }
}

/// A component found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredEntry {
    /// `/`-separated path relative to the category directory
    pub relative_path: String,
    pub category: Category,
    /// Kexts only: executable relative to the bundle, absent for plist-only kexts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<String>,
    /// Kexts only: descriptor relative to the bundle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_identifier: Option<String>,
    /// Kexts only: identifiers listed under `OSBundleLibraries`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<String>,
}

impl DiscoveredEntry {
    /// Entry for a flat file (ACPI table, driver, tool).
    pub fn file(category: Category, relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            category,
            executable_path: None,
            info_path: None,
            bundle_identifier: None,
            libraries: Vec::new(),
        }
    }
}

/// A path the scanner could not use. Always Warning severity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkippedPath {
    pub path: String,
    pub reason: String,
}

impl SkippedPath {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Re-root a skip recorded relative to a category directory.
    fn within(self, directory: &str) -> Self {
        let path = if self.path.is_empty() || self.path.starts_with('/') {
            directory.to_string()
        } else {
            format!("{}/{}", directory, self.path)
        };
        Self { path, ..self }
    }
}

impl fmt::Display for SkippedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Scan output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// The OC directory actually scanned (after `OC/` resolution)
    pub root: PathBuf,
    /// Categories whose directory existed and was walked
    pub scanned: Vec<Category>,
    /// Ordered by category, then path
    pub entries: Vec<DiscoveredEntry>,
    pub skipped: Vec<SkippedPath>,
}

impl ScanReport {
    pub fn entries_for(&self, category: Category) -> impl Iterator<Item = &DiscoveredEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    pub fn count(&self, category: Category) -> usize {
        self.entries_for(category).count()
    }
}

/// Scanner options
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub categories: Vec<Category>,
    /// Worker pool size; defaults to available hardware concurrency
    pub workers: Option<usize>,
    pub follow_symlinks: bool,
    pub cancel: CancelToken,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            categories: Category::ALL.to_vec(),
            workers: None,
            follow_symlinks: false,
            cancel: CancelToken::new(),
        }
    }
}

/// Directories that must exist for a folder to count as an OC root.
const REQUIRED_CATEGORY_DIRS: [Category; 3] = [Category::Acpi, Category::Driver, Category::Kext];

/// Resolve the directory to scan.
///
/// When `root` lacks one of `ACPI/`, `Drivers/` or `Kexts/` but `root/OC`
/// has all three, `root/OC` is used instead. Otherwise `root` is returned as is.
pub fn resolve_oc_root(root: &Path) -> PathBuf {
    let complete = |dir: &Path| {
        REQUIRED_CATEGORY_DIRS
            .iter()
            .all(|c| dir.join(c.directory()).is_dir())
    };
    if complete(root) {
        return root.to_path_buf();
    }
    let nested = root.join("OC");
    if nested.is_dir() && complete(&nested) {
        debug!(root = %nested.display(), "Using nested OC directory");
        return nested;
    }
    root.to_path_buf()
}

/// Filesystem scanner
pub struct Scanner {
    codec: Arc<dyn DocumentCodec>,
    options: ScanOptions,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(Arc::new(PlistCodec::default()))
    }
}

impl Scanner {
    pub fn new(codec: Arc<dyn DocumentCodec>) -> Self {
        Self {
            codec,
            options: ScanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scan `root` on a freshly started worker pool.
    ///
    /// Fails only when the root itself is inaccessible or the scan is cancelled;
    /// everything else is reported through [`ScanReport::skipped`].
    #[instrument(skip(self), fields(root = %root.display()))]
    pub fn scan(&self, root: &Path) -> Result<ScanReport, ScanError> {
        let workers = self.options.workers.unwrap_or_else(pool::default_pool_size);
        let pool = WorkerPool::new(workers, self.options.cancel.clone())?;
        let handle = pool.handle();
        pool.block_on(self.scan_async(root, handle))
    }

    /// Scan `root`, submitting blocking work through `pool`.
    pub async fn scan_async(&self, root: &Path, pool: PoolHandle) -> Result<ScanReport, ScanError> {
        let start = Instant::now();
        let root = check_root(root)?;
        let oc_root = resolve_oc_root(&root);
        info!(root = %oc_root.display(), "Starting scan");

        let mut categories = self.options.categories.clone();
        categories.sort();
        categories.dedup();

        let walks = categories.iter().map(|&category| {
            let pool = pool.clone();
            let dir = oc_root.join(category.directory());
            let codec = Arc::clone(&self.codec);
            let follow_symlinks = self.options.follow_symlinks;
            async move {
                if !dir.is_dir() {
                    warn!(category = %category, dir = %dir.display(), "Category directory not found");
                    return Ok(CategoryScan {
                        category,
                        found: false,
                        entries: Vec::new(),
                        skipped: vec![SkippedPath::new(
                            category.directory(),
                            "directory not found",
                        )],
                    });
                }
                match category {
                    Category::Kext => scan_kexts(dir, codec, pool).await,
                    _ => scan_files(category, dir, follow_symlinks, pool).await,
                }
            }
        });

        let mut scanned = Vec::new();
        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        for result in join_all(walks).await {
            let walk = result?;
            if walk.found {
                scanned.push(walk.category);
            }
            entries.extend(walk.entries);
            skipped.extend(walk.skipped);
        }

        if pool.cancel_token().is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        entries.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.relative_path.cmp(&b.relative_path))
        });
        entries.dedup_by(|a, b| a.category == b.category && a.relative_path == b.relative_path);
        skipped.sort();

        info!(
            entries = entries.len(),
            skipped = skipped.len(),
            duration_ms = start.elapsed().as_millis(),
            "Scan completed"
        );

        Ok(ScanReport {
            root: oc_root,
            scanned,
            entries,
            skipped,
        })
    }
}

struct CategoryScan {
    category: Category,
    found: bool,
    entries: Vec<DiscoveredEntry>,
    skipped: Vec<SkippedPath>,
}

fn check_root(root: &Path) -> Result<PathBuf, ScanError> {
    let canonical = path::canonicalize_root(root).map_err(|source| ScanError::RootInaccessible {
        path: root.to_path_buf(),
        source,
    })?;
    if !canonical.is_dir() {
        return Err(ScanError::RootNotDirectory(root.to_path_buf()));
    }
    std::fs::read_dir(&canonical).map_err(|source| ScanError::RootInaccessible {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(canonical)
}

async fn scan_files(
    category: Category,
    dir: PathBuf,
    follow_symlinks: bool,
    pool: PoolHandle,
) -> Result<CategoryScan, ScanError> {
    let mut config = WalkerConfig::for_extensions(category.extensions());
    config.follow_symlinks = follow_symlinks;
    let outcome = pool.run(move || Walker::new(dir, config).walk()).await?;

    Ok(CategoryScan {
        category,
        found: true,
        entries: outcome
            .files
            .into_iter()
            .map(|rel| DiscoveredEntry::file(category, rel))
            .collect(),
        skipped: outcome
            .skipped
            .into_iter()
            .map(|s| s.within(category.directory()))
            .collect(),
    })
}

async fn scan_kexts(
    dir: PathBuf,
    codec: Arc<dyn DocumentCodec>,
    pool: PoolHandle,
) -> Result<CategoryScan, ScanError> {
    let discovery = pool.run(move || discover_bundles(&dir)).await?;
    let directory = Category::Kext.directory();

    let parses = discovery.candidates.into_iter().map(|candidate| {
        let codec = Arc::clone(&codec);
        let pool = pool.clone();
        async move { pool.run(move || inspect_bundle(codec.as_ref(), &candidate)).await }
    });

    let mut entries = Vec::new();
    let mut skipped: Vec<SkippedPath> = discovery
        .skipped
        .into_iter()
        .map(|s| s.within(directory))
        .collect();

    for parsed in join_all(parses).await {
        match parsed? {
            Ok(entry) => entries.push(entry),
            Err(skip) => {
                warn!(bundle = %skip.path, reason = %skip.reason, "Skipping kext bundle");
                skipped.push(skip.within(directory));
            }
        }
    }

    Ok(CategoryScan {
        category: Category::Kext,
        found: true,
        entries,
        skipped,
    })
}
