//! Path canonicalization and normalization utilities

use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Canonicalize a scan root.
///
/// Resolves symlinks, `..` and `.` through `dunce` so Windows roots do not end
/// up in verbatim (`\\?\`) form.
pub fn canonicalize_root(path: &Path) -> std::io::Result<PathBuf> {
    dunce::canonicalize(path)
}

/// Normalize a component path for identity comparison (no filesystem access).
///
/// This function:
/// 1. Normalizes Unicode to NFC
/// 2. Converts `\` separators to `/`
/// 3. Collapses repeated separators and drops `.` components
/// 4. Removes trailing separators
///
/// Case is preserved; identities compare exactly after normalization.
pub fn normalize_component_path(path: &str) -> String {
    let normalized: String = path.nfc().collect();
    let normalized = normalized.replace('\\', "/");

    normalized
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Render a path relative to `base` with `/` separators.
pub fn relative_slash_path(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(normalize_component_path(&parts.join("/")))
}

/// Final path component, used for default `Comment` values.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
