//! Kext bundle discovery and descriptor parsing
//!
//! Bundles are found with an explicit stack capped at [`MAX_BUNDLE_DEPTH`]:
//! top-level `*.kext` directories under `Kexts/`, then plug-in bundles under each
//! bundle's `Contents/PlugIns/`. Descriptor parsing is a separate step so it can
//! run on the worker pool.

use crate::codec::DocumentCodec;
use crate::scan::path::normalize_component_path;
use crate::scan::{Category, DiscoveredEntry, SkippedPath};
use crate::tree::{Dictionary, PropertyNode};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Bundle nesting limit: a top-level bundle and its plug-ins.
pub const MAX_BUNDLE_DEPTH: usize = 2;

/// Bundle extension (case-insensitive)
pub const BUNDLE_EXTENSION: &str = "kext";

/// Descriptor file name inside a bundle
pub const DESCRIPTOR_NAME: &str = "Info.plist";

const CONTENTS_DIR: &str = "Contents";
const PLUGINS_DIR: &str = "PlugIns";
const EXECUTABLE_DIR: &str = "MacOS";

/// A bundle directory located on disk, not yet inspected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleCandidate {
    /// Absolute bundle directory
    pub path: PathBuf,
    /// `/`-separated path relative to `Kexts/`
    pub relative_path: String,
    /// 1 for top-level bundles, 2 for plug-ins
    pub depth: usize,
}

/// Bundles found under a `Kexts/` directory
#[derive(Debug, Clone, Default)]
pub struct BundleDiscovery {
    pub candidates: Vec<BundleCandidate>,
    pub skipped: Vec<SkippedPath>,
}

/// Enumerate bundle directories below `kexts_dir`, plug-ins included.
pub fn discover_bundles(kexts_dir: &Path) -> BundleDiscovery {
    let mut discovery = BundleDiscovery::default();
    // (directory to list, relative prefix, depth of bundles found in it)
    let mut stack: Vec<(PathBuf, String, usize)> = vec![(kexts_dir.to_path_buf(), String::new(), 1)];

    while let Some((dir, prefix, depth)) = stack.pop() {
        let listing = match fs::read_dir(&dir) {
            Ok(listing) => listing,
            Err(e) => {
                let shown = if prefix.is_empty() {
                    dir.display().to_string()
                } else {
                    prefix.clone()
                };
                warn!(path = %shown, error = %e, "Skipping unreadable bundle directory");
                discovery.skipped.push(SkippedPath::new(shown, e.to_string()));
                continue;
            }
        };

        let mut names = Vec::new();
        for entry in listing {
            match entry {
                Ok(entry) => names.push(entry),
                Err(e) => discovery
                    .skipped
                    .push(SkippedPath::new(prefix.clone(), e.to_string())),
            }
        }

        for entry in names {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || !is_bundle_name(&name) {
                continue;
            }
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let relative_path = normalize_component_path(&format!("{}/{}", prefix, name));

            let plugins = path.join(CONTENTS_DIR).join(PLUGINS_DIR);
            if plugins.is_dir() {
                if depth < MAX_BUNDLE_DEPTH {
                    stack.push((
                        plugins,
                        format!("{}/{}/{}", relative_path, CONTENTS_DIR, PLUGINS_DIR),
                        depth + 1,
                    ));
                } else if has_bundles(&plugins) {
                    warn!(bundle = %relative_path, "Plug-ins nested beyond the bundle depth limit are ignored");
                    discovery.skipped.push(SkippedPath::new(
                        format!("{}/{}/{}", relative_path, CONTENTS_DIR, PLUGINS_DIR),
                        format!("bundles nested deeper than {} levels", MAX_BUNDLE_DEPTH),
                    ));
                }
            }

            discovery.candidates.push(BundleCandidate {
                path,
                relative_path,
                depth,
            });
        }
    }

    discovery
        .candidates
        .sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    discovery.skipped.sort();
    debug!(
        bundles = discovery.candidates.len(),
        skipped = discovery.skipped.len(),
        "Discovered kext bundles"
    );
    discovery
}

/// Locate and parse a bundle's descriptor, producing its scan entry.
///
/// Returns a skip (with the reason) when the descriptor is missing, unreadable,
/// malformed, or has no bundle identifier.
pub fn inspect_bundle(
    codec: &dyn DocumentCodec,
    candidate: &BundleCandidate,
) -> Result<DiscoveredEntry, SkippedPath> {
    let skip = |reason: String| SkippedPath::new(candidate.relative_path.clone(), reason);

    let (descriptor_path, info_path) = locate_descriptor(&candidate.path)
        .ok_or_else(|| skip(format!("no {} found", DESCRIPTOR_NAME)))?;

    let bytes = fs::read(&descriptor_path)
        .map_err(|e| skip(format!("cannot read {}: {}", info_path, e)))?;
    let source_name = format!("{}/{}", candidate.relative_path, info_path);
    let descriptor = codec
        .parse(&bytes, &source_name)
        .map_err(|e| skip(e.to_string()))?;
    let descriptor = descriptor
        .as_dictionary()
        .ok_or_else(|| skip(format!("{} root is not a dictionary", info_path)))?;

    let bundle_identifier = descriptor
        .get_str("CFBundleIdentifier")
        .ok_or_else(|| skip("descriptor has no CFBundleIdentifier".to_string()))?
        .to_string();

    let executable_path = descriptor
        .get_str("CFBundleExecutable")
        .map(|name| format!("{}/{}/{}", CONTENTS_DIR, EXECUTABLE_DIR, name))
        .filter(|rel| {
            fs::metadata(candidate.path.join(rel))
                .map(|m| m.is_file() && m.len() > 0)
                .unwrap_or(false)
        });

    Ok(DiscoveredEntry {
        relative_path: candidate.relative_path.clone(),
        category: Category::Kext,
        executable_path,
        info_path: Some(info_path),
        bundle_identifier: Some(bundle_identifier),
        libraries: libraries(descriptor),
    })
}

fn locate_descriptor(bundle: &Path) -> Option<(PathBuf, String)> {
    let contents = bundle.join(CONTENTS_DIR).join(DESCRIPTOR_NAME);
    if contents.is_file() {
        return Some((contents, format!("{}/{}", CONTENTS_DIR, DESCRIPTOR_NAME)));
    }
    let flat = bundle.join(DESCRIPTOR_NAME);
    if flat.is_file() {
        return Some((flat, DESCRIPTOR_NAME.to_string()));
    }
    None
}

fn libraries(descriptor: &Dictionary) -> Vec<String> {
    descriptor
        .get("OSBundleLibraries")
        .and_then(PropertyNode::as_dictionary)
        .map(|libs| libs.keys().map(str::to_string).collect())
        .unwrap_or_default()
}

fn is_bundle_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case(BUNDLE_EXTENSION))
        .unwrap_or(false)
}

fn has_bundles(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|listing| {
            listing
                .filter_map(Result::ok)
                .any(|e| is_bundle_name(&e.file_name().to_string_lossy()))
        })
        .unwrap_or(false)
}
