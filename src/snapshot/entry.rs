//! Entry projection and default entry construction
//!
//! An [`ExistingEntry`] is a read-only view of one item already present in a
//! target list, reduced to the identifying path used for matching. New items are
//! built by [`default_entry`] with the field layout the bootloader expects.

use crate::document::TargetSequence;
use crate::scan::path::{file_name, normalize_component_path};
use crate::scan::{Category, DiscoveredEntry};
use crate::tree::{Dictionary, PropertyNode};
use std::collections::{HashMap, HashSet};

pub const PATH_KEY: &str = "Path";
pub const BUNDLE_PATH_KEY: &str = "BundlePath";
pub const EXECUTABLE_PATH_KEY: &str = "ExecutablePath";
pub const PLIST_PATH_KEY: &str = "PlistPath";
pub const ENABLED_KEY: &str = "Enabled";

/// Identity view of an item already in a target list
#[derive(Debug, Clone, PartialEq)]
pub struct ExistingEntry<'a> {
    pub fields: EntryFields<'a>,
    pub identifying_path: String,
    pub original_index: usize,
}

/// The stored shape of an entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryFields<'a> {
    Dictionary(&'a Dictionary),
    /// Pre-0.6 driver lists store bare path strings
    LegacyPath(&'a str),
}

impl<'a> ExistingEntry<'a> {
    /// Project an item of `target`. Items with no recognizable shape, or whose
    /// identifying field is missing or empty, give `None`: additive merges keep
    /// them in place and clean merges drop them.
    pub fn project(
        target: TargetSequence,
        index: usize,
        node: &'a PropertyNode,
        identity: &KextIdentity,
    ) -> Option<Self> {
        let (fields, identifying_path) = match node {
            PropertyNode::Dictionary(dict) => {
                let identifying_path = match target {
                    TargetSequence::KernelAdd => {
                        let bundle = dict.get_str(BUNDLE_PATH_KEY)?;
                        if normalize_component_path(bundle).is_empty() {
                            return None;
                        }
                        identity.for_fields(
                            bundle,
                            dict.get_str(EXECUTABLE_PATH_KEY).unwrap_or_default(),
                            dict.get_str(PLIST_PATH_KEY).unwrap_or_default(),
                        )
                    }
                    _ => normalize_component_path(dict.get_str(PATH_KEY)?),
                };
                (EntryFields::Dictionary(dict), identifying_path)
            }
            _ if target == TargetSequence::UefiDrivers => {
                let path = node.as_str()?;
                (EntryFields::LegacyPath(path), normalize_component_path(path))
            }
            _ => return None,
        };
        if identifying_path.is_empty() {
            return None;
        }
        Some(Self {
            fields,
            identifying_path,
            original_index: index,
        })
    }

    pub fn dictionary(&self) -> Option<&'a Dictionary> {
        match self.fields {
            EntryFields::Dictionary(dict) => Some(dict),
            EntryFields::LegacyPath(_) => None,
        }
    }

    /// Whether the entry takes part in loading. A dictionary without `Enabled`
    /// is treated as disabled; legacy strings are always enabled.
    pub fn is_enabled(&self) -> bool {
        match self.fields {
            EntryFields::Dictionary(dict) => dict.get_bool(ENABLED_KEY).unwrap_or(false),
            EntryFields::LegacyPath(_) => true,
        }
    }
}

/// Kext matching rule.
///
/// A kext is identified by its `BundlePath` alone, unless that bundle path is
/// shared by more than one item on either side of the merge. Shared bundle
/// paths are disambiguated with the executable path, or the plist path for
/// plist-only kexts.
#[derive(Debug, Clone, Default)]
pub struct KextIdentity {
    shared: HashSet<String>,
}

impl KextIdentity {
    pub fn new<'a, E, D>(existing: E, discovered: D) -> Self
    where
        E: IntoIterator<Item = &'a PropertyNode>,
        D: IntoIterator<Item = &'a DiscoveredEntry>,
    {
        let mut shared = HashSet::new();

        let mut existing_counts: HashMap<String, usize> = HashMap::new();
        for bundle in existing
            .into_iter()
            .filter_map(PropertyNode::as_dictionary)
            .filter_map(|d| d.get_str(BUNDLE_PATH_KEY))
        {
            *existing_counts
                .entry(normalize_component_path(bundle))
                .or_default() += 1;
        }

        let mut discovered_counts: HashMap<String, usize> = HashMap::new();
        for entry in discovered {
            *discovered_counts
                .entry(normalize_component_path(&entry.relative_path))
                .or_default() += 1;
        }

        for (bundle, count) in existing_counts.into_iter().chain(discovered_counts) {
            if count > 1 {
                shared.insert(bundle);
            }
        }
        Self { shared }
    }

    pub fn is_shared(&self, bundle_path: &str) -> bool {
        self.shared.contains(bundle_path)
    }

    /// Identifying path for a kext given its three path fields.
    pub fn for_fields(&self, bundle_path: &str, executable_path: &str, plist_path: &str) -> String {
        let bundle = normalize_component_path(bundle_path);
        if !self.is_shared(&bundle) {
            return bundle;
        }
        Self::qualified(&bundle, executable_path, plist_path)
    }

    /// Bundle path qualified by the executable, or the plist for plist-only kexts.
    pub fn qualified(bundle_path: &str, executable_path: &str, plist_path: &str) -> String {
        let qualifier = if executable_path.is_empty() {
            plist_path
        } else {
            executable_path
        };
        normalize_component_path(&format!("{}/{}", bundle_path, qualifier))
    }

    pub fn for_discovered(&self, entry: &DiscoveredEntry) -> String {
        self.for_fields(
            &entry.relative_path,
            entry.executable_path.as_deref().unwrap_or_default(),
            entry.info_path.as_deref().unwrap_or_default(),
        )
    }
}

/// Identifying path of a discovered entry within its target.
pub fn discovered_identity(entry: &DiscoveredEntry, identity: &KextIdentity) -> String {
    match entry.category {
        Category::Kext => identity.for_discovered(entry),
        _ => normalize_component_path(&entry.relative_path),
    }
}

/// Build the item appended for a newly discovered component.
///
/// `legacy_drivers` selects the bare-string driver format.
pub fn default_entry(entry: &DiscoveredEntry, legacy_drivers: bool) -> PropertyNode {
    let path = normalize_component_path(&entry.relative_path);
    let comment = file_name(&path).to_string();

    let fields: Vec<(&str, PropertyNode)> = match entry.category {
        Category::Acpi => vec![
            ("Comment", comment.into()),
            (ENABLED_KEY, true.into()),
            (PATH_KEY, path.into()),
        ],
        Category::Kext => vec![
            ("Arch", "Any".into()),
            (BUNDLE_PATH_KEY, path.into()),
            ("Comment", comment.into()),
            (ENABLED_KEY, true.into()),
            (
                EXECUTABLE_PATH_KEY,
                entry.executable_path.clone().unwrap_or_default().into(),
            ),
            ("MaxKernel", "".into()),
            ("MinKernel", "".into()),
            (
                PLIST_PATH_KEY,
                entry.info_path.clone().unwrap_or_default().into(),
            ),
        ],
        Category::Driver if legacy_drivers => return PropertyNode::from(path),
        Category::Driver => vec![
            ("Arguments", "".into()),
            ("Comment", comment.into()),
            (ENABLED_KEY, true.into()),
            ("LoadEarly", false.into()),
            (PATH_KEY, path.into()),
        ],
        Category::Tool => vec![
            ("Arguments", "".into()),
            ("Auxiliary", true.into()),
            ("Comment", comment.into()),
            (ENABLED_KEY, true.into()),
            ("Flavour", "Auto".into()),
            ("FullNvramAccess", false.into()),
            (PATH_KEY, path.into()),
            ("RealPath", false.into()),
            ("TextMode", false.into()),
        ],
    };
    PropertyNode::Dictionary(fields.into_iter().collect())
}

/// A driver list is legacy when its first item is a bare string.
pub fn is_legacy_driver_list(items: &[PropertyNode]) -> bool {
    items.first().and_then(PropertyNode::as_str).is_some()
}
