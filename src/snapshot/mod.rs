//! Snapshot Merger
//!
//! Reconciles scan results with the four target lists of a [`ConfigDocument`].
//! Every target is rebuilt in a scratch list first; the document is written only
//! after all targets reconciled, so a failed merge leaves it untouched.

pub mod changelog;
pub mod entry;

pub use changelog::{Change, ChangeCounts, ChangeKind, ChangeLog};
pub use entry::{ExistingEntry, KextIdentity};

use crate::document::{ConfigDocument, TargetSequence};
use crate::error::MergeError;
use crate::scan::DiscoveredEntry;
use crate::tree::PropertyNode;
use entry::{
    default_entry, discovered_identity, is_legacy_driver_list, BUNDLE_PATH_KEY,
    EXECUTABLE_PATH_KEY, PLIST_PATH_KEY,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info, instrument};

/// Merge policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Keep matching entries as they are, drop stale ones, append new ones
    #[default]
    Additive,
    /// Discard every existing entry and rebuild from the scan
    Clean,
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeMode::Additive => write!(f, "additive"),
            MergeMode::Clean => write!(f, "clean"),
        }
    }
}

/// Reconcile all four target lists with `discovered`.
pub fn merge(
    document: &mut ConfigDocument,
    discovered: &[DiscoveredEntry],
    mode: MergeMode,
) -> Result<ChangeLog, MergeError> {
    merge_targets(document, discovered, mode, &TargetSequence::ALL)
}

/// Reconcile only `targets`. Lists not named are left alone.
#[instrument(skip(document, discovered), fields(discovered = discovered.len()))]
pub fn merge_targets(
    document: &mut ConfigDocument,
    discovered: &[DiscoveredEntry],
    mode: MergeMode,
    targets: &[TargetSequence],
) -> Result<ChangeLog, MergeError> {
    let mut targets = targets.to_vec();
    targets.sort();
    targets.dedup();

    let mut log = ChangeLog::new();
    let mut staged = Vec::with_capacity(targets.len());
    for target in targets {
        let existing = existing_items(document, target)?.unwrap_or(&[]);
        let found: Vec<&DiscoveredEntry> = discovered
            .iter()
            .filter(|e| e.category == target.category())
            .collect();

        let (items, changes) = reconcile(target, existing, &found, mode);
        let counts = changes.counts();
        debug!(
            target = %target,
            before = existing.len(),
            after = items.len(),
            added = counts.added,
            removed = counts.removed + counts.stale_removed,
            path_updated = counts.path_updated,
            "Reconciled target"
        );
        log.extend(changes);
        staged.push((target, items));
    }

    for (target, items) in staged {
        commit(document, target, items);
    }

    info!(changes = log.len(), "Merge completed");
    Ok(log)
}

/// Borrow a target list, checking container types on the way.
fn existing_items(
    document: &ConfigDocument,
    target: TargetSequence,
) -> Result<Option<&[PropertyNode]>, MergeError> {
    match document.section(target.section()) {
        None => Ok(None),
        Some(PropertyNode::Dictionary(section)) => match section.get(target.key()) {
            None => Ok(None),
            Some(PropertyNode::Sequence(items)) => Ok(Some(items)),
            Some(_) => Err(MergeError::TargetNotSequence {
                target: target.to_string(),
            }),
        },
        Some(_) => Err(MergeError::ContainerNotDictionary {
            key: target.section().to_string(),
        }),
    }
}

fn commit(document: &mut ConfigDocument, target: TargetSequence, items: Vec<PropertyNode>) {
    let root = document.root_mut();
    if !root.contains_key(target.section()) {
        root.insert(target.section(), PropertyNode::empty_dictionary());
    }
    if let Some(section) = root
        .get_mut(target.section())
        .and_then(PropertyNode::as_dictionary_mut)
    {
        section.insert(target.key(), PropertyNode::Sequence(items));
    }
}

fn reconcile(
    target: TargetSequence,
    existing: &[PropertyNode],
    discovered: &[&DiscoveredEntry],
    mode: MergeMode,
) -> (Vec<PropertyNode>, ChangeLog) {
    let identity = match target {
        TargetSequence::KernelAdd => KextIdentity::new(existing, discovered.iter().copied()),
        _ => KextIdentity::default(),
    };

    // Duplicate discoveries collapse to the first occurrence.
    let mut seen = HashSet::new();
    let wanted: Vec<(String, &DiscoveredEntry)> = discovered
        .iter()
        .filter_map(|&entry| {
            let id = discovered_identity(entry, &identity);
            seen.insert(id.clone()).then_some((id, entry))
        })
        .collect();
    let by_id: HashMap<&str, &DiscoveredEntry> =
        wanted.iter().map(|(id, e)| (id.as_str(), *e)).collect();

    let legacy = target == TargetSequence::UefiDrivers && is_legacy_driver_list(existing);
    let mut log = ChangeLog::new();
    let mut items = Vec::new();
    let mut matched = HashSet::new();

    for (index, node) in existing.iter().enumerate() {
        let projected = ExistingEntry::project(target, index, node, &identity);
        match mode {
            MergeMode::Clean => log.push(Change {
                target,
                kind: ChangeKind::Removed,
                identifying_path: projected
                    .map(|p| p.identifying_path)
                    .unwrap_or_else(|| node.kind_name().to_string()),
                index,
            }),
            MergeMode::Additive => match projected {
                Some(entry) if !by_id.contains_key(entry.identifying_path.as_str()) => {
                    log.push(Change {
                        target,
                        kind: ChangeKind::StaleRemoved,
                        identifying_path: entry.identifying_path,
                        index,
                    })
                }
                Some(entry) => {
                    matched.insert(entry.identifying_path);
                    items.push(node.clone());
                }
                None => items.push(node.clone()),
            },
        }
    }

    if target == TargetSequence::KernelAdd {
        update_kext_paths(target, &mut items, &identity, &by_id, &mut log);
    }

    for (id, entry) in wanted.iter() {
        if matched.contains(id) {
            continue;
        }
        items.push(default_entry(entry, legacy));
        log.push(Change {
            target,
            kind: ChangeKind::Added,
            identifying_path: id.clone(),
            index: items.len() - 1,
        });
    }

    (items, log)
}

/// Rewrite executable and plist paths of retained kexts whose bundle moved them.
fn update_kext_paths(
    target: TargetSequence,
    items: &mut [PropertyNode],
    identity: &KextIdentity,
    by_id: &HashMap<&str, &DiscoveredEntry>,
    log: &mut ChangeLog,
) {
    for (index, item) in items.iter_mut().enumerate() {
        let dict = match item.as_dictionary_mut() {
            Some(dict) => dict,
            None => continue,
        };
        let id = identity.for_fields(
            dict.get_str(BUNDLE_PATH_KEY).unwrap_or_default(),
            dict.get_str(EXECUTABLE_PATH_KEY).unwrap_or_default(),
            dict.get_str(PLIST_PATH_KEY).unwrap_or_default(),
        );
        let found = match by_id.get(id.as_str()) {
            Some(found) => *found,
            None => continue,
        };

        let fields = [
            (EXECUTABLE_PATH_KEY, found.executable_path.as_deref().unwrap_or_default()),
            (PLIST_PATH_KEY, found.info_path.as_deref().unwrap_or_default()),
        ];
        for (field, new) in fields {
            let old = dict.get_str(field).unwrap_or_default().to_string();
            if old == new {
                continue;
            }
            dict.insert(field, PropertyNode::from(new));
            log.push(Change {
                target,
                kind: ChangeKind::PathUpdated {
                    field: field.to_string(),
                    old,
                    new: new.to_string(),
                },
                identifying_path: id.clone(),
                index,
            });
        }
    }
}
