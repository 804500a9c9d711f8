//! Duplicate entry check

use super::{IssueCategory, ValidationIssue};
use crate::document::{ConfigDocument, TargetSequence};
use crate::scan::path::normalize_component_path;
use crate::snapshot::entry::{BUNDLE_PATH_KEY, EXECUTABLE_PATH_KEY, PATH_KEY, PLIST_PATH_KEY};
use crate::snapshot::KextIdentity;
use crate::tree::PropertyNode;
use std::collections::BTreeMap;

/// One error per group of entries sharing an identifying path.
pub fn check(document: &ConfigDocument) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for target in TargetSequence::ALL {
        let items = match document.target(target) {
            Some(items) => items,
            None => continue,
        };

        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, item) in items.iter().enumerate() {
            if let Some(key) = duplicate_key(target, item) {
                groups.entry(key).or_default().push(index);
            }
        }

        let mut dupes: Vec<(String, Vec<usize>)> =
            groups.into_iter().filter(|(_, idx)| idx.len() > 1).collect();
        // report in document order
        dupes.sort_by_key(|(_, idx)| idx[0]);

        for (key, indices) in dupes {
            let listed = indices
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            issues.push(ValidationIssue::error(
                IssueCategory::Duplicate,
                target.node_path().index(indices[0]),
                format!("{} appears {} times in {} (indices {})", key, indices.len(), target, listed),
            ));
        }
    }
    issues
}

/// Kexts are keyed by bundle path qualified with the executable (or plist)
/// path, so plug-ins sharing a parent bundle path are not duplicates.
fn duplicate_key(target: TargetSequence, item: &PropertyNode) -> Option<String> {
    let key = match item {
        PropertyNode::Dictionary(dict) if target == TargetSequence::KernelAdd => {
            KextIdentity::qualified(
                &normalize_component_path(dict.get_str(BUNDLE_PATH_KEY)?),
                dict.get_str(EXECUTABLE_PATH_KEY).unwrap_or_default(),
                dict.get_str(PLIST_PATH_KEY).unwrap_or_default(),
            )
        }
        PropertyNode::Dictionary(dict) => normalize_component_path(dict.get_str(PATH_KEY)?),
        other if target == TargetSequence::UefiDrivers => normalize_component_path(other.as_str()?),
        _ => return None,
    };
    (!key.is_empty()).then_some(key)
}
