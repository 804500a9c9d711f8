//! Path length check

use super::{IssueCategory, ValidationIssue, MAX_PATH_LENGTH};
use crate::document::{ConfigDocument, TargetSequence};
use crate::snapshot::entry::{BUNDLE_PATH_KEY, EXECUTABLE_PATH_KEY, PATH_KEY, PLIST_PATH_KEY};
use crate::tree::{NodePath, PropertyNode};

/// Flag every path-bearing value longer than [`MAX_PATH_LENGTH`] characters.
pub fn check(document: &ConfigDocument) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for target in TargetSequence::ALL {
        let items = match document.target(target) {
            Some(items) => items,
            None => continue,
        };
        for (index, item) in items.iter().enumerate() {
            let at = target.node_path().index(index);
            for (path, value) in candidates(target, item, &at) {
                let length = value.chars().count();
                if length > MAX_PATH_LENGTH {
                    issues.push(ValidationIssue::error(
                        IssueCategory::PathLength,
                        path,
                        format!(
                            "{:?} is {} characters long (maximum {})",
                            value, length, MAX_PATH_LENGTH
                        ),
                    ));
                }
            }
        }
    }
    issues
}

/// Strings whose length matters for one item, with the field they come from.
fn candidates(target: TargetSequence, item: &PropertyNode, at: &NodePath) -> Vec<(NodePath, String)> {
    let dict = match item {
        PropertyNode::Dictionary(dict) => dict,
        other => {
            return other
                .as_str()
                .filter(|_| target == TargetSequence::UefiDrivers)
                .map(|s| vec![(at.clone(), s.to_string())])
                .unwrap_or_default()
        }
    };

    if target != TargetSequence::KernelAdd {
        return dict
            .get_str(PATH_KEY)
            .map(|p| vec![(at.key(PATH_KEY), p.to_string())])
            .unwrap_or_default();
    }

    let bundle = match dict.get_str(BUNDLE_PATH_KEY) {
        Some(bundle) => bundle,
        None => return Vec::new(),
    };
    let mut out = vec![(at.key(BUNDLE_PATH_KEY), bundle.to_string())];
    for field in [EXECUTABLE_PATH_KEY, PLIST_PATH_KEY] {
        if let Some(rel) = dict.get_str(field).filter(|s| !s.is_empty()) {
            out.push((at.key(field), format!("{}/{}", bundle, rel)));
        }
    }
    out
}
