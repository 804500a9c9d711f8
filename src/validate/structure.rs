//! Structural completeness check

use super::{IssueCategory, ValidationIssue};
use crate::document::{ConfigDocument, TargetSequence, REQUIRED_TOP_LEVEL_KEYS};
use crate::tree::{NodePath, PropertyNode};

/// Subsections expected under each top-level section.
pub const RECOMMENDED_SUBSECTIONS: [(&str, &[&str]); 8] = [
    ("ACPI", &["Add", "Delete", "Patch", "Quirks"]),
    ("Booter", &["MmioWhitelist", "Patch", "Quirks"]),
    ("DeviceProperties", &["Add", "Delete"]),
    (
        "Kernel",
        &["Add", "Block", "Emulate", "Force", "Patch", "Quirks", "Scheme"],
    ),
    (
        "Misc",
        &["BlessOverride", "Boot", "Debug", "Entries", "Security", "Tools"],
    ),
    ("NVRAM", &["Add", "Delete", "LegacySchema", "WriteFlash"]),
    (
        "PlatformInfo",
        &[
            "Automatic",
            "Generic",
            "UpdateDataHub",
            "UpdateNVRAM",
            "UpdateSMBIOS",
            "UpdateSMBIOSMode",
        ],
    ),
    (
        "UEFI",
        &[
            "APFS",
            "AppleInput",
            "Audio",
            "ConnectDrivers",
            "Drivers",
            "Input",
            "Output",
            "ProtocolOverrides",
            "Quirks",
            "ReservedMemory",
        ],
    ),
];

pub fn check(document: &ConfigDocument) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for key in REQUIRED_TOP_LEVEL_KEYS {
        let path = NodePath::root().key(key);
        match document.section(key) {
            None => issues.push(ValidationIssue::error(
                IssueCategory::Structure,
                path,
                format!("missing required section {}", key),
            )),
            Some(PropertyNode::Dictionary(section)) => {
                for sub in recommended(key) {
                    if !section.contains_key(sub) {
                        issues.push(ValidationIssue::warning(
                            IssueCategory::Structure,
                            path.key(*sub),
                            format!("missing recommended subsection {}.{}", key, sub),
                        ));
                    }
                }
            }
            Some(other) => issues.push(ValidationIssue::error(
                IssueCategory::Structure,
                path,
                format!("{} must be a dictionary, found {}", key, other.kind_name()),
            )),
        }
    }

    for target in TargetSequence::ALL {
        let list = document
            .section(target.section())
            .and_then(PropertyNode::as_dictionary)
            .and_then(|section| section.get(target.key()));
        if let Some(node) = list {
            if node.as_sequence().is_none() {
                issues.push(ValidationIssue::error(
                    IssueCategory::Structure,
                    target.node_path(),
                    format!("{} must be an array, found {}", target, node.kind_name()),
                ));
            }
        }
    }

    issues
}

fn recommended(key: &str) -> &'static [&'static str] {
    RECOMMENDED_SUBSECTIONS
        .iter()
        .find(|(section, _)| *section == key)
        .map(|(_, subs)| *subs)
        .unwrap_or(&[])
}
