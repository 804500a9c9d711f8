//! Integration tests for document validation

use super::test_utils::{dict, skeleton_document, OcTree};
use ocsnap::document::{ConfigDocument, TargetSequence};
use ocsnap::snapshot::{merge, MergeMode};
use ocsnap::tree::PropertyNode;
use ocsnap::validate::{validate, IssueCategory, Severity, MAX_PATH_LENGTH};

fn with_items(target: TargetSequence, items: Vec<PropertyNode>) -> ConfigDocument {
    let mut doc = skeleton_document();
    doc.root_mut()
        .get_mut(target.section())
        .and_then(PropertyNode::as_dictionary_mut)
        .unwrap()
        .insert(target.key(), PropertyNode::Sequence(items));
    doc
}

fn acpi(path: &str) -> PropertyNode {
    dict(&[
        ("Enabled", PropertyNode::from(true)),
        ("Path", PropertyNode::from(path)),
    ])
}

fn kext(bundle: &str) -> PropertyNode {
    dict(&[
        ("BundlePath", PropertyNode::from(bundle)),
        ("Enabled", PropertyNode::from(true)),
    ])
}

#[test]
fn test_skeleton_is_clean() {
    let report = validate(&skeleton_document());
    assert!(report.is_clean(), "{:?}", report);
}

#[test]
fn test_snapshot_result_validates() {
    let tree = OcTree::new();
    tree.acpi("SSDT-EC.aml").driver("OpenRuntime.efi");
    tree.kext("Lilu.kext", "as.vit9696.Lilu", Some("Lilu"));
    tree.kext("WhateverGreen.kext", "as.vit9696.WhateverGreen", Some("WhateverGreen"));

    let mut doc = skeleton_document();
    merge(&mut doc, &tree.scan().entries, MergeMode::Additive).unwrap();
    let report = validate(&doc);
    assert!(report.is_clean(), "{:?}", report);
}

#[test]
fn test_fresh_snapshot_appends_kexts_in_scan_order() {
    let tree = OcTree::new();
    tree.kext("Lilu.kext", "as.vit9696.Lilu", Some("Lilu"));
    tree.kext("AppleALC.kext", "as.vit9696.AppleALC", Some("AppleALC"));

    let mut doc = skeleton_document();
    merge(&mut doc, &tree.scan().entries, MergeMode::Additive).unwrap();
    let bundles: Vec<_> = doc
        .target(TargetSequence::KernelAdd)
        .unwrap()
        .iter()
        .filter_map(|k| k.as_dictionary()?.get_str("BundlePath"))
        .collect();
    assert_eq!(bundles, vec!["AppleALC.kext", "Lilu.kext"]);

    // Load order is left to the user; the check points it out.
    let report = validate(&doc);
    assert!(!report.has_errors());
    assert_eq!(report.by_category(IssueCategory::Dependency).count(), 1);
}

#[test]
fn test_path_length_boundary() {
    let at_limit = "a".repeat(MAX_PATH_LENGTH);
    let over = "b".repeat(MAX_PATH_LENGTH + 1);
    let doc = with_items(TargetSequence::AcpiAdd, vec![acpi(&at_limit), acpi(&over)]);

    let report = validate(&doc);
    let issues: Vec<_> = report.by_category(IssueCategory::PathLength).collect();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::Error);
    assert!(issues[0].message.contains(&over));
    assert_eq!(issues[0].path.to_string(), "ACPI.Add[1].Path");
}

#[test]
fn test_duplicate_acpi_entries() {
    let doc = with_items(
        TargetSequence::AcpiAdd,
        vec![acpi("SSDT-EC.aml"), acpi("SSDT-AWAC.aml"), acpi("SSDT-EC.aml")],
    );
    let report = validate(&doc);
    let issues: Vec<_> = report.by_category(IssueCategory::Duplicate).collect();
    assert_eq!(issues.len(), 1);
    assert!(issues[0].message.contains("indices 0, 2"));
}

#[test]
fn test_dependency_out_of_order_warns() {
    let doc = with_items(
        TargetSequence::KernelAdd,
        vec![kext("AppleALC.kext"), kext("Lilu.kext")],
    );
    let report = validate(&doc);
    assert!(!report.has_errors());
    let warnings: Vec<_> = report.by_category(IssueCategory::Dependency).collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, Severity::Warning);
    assert!(warnings[0].message.contains("AppleALC should load after Lilu"));
}

#[test]
fn test_dependency_in_order_passes() {
    let doc = with_items(
        TargetSequence::KernelAdd,
        vec![kext("Lilu.kext"), kext("AppleALC.kext")],
    );
    assert!(validate(&doc).is_clean());
}

#[test]
fn test_dependency_missing_is_error() {
    let doc = with_items(TargetSequence::KernelAdd, vec![kext("AppleALC.kext")]);
    let report = validate(&doc);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].category, IssueCategory::Dependency);
    assert!(report.errors[0].message.contains("requires Lilu"));
}

#[test]
fn test_empty_document_reports_every_missing_section() {
    let report = validate(&ConfigDocument::default());
    assert_eq!(report.errors.len(), 8);
    assert!(report
        .errors
        .iter()
        .all(|e| e.category == IssueCategory::Structure));
}

#[test]
fn test_validation_does_not_mutate() {
    let doc = with_items(TargetSequence::AcpiAdd, vec![acpi("SSDT-EC.aml"), acpi("SSDT-EC.aml")]);
    let before = doc.clone();
    let first = validate(&doc);
    let second = validate(&doc);
    assert_eq!(first, second);
    assert_eq!(doc, before);
}
