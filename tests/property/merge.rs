//! Property-based tests for merge idempotence and clean rebuilds

use ocsnap::document::{ConfigDocument, TargetSequence};
use ocsnap::scan::{Category, DiscoveredEntry};
use ocsnap::snapshot::{merge, MergeMode};
use proptest::prelude::*;

fn entry_strategy() -> impl Strategy<Value = DiscoveredEntry> {
    (0usize..4, "[A-Za-z][A-Za-z0-9-]{0,10}").prop_map(|(c, name)| {
        let category = Category::ALL[c];
        match category {
            Category::Kext => DiscoveredEntry {
                relative_path: format!("{}.kext", name),
                category,
                executable_path: Some(format!("Contents/MacOS/{}", name)),
                info_path: Some("Contents/Info.plist".to_string()),
                bundle_identifier: Some(format!("com.example.{}", name)),
                libraries: Vec::new(),
            },
            Category::Acpi => DiscoveredEntry::file(category, format!("{}.aml", name)),
            _ => DiscoveredEntry::file(category, format!("{}.efi", name)),
        }
    })
}

fn identifying_paths(doc: &ConfigDocument, target: TargetSequence) -> Vec<String> {
    let key = if target == TargetSequence::KernelAdd {
        "BundlePath"
    } else {
        "Path"
    };
    doc.target(target)
        .unwrap_or(&[])
        .iter()
        .filter_map(|i| i.as_dictionary()?.get_str(key).map(str::to_string))
        .collect()
}

/// A second additive merge over the same scan is a no-op
#[test]
fn test_additive_merge_idempotent_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                prop::collection::vec(entry_strategy(), 0..20),
                prop::collection::vec(entry_strategy(), 0..20),
            ),
            |(before, after)| {
                let mut doc = ConfigDocument::default();
                merge(&mut doc, &before, MergeMode::Additive).unwrap();
                merge(&mut doc, &after, MergeMode::Additive).unwrap();
                let settled = doc.clone();

                let log = merge(&mut doc, &after, MergeMode::Additive).unwrap();
                prop_assert!(log.is_empty());
                prop_assert_eq!(doc, settled);
                Ok(())
            },
        )
        .unwrap();
}

/// After a clean merge every list holds exactly the scanned paths, in scan order
#[test]
fn test_clean_rebuild_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                prop::collection::vec(entry_strategy(), 0..20),
                prop::collection::vec(entry_strategy(), 0..20),
            ),
            |(old, mut current)| {
                let mut doc = ConfigDocument::default();
                merge(&mut doc, &old, MergeMode::Additive).unwrap();

                current.sort_by(|a, b| {
                    a.category
                        .cmp(&b.category)
                        .then_with(|| a.relative_path.cmp(&b.relative_path))
                });
                current.dedup_by(|a, b| a.relative_path == b.relative_path && a.category == b.category);
                merge(&mut doc, &current, MergeMode::Clean).unwrap();

                for target in TargetSequence::ALL {
                    let expected: Vec<String> = current
                        .iter()
                        .filter(|e| e.category == target.category())
                        .map(|e| e.relative_path.clone())
                        .collect();
                    prop_assert_eq!(identifying_paths(&doc, target), expected);
                }
                Ok(())
            },
        )
        .unwrap();
}
