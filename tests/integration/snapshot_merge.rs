//! Integration tests for scan-then-merge behavior

use super::test_utils::{dict, skeleton_document, write_bundle, OcTree};
use ocsnap::document::TargetSequence;
use ocsnap::error::MergeError;
use ocsnap::snapshot::{merge, ChangeKind, MergeMode};
use ocsnap::tree::PropertyNode;

fn oc_tree() -> OcTree {
    let tree = OcTree::new();
    tree.acpi("SSDT-EC.aml")
        .acpi("SSDT-PLUG.aml")
        .driver("OpenRuntime.efi")
        .tool("OpenShell.efi");
    tree.kext("Lilu.kext", "as.vit9696.Lilu", Some("Lilu"));
    tree.kext("AppleALC.kext", "as.vit9696.AppleALC", Some("AppleALC"));
    tree
}

fn paths(doc: &ocsnap::document::ConfigDocument, target: TargetSequence) -> Vec<String> {
    let key = match target {
        TargetSequence::KernelAdd => "BundlePath",
        _ => "Path",
    };
    doc.target(target)
        .unwrap_or(&[])
        .iter()
        .filter_map(|item| item.as_dictionary()?.get_str(key).map(str::to_string))
        .collect()
}

#[test]
fn test_second_additive_merge_is_noop() {
    let tree = oc_tree();
    let mut doc = skeleton_document();

    let first = merge(&mut doc, &tree.scan().entries, MergeMode::Additive).unwrap();
    assert_eq!(first.counts().added, 6);
    let after_first = doc.clone();

    let second = merge(&mut doc, &tree.scan().entries, MergeMode::Additive).unwrap();
    assert!(second.is_empty(), "unexpected changes: {}", second);
    assert_eq!(doc, after_first);
}

#[test]
fn test_user_settings_survive_additive_merge() {
    let tree = oc_tree();
    let mut doc = skeleton_document();
    merge(&mut doc, &tree.scan().entries, MergeMode::Additive).unwrap();

    // Disable Lilu and add a note, as a user would in an editor.
    let path: ocsnap::tree::NodePath = "Kernel.Add[1]".parse().unwrap();
    let lilu = doc.locate_mut(&path).unwrap().as_dictionary_mut().unwrap();
    assert_eq!(lilu.get_str("BundlePath"), Some("Lilu.kext"));
    lilu.insert("Enabled", PropertyNode::from(false));
    lilu.insert("MinKernel", PropertyNode::from("20.0.0"));

    tree.acpi("SSDT-USBX.aml");
    let log = merge(&mut doc, &tree.scan().entries, MergeMode::Additive).unwrap();
    assert_eq!(log.counts().added, 1);

    let lilu = doc.locate(&path).unwrap().as_dictionary().unwrap();
    assert_eq!(lilu.get_bool("Enabled"), Some(false));
    assert_eq!(lilu.get_str("MinKernel"), Some("20.0.0"));
}

#[test]
fn test_removed_files_are_dropped() {
    let tree = oc_tree();
    let mut doc = skeleton_document();
    merge(&mut doc, &tree.scan().entries, MergeMode::Additive).unwrap();

    tree.remove("ACPI/SSDT-PLUG.aml");
    tree.remove("Kexts/AppleALC.kext");
    let log = merge(&mut doc, &tree.scan().entries, MergeMode::Additive).unwrap();

    assert_eq!(log.counts().stale_removed, 2);
    assert_eq!(paths(&doc, TargetSequence::AcpiAdd), vec!["SSDT-EC.aml"]);
    assert_eq!(paths(&doc, TargetSequence::KernelAdd), vec!["Lilu.kext"]);
}

#[test]
fn test_clean_rebuild_matches_scan() {
    let tree = oc_tree();
    let mut doc = skeleton_document();
    doc.root_mut()
        .get_mut("ACPI")
        .and_then(PropertyNode::as_dictionary_mut)
        .unwrap()
        .insert(
            "Add",
            PropertyNode::Sequence(vec![
                dict(&[("Path", PropertyNode::from("SSDT-OLD.aml"))]),
                dict(&[
                    ("Enabled", PropertyNode::from(false)),
                    ("Path", PropertyNode::from("SSDT-EC.aml")),
                ]),
            ]),
        );

    let report = tree.scan();
    let log = merge(&mut doc, &report.entries, MergeMode::Clean).unwrap();
    assert_eq!(log.counts().removed, 2);

    for target in TargetSequence::ALL {
        let expected: Vec<String> = report
            .entries_for(target.category())
            .map(|e| e.relative_path.clone())
            .collect();
        assert_eq!(paths(&doc, target), expected, "{}", target);
    }
    // Clean rebuild resets user settings.
    let ec = doc.locate(&"ACPI.Add[0]".parse().unwrap()).unwrap();
    assert_eq!(ec.as_dictionary().unwrap().get_bool("Enabled"), Some(true));
}

#[test]
fn test_new_kext_executable_updates_existing_entry() {
    let tree = oc_tree();
    let mut doc = skeleton_document();
    tree.kext("USBMap.kext", "com.example.USBMap", None);
    merge(&mut doc, &tree.scan().entries, MergeMode::Additive).unwrap();

    // The plist-only kext gains a binary.
    write_bundle(
        &tree.root().join("Kexts/USBMap.kext"),
        "com.example.USBMap",
        Some("USBMap"),
    );
    let log = merge(&mut doc, &tree.scan().entries, MergeMode::Additive).unwrap();
    let updates: Vec<_> = log
        .iter()
        .filter(|c| matches!(c.kind, ChangeKind::PathUpdated { .. }))
        .collect();
    assert_eq!(updates.len(), 1);
    match &updates[0].kind {
        ChangeKind::PathUpdated { field, old, new } => {
            assert_eq!(field, "ExecutablePath");
            assert_eq!(old, "");
            assert_eq!(new, "Contents/MacOS/USBMap");
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_plugins_get_their_own_entries() {
    let tree = OcTree::new();
    let parent = tree.kext(
        "VoodooPS2Controller.kext",
        "as.acidanthera.voodoo.driver.PS2Controller",
        Some("VoodooPS2Controller"),
    );
    write_bundle(
        &parent.join("Contents/PlugIns/VoodooPS2Keyboard.kext"),
        "as.acidanthera.voodoo.driver.PS2Keyboard",
        Some("VoodooPS2Keyboard"),
    );

    let mut doc = skeleton_document();
    merge(&mut doc, &tree.scan().entries, MergeMode::Additive).unwrap();
    assert_eq!(
        paths(&doc, TargetSequence::KernelAdd),
        vec![
            "VoodooPS2Controller.kext",
            "VoodooPS2Controller.kext/Contents/PlugIns/VoodooPS2Keyboard.kext"
        ]
    );
}

#[test]
fn test_wrong_container_type_aborts_whole_merge() {
    let tree = oc_tree();
    let mut doc = skeleton_document();
    doc.root_mut()
        .get_mut("Misc")
        .and_then(PropertyNode::as_dictionary_mut)
        .unwrap()
        .insert("Tools", PropertyNode::from("not a list"));
    let before = doc.clone();

    let err = merge(&mut doc, &tree.scan().entries, MergeMode::Additive).unwrap_err();
    assert_eq!(
        err,
        MergeError::TargetNotSequence {
            target: "Misc.Tools".to_string()
        }
    );
    assert_eq!(doc, before);
}
