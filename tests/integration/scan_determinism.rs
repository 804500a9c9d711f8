//! Integration tests for scanner ordering and skip handling

use super::test_utils::{write_bundle, OcTree};
use ocsnap::error::ScanError;
use ocsnap::scan::pool::CancelToken;
use ocsnap::scan::{Category, ScanOptions, Scanner};

fn populated() -> OcTree {
    let tree = OcTree::new();
    tree.acpi("SSDT-PLUG.aml")
        .acpi("SSDT-EC.aml")
        .acpi("Custom/DSDT.bin")
        .acpi(".hidden.aml")
        .acpi("README.txt")
        .driver("OpenRuntime.efi")
        .driver("HfsPlus.efi")
        .tool("OpenShell.efi");
    tree.kext("WhateverGreen.kext", "as.vit9696.WhateverGreen", Some("WhateverGreen"));
    tree.kext("Lilu.kext", "as.vit9696.Lilu", Some("Lilu"));
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
    tree.kext("USBMap.kext", "com.example.USBMap", None);
    tree
}

#[test]
fn test_two_scans_are_identical() {
    let tree = populated();
    let first = tree.scan();
    let second = tree.scan();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first.entries).unwrap(),
        serde_json::to_vec(&second.entries).unwrap()
    );
}

#[test]
fn test_worker_count_does_not_change_output() {
    let tree = populated();
    let serial = Scanner::default()
        .with_options(ScanOptions {
            workers: Some(1),
            ..ScanOptions::default()
        })
        .scan(tree.root())
        .unwrap();
    let parallel = Scanner::default()
        .with_options(ScanOptions {
            workers: Some(8),
            ..ScanOptions::default()
        })
        .scan(tree.root())
        .unwrap();
    assert_eq!(serial.entries, parallel.entries);
}

#[test]
fn test_entries_ordered_by_category_then_path() {
    let report = populated().scan();
    let listed: Vec<(Category, &str)> = report
        .entries
        .iter()
        .map(|e| (e.category, e.relative_path.as_str()))
        .collect();
    assert_eq!(
        listed,
        vec![
            (Category::Acpi, "Custom/DSDT.bin"),
            (Category::Acpi, "SSDT-EC.aml"),
            (Category::Acpi, "SSDT-PLUG.aml"),
            (Category::Kext, "Lilu.kext"),
            (Category::Kext, "USBMap.kext"),
            (Category::Kext, "VoodooPS2Controller.kext"),
            (
                Category::Kext,
                "VoodooPS2Controller.kext/Contents/PlugIns/VoodooPS2Keyboard.kext"
            ),
            (Category::Kext, "WhateverGreen.kext"),
            (Category::Driver, "HfsPlus.efi"),
            (Category::Driver, "OpenRuntime.efi"),
            (Category::Tool, "OpenShell.efi"),
        ]
    );
}

#[test]
fn test_kext_descriptor_fields() {
    let report = populated().scan();
    let lilu = report
        .entries_for(Category::Kext)
        .find(|e| e.relative_path == "Lilu.kext")
        .unwrap();
    assert_eq!(lilu.executable_path.as_deref(), Some("Contents/MacOS/Lilu"));
    assert_eq!(lilu.info_path.as_deref(), Some("Contents/Info.plist"));
    assert_eq!(lilu.bundle_identifier.as_deref(), Some("as.vit9696.Lilu"));

    let usb_map = report
        .entries_for(Category::Kext)
        .find(|e| e.relative_path == "USBMap.kext")
        .unwrap();
    assert_eq!(usb_map.executable_path, None);
}

#[test]
fn test_malformed_bundle_is_skipped_not_fatal() {
    let tree = populated();
    let broken = tree.root().join("Kexts/Broken.kext/Contents");
    std::fs::create_dir_all(&broken).unwrap();
    std::fs::write(broken.join("Info.plist"), b"<plist><dict>").unwrap();

    let report = tree.scan();
    assert!(report
        .entries
        .iter()
        .all(|e| e.relative_path != "Broken.kext"));
    assert!(report
        .skipped
        .iter()
        .any(|s| s.path.contains("Broken.kext")));
    assert_eq!(report.count(Category::Kext), 5);
}

#[cfg(unix)]
#[test]
fn test_dangling_link_is_skipped_when_following() {
    let tree = populated();
    std::os::unix::fs::symlink(
        tree.root().join("ACPI/SSDT-MISSING.aml"),
        tree.root().join("ACPI/SSDT-BROKEN.aml"),
    )
    .unwrap();

    let report = Scanner::default()
        .with_options(ScanOptions {
            follow_symlinks: true,
            ..ScanOptions::default()
        })
        .scan(tree.root())
        .unwrap();
    assert_eq!(report.count(Category::Acpi), 3);
    assert_eq!(report.count(Category::Driver), 2);
    assert!(report.scanned.contains(&Category::Acpi));
    assert!(report
        .skipped
        .iter()
        .any(|s| s.path == "ACPI/SSDT-BROKEN.aml"));
}

#[cfg(unix)]
#[test]
fn test_file_link_is_scanned_without_following() {
    let tree = populated();
    tree.file("shared/SSDT-USBX.aml");
    std::os::unix::fs::symlink(
        tree.root().join("shared/SSDT-USBX.aml"),
        tree.root().join("ACPI/SSDT-USBX.aml"),
    )
    .unwrap();

    let report = tree.scan();
    assert!(report
        .entries
        .iter()
        .any(|e| e.category == Category::Acpi && e.relative_path == "SSDT-USBX.aml"));
    assert_eq!(report.count(Category::Acpi), 4);
}

#[test]
fn test_efi_folder_resolves_to_nested_oc() {
    let efi = OcTree::bare();
    efi.file("OC/ACPI/SSDT-EC.aml")
        .file("OC/Drivers/OpenRuntime.efi");
    std::fs::create_dir_all(efi.root().join("OC/Kexts")).unwrap();

    let report = Scanner::default().scan(efi.root()).unwrap();
    assert!(report.root.ends_with("OC"));
    assert_eq!(report.count(Category::Acpi), 1);
    assert_eq!(report.count(Category::Driver), 1);
    assert!(!report.scanned.contains(&Category::Tool));
}

#[test]
fn test_missing_root_is_fatal() {
    let tree = OcTree::bare();
    let err = Scanner::default()
        .scan(&tree.root().join("missing"))
        .unwrap_err();
    assert!(matches!(err, ScanError::RootInaccessible { .. }));
}

#[test]
fn test_cancelled_scan_fails() {
    let tree = populated();
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = Scanner::default()
        .with_options(ScanOptions {
            cancel,
            ..ScanOptions::default()
        })
        .scan(tree.root())
        .unwrap_err();
    assert!(matches!(err, ScanError::Cancelled));
}
