//! Kext dependency order check
//!
//! Load order is the order of `Kernel.Add`. A plug-in that hooks into another
//! kext must come after it; a missing prerequisite means the plug-in cannot load.

use super::{IssueCategory, ValidationIssue};
use crate::document::{ConfigDocument, TargetSequence};
use crate::scan::path::{file_name, normalize_component_path};
use crate::snapshot::entry::{ExistingEntry, BUNDLE_PATH_KEY};
use crate::snapshot::KextIdentity;
use std::collections::HashMap;

/// `subject`, when enabled, needs every kext in `requires` enabled too, and
/// loaded earlier when `requires_before` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyRule {
    pub subject: &'static str,
    pub requires: &'static [&'static str],
    pub requires_before: bool,
}

const fn after(subject: &'static str, requires: &'static [&'static str]) -> DependencyRule {
    DependencyRule {
        subject,
        requires,
        requires_before: true,
    }
}

const LILU: &[&str] = &["Lilu"];

pub const DEPENDENCY_RULES: &[DependencyRule] = &[
    after("AirportBrcmFixup", LILU),
    after("AMFIPass", LILU),
    after("AppleALC", LILU),
    after("BlueToolFixup", LILU),
    after("BrightnessKeys", LILU),
    after("CPUFriend", LILU),
    after("CPUFriendDataProvider", &["CPUFriend"]),
    after("CpuTscSync", LILU),
    after("CryptexFixup", LILU),
    after("DebugEnhancer", LILU),
    after("ECEnabler", LILU),
    after("FeatureUnlock", LILU),
    after("HibernationFixup", LILU),
    after("NVMeFix", LILU),
    after("RestrictEvents", LILU),
    after("VirtualSMC", LILU),
    after("WhateverGreen", LILU),
    after("SMCBatteryManager", &["VirtualSMC"]),
    after("SMCDellSensors", &["VirtualSMC"]),
    after("SMCLightSensor", &["VirtualSMC"]),
    after("SMCProcessor", &["VirtualSMC"]),
    after("SMCSuperIO", &["VirtualSMC"]),
    after("VoodooPS2Keyboard", &["VoodooPS2Controller"]),
    after("VoodooPS2Mouse", &["VoodooPS2Controller"]),
    after("VoodooPS2Trackpad", &["VoodooPS2Controller"]),
    after("VoodooI2CHID", &["VoodooI2C"]),
    after("BrcmPatchRAM3", &["BrcmFirmwareData"]),
    DependencyRule {
        subject: "BrcmBluetoothInjector",
        requires: &["BrcmPatchRAM3"],
        requires_before: false,
    },
];

/// Component name of a kext: bundle directory name without `.kext`.
pub fn component_name(bundle_path: &str) -> String {
    let normalized = normalize_component_path(bundle_path);
    let name = file_name(&normalized);
    let stem = match name.len().checked_sub(5) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".kext") => {
            &name[..cut]
        }
        _ => name,
    };
    stem.to_string()
}

pub fn check(document: &ConfigDocument) -> Vec<ValidationIssue> {
    let items = match document.target(TargetSequence::KernelAdd) {
        Some(items) => items,
        None => return Vec::new(),
    };

    // First enabled position of every component name.
    let identity = KextIdentity::default();
    let mut enabled: HashMap<String, usize> = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        let entry = match ExistingEntry::project(TargetSequence::KernelAdd, index, item, &identity) {
            Some(entry) if entry.is_enabled() => entry,
            _ => continue,
        };
        let bundle = match entry.dictionary().and_then(|d| d.get_str(BUNDLE_PATH_KEY)) {
            Some(bundle) => bundle,
            None => continue,
        };
        enabled.entry(component_name(bundle)).or_insert(index);
    }

    let mut issues = Vec::new();
    for rule in DEPENDENCY_RULES {
        let subject_index = match enabled.get(rule.subject) {
            Some(index) => *index,
            None => continue,
        };
        let at = TargetSequence::KernelAdd.node_path().index(subject_index);
        for required in rule.requires {
            match enabled.get(*required) {
                None => issues.push(ValidationIssue::error(
                    IssueCategory::Dependency,
                    at.clone(),
                    format!("{} requires {}, not present/enabled", rule.subject, required),
                )),
                Some(index) if rule.requires_before && *index > subject_index => {
                    issues.push(ValidationIssue::warning(
                        IssueCategory::Dependency,
                        at.clone(),
                        format!("{} should load after {}", rule.subject, required),
                    ))
                }
                Some(_) => {}
            }
        }
    }
    issues
}
