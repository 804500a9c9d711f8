//! Shared test utilities for integration tests
//!
//! Builders for OC directory trees, kext bundles and documents, plus isolated
//! XDG environment handling for configuration tests.

#![allow(dead_code)]

use ocsnap::codec::{PlistCodec, PlistFormat};
use ocsnap::document::{ConfigDocument, TargetSequence, REQUIRED_TOP_LEVEL_KEYS};
use ocsnap::scan::{ScanReport, Scanner};
use ocsnap::tree::{Dictionary, PropertyNode};
use ocsnap::validate::structure::RECOMMENDED_SUBSECTIONS;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// An OC directory under a temporary root
pub struct OcTree {
    dir: TempDir,
}

impl OcTree {
    /// Empty OC root with `ACPI/`, `Kexts/`, `Drivers/` and `Tools/`.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        for sub in ["ACPI", "Kexts", "Drivers", "Tools"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        Self { dir }
    }

    /// Empty temporary root with no category directories.
    pub fn bare() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, relative: &str) -> &Self {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"\x00payload").unwrap();
        self
    }

    pub fn acpi(&self, name: &str) -> &Self {
        self.file(&format!("ACPI/{}", name))
    }

    pub fn driver(&self, name: &str) -> &Self {
        self.file(&format!("Drivers/{}", name))
    }

    pub fn tool(&self, name: &str) -> &Self {
        self.file(&format!("Tools/{}", name))
    }

    /// Kext bundle at `Kexts/<relative>` with a `Contents/MacOS/<executable>`
    /// binary when one is given.
    pub fn kext(&self, relative: &str, identifier: &str, executable: Option<&str>) -> PathBuf {
        let bundle = self.dir.path().join("Kexts").join(relative);
        write_bundle(&bundle, identifier, executable);
        bundle
    }

    pub fn remove(&self, relative: &str) {
        let path = self.dir.path().join(relative);
        if path.is_dir() {
            fs::remove_dir_all(path).unwrap();
        } else {
            fs::remove_file(path).unwrap();
        }
    }

    pub fn scan(&self) -> ScanReport {
        Scanner::default().scan(self.root()).unwrap()
    }
}

pub fn write_bundle(bundle: &Path, identifier: &str, executable: Option<&str>) {
    let contents = bundle.join("Contents");
    fs::create_dir_all(&contents).unwrap();
    let exec_key = executable
        .map(|e| format!("<key>CFBundleExecutable</key><string>{}</string>", e))
        .unwrap_or_default();
    let plist = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0"><dict>
<key>CFBundleIdentifier</key><string>{}</string>{}
</dict></plist>"#,
        identifier, exec_key
    );
    fs::write(contents.join("Info.plist"), plist).unwrap();
    if let Some(exe) = executable {
        fs::create_dir_all(contents.join("MacOS")).unwrap();
        fs::write(contents.join("MacOS").join(exe), b"\xcf\xfa\xed\xfe").unwrap();
    }
}

/// Document with every required section and recommended subsection; the four
/// component lists are empty arrays. Validates without findings.
pub fn skeleton_document() -> ConfigDocument {
    let mut root = Dictionary::new();
    for key in REQUIRED_TOP_LEVEL_KEYS {
        let mut section = Dictionary::new();
        for (name, subs) in RECOMMENDED_SUBSECTIONS {
            if name == key {
                for sub in subs {
                    section.insert(*sub, PropertyNode::empty_dictionary());
                }
            }
        }
        root.insert(key, section.into());
    }
    let mut doc = ConfigDocument::new(root);
    for target in TargetSequence::ALL {
        doc.root_mut()
            .get_mut(target.section())
            .and_then(PropertyNode::as_dictionary_mut)
            .unwrap()
            .insert(target.key(), PropertyNode::empty_sequence());
    }
    doc
}

pub fn dict(fields: &[(&str, PropertyNode)]) -> PropertyNode {
    let dict: Dictionary = fields.iter().cloned().collect();
    dict.into()
}

pub fn write_document(path: &Path, document: &ConfigDocument) {
    let bytes = document.to_bytes(&PlistCodec::new(PlistFormat::Xml)).unwrap();
    fs::write(path, bytes).unwrap();
}

pub fn read_document(path: &Path) -> ConfigDocument {
    let bytes = fs::read(path).unwrap();
    ConfigDocument::from_bytes(&PlistCodec::default(), &bytes, "test").unwrap()
}

/// Run `f` with XDG_CONFIG_HOME pointing into `test_dir` and OCSNAP variables
/// cleared, restoring the environment afterwards.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    let mut names: Vec<String> = std::env::vars()
        .map(|(k, _)| k)
        .filter(|k| k.starts_with("OCSNAP"))
        .collect();
    names.push("XDG_CONFIG_HOME".to_string());
    names.extend(vars.iter().map(|(k, _)| k.to_string()));
    let saved: Vec<(String, Option<String>)> = names
        .into_iter()
        .map(|k| {
            let v = std::env::var(&k).ok();
            (k, v)
        })
        .collect();

    for (key, _) in &saved {
        std::env::remove_var(key);
    }
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path().join("xdg"));
    for (key, value) in vars {
        std::env::set_var(key, value);
    }

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

    for (key, value) in saved {
        match value {
            Some(v) => std::env::set_var(&key, v),
            None => std::env::remove_var(&key),
        }
    }

    match result {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
