//! Integration tests for layered configuration

use super::test_utils::{read_document, skeleton_document, with_isolated_env, write_document, OcTree};
use ocsnap::cli::{Commands, RunContext};
use ocsnap::config::{ConfigLoader, OcsnapConfig, WORKSPACE_CONFIG_NAME};
use ocsnap::document::TargetSequence;
use ocsnap::snapshot::MergeMode;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_defaults_without_files() {
    let temp = TempDir::new().unwrap();
    let config = with_isolated_env(&temp, &[], || ConfigLoader::load(temp.path()).unwrap());
    assert_eq!(config, OcsnapConfig::default());
}

#[test]
fn test_precedence_global_workspace_env() {
    let temp = TempDir::new().unwrap();
    let global_dir = temp.path().join("xdg").join("ocsnap");
    fs::create_dir_all(&global_dir).unwrap();
    fs::write(
        global_dir.join("config.toml"),
        "[scan]\nworkers = 2\nfollow_symlinks = true\n\n[logging]\nlevel = \"info\"\n",
    )
    .unwrap();
    fs::write(
        temp.path().join(WORKSPACE_CONFIG_NAME),
        "[scan]\nworkers = 4\n\n[snapshot]\ndefault_mode = \"clean\"\n",
    )
    .unwrap();

    let config = with_isolated_env(&temp, &[("OCSNAP__SCAN__WORKERS", "6")], || {
        ConfigLoader::load(temp.path()).unwrap()
    });
    assert_eq!(config.scan.workers, Some(6));
    assert!(config.scan.follow_symlinks);
    assert_eq!(config.snapshot.default_mode, MergeMode::Clean);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_invalid_values_rejected() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(WORKSPACE_CONFIG_NAME), "[scan]\nworkers = 0\n").unwrap();
    let result = with_isolated_env(&temp, &[], || ConfigLoader::load(temp.path()));
    assert!(result.is_err());
}

#[test]
fn test_backup_disabled_by_config() {
    let tree = OcTree::new();
    tree.acpi("SSDT-EC.aml");
    let document = tree.root().join("config.plist");
    write_document(&document, &skeleton_document());
    fs::write(
        tree.root().join(WORKSPACE_CONFIG_NAME),
        "[snapshot]\nbackup_on_save = false\n",
    )
    .unwrap();

    let temp = TempDir::new().unwrap();
    let output = with_isolated_env(&temp, &[], || {
        let context = RunContext::new(tree.root().to_path_buf(), None).unwrap();
        assert!(!context.config().snapshot.backup_on_save);
        context
            .execute(&Commands::Snapshot {
                document: document.clone(),
                oc_dir: None,
                clean: false,
                output: None,
                dry_run: false,
                yes: true,
                format: "text".to_string(),
            })
            .unwrap()
    });

    assert!(output.success);
    assert!(!tree.root().join("config.plist.bak").exists());
    let saved = read_document(&document);
    assert_eq!(saved.target(TargetSequence::AcpiAdd).unwrap().len(), 1);
}
