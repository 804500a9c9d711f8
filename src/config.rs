//! Configuration System
//!
//! Layered settings for the command layer: built-in defaults, the global config
//! file, a workspace `.ocsnap.toml`, then `OCSNAP__SECTION__KEY` environment
//! variables. Bootloader constants (path limit, required sections, directory
//! names, dependency table) are compiled in and not configurable here.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::scan::pool::CancelToken;
use crate::scan::{Category, ScanOptions};
use crate::snapshot::MergeMode;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

mod merge;
mod sources;

pub use sources::global_file::global_config_path;
pub use sources::workspace_file::{workspace_config_path, WORKSPACE_CONFIG_NAME};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcsnapConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scanner settings
    #[serde(default)]
    pub scan: ScanSettings,

    /// Snapshot settings
    #[serde(default)]
    pub snapshot: SnapshotSettings,
}

/// Scanner settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Worker pool size (defaults to available hardware concurrency)
    #[serde(default)]
    pub workers: Option<usize>,

    /// Follow symbolic links inside category directories
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl ScanSettings {
    pub fn scan_options(&self, categories: Vec<Category>, cancel: CancelToken) -> ScanOptions {
        ScanOptions {
            categories,
            workers: self.workers,
            follow_symlinks: self.follow_symlinks,
            cancel,
        }
    }
}

/// Snapshot settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSettings {
    /// Merge mode used when `--clean` is not given
    #[serde(default)]
    pub default_mode: MergeMode,

    /// Copy the previous document to `<file>.bak` before overwriting it
    #[serde(default = "default_true")]
    pub backup_on_save: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            default_mode: MergeMode::default(),
            backup_on_save: default_true(),
        }
    }
}

impl OcsnapConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if self.scan.workers == Some(0) {
            errors.push("scan.workers must be at least 1".to_string());
        }
        if !["json", "text"].contains(&self.logging.format.as_str()) {
            errors.push(format!(
                "logging.format must be 'json' or 'text', got '{}'",
                self.logging.format
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            )))
        }
    }
}

/// Loads [`OcsnapConfig`] from its layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace directory.
    ///
    /// Precedence (lowest to highest): defaults, global file, workspace file, environment.
    pub fn load(workspace_root: &Path) -> Result<OcsnapConfig, ApiError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let config: OcsnapConfig = builder.add_source(environment()).build()?.try_deserialize()?;
        config.validate()?;
        debug!(workspace = %workspace_root.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from one explicit file (environment still applies).
    pub fn load_from_file(path: &Path) -> Result<OcsnapConfig, ApiError> {
        if !path.is_file() {
            return Err(ApiError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let config: OcsnapConfig = merge::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Path of the global config file, if one can be determined.
    pub fn global_config_path() -> Option<PathBuf> {
        global_config_path()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("OCSNAP")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Built-in defaults with no file or environment sources.
pub fn defaults() -> Result<OcsnapConfig, ApiError> {
    let config: Config = merge::builder_with_defaults()?.build()?;
    Ok(config.try_deserialize()?)
}
