//! CLI route: single route table and run context. Dispatches to domain services and presentation.
//!
//! A command owns its document for its whole run: it is loaded once, lent by
//! `&mut` to the merger or by `&` to the validator, then saved or dropped.

use crate::codec::{PlistCodec, PlistFormat};
use crate::config::{ConfigLoader, OcsnapConfig};
use crate::document::{ConfigDocument, TargetSequence};
use crate::error::ApiError;
use crate::scan::pool::CancelToken;
use crate::scan::{Category, ScanReport, Scanner};
use crate::snapshot::{merge_targets, MergeMode};
use crate::tree::NodePath;
use crate::validate::validate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_node_json, format_node_text, format_scan_json, format_scan_text,
    format_snapshot_json, format_snapshot_text, format_validate_json, format_validate_text,
    SnapshotSummary,
};
use crate::cli::command_name;

const BINARY_PLIST_MAGIC: &[u8] = b"bplist00";

/// Rendered command result. `success` is false when the command ran but found
/// problems (validation errors), which maps to a non-zero exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub rendered: String,
    pub success: bool,
}

impl CommandOutput {
    fn ok(rendered: String) -> Self {
        Self {
            rendered,
            success: true,
        }
    }
}

/// Runtime context for CLI execution: workspace and loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: OcsnapConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: OcsnapConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &OcsnapConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        let span = info_span!("command", name = command_name(command));
        let _enter = span.enter();
        let started = Instant::now();

        let result = match command {
            Commands::Scan { oc_dir, format } => self.handle_scan(oc_dir, format),
            Commands::Snapshot {
                document,
                oc_dir,
                clean,
                output,
                dry_run,
                yes,
                format,
            } => self.handle_snapshot(SnapshotRequest {
                document,
                oc_dir: oc_dir.as_deref(),
                clean: *clean,
                output: output.as_deref(),
                dry_run: *dry_run,
                yes: *yes,
                format,
            }),
            Commands::Validate { document, format } => self.handle_validate(document, format),
            Commands::Show {
                document,
                path,
                format,
            } => self.handle_show(document, path.as_deref(), format),
        };

        match &result {
            Ok(output) => info!(
                success = output.success,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Command finished"
            ),
            Err(e) => warn!(error = %e, "Command failed"),
        }
        result
    }

    fn handle_scan(&self, oc_dir: &Path, format: &str) -> Result<CommandOutput, ApiError> {
        let report = self.scan(oc_dir)?;
        let rendered = match format {
            "json" => format_scan_json(&report)?,
            _ => format_scan_text(&report),
        };
        Ok(CommandOutput::ok(rendered))
    }

    fn handle_snapshot(&self, request: SnapshotRequest<'_>) -> Result<CommandOutput, ApiError> {
        let mode = if request.clean {
            MergeMode::Clean
        } else {
            self.config.snapshot.default_mode
        };

        if mode == MergeMode::Clean && !request.yes && !request.dry_run {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Rebuild every component list in {} from disk? Existing entries and their settings will be discarded.",
                    request.document.display()
                ))
                .default(false)
                .interact()
                .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;

            if !confirmed {
                return Ok(CommandOutput::ok("Snapshot cancelled".to_string()));
            }
        }

        let (mut document, format) = load_document(request.document)?;
        let oc_dir = request
            .oc_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_oc_dir(request.document));
        let report = self.scan(&oc_dir)?;

        // Lists whose directory is absent are left alone rather than emptied.
        let targets: Vec<TargetSequence> = report
            .scanned
            .iter()
            .map(|&c| TargetSequence::for_category(c))
            .collect();
        let changes = merge_targets(&mut document, &report.entries, mode, &targets)?;
        info!(changes = changes.len(), mode = %mode, "Merged scan into document");

        let destination = request.output.unwrap_or(request.document);
        let unchanged_in_place = changes.is_empty() && same_file(destination, request.document);
        let (written, backup) = if request.dry_run || unchanged_in_place {
            (None, None)
        } else {
            let backup = self.save_document(&document, format, destination)?;
            (Some(destination.to_path_buf()), backup)
        };

        let summary = SnapshotSummary {
            document: request.document.to_path_buf(),
            oc_root: report.root,
            mode,
            dry_run: request.dry_run,
            written,
            backup,
            changes,
            skipped: report.skipped,
        };
        let rendered = match request.format {
            "json" => format_snapshot_json(&summary)?,
            _ => format_snapshot_text(&summary),
        };
        Ok(CommandOutput::ok(rendered))
    }

    fn handle_validate(&self, path: &Path, format: &str) -> Result<CommandOutput, ApiError> {
        let (document, _) = load_document(path)?;
        let report = validate(&document);
        info!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Validated document"
        );
        let rendered = match format {
            "json" => format_validate_json(path, &report)?,
            _ => format_validate_text(path, &report),
        };
        Ok(CommandOutput {
            rendered,
            success: !report.has_errors(),
        })
    }

    fn handle_show(
        &self,
        path: &Path,
        node_path: Option<&str>,
        format: &str,
    ) -> Result<CommandOutput, ApiError> {
        let (document, _) = load_document(path)?;
        let node_path: NodePath = node_path.unwrap_or_default().parse()?;
        let node = if node_path.is_root() {
            document.into_node()
        } else {
            document.locate(&node_path)?.clone()
        };
        let rendered = match format {
            "json" => format_node_json(&node)?,
            _ => format_node_text(&node_path, &node),
        };
        Ok(CommandOutput::ok(rendered))
    }

    fn scan(&self, oc_dir: &Path) -> Result<ScanReport, ApiError> {
        let options = self
            .config
            .scan
            .scan_options(Category::ALL.to_vec(), CancelToken::new());
        let scanner = Scanner::new(Arc::new(PlistCodec::default())).with_options(options);
        Ok(scanner.scan(oc_dir)?)
    }

    /// Serialize in the document's original encoding and replace `destination`.
    /// Returns the backup path when one was written.
    fn save_document(
        &self,
        document: &ConfigDocument,
        format: PlistFormat,
        destination: &Path,
    ) -> Result<Option<PathBuf>, ApiError> {
        let bytes = document.to_bytes(&PlistCodec::new(format))?;

        let backup = if self.config.snapshot.backup_on_save && destination.is_file() {
            let backup = sibling_with_suffix(destination, ".bak");
            std::fs::copy(destination, &backup).map_err(|source| ApiError::Io {
                path: backup.clone(),
                source,
            })?;
            debug!(backup = %backup.display(), "Wrote backup");
            Some(backup)
        } else {
            None
        };

        let staging = sibling_with_suffix(destination, ".tmp");
        std::fs::write(&staging, &bytes).map_err(|source| ApiError::Io {
            path: staging.clone(),
            source,
        })?;
        std::fs::rename(&staging, destination).map_err(|source| ApiError::Io {
            path: destination.to_path_buf(),
            source,
        })?;
        info!(path = %destination.display(), bytes = bytes.len(), "Saved document");
        Ok(backup)
    }
}

struct SnapshotRequest<'a> {
    document: &'a Path,
    oc_dir: Option<&'a Path>,
    clean: bool,
    output: Option<&'a Path>,
    dry_run: bool,
    yes: bool,
    format: &'a str,
}

/// Read and parse a document, remembering whether it was binary.
pub fn load_document(path: &Path) -> Result<(ConfigDocument, PlistFormat), ApiError> {
    let bytes = std::fs::read(path).map_err(|source| ApiError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let format = if bytes.starts_with(BINARY_PLIST_MAGIC) {
        PlistFormat::Binary
    } else {
        PlistFormat::Xml
    };
    let codec = PlistCodec::new(format);
    let document = ConfigDocument::from_bytes(&codec, &bytes, &path.display().to_string())?;
    debug!(path = %path.display(), ?format, "Loaded document");
    Ok((document, format))
}

/// config.plist lives at the OC root, so its directory is the default scan root.
fn default_oc_dir(document: &Path) -> PathBuf {
    match document.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (dunce::canonicalize(a), dunce::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
