//! Snapshot presentation: change log and what was written.

use super::shared::{format_section_heading, push_list, to_pretty_json};
use crate::error::ApiError;
use crate::scan::SkippedPath;
use crate::snapshot::{ChangeLog, MergeMode};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of one snapshot command
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub document: PathBuf,
    pub oc_root: PathBuf,
    pub mode: MergeMode,
    pub dry_run: bool,
    /// File written, if any
    pub written: Option<PathBuf>,
    pub backup: Option<PathBuf>,
    pub changes: ChangeLog,
    pub skipped: Vec<SkippedPath>,
}

pub fn format_snapshot_text(summary: &SnapshotSummary) -> String {
    let counts = summary.changes.counts();
    let mut out = format!(
        "{}\n  Document: {}\n  OC root: {}\n  Mode: {}\n  Added: {}  Removed: {}  Stale: {}  Updated: {}",
        format_section_heading("Snapshot"),
        summary.document.display(),
        summary.oc_root.display(),
        summary.mode,
        counts.added,
        counts.removed,
        counts.stale_removed,
        counts.path_updated,
    );

    push_list(&mut out, "Changes", summary.changes.iter());
    push_list(&mut out, "Skipped", &summary.skipped);

    out.push_str("\n\n");
    match (&summary.written, summary.dry_run) {
        (_, true) => out.push_str("Dry run: nothing written"),
        (Some(path), false) => {
            out.push_str(&format!("Saved {}", path.display()));
            if let Some(backup) = &summary.backup {
                out.push_str(&format!(" (backup: {})", backup.display()));
            }
        }
        (None, false) => out.push_str("No changes; document left as is"),
    }
    out
}

pub fn format_snapshot_json(summary: &SnapshotSummary) -> Result<String, ApiError> {
    let out = serde_json::json!({
        "generated_at": Utc::now().to_rfc3339(),
        "document": summary.document,
        "oc_root": summary.oc_root,
        "mode": summary.mode,
        "dry_run": summary.dry_run,
        "written": summary.written,
        "backup": summary.backup,
        "counts": summary.changes.counts(),
        "changes": summary.changes.changes,
        "skipped": summary.skipped,
    });
    to_pretty_json(&out)
}
