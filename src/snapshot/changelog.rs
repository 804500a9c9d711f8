//! Merge change log

use crate::document::TargetSequence;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to one item of a target list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeKind {
    /// Dropped by a clean rebuild
    Removed,
    /// Dropped because its file no longer exists
    StaleRemoved,
    /// Appended for a newly discovered component
    Added,
    /// A path field of a retained kext was rewritten
    PathUpdated {
        field: String,
        old: String,
        new: String,
    },
}

/// A single change. `index` is the pre-merge position for removals and the
/// post-merge position otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub target: TargetSequence,
    #[serde(flatten)]
    pub kind: ChangeKind,
    pub identifying_path: String,
    pub index: usize,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = format!("{}[{}]", self.target, self.index);
        match &self.kind {
            ChangeKind::Removed => write!(f, "- {} {} (clean)", at, self.identifying_path),
            ChangeKind::StaleRemoved => write!(f, "- {} {} (missing on disk)", at, self.identifying_path),
            ChangeKind::Added => write!(f, "+ {} {}", at, self.identifying_path),
            ChangeKind::PathUpdated { field, old, new } => write!(
                f,
                "~ {} {}: {} {:?} -> {:?}",
                at, self.identifying_path, field, old, new
            ),
        }
    }
}

/// Ordered record of everything a merge did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLog {
    pub changes: Vec<Change>,
}

/// Per-kind totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub removed: usize,
    pub stale_removed: usize,
    pub added: usize,
    pub path_updated: usize,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn extend(&mut self, other: ChangeLog) {
        self.changes.extend(other.changes);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    pub fn for_target(&self, target: TargetSequence) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(move |c| c.target == target)
    }

    pub fn counts(&self) -> ChangeCounts {
        let mut counts = ChangeCounts::default();
        for change in &self.changes {
            match change.kind {
                ChangeKind::Removed => counts.removed += 1,
                ChangeKind::StaleRemoved => counts.stale_removed += 1,
                ChangeKind::Added => counts.added += 1,
                ChangeKind::PathUpdated { .. } => counts.path_updated += 1,
            }
        }
        counts
    }
}

impl fmt::Display for ChangeLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "No changes");
        }
        for (i, change) in self.changes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", change)?;
        }
        Ok(())
    }
}
