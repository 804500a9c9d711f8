//! Validator
//!
//! Four read-only checks over a [`ConfigDocument`]: path length, structural
//! completeness, duplicate entries and kext dependency order. Findings are
//! collected into a [`ValidationReport`]; validation itself never fails.

pub mod dependencies;
pub mod duplicates;
pub mod paths;
pub mod structure;

use crate::document::ConfigDocument;
use crate::tree::NodePath;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

/// Longest path the bootloader handles safely (inclusive).
pub const MAX_PATH_LENGTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Which check produced an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    PathLength,
    Structure,
    Duplicate,
    Dependency,
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssueCategory::PathLength => "path-length",
            IssueCategory::Structure => "structure",
            IssueCategory::Duplicate => "duplicate",
            IssueCategory::Dependency => "dependency",
        };
        write!(f, "{}", name)
    }
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub category: IssueCategory,
    pub message: String,
    /// Location in the document the finding refers to
    pub path: NodePath,
}

impl ValidationIssue {
    pub fn error(category: IssueCategory, path: NodePath, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category,
            message: message.into(),
            path,
        }
    }

    pub fn warning(category: IssueCategory, path: NodePath, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            category,
            message: message.into(),
            path,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.category, self.path, self.message)
    }
}

/// Validation output, errors and warnings kept apart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn push(&mut self, issue: ValidationIssue) {
        match issue.severity {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Issues from one check, errors first.
    pub fn by_category(&self, category: IssueCategory) -> impl Iterator<Item = &ValidationIssue> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .filter(move |i| i.category == category)
    }
}

/// Run every check against `document`.
#[instrument(skip_all)]
pub fn validate(document: &ConfigDocument) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.extend(structure::check(document));
    report.extend(paths::check(document));
    report.extend(duplicates::check(document));
    report.extend(dependencies::check(document));
    debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "Validation completed"
    );
    report
}
