//! Validate presentation

use super::shared::{push_list, to_pretty_json};
use crate::error::ApiError;
use crate::validate::{ValidationIssue, ValidationReport};
use std::path::Path;

pub fn format_validate_text(document: &Path, report: &ValidationReport) -> String {
    if report.is_clean() {
        return format!(
            "Validation passed:\n  Document: {}\n  All checks passed",
            document.display()
        );
    }
    let mut out = format!(
        "Validation completed with issues:\n  Document: {}",
        document.display()
    );
    push_list(&mut out, "Errors", &report.errors);
    push_list(&mut out, "Warnings", &report.warnings);
    out
}

pub fn format_validate_json(document: &Path, report: &ValidationReport) -> Result<String, ApiError> {
    let out = serde_json::json!({
        "document": document,
        "valid": !report.has_errors(),
        "errors": report.errors.iter().map(issue_json).collect::<Vec<_>>(),
        "warnings": report.warnings.iter().map(issue_json).collect::<Vec<_>>(),
    });
    to_pretty_json(&out)
}

fn issue_json(issue: &ValidationIssue) -> serde_json::Value {
    serde_json::json!({
        "category": issue.category.to_string(),
        "path": issue.path.to_string(),
        "message": issue.message,
    })
}
