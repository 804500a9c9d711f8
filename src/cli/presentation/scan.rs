//! Scan presentation: entries per category and skipped paths.

use super::shared::{format_section_heading, push_list, to_pretty_json};
use crate::error::ApiError;
use crate::scan::{Category, ScanReport};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;

pub fn format_scan_text(report: &ScanReport) -> String {
    let mut out = format!(
        "{}\n  Root: {}\n",
        format_section_heading("Scan"),
        report.root.display()
    );

    let mut summary = Table::new();
    summary.load_preset(UTF8_BORDERS_ONLY);
    summary.set_header(vec!["Category", "Directory", "Found"]);
    for category in Category::ALL {
        let found = if report.scanned.contains(&category) {
            report.count(category).to_string()
        } else {
            "-".to_string()
        };
        summary.add_row(vec![
            category.to_string(),
            category.directory().to_string(),
            found,
        ]);
    }
    out.push_str(&format!("{}\n", summary));

    if !report.entries.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Category", "Path", "Executable", "Identifier"]);
        for entry in &report.entries {
            table.add_row(vec![
                entry.category.to_string(),
                entry.relative_path.clone(),
                entry.executable_path.clone().unwrap_or_else(|| "-".to_string()),
                entry.bundle_identifier.clone().unwrap_or_else(|| "-".to_string()),
            ]);
        }
        out.push_str(&format!("\n{}", table));
    }

    push_list(&mut out, "Skipped", &report.skipped);
    out
}

pub fn format_scan_json(report: &ScanReport) -> Result<String, ApiError> {
    to_pretty_json(report)
}
