//! Shared presentation helpers.

use crate::error::{ApiError, ParseError};
use owo_colors::OwoColorize;
use serde::Serialize;

/// Bold, underlined section title.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub(crate) fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::Parse(ParseError::Serialize(e.to_string())))
}

/// `"  - item"` lines under a `Title (n):` header; nothing when `items` is empty.
pub(crate) fn push_list<I, T>(out: &mut String, title: &str, items: I)
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let lines: Vec<String> = items.into_iter().map(|i| format!("  - {}", i)).collect();
    if lines.is_empty() {
        return;
    }
    out.push_str(&format!("\n\n{} ({}):", title, lines.len()));
    for line in lines {
        out.push('\n');
        out.push_str(&line);
    }
}
