//! CLI domain: parse, route, help, output, and presentation only.
//! No domain logic; the single route table dispatches to scan, snapshot and validate.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_node_json, format_node_text, format_scan_json, format_scan_text,
    format_section_heading, format_snapshot_json, format_snapshot_text, format_validate_json,
    format_validate_text, node_to_json, SnapshotSummary,
};
pub use route::{load_document, CommandOutput, RunContext};
