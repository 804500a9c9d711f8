//! CLI presentation: text and json formatters per command family.

mod scan;
mod shared;
mod show;
mod snapshot;
mod validate;

pub use scan::{format_scan_json, format_scan_text};
pub use shared::format_section_heading;
pub use show::{format_node_json, format_node_text, node_to_json};
pub use snapshot::{format_snapshot_json, format_snapshot_text, SnapshotSummary};
pub use validate::{format_validate_json, format_validate_text};
