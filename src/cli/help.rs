//! CLI help and command-name contract for logging spans.

use crate::cli::parse::Commands;

/// Command name string used in log spans (e.g. "snapshot", "validate").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Scan { .. } => "scan",
        Commands::Snapshot { .. } => "snapshot",
        Commands::Validate { .. } => "validate",
        Commands::Show { .. } => "show",
    }
}
