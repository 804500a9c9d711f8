//! CLI parse: clap types for ocsnap. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ocsnap CLI - Snapshot and validate OpenCore config.plist files
#[derive(Parser)]
#[command(name = "ocsnap")]
#[command(version)]
#[command(about = "Snapshot an OpenCore EFI folder into config.plist and validate the result")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory searched for .ocsnap.toml
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the ACPI tables, kexts, drivers and tools in an OC directory
    Scan {
        /// OC directory (or the EFI folder containing it)
        oc_dir: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Reconcile config.plist with the files present in an OC directory
    Snapshot {
        /// config.plist to update
        document: PathBuf,
        /// OC directory to scan (defaults to the document's directory)
        #[arg(long = "oc")]
        oc_dir: Option<PathBuf>,
        /// Rebuild every list from the scan, discarding existing entries
        #[arg(long)]
        clean: bool,
        /// Write the result here instead of overwriting the document
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Report changes without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Do not ask for confirmation in clean mode
        #[arg(long, short)]
        yes: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Check a config.plist for structural, path and load-order problems
    Validate {
        /// config.plist to check
        document: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print a document, or one node of it
    Show {
        /// config.plist to read
        document: PathBuf,
        /// Node path such as Kernel.Add[0] (whole document when omitted)
        #[arg(long)]
        path: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
