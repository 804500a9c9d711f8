//! ocsnap: OpenCore config.plist snapshot and validation engine
//!
//! Loads a property-list configuration into a typed tree, scans an OC directory
//! for ACPI tables, kexts, drivers and tools, reconciles the document's component
//! lists with what is on disk, and validates the result.

pub mod cli;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod scan;
pub mod snapshot;
pub mod tree;
pub mod validate;
