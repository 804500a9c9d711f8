//! Error types for the ocsnap snapshot and validation engine.

use crate::tree::NodePath;
use std::path::PathBuf;
use thiserror::Error;

/// Property tree navigation and mutation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node not found: {path}")]
    NotFound { path: NodePath },

    #[error("Type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: NodePath,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Invalid node path: {0}")]
    InvalidPath(String),
}

/// Document and descriptor parse errors
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Malformed property list {source_name}: {message}")]
    Malformed {
        source_name: String,
        message: String,
    },

    #[error("Unsupported property list value: {kind}")]
    UnsupportedValue { kind: &'static str },

    #[error("Integer {0} does not fit a signed 64-bit value")]
    IntegerOutOfRange(u64),

    #[error("Document root must be a dictionary")]
    RootNotDictionary,

    #[error("Serialization failed: {0}")]
    Serialize(String),
}

/// Fatal scanner errors. Per-entry problems are reported as skips, never as errors.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scan root {path:?} is not accessible: {source}")]
    RootInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan root {0:?} is not a directory")]
    RootNotDirectory(PathBuf),

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Scan worker pool failed: {0}")]
    Runtime(String),
}

/// Snapshot merge errors. A failed merge leaves the document untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("Target {target} exists but is not an array")]
    TargetNotSequence { target: String },

    #[error("Section {key} exists but is not a dictionary")]
    ContainerNotDictionary { key: String },
}

/// Top-level error used by the command layer
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
