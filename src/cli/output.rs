//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, ParseError};

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Parse(ParseError::Malformed {
            source_name,
            message,
        }) => format!("{} is not a valid property list: {}", source_name, message),
        ApiError::Parse(ParseError::RootNotDictionary) => {
            "Document root must be a dictionary; refusing to edit it".to_string()
        }
        other => other.to_string(),
    }
}
