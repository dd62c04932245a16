use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for ngffcheck operations.
///
/// Invalid data is never an `NgffError` on its own: it is collected into a
/// [`ValidationReport`]. The variants here are setup and connectivity
/// faults, plus [`NgffError::ValidationFailed`] for the CLI exit path.
#[derive(Debug, Error)]
pub enum NgffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON from {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write JSON to {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store root {uri} is unreachable: {message}")]
    StoreUnreachable { uri: String, message: String },

    #[error("Invalid store URI '{0}' (supported: local paths, file://, http://, https://)")]
    InvalidUri(String),

    #[error("Remote store '{0}' requires the 'remote' feature")]
    RemoteUnsupported(String),

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },
}

/// Errors raised by a [`Store`](crate::store::Store) while reading a key.
///
/// A missing key is not an error (`Ok(None)`); these variants describe
/// faults that prevent the store from answering at all.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("'{key}' is unreachable: {message}")]
    Unreachable { key: String, message: String },

    #[error("timed out reading '{key}'")]
    Timeout { key: String },

    #[error("IO error reading '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed metadata in '{key}': {message}")]
    Corrupt { key: String, message: String },
}

impl StoreError {
    /// The store key this error refers to.
    pub fn key(&self) -> &str {
        match self {
            StoreError::Unreachable { key, .. }
            | StoreError::Timeout { key }
            | StoreError::Io { key, .. }
            | StoreError::Corrupt { key, .. } => key,
        }
    }

    /// Returns true if the store could not be reached (as opposed to
    /// answering with malformed metadata).
    pub fn is_connectivity(&self) -> bool {
        !matches!(self, StoreError::Corrupt { .. })
    }
}
