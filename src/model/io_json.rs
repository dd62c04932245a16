//! JSON file I/O for metadata documents.
//!
//! Reading yields an untyped value; turning it into an [`OmeDocument`] is
//! the job of [`crate::schema`], so nothing here bypasses validation.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde_json::Value;

use super::OmeDocument;
use crate::error::NgffError;

/// Reads an untyped JSON document from a file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid JSON.
pub fn read_json_file(path: &Path) -> Result<Value, NgffError> {
    let file = File::open(path).map_err(NgffError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| NgffError::JsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a document to a file in the shape it was read from.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_document(path: &Path, document: &OmeDocument) -> Result<(), NgffError> {
    let file = File::create(path).map_err(NgffError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, document).map_err(|source| NgffError::JsonWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a document to a pretty-printed JSON string.
pub fn to_json_string(document: &OmeDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(document)
}
