//! Structural validation of OME-NGFF stores.
//!
//! Metadata validation (see [`crate::schema`]) answers "is this document
//! well-formed?". This module answers "does the store agree with it?": every
//! dataset, label, well, field and series the metadata references is looked
//! up and cross-checked against what is actually there.
//!
//! Validation never stops at the first defect. Independent branches (other
//! wells, other pyramid levels) keep being checked, and everything found ends
//! up in one [`ValidationReport`], ordered depth-first by declaration.
//!
//! The only fatal condition is a store root that cannot be reached at all,
//! which surfaces as [`NgffError::StoreUnreachable`].

mod report;
mod walker;

pub use report::{
    IssueCode, IssueDomain, Location, Segment, Severity, ValidationIssue, ValidationReport,
};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::NgffError;
use crate::model::{NodeKind, OmeDocument, SpecVersion};
use crate::schema::{MetadataValidator, SchemaTable};
use crate::store::{open_node, Store};
use walker::{Trail, Walker};

/// Options for validation behavior.
#[derive(Clone, Debug)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
    /// Worker threads for independent subtrees (wells, collection images).
    pub jobs: usize,
    /// Deepest nesting the walk descends to before reporting a cycle.
    pub max_depth: usize,
    /// Suppresses `risky_node_name` warnings.
    pub allow_risky_names: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            strict: false,
            jobs: 1,
            max_depth: 16,
            allow_risky_names: false,
        }
    }
}

impl ValidateOptions {
    /// Returns true if `report` passes under these options.
    pub fn passes(&self, report: &ValidationReport) -> bool {
        if self.strict {
            report.is_ok_strict()
        } else {
            report.is_ok()
        }
    }
}

/// The outcome of validating a store.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoreValidation {
    /// The version of the root metadata, if it could be determined.
    pub version: Option<SpecVersion>,
    /// The kind of the root node, if its metadata was valid.
    pub kind: Option<NodeKind>,
    pub report: ValidationReport,
}

/// Validates the whole store, starting at its root.
///
/// # Errors
/// Returns [`NgffError::StoreUnreachable`] if the root cannot be read.
/// Invalid data is never an error; it is collected in the report.
pub fn validate_store(
    store: &dyn Store,
    opts: &ValidateOptions,
) -> Result<StoreValidation, NgffError> {
    let table = SchemaTable::new();
    validate_group(store, "", None, &table, opts)
}

/// Validates the group at `path` and everything below it.
///
/// If `metadata` is given it is used instead of the group's own metadata,
/// which lets callers check a hierarchy against metadata they built.
///
/// # Errors
/// Returns [`NgffError::StoreUnreachable`] if the group cannot be read
/// because of a store fault.
pub fn validate_group(
    store: &dyn Store,
    path: &str,
    metadata: Option<&OmeDocument>,
    table: &SchemaTable,
    opts: &ValidateOptions,
) -> Result<StoreValidation, NgffError> {
    let fs_path = store.fs_path(path);
    info!(store = %fs_path, jobs = opts.jobs, "validating store");

    let mut report = ValidationReport::new();
    let root = Location::root();

    let node = match open_node(store, path) {
        Ok(node) => node,
        Err(e) if e.is_connectivity() => {
            return Err(NgffError::StoreUnreachable {
                uri: fs_path,
                message: e.to_string(),
            })
        }
        Err(e) => {
            report.add(
                ValidationIssue::error(
                    IssueCode::MetadataUnreadable,
                    root,
                    format!("Root metadata could not be parsed: {}", e),
                )
                .with("fs_path", fs_path),
            );
            return Ok(StoreValidation {
                version: metadata.map(|m| m.version),
                kind: metadata.map(OmeDocument::kind),
                report,
            });
        }
    };

    let Some(node) = node else {
        report.add(
            ValidationIssue::error(
                IssueCode::RootMetadataNotFound,
                root,
                "No zarr group found at the store root",
            )
            .with("fs_path", fs_path),
        );
        return Ok(StoreValidation {
            version: metadata.map(|m| m.version),
            kind: metadata.map(OmeDocument::kind),
            report,
        });
    };

    if !node.is_group() {
        report.add(
            ValidationIssue::error(
                IssueCode::RootMetadataNotFound,
                root,
                "Store root is an array, not a group",
            )
            .with("expected", "group")
            .with("found", "array")
            .with("fs_path", fs_path),
        );
        return Ok(StoreValidation {
            version: None,
            kind: None,
            report,
        });
    }

    let validator = MetadataValidator::new(table).allow_risky_names(opts.allow_risky_names);
    let owned;
    let document = match metadata {
        Some(document) => document,
        None => match validator.validate_document(&node.document) {
            Ok(validated) => {
                report.merge(validated.warnings);
                owned = validated.value;
                &owned
            }
            Err(errors) => {
                debug!(errors = errors.error_count(), "root metadata is invalid");
                for issue in errors.issues {
                    report.add(issue.with("fs_path", fs_path.clone()));
                }
                return Ok(StoreValidation {
                    version: None,
                    kind: None,
                    report,
                });
            }
        },
    };

    let walker = Walker::new(store, validator, document.version, opts);
    walker.visit(
        &Trail::root(&node.path),
        &node,
        &document.node,
        &root,
        &mut report,
    );

    info!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        "validation finished"
    );
    Ok(StoreValidation {
        version: Some(document.version),
        kind: Some(document.kind()),
        report,
    })
}
