//! Metadata validation: untyped JSON in, typed [`OmeDocument`] out.
//!
//! Validation runs in three steps:
//! - locate the OME object and its version ([`Envelope`] detection)
//! - pick the node kind from the document's markers ([`discriminate`])
//! - read every field of that kind, collecting all issues
//!
//! A document either yields a node that satisfies every invariant (plus any
//! warnings) or a [`ValidationReport`] listing everything that is wrong.
//!
//! # Example
//!
//! ```
//! use ngffcheck::model::NodeKind;
//! use ngffcheck::schema::validate_json_str;
//!
//! let doc = r#"{"ome": {"version": "0.5", "labels": ["cells"]}}"#;
//! let validated = validate_json_str(doc).unwrap();
//! assert_eq!(validated.value.kind(), NodeKind::LabelsGroup);
//! ```
//!
//! [`Envelope`]: crate::model::Envelope

mod checker;
mod collection;
mod discriminate;
mod envelope;
mod image;
mod label;
mod plate;
mod rules;
mod table;

pub use discriminate::discriminate;
pub use table::{KindEntry, NamePatterns, SchemaTable};

pub(crate) use plate::{column_out_of_range, row_out_of_range};

use serde_json::Value;

use checker::Checker;
use crate::model::{NodeKind, OmeDocument, OmeNode, SpecVersion};
use crate::validation::{IssueCode, Location, ValidationIssue, ValidationReport};
use envelope::unwrap_envelope;

/// A successfully validated value with the warnings raised along the way.
#[derive(Clone, Debug, PartialEq)]
pub struct Validated<T> {
    pub value: T,
    pub warnings: ValidationReport,
}

impl<T> Validated<T> {
    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Validated<U> {
        Validated {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}

/// Validates metadata documents against a shared [`SchemaTable`].
#[derive(Clone, Copy, Debug)]
pub struct MetadataValidator<'t> {
    table: &'t SchemaTable,
    allow_risky_names: bool,
}

impl<'t> MetadataValidator<'t> {
    pub fn new(table: &'t SchemaTable) -> Self {
        Self {
            table,
            allow_risky_names: false,
        }
    }

    /// Suppresses `risky_node_name` warnings.
    pub fn allow_risky_names(mut self, allow: bool) -> Self {
        self.allow_risky_names = allow;
        self
    }

    /// Validates a document in any accepted shape.
    ///
    /// # Errors
    /// Returns every schema issue found if the document is invalid.
    pub fn validate_document(
        &self,
        raw: &Value,
    ) -> Result<Validated<OmeDocument>, ValidationReport> {
        let unwrapped = unwrap_envelope(raw).map_err(single)?;
        let node = self.validate_node(unwrapped.ome, unwrapped.version)?;
        Ok(node.map(|node| OmeDocument {
            version: unwrapped.version,
            envelope: unwrapped.envelope,
            version_declared: unwrapped.version_declared,
            node,
        }))
    }

    /// Validates a document that must be of a given version, as when a
    /// hierarchy is walked below a parent of known version.
    ///
    /// # Errors
    /// Returns an `unsupported_version` issue on a version mismatch, or the
    /// document's own schema issues.
    pub fn validate_document_as(
        &self,
        raw: &Value,
        expected: SpecVersion,
    ) -> Result<Validated<OmeDocument>, ValidationReport> {
        let unwrapped = unwrap_envelope(raw).map_err(single)?;
        if unwrapped.version != expected {
            return Err(single(
                ValidationIssue::error(
                    IssueCode::UnsupportedVersion,
                    Location::root(),
                    format!(
                        "Found version {} metadata inside a version {} hierarchy",
                        unwrapped.version, expected
                    ),
                )
                .with("expected", expected.as_str())
                .with("found", unwrapped.version.as_str()),
            ));
        }
        self.validate_document(raw)
    }

    /// Validates a bare OME metadata object under the rules of `version`.
    ///
    /// # Errors
    /// Returns every schema issue found if the object is invalid.
    pub fn validate_node(
        &self,
        ome: &Value,
        version: SpecVersion,
    ) -> Result<Validated<OmeNode>, ValidationReport> {
        let kind = discriminate(ome, self.table).map_err(single)?;
        let Some(map) = ome.as_object() else {
            return Err(single(ValidationIssue::error(
                IssueCode::InvalidType,
                Location::root(),
                "Expected a JSON object",
            )));
        };

        let root = Location::root();
        let mut c = Checker::new(self.table, self.table.rules(version), self.allow_risky_names);
        let node = match kind {
            NodeKind::Image => image::read_image(&mut c, map, &root).map(OmeNode::Image),
            NodeKind::LabelImage => {
                label::read_label_image(&mut c, map, &root).map(OmeNode::LabelImage)
            }
            NodeKind::LabelsGroup => {
                label::read_labels_group(&mut c, map, &root).map(OmeNode::LabelsGroup)
            }
            NodeKind::Plate => plate::read_plate(&mut c, map, &root).map(OmeNode::Plate),
            NodeKind::Well => plate::read_well(&mut c, map, &root).map(OmeNode::Well),
            NodeKind::Collection => {
                collection::read_collection(&mut c, map, &root).map(OmeNode::Collection)
            }
            NodeKind::Series => collection::read_series(&mut c, map, &root).map(OmeNode::Series),
        };

        let mut report = c.into_report();
        match node {
            Some(node) if report.is_ok() => Ok(Validated {
                value: node,
                warnings: report,
            }),
            _ => {
                if report.is_ok() {
                    report.add(ValidationIssue::error(
                        IssueCode::InvalidValue,
                        Location::root(),
                        format!("{} metadata could not be read", kind),
                    ));
                }
                Err(report)
            }
        }
    }
}

fn single(issue: ValidationIssue) -> ValidationReport {
    let mut report = ValidationReport::new();
    report.add(issue);
    report
}

/// Validates a document with a freshly built [`SchemaTable`].
///
/// Callers validating many documents should build one table and use a
/// [`MetadataValidator`] instead.
///
/// # Errors
/// Returns every schema issue found if the document is invalid.
pub fn validate_document(raw: &Value) -> Result<Validated<OmeDocument>, ValidationReport> {
    let table = SchemaTable::new();
    MetadataValidator::new(&table).validate_document(raw)
}

/// Parses and validates a JSON string.
///
/// # Errors
/// Malformed JSON is reported as a single `invalid_type` issue at the root;
/// otherwise as [`validate_document`].
pub fn validate_json_str(json: &str) -> Result<Validated<OmeDocument>, ValidationReport> {
    let raw: Value = serde_json::from_str(json).map_err(|e| {
        single(ValidationIssue::error(
            IssueCode::InvalidType,
            Location::root(),
            format!("Document is not valid JSON: {}", e),
        ))
    })?;
    validate_document(&raw)
}
