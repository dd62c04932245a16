//! Validation report types for structured error reporting.
//!
//! Schema issues (a field in a metadata document is wrong) and structural
//! issues (the store disagrees with its metadata) share one report shape, so
//! callers can render, filter or serialize them uniformly.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// The result of validating a document or a store.
///
/// Issues are kept in discovery order: depth-first, in declaration order of
/// the metadata that led to them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    /// All issues found during validation.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Appends every issue of `other`, preserving its order.
    pub fn merge(&mut self, other: ValidationReport) {
        self.issues.extend(other.issues);
    }

    /// Appends every issue of `other` with its location re-rooted under `prefix`.
    pub fn merge_prefixed(&mut self, prefix: &Location, other: ValidationReport) {
        self.issues.extend(other.issues.into_iter().map(|mut issue| {
            issue.location = prefix.join(&issue.location);
            issue
        }));
    }

    /// Returns the number of errors in the report.
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Returns the number of warnings in the report.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if validation passed in strict mode (no errors or warnings).
    pub fn is_ok_strict(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if any issue carries `code`.
    pub fn has(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    /// Returns the issues carrying `code`.
    pub fn with_code(&self, code: IssueCode) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }

    /// A compact JSON list of `{code, location, message}` entries.
    ///
    /// Used to attach a child document's schema failures to the one
    /// structural issue that reports them.
    pub fn summary(&self) -> Value {
        Value::Array(
            self.issues
                .iter()
                .map(|issue| {
                    let mut entry = Map::new();
                    entry.insert("code".into(), issue.code.as_str().into());
                    entry.insert("location".into(), issue.location.to_string().into());
                    entry.insert("message".into(), issue.message.clone().into());
                    Value::Object(entry)
                })
                .collect(),
        )
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("ValidationReport", 3)?;
        state.serialize_field("error_count", &self.error_count())?;
        state.serialize_field("warning_count", &self.warning_count())?;
        state.serialize_field("issues", &self.issues)?;
        state.end()
    }
}

/// A single validation issue (error or warning).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// The severity of the issue.
    pub severity: Severity,

    /// Whether the issue came from a metadata document or from the store.
    pub domain: IssueDomain,

    /// A stable code for the issue type.
    pub code: IssueCode,

    /// Where the issue occurred, relative to the validated node.
    pub location: Location,

    /// A human-readable description of the issue.
    pub message: String,

    /// Structured details: `expected`, `found`, `fs_path` and friends.
    pub context: Map<String, Value>,
}

impl ValidationIssue {
    /// Creates a new validation issue. The domain follows from the code.
    pub fn new(
        severity: Severity,
        code: IssueCode,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            domain: code.domain(),
            code,
            location,
            message: message.into(),
            context: Map::new(),
        }
    }

    /// Creates a new error.
    pub fn error(code: IssueCode, location: Location, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, location, message)
    }

    /// Creates a new warning.
    pub fn warning(code: IssueCode, location: Location, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, location, message)
    }

    /// Adds a context entry.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        let location = if self.location.is_root() {
            "<root>".to_string()
        } else {
            self.location.to_string()
        };
        write!(
            f,
            "[{}] {} at {}: {}",
            severity,
            self.code.as_str(),
            location,
            self.message
        )?;
        if let Some(Value::String(fs_path)) = self.context.get("fs_path") {
            write!(f, " ({})", fs_path)?;
        }
        Ok(())
    }
}

/// The severity of a validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Suspicious but conforming data, e.g. a risky node name.
    Warning,
    /// Data that violates the format.
    Error,
}

/// Which layer produced an issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueDomain {
    /// A field of a metadata document.
    Schema,
    /// The store's contents versus its metadata.
    Structure,
}

/// One step of a [`Location`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A path inside a metadata document or the logical hierarchy, rendered
/// dotted: `multiscales.0.datasets.0.path`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location(Vec<Segment>);

impl Location {
    /// The empty location (the validated node itself).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns a new location extended by a field name.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Key(key.into()));
        Self(segments)
    }

    /// Returns a new location extended by a list index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index));
        Self(segments)
    }

    /// Returns `self` followed by every segment of `other`.
    pub fn join(&self, other: &Location) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// The trailing list index, if the location ends in one.
    pub fn last_index(&self) -> Option<usize> {
        match self.0.last() {
            Some(Segment::Index(index)) => Some(*index),
            _ => None,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Key(key) => f.write_str(key)?,
                Segment::Index(index) => write!(f, "{}", index)?,
            }
        }
        Ok(())
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A stable code identifying the type of validation issue.
///
/// Codes serialize as snake_case strings and never change meaning, so they
/// can be used for filtering and for asserting on specific defects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    // Document shape
    /// No node kind could be determined, or markers conflict.
    UnionTagNotFound,
    /// A version string outside the supported set.
    UnsupportedVersion,
    /// A zarr v3 envelope that is not a group or lacks `ome` attributes.
    InvalidEnvelope,

    // Generic field checks
    MissingField,
    InvalidType,
    InvalidValue,
    TooShort,
    TooLong,
    ListNotUnique,
    PatternMismatch,
    OutOfRange,

    // Axes
    TooFewAxes,
    TooManyAxes,
    TooFewSpaceAxes,
    TooManySpaceAxes,
    TooManyTimeAxes,
    TooManyChannelAxes,
    AxesOutOfOrder,
    DuplicateAxisName,
    InvalidUnit,

    // Coordinate transformations and datasets
    ScaleCount,
    TooManyTranslations,
    TranslationBeforeScale,
    TransformDimensionMismatch,
    DatasetDimensionsDiffer,
    DatasetsNotOrdered,

    // Plate
    WellRowIndexOutOfRange,
    WellColumnIndexOutOfRange,
    /// A 0.4 well without indices whose path does not name a declared row/column.
    WellIndexUnresolved,

    // Node names
    InvalidNodeName,
    /// Warning: legal but likely to break on some filesystems.
    RiskyNodeName,

    // Structure: images
    DatasetPathNotFound,
    DatasetNotArray,
    DatasetDimensionMismatch,
    DimensionNamesMismatch,

    // Structure: labels
    LabelsNotGroup,
    LabelsMetadataInvalid,
    LabelPathNotFound,
    LabelPathNotGroup,
    LabelImageInvalid,
    LabelMultiscaleCountMismatch,
    LabelDatasetCountMismatch,
    LabelNonIntegerDtype,
    LabelImageSourceNotFound,
    LabelImageSourceInvalid,

    // Structure: plates and wells
    WellPathNotFound,
    WellPathNotGroup,
    WellInvalid,
    FieldPathNotFound,
    FieldPathNotGroup,
    FieldImageInvalid,
    FieldAcquisitionUnknown,

    // Structure: bioformats2raw collections
    CollectionMetadataMissing,
    SeriesMetadataInvalid,
    SeriesPathNotNumeric,
    SeriesPathNotFound,
    SeriesPathNotGroup,
    SeriesInvalidImage,
    Bf2rawNoImages,
    Bf2rawPathNotGroup,
    Bf2rawInvalidImage,
    Bf2rawNumberingGap,

    // Structure: store access
    RootMetadataNotFound,
    NodeUnreachable,
    MetadataUnreadable,
    CycleDetected,
}

impl IssueCode {
    /// The snake_case identifier, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::UnionTagNotFound => "union_tag_not_found",
            IssueCode::UnsupportedVersion => "unsupported_version",
            IssueCode::InvalidEnvelope => "invalid_envelope",
            IssueCode::MissingField => "missing_field",
            IssueCode::InvalidType => "invalid_type",
            IssueCode::InvalidValue => "invalid_value",
            IssueCode::TooShort => "too_short",
            IssueCode::TooLong => "too_long",
            IssueCode::ListNotUnique => "list_not_unique",
            IssueCode::PatternMismatch => "pattern_mismatch",
            IssueCode::OutOfRange => "out_of_range",
            IssueCode::TooFewAxes => "too_few_axes",
            IssueCode::TooManyAxes => "too_many_axes",
            IssueCode::TooFewSpaceAxes => "too_few_space_axes",
            IssueCode::TooManySpaceAxes => "too_many_space_axes",
            IssueCode::TooManyTimeAxes => "too_many_time_axes",
            IssueCode::TooManyChannelAxes => "too_many_channel_axes",
            IssueCode::AxesOutOfOrder => "axes_out_of_order",
            IssueCode::DuplicateAxisName => "duplicate_axis_name",
            IssueCode::InvalidUnit => "invalid_unit",
            IssueCode::ScaleCount => "scale_count",
            IssueCode::TooManyTranslations => "too_many_translations",
            IssueCode::TranslationBeforeScale => "translation_before_scale",
            IssueCode::TransformDimensionMismatch => "transform_dimension_mismatch",
            IssueCode::DatasetDimensionsDiffer => "dataset_dimensions_differ",
            IssueCode::DatasetsNotOrdered => "datasets_not_ordered",
            IssueCode::WellRowIndexOutOfRange => "well_row_index_out_of_range",
            IssueCode::WellColumnIndexOutOfRange => "well_column_index_out_of_range",
            IssueCode::WellIndexUnresolved => "well_index_unresolved",
            IssueCode::InvalidNodeName => "invalid_node_name",
            IssueCode::RiskyNodeName => "risky_node_name",
            IssueCode::DatasetPathNotFound => "dataset_path_not_found",
            IssueCode::DatasetNotArray => "dataset_not_array",
            IssueCode::DatasetDimensionMismatch => "dataset_dimension_mismatch",
            IssueCode::DimensionNamesMismatch => "dimension_names_mismatch",
            IssueCode::LabelsNotGroup => "labels_not_group",
            IssueCode::LabelsMetadataInvalid => "labels_metadata_invalid",
            IssueCode::LabelPathNotFound => "label_path_not_found",
            IssueCode::LabelPathNotGroup => "label_path_not_group",
            IssueCode::LabelImageInvalid => "label_image_invalid",
            IssueCode::LabelMultiscaleCountMismatch => "label_multiscale_count_mismatch",
            IssueCode::LabelDatasetCountMismatch => "label_dataset_count_mismatch",
            IssueCode::LabelNonIntegerDtype => "label_non_integer_dtype",
            IssueCode::LabelImageSourceNotFound => "label_image_source_not_found",
            IssueCode::LabelImageSourceInvalid => "label_image_source_invalid",
            IssueCode::WellPathNotFound => "well_path_not_found",
            IssueCode::WellPathNotGroup => "well_path_not_group",
            IssueCode::WellInvalid => "well_invalid",
            IssueCode::FieldPathNotFound => "field_path_not_found",
            IssueCode::FieldPathNotGroup => "field_path_not_group",
            IssueCode::FieldImageInvalid => "field_image_invalid",
            IssueCode::FieldAcquisitionUnknown => "field_acquisition_unknown",
            IssueCode::CollectionMetadataMissing => "collection_metadata_missing",
            IssueCode::SeriesMetadataInvalid => "series_metadata_invalid",
            IssueCode::SeriesPathNotNumeric => "series_path_not_numeric",
            IssueCode::SeriesPathNotFound => "series_path_not_found",
            IssueCode::SeriesPathNotGroup => "series_path_not_group",
            IssueCode::SeriesInvalidImage => "series_invalid_image",
            IssueCode::Bf2rawNoImages => "bf2raw_no_images",
            IssueCode::Bf2rawPathNotGroup => "bf2raw_path_not_group",
            IssueCode::Bf2rawInvalidImage => "bf2raw_invalid_image",
            IssueCode::Bf2rawNumberingGap => "bf2raw_numbering_gap",
            IssueCode::RootMetadataNotFound => "root_metadata_not_found",
            IssueCode::NodeUnreachable => "node_unreachable",
            IssueCode::MetadataUnreadable => "metadata_unreadable",
            IssueCode::CycleDetected => "cycle_detected",
        }
    }

    /// Schema codes describe a document; everything from
    /// `DatasetPathNotFound` onwards describes the store.
    pub fn domain(&self) -> IssueDomain {
        match self {
            IssueCode::UnionTagNotFound
            | IssueCode::UnsupportedVersion
            | IssueCode::InvalidEnvelope
            | IssueCode::MissingField
            | IssueCode::InvalidType
            | IssueCode::InvalidValue
            | IssueCode::TooShort
            | IssueCode::TooLong
            | IssueCode::ListNotUnique
            | IssueCode::PatternMismatch
            | IssueCode::OutOfRange
            | IssueCode::TooFewAxes
            | IssueCode::TooManyAxes
            | IssueCode::TooFewSpaceAxes
            | IssueCode::TooManySpaceAxes
            | IssueCode::TooManyTimeAxes
            | IssueCode::TooManyChannelAxes
            | IssueCode::AxesOutOfOrder
            | IssueCode::DuplicateAxisName
            | IssueCode::InvalidUnit
            | IssueCode::ScaleCount
            | IssueCode::TooManyTranslations
            | IssueCode::TranslationBeforeScale
            | IssueCode::TransformDimensionMismatch
            | IssueCode::DatasetDimensionsDiffer
            | IssueCode::DatasetsNotOrdered
            | IssueCode::WellRowIndexOutOfRange
            | IssueCode::WellColumnIndexOutOfRange
            | IssueCode::WellIndexUnresolved
            | IssueCode::InvalidNodeName
            | IssueCode::RiskyNodeName => IssueDomain::Schema,
            _ => IssueDomain::Structure,
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_renders_dotted() {
        let loc = Location::root()
            .key("multiscales")
            .index(0)
            .key("datasets")
            .index(2)
            .key("path");
        assert_eq!(loc.to_string(), "multiscales.0.datasets.2.path");
        assert_eq!(Location::root().to_string(), "");
    }

    #[test]
    fn merge_prefixed_reroots_locations() {
        let mut child = ValidationReport::new();
        child.add(ValidationIssue::warning(
            IssueCode::RiskyNodeName,
            Location::root().key("well").key("images").index(0).key("path"),
            "risky",
        ));

        let mut report = ValidationReport::new();
        report.merge_prefixed(&Location::root().key("plate").key("wells").index(3), child);

        assert_eq!(
            report.issues[0].location.to_string(),
            "plate.wells.3.well.images.0.path"
        );
    }

    #[test]
    fn counts_and_strictness() {
        let mut report = ValidationReport::new();
        assert!(report.is_clean());
        report.add(ValidationIssue::warning(
            IssueCode::RiskyNodeName,
            Location::root(),
            "w",
        ));
        assert!(report.is_ok());
        assert!(!report.is_ok_strict());
        report.add(ValidationIssue::error(
            IssueCode::MissingField,
            Location::root().key("plate"),
            "e",
        ));
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert!(!report.is_ok());
    }

    #[test]
    fn serializes_codes_and_locations_as_strings() {
        let issue = ValidationIssue::error(
            IssueCode::DatasetPathNotFound,
            Location::root().key("multiscales").index(0),
            "missing",
        )
        .with("fs_path", "store/0");
        let value = serde_json::to_value(&issue).unwrap();

        assert_eq!(value["code"], "dataset_path_not_found");
        assert_eq!(value["domain"], "structure");
        assert_eq!(value["severity"], "error");
        assert_eq!(value["location"], "multiscales.0");
        assert_eq!(value["context"]["fs_path"], "store/0");
    }

    #[test]
    fn display_mentions_code_location_and_fs_path() {
        let issue = ValidationIssue::error(
            IssueCode::WellPathNotFound,
            Location::root().key("plate").key("wells").index(1).key("path"),
            "Well path 'A/2' not found",
        )
        .with("fs_path", "/data/plate.zarr/A/2");
        let text = issue.to_string();
        assert!(text.contains("[ERROR] well_path_not_found at plate.wells.1.path"));
        assert!(text.contains("(/data/plate.zarr/A/2)"));
    }

    #[test]
    fn codes_are_partitioned_by_domain() {
        assert_eq!(IssueCode::DuplicateAxisName.domain(), IssueDomain::Schema);
        assert_eq!(IssueCode::LabelNonIntegerDtype.domain(), IssueDomain::Structure);
        assert_eq!(IssueCode::CycleDetected.domain(), IssueDomain::Structure);
    }

    #[test]
    fn serialized_code_matches_as_str() {
        for code in [
            IssueCode::Bf2rawNumberingGap,
            IssueCode::WellRowIndexOutOfRange,
            IssueCode::UnionTagNotFound,
        ] {
            let value = serde_json::to_value(code).unwrap();
            assert_eq!(value, code.as_str());
        }
    }
}
