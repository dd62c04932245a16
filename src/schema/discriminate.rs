//! Node-kind discrimination.
//!
//! A pure function of the document's keys: the first marker present in
//! precedence order picks the kind, and any other marker that is not an
//! allowed companion of that kind makes the document ambiguous.

use serde_json::Value;

use super::table::SchemaTable;
use crate::model::NodeKind;
use crate::validation::{IssueCode, Location, ValidationIssue};

/// Determines the node kind of an OME metadata object.
///
/// # Errors
/// Returns a `union_tag_not_found` issue when the value is not an object,
/// carries no marker, or carries conflicting markers. The issue context
/// lists the markers found.
pub fn discriminate(document: &Value, table: &SchemaTable) -> Result<NodeKind, ValidationIssue> {
    let Some(map) = document.as_object() else {
        return Err(ValidationIssue::error(
            IssueCode::UnionTagNotFound,
            Location::root(),
            "Expected a JSON object to determine the node kind",
        )
        .with("markers", Vec::<Value>::new()));
    };

    let present: Vec<(NodeKind, &'static str)> = table
        .kinds()
        .iter()
        .filter_map(|entry| entry.present_key(map).map(|_| (entry.kind, entry.marker)))
        .collect();

    let Some(&(kind, marker)) = present.first() else {
        let expected: Vec<&str> = table.kinds().iter().map(|e| e.marker).collect();
        return Err(ValidationIssue::error(
            IssueCode::UnionTagNotFound,
            Location::root(),
            "No node kind marker found",
        )
        .with("markers", Vec::<Value>::new())
        .with("expected", expected));
    };

    let entry = table.entry(kind);
    let conflicting: Vec<&str> = present[1..]
        .iter()
        .map(|(_, m)| *m)
        .filter(|m| !entry.allows(m))
        .collect();

    if !conflicting.is_empty() {
        let found: Vec<&str> = present.iter().map(|(_, m)| *m).collect();
        return Err(ValidationIssue::error(
            IssueCode::UnionTagNotFound,
            Location::root(),
            format!(
                "Ambiguous node kind: '{}' cannot be combined with {}",
                marker,
                conflicting
                    .iter()
                    .map(|m| format!("'{}'", m))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )
        .with("markers", found));
    }

    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kind_of(value: Value) -> Result<NodeKind, ValidationIssue> {
        discriminate(&value, &SchemaTable::new())
    }

    #[test]
    fn each_marker_selects_its_kind() {
        assert_eq!(kind_of(json!({"multiscales": []})).unwrap(), NodeKind::Image);
        assert_eq!(
            kind_of(json!({"image-label": {}, "multiscales": []})).unwrap(),
            NodeKind::LabelImage
        );
        assert_eq!(kind_of(json!({"plate": {}})).unwrap(), NodeKind::Plate);
        assert_eq!(
            kind_of(json!({"bioformats2raw.layout": 3})).unwrap(),
            NodeKind::Collection
        );
        assert_eq!(kind_of(json!({"well": {}})).unwrap(), NodeKind::Well);
        assert_eq!(kind_of(json!({"labels": []})).unwrap(), NodeKind::LabelsGroup);
        assert_eq!(kind_of(json!({"series": []})).unwrap(), NodeKind::Series);
    }

    #[test]
    fn companions_are_allowed() {
        assert_eq!(
            kind_of(json!({"plate": {}, "bioformats2raw.layout": 3})).unwrap(),
            NodeKind::Plate
        );
        assert_eq!(
            kind_of(json!({"bioformats2raw.layout": 3, "series": ["0"]})).unwrap(),
            NodeKind::Collection
        );
    }

    #[test]
    fn conflicting_markers_are_ambiguous() {
        let issue = kind_of(json!({"multiscales": [], "plate": {}})).unwrap_err();
        assert_eq!(issue.code, IssueCode::UnionTagNotFound);
        assert_eq!(issue.context["markers"], json!(["multiscales", "plate"]));

        let issue = kind_of(json!({"well": {}, "labels": []})).unwrap_err();
        assert_eq!(issue.code, IssueCode::UnionTagNotFound);
    }

    #[test]
    fn empty_and_non_object_documents_fail() {
        assert_eq!(
            kind_of(json!({})).unwrap_err().code,
            IssueCode::UnionTagNotFound
        );
        assert_eq!(
            kind_of(json!([1, 2])).unwrap_err().code,
            IssueCode::UnionTagNotFound
        );
        assert_eq!(
            kind_of(json!({"omero": {}})).unwrap_err().code,
            IssueCode::UnionTagNotFound
        );
    }
}
