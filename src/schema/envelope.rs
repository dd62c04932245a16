//! Locating the OME metadata object inside the accepted document shapes.

use serde_json::Value;

use super::checker::json_type_name;
use crate::model::{Envelope, SpecVersion};
use crate::validation::{IssueCode, Location, ValidationIssue};

/// The OME metadata object of a document and what surrounded it.
#[derive(Debug)]
pub(crate) struct Unwrapped<'v> {
    pub envelope: Envelope,
    pub version: SpecVersion,
    pub version_declared: bool,
    pub ome: &'v Value,
}

/// Detects the document shape and version.
///
/// Non-object documents pass through as legacy so the discriminator can
/// reject them uniformly.
pub(crate) fn unwrap_envelope(raw: &Value) -> Result<Unwrapped<'_>, ValidationIssue> {
    let Some(map) = raw.as_object() else {
        return Ok(legacy(raw));
    };

    if map.contains_key("zarr_format") || map.contains_key("node_type") {
        let zarr_format = map.get("zarr_format");
        if zarr_format.and_then(Value::as_u64) != Some(3) {
            return Err(envelope_error(
                Location::root().key("zarr_format"),
                "OME-NGFF 0.5 metadata must live in a zarr v3 document",
                "3",
                zarr_format,
            ));
        }
        let node_type = map.get("node_type");
        if node_type.and_then(Value::as_str) != Some("group") {
            return Err(envelope_error(
                Location::root().key("node_type"),
                "OME metadata must be attached to a group",
                "group",
                node_type,
            ));
        }
        let Some(attributes) = map.get("attributes").and_then(Value::as_object) else {
            return Err(envelope_error(
                Location::root().key("attributes"),
                "zarr.json has no attributes object",
                "object",
                map.get("attributes"),
            ));
        };
        let Some(ome) = attributes.get("ome") else {
            return Err(envelope_error(
                Location::root().key("attributes").key("ome"),
                "zarr.json attributes carry no 'ome' metadata",
                "object",
                None,
            ));
        };
        return ome_object(Envelope::ZarrJson, ome);
    }

    if let Some(ome) = map.get("ome") {
        return ome_object(Envelope::Attributes, ome);
    }

    match map.get("version") {
        Some(Value::String(v)) if v == SpecVersion::V05.as_str() => Ok(Unwrapped {
            envelope: Envelope::Bare,
            version: SpecVersion::V05,
            version_declared: true,
            ome: raw,
        }),
        Some(other) => Err(version_error(other)),
        None => Ok(legacy(raw)),
    }
}

fn legacy(raw: &Value) -> Unwrapped<'_> {
    Unwrapped {
        envelope: Envelope::Legacy,
        version: SpecVersion::V04,
        version_declared: false,
        ome: raw,
    }
}

fn ome_object(envelope: Envelope, ome: &Value) -> Result<Unwrapped<'_>, ValidationIssue> {
    let Some(map) = ome.as_object() else {
        return Err(envelope_error(
            Location::root(),
            "'ome' metadata must be an object",
            "object",
            Some(ome),
        ));
    };
    let version_declared = match map.get("version") {
        None | Some(Value::Null) => false,
        Some(Value::String(v)) if v == SpecVersion::V05.as_str() => true,
        Some(other) => return Err(version_error(other)),
    };
    Ok(Unwrapped {
        envelope,
        version: SpecVersion::V05,
        version_declared,
        ome,
    })
}

fn version_error(found: &Value) -> ValidationIssue {
    let shown = match found {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    ValidationIssue::error(
        IssueCode::UnsupportedVersion,
        Location::root().key("version"),
        format!("Unsupported OME-NGFF version {}", shown),
    )
    .with("expected", vec!["0.4", "0.5"])
    .with("found", found.clone())
}

fn envelope_error(
    loc: Location,
    message: &str,
    expected: &str,
    found: Option<&Value>,
) -> ValidationIssue {
    let found = match found {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => json_type_name(other).to_string(),
        None => "nothing".to_string(),
    };
    ValidationIssue::error(IssueCode::InvalidEnvelope, loc, message)
        .with("expected", expected)
        .with("found", found)
}
