use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::{Collection, Image, LabelImage, LabelsGroup, Plate, Series, SpecVersion, Well};

/// The seven mutually exclusive node kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Image,
    LabelImage,
    LabelsGroup,
    Plate,
    Well,
    /// A bioformats2raw collection root.
    Collection,
    Series,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Image => "image",
            NodeKind::LabelImage => "label-image",
            NodeKind::LabelsGroup => "labels-group",
            NodeKind::Plate => "plate",
            NodeKind::Well => "well",
            NodeKind::Collection => "bioformats2raw",
            NodeKind::Series => "series",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A discriminated OME metadata node.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OmeNode {
    Image(Image),
    LabelImage(LabelImage),
    LabelsGroup(LabelsGroup),
    Plate(Plate),
    Well(Well),
    Collection(Collection),
    Series(Series),
}

impl OmeNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            OmeNode::Image(_) => NodeKind::Image,
            OmeNode::LabelImage(_) => NodeKind::LabelImage,
            OmeNode::LabelsGroup(_) => NodeKind::LabelsGroup,
            OmeNode::Plate(_) => NodeKind::Plate,
            OmeNode::Well(_) => NodeKind::Well,
            OmeNode::Collection(_) => NodeKind::Collection,
            OmeNode::Series(_) => NodeKind::Series,
        }
    }

    /// The image part of an image or label image.
    pub fn as_image(&self) -> Option<&Image> {
        match self {
            OmeNode::Image(image) => Some(image),
            OmeNode::LabelImage(label) => Some(&label.image),
            _ => None,
        }
    }
}

/// The shape a document was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Envelope {
    /// A whole zarr v3 `zarr.json` group document.
    ZarrJson,
    /// An attributes map holding an `ome` object.
    Attributes,
    /// OME metadata with a top-level `version`, no wrapper.
    Bare,
    /// Flat 0.4 `.zattrs` attributes.
    Legacy,
}

/// A validated node together with its version and original document shape.
#[derive(Clone, Debug, PartialEq)]
pub struct OmeDocument {
    pub version: SpecVersion,
    pub envelope: Envelope,
    /// Whether the OME object carried its own `version` field.
    pub version_declared: bool,
    pub node: OmeNode,
}

impl OmeDocument {
    /// Wraps a node in the canonical shape for its version: an attributes
    /// map for 0.5, flat attributes for 0.4.
    pub fn new(version: SpecVersion, node: OmeNode) -> Self {
        let (envelope, version_declared) = match version {
            SpecVersion::V05 => (Envelope::Attributes, true),
            SpecVersion::V04 => (Envelope::Legacy, false),
        };
        Self {
            version,
            envelope,
            version_declared,
            node,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    /// Rebuilds the document in the shape it was read from.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let mut ome = serde_json::to_value(&self.node)?;
        if self.version_declared && self.envelope != Envelope::Legacy {
            if let Value::Object(map) = &mut ome {
                map.insert("version".into(), self.version.as_str().into());
            }
        }

        Ok(match self.envelope {
            Envelope::Legacy | Envelope::Bare => ome,
            Envelope::Attributes => {
                let mut attributes = Map::new();
                attributes.insert("ome".into(), ome);
                Value::Object(attributes)
            }
            Envelope::ZarrJson => {
                let mut attributes = Map::new();
                attributes.insert("ome".into(), ome);
                let mut envelope = Map::new();
                envelope.insert("zarr_format".into(), 3.into());
                envelope.insert("node_type".into(), "group".into());
                envelope.insert("attributes".into(), Value::Object(attributes));
                Value::Object(envelope)
            }
        })
    }
}

impl Serialize for OmeDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LabelsGroup;
    use serde_json::json;

    #[test]
    fn envelopes_reproduce_their_shape() {
        let node = OmeNode::LabelsGroup(LabelsGroup::new(["cells"]));

        let legacy = OmeDocument::new(SpecVersion::V04, node.clone());
        assert_eq!(legacy.to_value().unwrap(), json!({"labels": ["cells"]}));

        let attrs = OmeDocument::new(SpecVersion::V05, node.clone());
        assert_eq!(
            attrs.to_value().unwrap(),
            json!({"ome": {"version": "0.5", "labels": ["cells"]}})
        );

        let zarr = OmeDocument {
            envelope: Envelope::ZarrJson,
            ..attrs
        };
        assert_eq!(
            zarr.to_value().unwrap(),
            json!({
                "zarr_format": 3,
                "node_type": "group",
                "attributes": {"ome": {"version": "0.5", "labels": ["cells"]}}
            })
        );
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(NodeKind::Collection.as_str(), "bioformats2raw");
        assert_eq!(NodeKind::LabelImage.to_string(), "label-image");
    }
}
