use serde::Serialize;
use serde_json::{Map, Number, Value};

use super::Image;

/// Display color for one label value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabelColor {
    /// Kept as the supplied JSON number so integers stay integers.
    #[serde(rename = "label-value")]
    pub label_value: Number,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgba: Option<[u8; 4]>,
}

/// Free-form properties attached to one label value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabelProperty {
    #[serde(rename = "label-value")]
    pub label_value: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference back to the image a label image was derived from.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LabelSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// The `image-label` block of a label image.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ImageLabel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<LabelColor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<LabelProperty>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<LabelSource>,
}

impl ImageLabel {
    /// The declared source image path, if any.
    pub fn source_image(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.image.as_deref())
    }
}

/// A segmentation image: an [`Image`] whose arrays hold integer labels.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabelImage {
    #[serde(flatten)]
    pub image: Image,
    #[serde(rename = "image-label")]
    pub image_label: ImageLabel,
}

impl LabelImage {
    pub fn new(image: Image, image_label: ImageLabel) -> Self {
        Self { image, image_label }
    }
}

/// The `labels` group listing label images under an image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabelsGroup {
    pub labels: Vec<String>,
}

impl LabelsGroup {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }
}
