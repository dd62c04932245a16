use serde::Serialize;

/// One field of view (an image group) inside a well.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldOfView {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquisition: Option<i64>,
}

impl FieldOfView {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            acquisition: None,
        }
    }

    pub fn with_acquisition(mut self, acquisition: i64) -> Self {
        self.acquisition = Some(acquisition);
        self
    }
}

/// The `well` block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WellDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub images: Vec<FieldOfView>,
}

/// A plate well.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Well {
    pub well: WellDef,
}

impl Well {
    pub fn new(images: Vec<FieldOfView>) -> Self {
        Self {
            well: WellDef {
                version: None,
                images,
            },
        }
    }
}
