use serde::Serialize;

/// The layout version bioformats2raw writes; the only one accepted.
pub const BIOFORMATS2RAW_LAYOUT: u64 = 3;

/// The root of a bioformats2raw collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Collection {
    #[serde(rename = "bioformats2raw.layout")]
    pub layout: u64,
    /// Inline series paths; usually these live in the `OME` group instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<Vec<String>>,
}

impl Collection {
    pub fn new() -> Self {
        Self {
            layout: BIOFORMATS2RAW_LAYOUT,
            series: None,
        }
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

/// The series list stored in a collection's `OME` group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Series {
    pub series: Vec<String>,
}

impl Series {
    pub fn new<I, S>(series: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            series: series.into_iter().map(Into::into).collect(),
        }
    }
}
