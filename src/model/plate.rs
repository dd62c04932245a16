use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A named plate row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Row {
    pub name: String,
}

/// A named plate column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
}

/// A well reference inside a plate.
///
/// Indices are always resolved. In 0.4 either may be absent from the
/// document and is then derived from the path; a derived index is not
/// serialized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlateWell {
    /// `<row>/<column>`, relative to the plate group.
    pub path: String,
    pub row_index: usize,
    pub column_index: usize,
    pub(crate) row_declared: bool,
    pub(crate) column_declared: bool,
}

impl PlateWell {
    pub fn new(path: impl Into<String>, row_index: usize, column_index: usize) -> Self {
        Self {
            path: path.into(),
            row_index,
            column_index,
            row_declared: true,
            column_declared: true,
        }
    }

    /// True when either index was derived from the path rather than declared.
    pub fn has_derived_indices(&self) -> bool {
        !(self.row_declared && self.column_declared)
    }
}

impl Serialize for PlateWell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("path", &self.path)?;
        if self.row_declared {
            map.serialize_entry("rowIndex", &self.row_index)?;
        }
        if self.column_declared {
            map.serialize_entry("columnIndex", &self.column_index)?;
        }
        map.end()
    }
}

/// One acquisition run over a plate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Acquisition {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximumfieldcount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starttime: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endtime: Option<u64>,
}

impl Acquisition {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            name: None,
            description: None,
            maximumfieldcount: None,
            starttime: None,
            endtime: None,
        }
    }
}

/// The `plate` block.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlateDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Per-object version string (0.4 documents only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub wells: Vec<PlateWell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquisitions: Option<Vec<Acquisition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_count: Option<u64>,
}

impl PlateDef {
    pub fn new(rows: Vec<Row>, columns: Vec<Column>, wells: Vec<PlateWell>) -> Self {
        Self {
            name: None,
            version: None,
            columns,
            rows,
            wells,
            acquisitions: None,
            field_count: None,
        }
    }

    pub fn with_acquisitions(mut self, acquisitions: Vec<Acquisition>) -> Self {
        self.acquisitions = Some(acquisitions);
        self
    }

    /// Returns true if the plate declares an acquisition with this id.
    pub fn declares_acquisition(&self, id: i64) -> bool {
        self.acquisitions
            .as_ref()
            .is_some_and(|acqs| acqs.iter().any(|a| i64::try_from(a.id) == Ok(id)))
    }
}

/// A multi-well plate.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Plate {
    pub plate: PlateDef,
    /// Set when the plate was written by bioformats2raw.
    #[serde(
        rename = "bioformats2raw.layout",
        skip_serializing_if = "Option::is_none"
    )]
    pub bioformats2raw_layout: Option<u64>,
}

impl Plate {
    pub fn new(plate: PlateDef) -> Self {
        Self {
            plate,
            bioformats2raw_layout: None,
        }
    }
}
