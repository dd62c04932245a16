use std::fmt;

use serde::{Serialize, Serializer};

/// A supported OME-NGFF version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecVersion {
    /// 0.4: zarr v2, flat `.zattrs`, per-object version fields.
    V04,
    /// 0.5: zarr v3, `zarr.json` with attributes under `ome`.
    V05,
}

impl SpecVersion {
    pub const ALL: [SpecVersion; 2] = [SpecVersion::V04, SpecVersion::V05];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecVersion::V04 => "0.4",
            SpecVersion::V05 => "0.5",
        }
    }

    /// Parses a version string as it appears in metadata.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "0.4" => Some(SpecVersion::V04),
            "0.5" => Some(SpecVersion::V05),
            _ => None,
        }
    }

    /// The rule overrides that apply to documents of this version.
    pub fn rules(&self) -> &'static VersionRules {
        match self {
            SpecVersion::V04 => &VersionRules::V04,
            SpecVersion::V05 => &VersionRules::V05,
        }
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SpecVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The points where 0.4 and 0.5 disagree.
///
/// Every rule that is not listed here is shared, so both versions run
/// through the same checks with one of these tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VersionRules {
    pub version: SpecVersion,
    /// Arrays must declare `dimension_names` matching the axes.
    pub requires_dimension_names: bool,
    /// Plate wells must carry `rowIndex`/`columnIndex`.
    pub requires_well_indices: bool,
    /// Datasets must be ordered from highest to lowest resolution.
    pub checks_dataset_order: bool,
    /// Field-of-view paths may use `.`, `_` and `-` (with a warning).
    pub relaxed_field_paths: bool,
}

impl VersionRules {
    pub const V04: VersionRules = VersionRules {
        version: SpecVersion::V04,
        requires_dimension_names: false,
        requires_well_indices: false,
        checks_dataset_order: false,
        relaxed_field_paths: true,
    };

    pub const V05: VersionRules = VersionRules {
        version: SpecVersion::V05,
        requires_dimension_names: true,
        requires_well_indices: true,
        checks_dataset_order: true,
        relaxed_field_paths: false,
    };
}
