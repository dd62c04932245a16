use regex::Regex;
use serde_json::{Map, Value};

use crate::model::{NodeKind, SpecVersion, VersionRules};

/// A discriminator entry: the key that marks a node kind and the other
/// markers allowed alongside it.
#[derive(Clone, Copy, Debug)]
pub struct KindEntry {
    pub kind: NodeKind,
    pub marker: &'static str,
    /// Alternative spellings of `marker` found in the wild.
    pub aliases: &'static [&'static str],
    pub companions: &'static [&'static str],
}

impl KindEntry {
    /// The key under which this kind's marker is present, if any.
    pub fn present_key(&self, map: &Map<String, Value>) -> Option<&'static str> {
        std::iter::once(self.marker)
            .chain(self.aliases.iter().copied())
            .find(|key| map.contains_key(*key))
    }

    pub fn allows(&self, marker: &str) -> bool {
        self.companions.contains(&marker)
    }
}

/// Markers in precedence order; the first present one wins.
const KINDS: [KindEntry; 7] = [
    KindEntry {
        kind: NodeKind::LabelImage,
        marker: "image-label",
        aliases: &[],
        companions: &["multiscales"],
    },
    KindEntry {
        kind: NodeKind::Image,
        marker: "multiscales",
        aliases: &[],
        companions: &[],
    },
    KindEntry {
        kind: NodeKind::Plate,
        marker: "plate",
        aliases: &[],
        companions: &["bioformats2raw.layout"],
    },
    KindEntry {
        kind: NodeKind::Collection,
        marker: "bioformats2raw.layout",
        aliases: &["bioformats2raw_layout"],
        companions: &["series"],
    },
    KindEntry {
        kind: NodeKind::Well,
        marker: "well",
        aliases: &[],
        companions: &[],
    },
    KindEntry {
        kind: NodeKind::LabelsGroup,
        marker: "labels",
        aliases: &[],
        companions: &[],
    },
    KindEntry {
        kind: NodeKind::Series,
        marker: "series",
        aliases: &[],
        companions: &[],
    },
];

/// Name patterns shared by every version.
#[derive(Debug)]
pub struct NamePatterns {
    /// Plate row and column names, strict field-of-view paths.
    pub alphanumeric: Regex,
    /// `<row>/<column>` well paths.
    pub well_path: Regex,
    /// 0.4 field-of-view paths.
    pub relaxed_field_path: Regex,
    /// A path segment that can never name a node.
    pub invalid_segment: Regex,
    /// A character that is legal but breaks on some filesystems.
    pub risky_char: Regex,
}

impl NamePatterns {
    fn new() -> Self {
        Self {
            alphanumeric: compile(r"^[A-Za-z0-9]+$"),
            well_path: compile(r"^[A-Za-z0-9]+/[A-Za-z0-9]+$"),
            relaxed_field_path: compile(r"^[A-Za-z0-9._-]+$"),
            invalid_segment: compile(r"^(?:|\.+|__.*)$"),
            risky_char: compile(r"[^A-Za-z0-9._-]"),
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in name pattern must compile")
}

/// Everything the metadata validator needs that does not change between
/// documents: version rule tables, the discriminator table and compiled
/// name patterns. Build it once and pass it by reference.
#[derive(Debug)]
pub struct SchemaTable {
    patterns: NamePatterns,
}

impl SchemaTable {
    pub fn new() -> Self {
        Self {
            patterns: NamePatterns::new(),
        }
    }

    pub fn rules(&self, version: SpecVersion) -> &'static VersionRules {
        version.rules()
    }

    /// Discriminator entries in precedence order.
    pub fn kinds(&self) -> &[KindEntry] {
        &KINDS
    }

    pub fn entry(&self, kind: NodeKind) -> &KindEntry {
        let precedence = match kind {
            NodeKind::LabelImage => 0,
            NodeKind::Image => 1,
            NodeKind::Plate => 2,
            NodeKind::Collection => 3,
            NodeKind::Well => 4,
            NodeKind::LabelsGroup => 5,
            NodeKind::Series => 6,
        };
        &KINDS[precedence]
    }

    pub fn patterns(&self) -> &NamePatterns {
        &self.patterns
    }
}

impl Default for SchemaTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_one_entry() {
        let table = SchemaTable::new();
        for kind in [
            NodeKind::Image,
            NodeKind::LabelImage,
            NodeKind::LabelsGroup,
            NodeKind::Plate,
            NodeKind::Well,
            NodeKind::Collection,
            NodeKind::Series,
        ] {
            assert_eq!(table.entry(kind).kind, kind);
            assert_eq!(table.kinds().iter().filter(|e| e.kind == kind).count(), 1);
        }
    }

    #[test]
    fn invalid_segment_pattern() {
        let table = SchemaTable::new();
        let re = &table.patterns().invalid_segment;
        for bad in ["", ".", "..", "...", "__private"] {
            assert!(re.is_match(bad), "{bad:?} should be invalid");
        }
        for ok in ["0", "a.b", "_x", "labels"] {
            assert!(!re.is_match(ok), "{ok:?} should be valid");
        }
    }

    #[test]
    fn alias_marker_is_recognised() {
        let table = SchemaTable::new();
        let entry = table.entry(NodeKind::Collection);
        let map: Map<String, Value> =
            serde_json::from_str(r#"{"bioformats2raw_layout": 3}"#).unwrap();
        assert_eq!(entry.present_key(&map), Some("bioformats2raw_layout"));
    }
}
