//! Field-level reading helpers that record issues instead of failing.
//!
//! Every helper takes the location of the value it inspects and returns
//! `None` once it has recorded why the value is unusable, so readers can
//! keep going and report every defect in a document.

use std::collections::HashMap;

use regex::Regex;
use serde_json::{Map, Value};

use super::table::SchemaTable;
use crate::model::VersionRules;
use crate::validation::{IssueCode, Location, ValidationIssue, ValidationReport};

pub(crate) struct Checker<'t> {
    pub(crate) table: &'t SchemaTable,
    pub(crate) rules: &'static VersionRules,
    pub(crate) allow_risky_names: bool,
    report: ValidationReport,
}

impl<'t> Checker<'t> {
    pub(crate) fn new(
        table: &'t SchemaTable,
        rules: &'static VersionRules,
        allow_risky_names: bool,
    ) -> Self {
        Self {
            table,
            rules,
            allow_risky_names,
            report: ValidationReport::new(),
        }
    }

    pub(crate) fn into_report(self) -> ValidationReport {
        self.report
    }

    pub(crate) fn error_count(&self) -> usize {
        self.report.error_count()
    }

    pub(crate) fn push(&mut self, issue: ValidationIssue) {
        self.report.add(issue);
    }

    pub(crate) fn error(&mut self, code: IssueCode, loc: &Location, message: impl Into<String>) {
        self.push(ValidationIssue::error(code, loc.clone(), message));
    }

    pub(crate) fn object<'v>(
        &mut self,
        value: &'v Value,
        loc: &Location,
    ) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.push(type_error(loc, "object", other));
                None
            }
        }
    }

    /// Looks up a required field of `map`; null counts as missing.
    pub(crate) fn required<'v>(
        &mut self,
        map: &'v Map<String, Value>,
        key: &str,
        loc: &Location,
    ) -> Option<&'v Value> {
        match optional(map, key) {
            Some(value) => Some(value),
            None => {
                self.push(
                    ValidationIssue::error(
                        IssueCode::MissingField,
                        loc.key(key),
                        format!("Missing required field '{}'", key),
                    )
                    .with("field", key),
                );
                None
            }
        }
    }

    pub(crate) fn string(&mut self, value: &Value, loc: &Location) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            other => {
                self.push(type_error(loc, "string", other));
                None
            }
        }
    }

    /// Accepts JSON integers and floats without a fractional part.
    pub(crate) fn integer(&mut self, value: &Value, loc: &Location) -> Option<i64> {
        let parsed = match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            _ => None,
        };
        if parsed.is_none() {
            self.push(type_error(loc, "integer", value));
        }
        parsed
    }

    pub(crate) fn non_negative(&mut self, value: &Value, loc: &Location) -> Option<u64> {
        let n = self.integer(value, loc)?;
        match u64::try_from(n) {
            Ok(n) => Some(n),
            Err(_) => {
                self.push(range_error(loc, n, "a value >= 0"));
                None
            }
        }
    }

    pub(crate) fn positive(&mut self, value: &Value, loc: &Location) -> Option<u64> {
        let n = self.integer(value, loc)?;
        if n > 0 {
            Some(n as u64)
        } else {
            self.push(range_error(loc, n, "a value > 0"));
            None
        }
    }

    pub(crate) fn number(&mut self, value: &Value, loc: &Location) -> Option<f64> {
        match value.as_f64() {
            Some(f) if value.is_number() => Some(f),
            _ => {
                self.push(type_error(loc, "number", value));
                None
            }
        }
    }

    /// Reads a list with at least `min_len` entries, reading each entry with
    /// `item`. Entries that fail are dropped; their issues are recorded.
    pub(crate) fn list<T>(
        &mut self,
        value: &Value,
        loc: &Location,
        min_len: usize,
        mut item: impl FnMut(&mut Self, &Value, &Location) -> Option<T>,
    ) -> Option<Vec<T>> {
        let Value::Array(entries) = value else {
            self.push(type_error(loc, "list", value));
            return None;
        };
        if entries.len() < min_len {
            self.push(
                ValidationIssue::error(
                    IssueCode::TooShort,
                    loc.clone(),
                    format!(
                        "List should have at least {} item(s), found {}",
                        min_len,
                        entries.len()
                    ),
                )
                .with("expected", min_len)
                .with("found", entries.len()),
            );
        }
        let items = entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| item(self, entry, &loc.index(i)))
            .collect();
        Some(items)
    }

    /// Records a `list_not_unique` issue for every entry equal to an earlier one.
    pub(crate) fn unique(&mut self, value: &Value, loc: &Location) {
        let Value::Array(entries) = value else {
            return;
        };
        let mut seen: HashMap<String, usize> = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            let key = entry.to_string();
            if let Some(first) = seen.get(&key) {
                self.push(
                    ValidationIssue::error(
                        IssueCode::ListNotUnique,
                        loc.index(i),
                        format!("Duplicate entry (same as index {})", first),
                    )
                    .with("first_index", *first),
                );
            } else {
                seen.insert(key, i);
            }
        }
    }

    pub(crate) fn matches(&mut self, s: &str, pattern: &Regex, loc: &Location) -> bool {
        if pattern.is_match(s) {
            return true;
        }
        self.push(
            ValidationIssue::error(
                IssueCode::PatternMismatch,
                loc.clone(),
                format!("'{}' does not match pattern {}", s, pattern.as_str()),
            )
            .with("pattern", pattern.as_str())
            .with("found", s),
        );
        false
    }

    /// Checks a per-object `version` field against the document version.
    pub(crate) fn version_field(
        &mut self,
        map: &Map<String, Value>,
        loc: &Location,
    ) -> Option<String> {
        let value = optional(map, "version")?;
        let loc = loc.key("version");
        let found = self.string(value, &loc)?;
        let expected = self.rules.version.as_str();
        if found != expected {
            self.push(
                ValidationIssue::error(
                    IssueCode::UnsupportedVersion,
                    loc,
                    format!("Version '{}' does not match document version {}", found, expected),
                )
                .with("expected", expected)
                .with("found", found.as_str()),
            );
            return None;
        }
        Some(found)
    }

    /// Checks a node path: every `/`-separated segment must be a usable
    /// node name; unusual characters get a warning.
    pub(crate) fn node_path(&mut self, path: &str, loc: &Location) -> bool {
        let table = self.table;
        let patterns = table.patterns();
        if path
            .split('/')
            .any(|segment| patterns.invalid_segment.is_match(segment))
        {
            self.push(
                ValidationIssue::error(
                    IssueCode::InvalidNodeName,
                    loc.clone(),
                    format!(
                        "Invalid node name '{}': segments must be non-empty, not only dots, and not start with '__'",
                        path
                    ),
                )
                .with("found", path),
            );
            return false;
        }
        let risky = path
            .split('/')
            .any(|segment| patterns.risky_char.is_match(segment));
        if risky && !self.allow_risky_names {
            self.push(
                ValidationIssue::warning(
                    IssueCode::RiskyNodeName,
                    loc.clone(),
                    format!(
                        "Node name '{}' contains characters outside [A-Za-z0-9._-]",
                        path
                    ),
                )
                .with("found", path),
            );
        }
        true
    }
}

/// Looks up an optional field; null counts as absent.
pub(crate) fn optional<'v>(map: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    map.get(key).filter(|v| !v.is_null())
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn type_error(loc: &Location, expected: &str, found: &Value) -> ValidationIssue {
    ValidationIssue::error(
        IssueCode::InvalidType,
        loc.clone(),
        format!("Expected {}, found {}", expected, json_type_name(found)),
    )
    .with("expected", expected)
    .with("found", json_type_name(found))
}

fn range_error(loc: &Location, found: i64, expected: &str) -> ValidationIssue {
    ValidationIssue::error(
        IssueCode::OutOfRange,
        loc.clone(),
        format!("Value {} is out of range, expected {}", found, expected),
    )
    .with("expected", expected)
    .with("found", found)
}
