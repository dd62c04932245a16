//! Readers for high-content screening metadata: plates and wells.

use serde_json::{Map, Value};

use super::checker::{optional, Checker};
use crate::model::{
    Acquisition, Column, FieldOfView, Plate, PlateDef, PlateWell, Row, Well, WellDef,
    BIOFORMATS2RAW_LAYOUT,
};
use crate::validation::{IssueCode, Location, ValidationIssue};

pub(crate) fn read_plate(
    c: &mut Checker<'_>,
    map: &Map<String, Value>,
    loc: &Location,
) -> Option<Plate> {
    let plate = c
        .required(map, "plate", loc)
        .and_then(|v| read_plate_def(c, v, &loc.key("plate")));
    let bioformats2raw_layout = match optional(map, "bioformats2raw.layout") {
        Some(v) => Some(read_layout(c, v, &loc.key("bioformats2raw.layout"))?),
        None => None,
    };
    Some(Plate {
        plate: plate?,
        bioformats2raw_layout,
    })
}

/// Reads a bioformats2raw layout marker, which must be 3.
pub(crate) fn read_layout(c: &mut Checker<'_>, value: &Value, loc: &Location) -> Option<u64> {
    let layout = c.integer(value, loc)?;
    if layout != BIOFORMATS2RAW_LAYOUT as i64 {
        c.push(
            ValidationIssue::error(
                IssueCode::InvalidValue,
                loc.clone(),
                format!(
                    "bioformats2raw layout must be {}, found {}",
                    BIOFORMATS2RAW_LAYOUT, layout
                ),
            )
            .with("expected", BIOFORMATS2RAW_LAYOUT)
            .with("found", layout),
        );
        return None;
    }
    Some(BIOFORMATS2RAW_LAYOUT)
}

fn read_plate_def(c: &mut Checker<'_>, value: &Value, loc: &Location) -> Option<PlateDef> {
    let map = c.object(value, loc)?;
    let name = optional(map, "name").and_then(|v| c.string(v, &loc.key("name")));
    let version = c.version_field(map, loc);

    let columns = read_named_list(c, map, "columns", loc)
        .map(|names| names.into_iter().map(|name| Column { name }).collect::<Vec<_>>());
    let rows = read_named_list(c, map, "rows", loc)
        .map(|names| names.into_iter().map(|name| Row { name }).collect::<Vec<_>>());

    let wells_loc = loc.key("wells");
    let raw_wells = c.required(map, "wells", loc);
    let wells = raw_wells.and_then(|raw| c.list(raw, &wells_loc, 1, read_raw_well));
    if let Some(raw) = raw_wells {
        c.unique(raw, &wells_loc);
    }

    let acquisitions_loc = loc.key("acquisitions");
    let acquisitions = match optional(map, "acquisitions") {
        Some(raw) => Some(c.list(raw, &acquisitions_loc, 0, read_acquisition)?),
        None => None,
    };
    let field_count = match optional(map, "field_count") {
        Some(v) => Some(c.positive(v, &loc.key("field_count"))?),
        None => None,
    };

    let (rows, columns, raw_wells) = (rows?, columns?, wells?);
    let wells = raw_wells
        .into_iter()
        .filter_map(|(i, well)| resolve_well(c, well, &rows, &columns, &wells_loc.index(i)))
        .collect();

    Some(PlateDef {
        name,
        version,
        columns,
        rows,
        wells,
        acquisitions,
        field_count,
    })
}

fn read_named_list(
    c: &mut Checker<'_>,
    map: &Map<String, Value>,
    key: &str,
    loc: &Location,
) -> Option<Vec<String>> {
    let list_loc = loc.key(key);
    let raw = c.required(map, key, loc)?;
    let names = c.list(raw, &list_loc, 1, |c, v, l| {
        let entry = c.object(v, l)?;
        let name_loc = l.key("name");
        let name = c
            .required(entry, "name", l)
            .and_then(|n| c.string(n, &name_loc))?;
        let table = c.table;
        c.matches(&name, &table.patterns().alphanumeric, &name_loc);
        Some(name)
    })?;
    c.unique(raw, &list_loc);
    Some(names)
}

/// A well as written, before its indices are resolved against the plate.
struct RawWell {
    path: String,
    row_index: Option<usize>,
    column_index: Option<usize>,
}

fn read_raw_well(c: &mut Checker<'_>, value: &Value, loc: &Location) -> Option<(usize, RawWell)> {
    let map = c.object(value, loc)?;
    let path_loc = loc.key("path");
    let path = c
        .required(map, "path", loc)
        .and_then(|v| c.string(v, &path_loc));
    if let Some(path) = &path {
        let table = c.table;
        c.matches(path, &table.patterns().well_path, &path_loc);
    }

    let read_index = |c: &mut Checker<'_>, key: &str| -> Option<Option<usize>> {
        let raw = if c.rules.requires_well_indices {
            Some(c.required(map, key, loc)?)
        } else {
            optional(map, key)
        };
        match raw {
            Some(v) => Some(Some(c.non_negative(v, &loc.key(key))? as usize)),
            None => Some(None),
        }
    };
    let row_index = read_index(c, "rowIndex");
    let column_index = read_index(c, "columnIndex");

    Some((
        loc.last_index().unwrap_or_default(),
        RawWell {
            path: path?,
            row_index: row_index?,
            column_index: column_index?,
        },
    ))
}

/// Resolves a well's indices, deriving missing ones from its path, and
/// checks them against the plate's rows and columns.
fn resolve_well(
    c: &mut Checker<'_>,
    well: RawWell,
    rows: &[Row],
    columns: &[Column],
    loc: &Location,
) -> Option<PlateWell> {
    let mut parts = well.path.splitn(2, '/');
    let row_name = parts.next().unwrap_or_default();
    let column_name = parts.next().unwrap_or_default();

    let row_declared = well.row_index.is_some();
    let column_declared = well.column_index.is_some();
    let row_index = match well.row_index {
        Some(i) => Some(i),
        None => rows.iter().position(|r| r.name == row_name),
    };
    let column_index = match well.column_index {
        Some(i) => Some(i),
        None => columns.iter().position(|col| col.name == column_name),
    };

    let (Some(row_index), Some(column_index)) = (row_index, column_index) else {
        c.push(
            ValidationIssue::error(
                IssueCode::WellIndexUnresolved,
                loc.key("path"),
                format!(
                    "Well '{}' has no rowIndex/columnIndex and its path does not name a declared row and column",
                    well.path
                ),
            )
            .with("found", well.path.as_str()),
        );
        return None;
    };

    let mut in_bounds = true;
    if row_index >= rows.len() {
        c.push(row_out_of_range(loc, row_index, rows.len()));
        in_bounds = false;
    }
    if column_index >= columns.len() {
        c.push(column_out_of_range(loc, column_index, columns.len()));
        in_bounds = false;
    }

    in_bounds.then(|| PlateWell {
        path: well.path,
        row_index,
        column_index,
        row_declared,
        column_declared,
    })
}

pub(crate) fn row_out_of_range(loc: &Location, index: usize, rows: usize) -> ValidationIssue {
    ValidationIssue::error(
        IssueCode::WellRowIndexOutOfRange,
        loc.key("rowIndex"),
        format!("rowIndex {} is out of range for {} row(s)", index, rows),
    )
    .with("expected", format!("< {}", rows))
    .with("found", index)
}

pub(crate) fn column_out_of_range(loc: &Location, index: usize, columns: usize) -> ValidationIssue {
    ValidationIssue::error(
        IssueCode::WellColumnIndexOutOfRange,
        loc.key("columnIndex"),
        format!(
            "columnIndex {} is out of range for {} column(s)",
            index, columns
        ),
    )
    .with("expected", format!("< {}", columns))
    .with("found", index)
}

fn read_acquisition(c: &mut Checker<'_>, value: &Value, loc: &Location) -> Option<Acquisition> {
    let map = c.object(value, loc)?;
    let id = c
        .required(map, "id", loc)
        .and_then(|v| c.non_negative(v, &loc.key("id")));
    let name = optional(map, "name").and_then(|v| c.string(v, &loc.key("name")));
    let description =
        optional(map, "description").and_then(|v| c.string(v, &loc.key("description")));
    let maximumfieldcount = optional(map, "maximumfieldcount")
        .and_then(|v| c.positive(v, &loc.key("maximumfieldcount")));
    let starttime = optional(map, "starttime").and_then(|v| c.non_negative(v, &loc.key("starttime")));
    let endtime = optional(map, "endtime").and_then(|v| c.non_negative(v, &loc.key("endtime")));

    Some(Acquisition {
        id: id?,
        name,
        description,
        maximumfieldcount,
        starttime,
        endtime,
    })
}

pub(crate) fn read_well(
    c: &mut Checker<'_>,
    map: &Map<String, Value>,
    loc: &Location,
) -> Option<Well> {
    let well_loc = loc.key("well");
    let def = c.required(map, "well", loc)?;
    let def = c.object(def, &well_loc)?;
    let version = c.version_field(def, &well_loc);

    let images_loc = well_loc.key("images");
    let raw = c.required(def, "images", &well_loc)?;
    let images = c.list(raw, &images_loc, 1, read_field)?;
    c.unique(raw, &images_loc);

    Some(Well {
        well: WellDef { version, images },
    })
}

fn read_field(c: &mut Checker<'_>, value: &Value, loc: &Location) -> Option<FieldOfView> {
    let map = c.object(value, loc)?;
    let path_loc = loc.key("path");
    let path = c
        .required(map, "path", loc)
        .and_then(|v| c.string(v, &path_loc));
    let acquisition = optional(map, "acquisition").and_then(|v| c.integer(v, &loc.key("acquisition")));

    let path = path?;
    let table = c.table;
    let patterns = table.patterns();
    if c.rules.relaxed_field_paths {
        if !c.matches(&path, &patterns.relaxed_field_path, &path_loc) {
            return None;
        }
        if !patterns.alphanumeric.is_match(&path) && !c.allow_risky_names {
            c.push(
                ValidationIssue::warning(
                    IssueCode::RiskyNodeName,
                    path_loc,
                    format!(
                        "Field path '{}' uses characters outside [A-Za-z0-9]",
                        path
                    ),
                )
                .with("found", path.as_str()),
            );
        }
    } else if !c.matches(&path, &patterns.alphanumeric, &path_loc) {
        return None;
    }

    Some(FieldOfView { path, acquisition })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VersionRules;
    use crate::schema::SchemaTable;
    use crate::validation::ValidationReport;
    use serde_json::json;

    fn plate(rules: &'static VersionRules, doc: Value) -> (Option<Plate>, ValidationReport) {
        let table = SchemaTable::new();
        let mut c = Checker::new(&table, rules, false);
        let plate = read_plate(&mut c, doc.as_object().unwrap(), &Location::root());
        (plate, c.into_report())
    }

    fn well(rules: &'static VersionRules, doc: Value) -> (Option<Well>, ValidationReport) {
        let table = SchemaTable::new();
        let mut c = Checker::new(&table, rules, false);
        let well = read_well(&mut c, doc.as_object().unwrap(), &Location::root());
        (well, c.into_report())
    }

    #[test]
    fn reads_plate_with_acquisitions() {
        let (plate, report) = plate(
            &VersionRules::V05,
            json!({"plate": {
                "columns": [{"name": "1"}, {"name": "2"}],
                "rows": [{"name": "A"}],
                "wells": [
                    {"path": "A/1", "rowIndex": 0, "columnIndex": 0},
                    {"path": "A/2", "rowIndex": 0, "columnIndex": 1}
                ],
                "acquisitions": [{"id": 0, "maximumfieldcount": 2, "starttime": 10}],
                "field_count": 2
            }}),
        );
        assert!(report.is_clean(), "{}", report);
        let plate = plate.unwrap();
        assert_eq!(plate.plate.wells[1].column_index, 1);
        assert!(plate.plate.declares_acquisition(0));
    }

    #[test]
    fn out_of_range_column_index() {
        let (_, report) = plate(
            &VersionRules::V05,
            json!({"plate": {
                "columns": [],
                "rows": [{"name": "A"}],
                "wells": [{"path": "A/1", "rowIndex": 0, "columnIndex": 0}]
            }}),
        );
        assert!(report.has(IssueCode::TooShort));
        assert_eq!(
            report
                .with_code(IssueCode::WellColumnIndexOutOfRange)
                .next()
                .unwrap()
                .location
                .to_string(),
            "plate.wells.0.columnIndex"
        );
    }

    #[test]
    fn indices_required_in_05_only() {
        let doc = json!({"plate": {
            "columns": [{"name": "1"}],
            "rows": [{"name": "A"}],
            "wells": [{"path": "A/1"}]
        }});
        let (_, report) = plate(&VersionRules::V05, doc.clone());
        assert_eq!(
            report.with_code(IssueCode::MissingField).count(),
            2,
            "{}",
            report
        );

        let (plate, report) = plate(&VersionRules::V04, doc);
        assert!(report.is_clean(), "{}", report);
        let well = &plate.unwrap().plate.wells[0];
        assert_eq!((well.row_index, well.column_index), (0, 0));
        assert!(well.has_derived_indices());
    }

    #[test]
    fn underivable_indices_are_reported() {
        let (_, report) = plate(
            &VersionRules::V04,
            json!({"plate": {
                "columns": [{"name": "1"}],
                "rows": [{"name": "A"}],
                "wells": [{"path": "B/1"}]
            }}),
        );
        assert!(report.has(IssueCode::WellIndexUnresolved));
    }

    #[test]
    fn name_patterns() {
        let (_, report) = plate(
            &VersionRules::V05,
            json!({"plate": {
                "columns": [{"name": "1"}],
                "rows": [{"name": "A-"}],
                "wells": [{"path": "A1", "rowIndex": 0, "columnIndex": 0}]
            }}),
        );
        let locations: Vec<String> = report
            .with_code(IssueCode::PatternMismatch)
            .map(|i| i.location.to_string())
            .collect();
        assert_eq!(locations, vec!["plate.rows.0.name", "plate.wells.0.path"]);
    }

    #[test]
    fn wrong_layout_is_rejected() {
        let (_, report) = plate(
            &VersionRules::V05,
            json!({
                "bioformats2raw.layout": 2,
                "plate": {
                    "columns": [{"name": "1"}],
                    "rows": [{"name": "A"}],
                    "wells": [{"path": "A/1", "rowIndex": 0, "columnIndex": 0}]
                }
            }),
        );
        assert!(report.has(IssueCode::InvalidValue));
    }

    #[test]
    fn field_paths_are_relaxed_in_04() {
        let doc = json!({"well": {"images": [{"path": "field_0"}, {"path": "1", "acquisition": 0}]}});
        let (well04, report) = well(&VersionRules::V04, doc.clone());
        assert_eq!(report.error_count(), 0);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(well04.unwrap().well.images[1].acquisition, Some(0));

        let (_, report) = well(&VersionRules::V05, doc);
        assert!(report.has(IssueCode::PatternMismatch));
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        let (_, report) = well(
            &VersionRules::V05,
            json!({"well": {"images": [{"path": "0"}, {"path": "0"}]}}),
        );
        assert_eq!(
            report
                .with_code(IssueCode::ListNotUnique)
                .next()
                .unwrap()
                .location
                .to_string(),
            "well.images.1"
        );
    }
}
