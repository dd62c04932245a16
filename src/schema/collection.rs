use serde_json::{Map, Value};

use super::checker::{optional, Checker};
use super::plate::read_layout;
use crate::model::{Collection, NodeKind, Series};
use crate::validation::Location;

pub(crate) fn read_collection(
    c: &mut Checker<'_>,
    map: &Map<String, Value>,
    loc: &Location,
) -> Option<Collection> {
    let table = c.table;
    let key = table
        .entry(NodeKind::Collection)
        .present_key(map)
        .unwrap_or("bioformats2raw.layout");
    let layout = c
        .required(map, key, loc)
        .and_then(|v| read_layout(c, v, &loc.key(key)));
    let series = match optional(map, "series") {
        Some(raw) => Some(read_series_list(c, raw, &loc.key("series"))?),
        None => None,
    };
    Some(Collection {
        layout: layout?,
        series,
    })
}

pub(crate) fn read_series(
    c: &mut Checker<'_>,
    map: &Map<String, Value>,
    loc: &Location,
) -> Option<Series> {
    let raw = c.required(map, "series", loc)?;
    let series = read_series_list(c, raw, &loc.key("series"))?;
    Some(Series { series })
}

fn read_series_list(c: &mut Checker<'_>, raw: &Value, loc: &Location) -> Option<Vec<String>> {
    let series = c.list(raw, loc, 1, |c, v, l| {
        let path = c.string(v, l)?;
        c.node_path(&path, l).then_some(path)
    })?;
    c.unique(raw, loc);
    Some(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VersionRules;
    use crate::schema::SchemaTable;
    use crate::validation::IssueCode;
    use serde_json::json;

    #[test]
    fn collection_accepts_alias_marker() {
        let table = SchemaTable::new();
        let mut c = Checker::new(&table, &VersionRules::V04, false);
        let doc = json!({"bioformats2raw_layout": 3});
        let collection = read_collection(&mut c, doc.as_object().unwrap(), &Location::root());
        assert_eq!(collection.unwrap().layout, 3);
        assert!(c.into_report().is_clean());
    }

    #[test]
    fn series_entries_must_be_unique_names() {
        let table = SchemaTable::new();
        let mut c = Checker::new(&table, &VersionRules::V05, false);
        let doc = json!({"series": ["0", "0", ""]});
        read_series(&mut c, doc.as_object().unwrap(), &Location::root());
        let report = c.into_report();
        assert!(report.has(IssueCode::ListNotUnique));
        assert!(report.has(IssueCode::InvalidNodeName));
    }
}
