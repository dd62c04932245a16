use serde_json::{Map, Value};
use tracing::trace;

use super::{node_key, Store};
use crate::error::StoreError;

/// Broad class of an array element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataTypeClass {
    Bool,
    SignedInteger,
    UnsignedInteger,
    Float,
    Complex,
    Other,
}

/// An array element type as declared by zarr v2 (`<u2`, `|b1`) or v3
/// (`uint16`, `bool`) metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataType {
    pub raw: String,
    pub class: DataTypeClass,
}

impl DataType {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            class: classify(raw),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.class,
            DataTypeClass::SignedInteger | DataTypeClass::UnsignedInteger
        )
    }
}

fn classify(raw: &str) -> DataTypeClass {
    let name = raw.trim_start_matches(&['<', '>', '=', '|'][..]);
    if name.starts_with("uint") {
        return DataTypeClass::UnsignedInteger;
    }
    if name.starts_with("int") {
        return DataTypeClass::SignedInteger;
    }
    if name.starts_with("float") || name.starts_with("bfloat") {
        return DataTypeClass::Float;
    }
    if name.starts_with("complex") {
        return DataTypeClass::Complex;
    }
    if name == "bool" {
        return DataTypeClass::Bool;
    }

    let mut chars = name.chars();
    let (Some(code), Some(width)) = (chars.next(), chars.next()) else {
        return DataTypeClass::Other;
    };
    if !width.is_ascii_digit() {
        return DataTypeClass::Other;
    }
    match code {
        'i' => DataTypeClass::SignedInteger,
        'u' => DataTypeClass::UnsignedInteger,
        'f' => DataTypeClass::Float,
        'c' => DataTypeClass::Complex,
        'b' => DataTypeClass::Bool,
        _ => DataTypeClass::Other,
    }
}

/// What an array declares about itself.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayMeta {
    pub shape: Vec<u64>,
    pub data_type: DataType,
    /// Per-dimension names; `None` entries are unnamed dimensions.
    pub dimension_names: Option<Vec<Option<String>>>,
}

impl ArrayMeta {
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeType {
    Group,
    Array(ArrayMeta),
}

/// A resolved zarr node.
#[derive(Clone, Debug, PartialEq)]
pub struct ZarrNode {
    /// Path relative to the store root (`""` for the root).
    pub path: String,
    pub zarr_format: u8,
    pub node_type: NodeType,
    /// The document OME metadata is read from: the whole `zarr.json` for
    /// v3, the `.zattrs` object for v2.
    pub document: Value,
    /// The key `document` was read from.
    pub metadata_key: String,
}

impl ZarrNode {
    pub fn is_group(&self) -> bool {
        matches!(self.node_type, NodeType::Group)
    }

    pub fn as_array(&self) -> Option<&ArrayMeta> {
        match &self.node_type {
            NodeType::Array(meta) => Some(meta),
            NodeType::Group => None,
        }
    }

    /// The node's user attributes.
    pub fn attributes(&self) -> Option<&Map<String, Value>> {
        match self.zarr_format {
            3 => self.document.get("attributes").and_then(Value::as_object),
            _ => self.document.as_object(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        if self.is_group() {
            "group"
        } else {
            "array"
        }
    }
}

/// Resolves the node at `path`, probing `zarr.json`, then `.zgroup`, then
/// `.zarray`.
///
/// # Errors
/// Store faults propagate; unparseable metadata is [`StoreError::Corrupt`].
pub fn open_node(store: &dyn Store, path: &str) -> Result<Option<ZarrNode>, StoreError> {
    let key = node_key(path, "zarr.json");
    if let Some(bytes) = store.read(&key)? {
        trace!(key = %key, "found zarr v3 metadata");
        return parse_v3(path, &key, &bytes).map(Some);
    }

    let group_key = node_key(path, ".zgroup");
    if let Some(bytes) = store.read(&group_key)? {
        parse_json(&group_key, &bytes)?;
        let (document, metadata_key) = read_v2_attributes(store, path)?;
        return Ok(Some(ZarrNode {
            path: path.to_string(),
            zarr_format: 2,
            node_type: NodeType::Group,
            document,
            metadata_key,
        }));
    }

    let array_key = node_key(path, ".zarray");
    if let Some(bytes) = store.read(&array_key)? {
        let meta = parse_json(&array_key, &bytes)?;
        let (document, metadata_key) = read_v2_attributes(store, path)?;
        let array = parse_v2_array(&array_key, &meta, &document)?;
        return Ok(Some(ZarrNode {
            path: path.to_string(),
            zarr_format: 2,
            node_type: NodeType::Array(array),
            document,
            metadata_key,
        }));
    }

    Ok(None)
}

fn parse_json(key: &str, bytes: &[u8]) -> Result<Value, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn corrupt(key: &str, message: impl Into<String>) -> StoreError {
    StoreError::Corrupt {
        key: key.to_string(),
        message: message.into(),
    }
}

fn read_v2_attributes(store: &dyn Store, path: &str) -> Result<(Value, String), StoreError> {
    let key = node_key(path, ".zattrs");
    let document = match store.read(&key)? {
        Some(bytes) => {
            let value = parse_json(&key, &bytes)?;
            if !value.is_object() {
                return Err(corrupt(&key, ".zattrs must hold a JSON object"));
            }
            value
        }
        None => Value::Object(Map::new()),
    };
    Ok((document, key))
}

fn parse_v3(path: &str, key: &str, bytes: &[u8]) -> Result<ZarrNode, StoreError> {
    let document = parse_json(key, bytes)?;
    let Some(map) = document.as_object() else {
        return Err(corrupt(key, "zarr.json must hold a JSON object"));
    };
    if map.get("zarr_format").and_then(Value::as_u64) != Some(3) {
        return Err(corrupt(key, "zarr.json must declare zarr_format 3"));
    }
    let node_type = match map.get("node_type").and_then(Value::as_str) {
        Some("group") => NodeType::Group,
        Some("array") => NodeType::Array(parse_v3_array(key, map)?),
        _ => return Err(corrupt(key, "node_type must be 'group' or 'array'")),
    };
    Ok(ZarrNode {
        path: path.to_string(),
        zarr_format: 3,
        node_type,
        document,
        metadata_key: key.to_string(),
    })
}

fn parse_v3_array(key: &str, map: &Map<String, Value>) -> Result<ArrayMeta, StoreError> {
    let shape = parse_shape(key, map.get("shape"))?;
    let data_type = match map.get("data_type") {
        Some(Value::String(name)) => DataType::parse(name),
        Some(Value::Object(ext)) => match ext.get("name").and_then(Value::as_str) {
            Some(name) => DataType::parse(name),
            None => return Err(corrupt(key, "data_type object has no name")),
        },
        _ => return Err(corrupt(key, "missing data_type")),
    };
    let dimension_names = parse_dimension_names(key, map.get("dimension_names"))?;
    Ok(ArrayMeta {
        shape,
        data_type,
        dimension_names,
    })
}

fn parse_v2_array(key: &str, meta: &Value, attributes: &Value) -> Result<ArrayMeta, StoreError> {
    let Some(map) = meta.as_object() else {
        return Err(corrupt(key, ".zarray must hold a JSON object"));
    };
    let shape = parse_shape(key, map.get("shape"))?;
    let data_type = match map.get("dtype") {
        Some(Value::String(dtype)) => DataType::parse(dtype),
        // Structured dtypes are lists of fields; never an integer type.
        Some(other @ Value::Array(_)) => DataType {
            raw: other.to_string(),
            class: DataTypeClass::Other,
        },
        _ => return Err(corrupt(key, "missing dtype")),
    };
    let dimension_names = parse_dimension_names(key, attributes.get("dimension_names"))?;
    Ok(ArrayMeta {
        shape,
        data_type,
        dimension_names,
    })
}

fn parse_shape(key: &str, raw: Option<&Value>) -> Result<Vec<u64>, StoreError> {
    let Some(Value::Array(dims)) = raw else {
        return Err(corrupt(key, "missing or invalid shape"));
    };
    dims.iter()
        .map(|d| {
            d.as_u64()
                .ok_or_else(|| corrupt(key, "shape entries must be non-negative integers"))
        })
        .collect()
}

fn parse_dimension_names(
    key: &str,
    raw: Option<&Value>,
) -> Result<Option<Vec<Option<String>>>, StoreError> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(names)) => names
            .iter()
            .map(|n| match n {
                Value::String(s) => Ok(Some(s.clone())),
                Value::Null => Ok(None),
                _ => Err(corrupt(key, "dimension_names entries must be strings or null")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(corrupt(key, "dimension_names must be a list")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn classifies_v2_and_v3_types() {
        for (raw, class) in [
            ("uint8", DataTypeClass::UnsignedInteger),
            ("int64", DataTypeClass::SignedInteger),
            ("float32", DataTypeClass::Float),
            ("bfloat16", DataTypeClass::Float),
            ("complex128", DataTypeClass::Complex),
            ("bool", DataTypeClass::Bool),
            ("<u2", DataTypeClass::UnsignedInteger),
            ("|i1", DataTypeClass::SignedInteger),
            (">f8", DataTypeClass::Float),
            ("<c16", DataTypeClass::Complex),
            ("|b1", DataTypeClass::Bool),
            ("<U10", DataTypeClass::Other),
            ("<M8[ns]", DataTypeClass::Other),
            ("r16", DataTypeClass::Other),
        ] {
            assert_eq!(DataType::parse(raw).class, class, "{raw}");
        }
        assert!(DataType::parse("<i4").is_integer());
        assert!(!DataType::parse("float64").is_integer());
    }

    #[test]
    fn opens_v3_array_with_dimension_names() {
        let mut store = MemoryStore::new("mem://test");
        store.insert_json(
            "img/0/zarr.json",
            &json!({
                "zarr_format": 3,
                "node_type": "array",
                "shape": [10, 20],
                "data_type": "uint16",
                "dimension_names": ["y", null]
            }),
        );
        let node = open_node(&store, "img/0").unwrap().unwrap();
        let array = node.as_array().unwrap();
        assert_eq!(array.ndim(), 2);
        assert_eq!(
            array.dimension_names,
            Some(vec![Some("y".to_string()), None])
        );
        assert!(array.data_type.is_integer());
    }

    #[test]
    fn opens_v2_group_and_array() {
        let mut store = MemoryStore::new("mem://test");
        store.insert_json(".zgroup", &json!({"zarr_format": 2}));
        store.insert_json(".zattrs", &json!({"labels": ["a"]}));
        store.insert_json("0/.zarray", &json!({"zarr_format": 2, "shape": [4, 4], "dtype": "<f4"}));

        let root = open_node(&store, "").unwrap().unwrap();
        assert!(root.is_group());
        assert_eq!(root.attributes().unwrap()["labels"], json!(["a"]));
        assert_eq!(root.metadata_key, ".zattrs");

        let array = open_node(&store, "0").unwrap().unwrap();
        assert_eq!(array.as_array().unwrap().data_type.class, DataTypeClass::Float);
        assert!(array.as_array().unwrap().dimension_names.is_none());

        assert!(open_node(&store, "missing").unwrap().is_none());
    }

    #[test]
    fn malformed_metadata_is_corrupt() {
        let mut store = MemoryStore::new("mem://test");
        store.insert("zarr.json", b"{not json".to_vec());
        assert!(matches!(
            open_node(&store, ""),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
