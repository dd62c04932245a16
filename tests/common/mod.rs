#![allow(dead_code)]

use std::fs;
use std::path::Path;

use ngffcheck::store::MemoryStore;
use serde_json::{json, Value};

pub const AXES_YX: [&str; 2] = ["y", "x"];

pub fn group_v3(ome: Value) -> Value {
    json!({
        "zarr_format": 3,
        "node_type": "group",
        "attributes": {"ome": ome}
    })
}

pub fn plain_group_v3() -> Value {
    json!({"zarr_format": 3, "node_type": "group", "attributes": {}})
}

pub fn array_v3(shape: &[u64], data_type: &str, dimension_names: Option<&[&str]>) -> Value {
    let mut array = json!({
        "zarr_format": 3,
        "node_type": "array",
        "shape": shape,
        "data_type": data_type,
        "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": shape}},
        "fill_value": 0
    });
    if let Some(names) = dimension_names {
        array["dimension_names"] = json!(names);
    }
    array
}

/// Multiscale metadata for a 2D yx pyramid with `levels` datasets `0..levels`.
pub fn multiscales_yx(levels: usize) -> Value {
    let datasets: Vec<Value> = (0..levels)
        .map(|i| {
            let factor = (1u32 << i) as f64;
            json!({
                "path": i.to_string(),
                "coordinateTransformations": [{"type": "scale", "scale": [factor, factor]}]
            })
        })
        .collect();
    json!([{
        "axes": [
            {"name": "y", "type": "space", "unit": "micrometer"},
            {"name": "x", "type": "space", "unit": "micrometer"}
        ],
        "datasets": datasets
    }])
}

pub fn join(path: &str, child: &str) -> String {
    if path.is_empty() {
        child.to_string()
    } else {
        format!("{}/{}", path, child)
    }
}

/// Builds OME-NGFF 0.5 (zarr v3) hierarchies in memory.
pub struct V05Builder {
    pub store: MemoryStore,
}

impl V05Builder {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new("mem://fixture.zarr"),
        }
    }

    pub fn put(&mut self, path: &str, document: Value) -> &mut Self {
        self.store.insert_json(join(path, "zarr.json"), &document);
        self
    }

    pub fn group(&mut self, path: &str, ome: Value) -> &mut Self {
        self.put(path, group_v3(ome))
    }

    pub fn arrays(&mut self, path: &str, levels: usize, data_type: &str) -> &mut Self {
        for i in 0..levels {
            let size = 64u64 >> i;
            self.put(
                &join(path, &i.to_string()),
                array_v3(&[size, size], data_type, Some(&AXES_YX)),
            );
        }
        self
    }

    pub fn image(&mut self, path: &str, levels: usize) -> &mut Self {
        self.group(
            path,
            json!({"version": "0.5", "multiscales": multiscales_yx(levels)}),
        );
        self.arrays(path, levels, "uint16")
    }

    /// A labels group under `image` holding one label image per name.
    pub fn labels(&mut self, image: &str, names: &[&str], levels: usize, data_type: &str) -> &mut Self {
        let labels = join(image, "labels");
        self.group(&labels, json!({"version": "0.5", "labels": names}));
        for name in names {
            let label = join(&labels, name);
            self.group(
                &label,
                json!({
                    "version": "0.5",
                    "multiscales": multiscales_yx(levels),
                    "image-label": {
                        "colors": [{"label-value": 1, "rgba": [255, 0, 0, 255]}],
                        "source": {"image": "../../"}
                    }
                }),
            );
            self.arrays(&label, levels, data_type);
        }
        self
    }

    /// A plate with one field of view per well, each a one-level image.
    pub fn plate(&mut self, rows: &[&str], columns: &[&str], wells: &[(&str, usize, usize)]) -> &mut Self {
        let wells_json: Vec<Value> = wells
            .iter()
            .map(|(path, row, column)| json!({"path": path, "rowIndex": row, "columnIndex": column}))
            .collect();
        let rows_json: Vec<Value> = rows.iter().map(|name| json!({"name": name})).collect();
        let columns_json: Vec<Value> = columns.iter().map(|name| json!({"name": name})).collect();
        self.group(
            "",
            json!({"version": "0.5", "plate": {
                "name": "fixture plate",
                "rows": rows_json,
                "columns": columns_json,
                "wells": wells_json,
                "field_count": 1
            }}),
        );
        for (path, _, _) in wells {
            self.well(path, &["0"]);
            self.image(&join(path, "0"), 1);
        }
        self
    }

    pub fn well(&mut self, path: &str, fields: &[&str]) -> &mut Self {
        let images: Vec<Value> = fields.iter().map(|p| json!({"path": p})).collect();
        self.group(path, json!({"version": "0.5", "well": {"images": images}}))
    }

    pub fn build(&self) -> MemoryStore {
        self.store.clone()
    }
}

impl Default for V05Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes an OME-NGFF 0.4 (zarr v2) image with `levels` levels into `dir`.
pub fn write_v04_image(dir: &Path, levels: usize, dtype: &str) {
    let mut multiscales = multiscales_yx(levels);
    multiscales[0]["version"] = json!("0.4");
    write_v2_group(dir, json!({"multiscales": multiscales}));
    for i in 0..levels {
        let size = 64u64 >> i;
        write_v2_array(&dir.join(i.to_string()), &[size, size], dtype);
    }
}

pub fn write_v2_group(dir: &Path, attributes: Value) {
    fs::create_dir_all(dir).expect("create group dir");
    fs::write(dir.join(".zgroup"), json!({"zarr_format": 2}).to_string()).expect("write .zgroup");
    fs::write(dir.join(".zattrs"), attributes.to_string()).expect("write .zattrs");
}

pub fn write_v2_array(dir: &Path, shape: &[u64], dtype: &str) {
    fs::create_dir_all(dir).expect("create array dir");
    let meta = json!({
        "zarr_format": 2,
        "shape": shape,
        "chunks": shape,
        "dtype": dtype,
        "compressor": null,
        "fill_value": 0,
        "order": "C",
        "filters": null
    });
    fs::write(dir.join(".zarray"), meta.to_string()).expect("write .zarray");
}
