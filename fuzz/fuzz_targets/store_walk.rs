//! Fuzz target for the structural walk.
//!
//! The input becomes the root metadata of an in-memory store whose only
//! other node is a single array at `0`.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ngffcheck::store::MemoryStore;
use ngffcheck::validation::{validate_store, ValidateOptions};

fuzz_target!(|data: &[u8]| {
    if data.len() > 256 * 1024 {
        return;
    }

    let mut store = MemoryStore::new("mem://fuzz");
    store.insert("zarr.json", data.to_vec());
    store.insert_json(
        "0/zarr.json",
        &serde_json::json!({
            "zarr_format": 3,
            "node_type": "array",
            "shape": [16, 16],
            "data_type": "uint8",
            "dimension_names": ["y", "x"]
        }),
    );

    let _ = validate_store(&store, &ValidateOptions::default());
});
