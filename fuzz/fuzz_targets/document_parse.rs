//! Fuzz target for metadata document validation.
//!
//! Feeds arbitrary bytes through JSON parsing, envelope detection,
//! discrimination and field validation, checking for panics.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ngffcheck::schema::validate_json_str;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(validated) = validate_json_str(text) {
        // Whatever validates must serialize back and validate again.
        let json = validated.value.to_value().expect("serialize validated document");
        assert!(ngffcheck::schema::validate_document(&json).is_ok());
    }
});
