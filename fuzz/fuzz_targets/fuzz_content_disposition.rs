#![no_main]

use libfuzzer_sys::fuzz_target;

use mediareport::download::headers::{content_disposition_filename, content_range_total};

fuzz_target!(|data: &str| {
    // Header values come straight from remote servers.
    if let Some(name) = content_disposition_filename(data) {
        assert!(!name.is_empty());
    }
    let _ = content_range_total(data);
});
