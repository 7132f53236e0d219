#![no_main]

use libfuzzer_sys::fuzz_target;

use mediareport::source::{extract_drive_id, SourceResolver};

fuzz_target!(|data: &str| {
    // Arbitrary user input must never panic the resolver.
    let resolver = SourceResolver::new(["drive.google.com", "docs.google.com"]);
    let _ = resolver.resolve(data);

    if let Some(id) = extract_drive_id(data) {
        assert!(!id.is_empty());
    }
});
