#![no_main]

use libfuzzer_sys::fuzz_target;

use mediareport::engine::parse_tracks;
use mediareport::normalize::normalize;
use mediareport::render::{fit_with_link, render_text};

fuzz_target!(|data: &str| {
    // Engine output is untrusted JSON; parsing through rendering must not panic.
    if let Ok(tracks) = parse_tracks(data) {
        let report = normalize("fuzz.mkv", &tracks);
        let text = render_text(&report);
        let fitted = fit_with_link(&text, Some("https://paste.rs/abc"), 4096);
        assert!(fitted.chars().count() <= 4096);
    }
});
