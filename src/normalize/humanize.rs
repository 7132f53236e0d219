//! Human-readable formatting of sizes, durations, rates.

use humansize::{format_size, BINARY};

/// Placeholder for any value the engine did not report.
pub const UNKNOWN: &str = "Unknown";

/// `2500000 → "2.5 Mb/s"`, `1500 → "2 kb/s"`, `500 → "500 b/s"`.
///
/// The unit is chosen after rounding, so `999_600` is `"1.0 Mb/s"`.
pub fn format_bitrate(bits_per_sec: f64) -> String {
    let bits = bits_per_sec.max(0.0).round();
    let kilobits = (bits / 1_000.0).round();
    if kilobits >= 1_000.0 {
        format!("{:.1} Mb/s", bits / 1_000_000.0)
    } else if bits >= 1_000.0 {
        format!("{} kb/s", kilobits as u64)
    } else {
        format!("{} b/s", bits as u64)
    }
}

/// `"1 h 32 min"` when at least an hour long, otherwise `"4 min 5 sec"`.
pub fn format_runtime(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours} h {minutes} min")
    } else {
        format!("{minutes} min {secs} sec")
    }
}

/// Binary-unit file size, e.g. `"1.5 GiB"`.
pub fn format_file_size(bytes: u64) -> String {
    format_size(bytes, BINARY)
}

/// `23.976 → "23.976 fps"`, `25.0 → "25 fps"`.
pub fn format_frame_rate(fps: f64) -> String {
    let rounded = format!("{fps:.3}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} fps")
}
