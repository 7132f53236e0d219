//! Plain styled-text report, used when no visual document is available.

use std::fmt::Write;

use crate::normalize::{NormalizedReport, VideoInfo};

/// Maximum characters in one chat message.
pub const DEFAULT_MESSAGE_CAP: usize = 4096;

/// Inserted where an over-long body was cut.
pub const TRUNCATION_MARKER: &str = "\n… [report truncated]";

const SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━";

const SUBTITLES_PER_LINE: usize = 4;

/// Render the line-oriented text report for `report`.
pub fn render_text(report: &NormalizedReport) -> String {
    let mut out = String::new();
    let general = &report.general;

    let _ = writeln!(out, "📁 {}", report.filename);
    let _ = writeln!(out, "{SEPARATOR}");
    out.push_str("🗂 GENERAL\n");
    let _ = writeln!(out, "Container: {}", general.container);
    let _ = writeln!(out, "Size: {}", general.size);
    let _ = writeln!(out, "Runtime: {}", general.runtime);
    let _ = writeln!(out, "Bitrate: {}", general.bitrate);

    if let Some(video) = &report.video {
        video_block(&mut out, video);
    }

    if !report.audio.is_empty() {
        let _ = writeln!(out, "{SEPARATOR}");
        let _ = writeln!(out, "🔊 AUDIO ({})", report.audio.len());
        for track in &report.audio {
            let _ = write!(
                out,
                "#{} {} {} · {} · {} · {}",
                track.index + 1,
                track.flag,
                track.language,
                track.codec,
                track.channels,
                track.bitrate
            );
            if let Some(title) = &track.title {
                let _ = write!(out, " · {title}");
            }
            if track.is_default {
                out.push_str(" [default]");
            }
            out.push('\n');
        }
    }

    if !report.subtitles.is_empty() {
        let _ = writeln!(out, "{SEPARATOR}");
        let _ = writeln!(out, "💬 SUBTITLES ({})", report.subtitles.len());
        for line in report.subtitles.chunks(SUBTITLES_PER_LINE) {
            let entries: Vec<String> = line
                .iter()
                .map(|s| format!("{} {} ({})", s.flag, s.language, s.format))
                .collect();
            let _ = writeln!(out, "{}", entries.join(", "));
        }
    }

    let flags = flag_line(report);
    if !flags.is_empty() {
        let _ = writeln!(out, "{SEPARATOR}");
        let _ = writeln!(out, "{flags}");
    }

    out.trim_end().to_string()
}

fn video_block(out: &mut String, video: &VideoInfo) {
    let _ = writeln!(out, "{SEPARATOR}");
    out.push_str("🎞 VIDEO\n");
    let _ = writeln!(out, "Codec: {}", video.codec);
    let _ = writeln!(out, "Resolution: {} ({})", video.resolution, video.aspect_ratio);
    let _ = writeln!(out, "Frame rate: {}", video.frame_rate);
    let _ = writeln!(out, "Frame count: {}", video.frame_count);
    let _ = writeln!(out, "Bitrate: {}", video.bitrate);
    let _ = writeln!(out, "Bit depth: {}", video.bit_depth);
}

/// Every distinct flag across audio then subtitle tracks, first appearance
/// first.
fn flag_line(report: &NormalizedReport) -> String {
    let mut seen: Vec<&str> = Vec::new();
    let all = report
        .audio
        .iter()
        .map(|a| a.flag.as_str())
        .chain(report.subtitles.iter().map(|s| s.flag.as_str()));
    for flag in all {
        if !seen.contains(&flag) {
            seen.push(flag);
        }
    }
    seen.join(" ")
}

/// Join `body` and an optional `link` into one message of at most `cap`
/// characters.
///
/// When the two do not fit, the body is cut and [`TRUNCATION_MARKER`]
/// appended; the link is never shortened. A link that alone exceeds `cap`
/// is dropped and the body fitted on its own.
pub fn fit_with_link(body: &str, link: Option<&str>, cap: usize) -> String {
    if link.is_some_and(|l| l.chars().count() > cap) {
        return fit_with_link(body, None, cap);
    }

    let tail = link.map(|l| format!("\n\n{l}")).unwrap_or_default();
    let body_len = body.chars().count();
    let tail_len = tail.chars().count();

    if body_len + tail_len <= cap {
        return format!("{body}{tail}");
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    let Some(room) = cap.checked_sub(tail_len + marker_len) else {
        // Not even the marker fits next to the link.
        return match link {
            Some(link) => link.to_string(),
            None => body.chars().take(cap).collect(),
        };
    };

    let kept: String = body.chars().take(room).collect();
    format!("{}{TRUNCATION_MARKER}{tail}", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{AudioTrack, GeneralInfo, SubtitleTrack};

    fn audio(index: usize, flag: &str, language: &str) -> AudioTrack {
        AudioTrack {
            index,
            language: language.to_string(),
            flag: flag.to_string(),
            codec: "AAC".to_string(),
            channels: "2ch".to_string(),
            bitrate: "128 kb/s".to_string(),
            title: None,
            is_default: index == 0,
        }
    }

    fn subtitle(index: usize, flag: &str, language: &str) -> SubtitleTrack {
        SubtitleTrack {
            index,
            format: "SRT".to_string(),
            language: language.to_string(),
            flag: flag.to_string(),
            title: None,
        }
    }

    fn report() -> NormalizedReport {
        NormalizedReport {
            filename: "movie.mkv".to_string(),
            general: GeneralInfo::default(),
            video: None,
            audio: vec![audio(0, "🇯🇵", "Ja"), audio(1, "🇬🇧", "En")],
            subtitles: (0..6)
                .map(|i| {
                    if i % 2 == 0 {
                        subtitle(i, "🇬🇧", "En")
                    } else {
                        subtitle(i, "🇫🇷", "Fr")
                    }
                })
                .collect(),
        }
    }

    // ==================== render tests ====================

    #[test]
    fn test_sections_and_separators() {
        let text = render_text(&report());
        assert!(text.starts_with("📁 movie.mkv\n"));
        assert!(text.contains("🗂 GENERAL"));
        assert!(text.contains("Container: Unknown"));
        assert!(text.contains("🔊 AUDIO (2)"));
        assert!(text.contains("#1 🇯🇵 Ja · AAC · 2ch · 128 kb/s [default]"));
        assert!(!text.contains("VIDEO"));
        assert_eq!(text.matches(SEPARATOR).count(), 4);
    }

    #[test]
    fn test_subtitles_four_per_line() {
        let text = render_text(&report());
        let lines: Vec<&str> = text
            .lines()
            .filter(|l| l.contains("(SRT)"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].matches("(SRT)").count(), 4);
        assert_eq!(lines[1].matches("(SRT)").count(), 2);
    }

    #[test]
    fn test_flag_line_deduplicated_in_order() {
        let text = render_text(&report());
        assert_eq!(text.lines().last(), Some("🇯🇵 🇬🇧 🇫🇷"));
    }

    #[test]
    fn test_no_tracks_no_flag_line() {
        let mut bare = report();
        bare.audio.clear();
        bare.subtitles.clear();
        let text = render_text(&bare);
        assert!(text.ends_with("Bitrate: Unknown"));
    }

    // ==================== fit tests ====================

    #[test]
    fn test_fit_short_body_untouched() {
        assert_eq!(
            fit_with_link("body", Some("https://p.example/x"), 4096),
            "body\n\nhttps://p.example/x"
        );
        assert_eq!(fit_with_link("body", None, 4096), "body");
    }

    #[test]
    fn test_fit_truncates_and_keeps_link() {
        let body = "x".repeat(10_000);
        let link = "https://paste.example/abc123";
        let out = fit_with_link(&body, Some(link), DEFAULT_MESSAGE_CAP);

        assert!(out.chars().count() <= DEFAULT_MESSAGE_CAP);
        assert!(out.ends_with(link));
        let marker_at = out.find(TRUNCATION_MARKER).expect("marker present");
        assert!(marker_at < out.find(link).unwrap_or(0));
    }

    #[test]
    fn test_fit_counts_characters_not_bytes() {
        let body = "🇬🇧".repeat(3000);
        let out = fit_with_link(&body, None, DEFAULT_MESSAGE_CAP);
        assert!(out.chars().count() <= DEFAULT_MESSAGE_CAP);
        assert!(out.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_fit_exact_cap() {
        let body = "y".repeat(100);
        assert_eq!(fit_with_link(&body, None, 100), body);
    }

    #[test]
    fn test_fit_link_longer_than_cap() {
        let link = "https://example.com/".to_string() + &"a".repeat(50);
        assert_eq!(fit_with_link("body", Some(&link), 20), "body");

        let body = "z".repeat(100);
        let fitted = fit_with_link(&body, Some(&link), 40);
        assert_eq!(fitted.chars().count(), 40);
        assert!(fitted.ends_with(TRUNCATION_MARKER));
        assert!(!fitted.contains("example.com"));
    }

    #[test]
    fn test_fit_only_link_room() {
        let link = "https://e.x/abc";
        // Link fits, but link plus marker does not.
        let cap = link.chars().count() + 3;
        assert_eq!(fit_with_link(&"q".repeat(50), Some(link), cap), link);
    }

    #[test]
    fn test_fit_tiny_cap_without_link() {
        assert_eq!(fit_with_link("abcdef", None, 3), "abc");
    }
}
