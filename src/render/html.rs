//! Visual report: a self-contained styled HTML document, sized for an
//! image-rendering service to screenshot.

use std::fmt::Write;

use crate::normalize::{AudioTrack, NormalizedReport, SubtitleTrack, VideoInfo};

use super::escape::escape_html;

const STYLE: &str = r#"
body { margin: 0; background: #0f1115; font-family: "Segoe UI", Roboto, sans-serif; color: #e6e6e6; }
.card { width: 720px; padding: 28px 32px; background: linear-gradient(160deg, #1b1f27, #12151b); }
h1 { font-size: 20px; margin: 0 0 18px; color: #ffffff; word-break: break-all; }
h2 { font-size: 14px; margin: 20px 0 8px; color: #7aa2f7; text-transform: uppercase; letter-spacing: 1px; }
table { width: 100%; border-collapse: collapse; font-size: 14px; }
td { padding: 4px 0; vertical-align: top; }
td.k { width: 140px; color: #8b93a7; }
.track { margin: 6px 0; padding: 8px 12px; background: #1e232d; border-radius: 6px; font-size: 14px; }
.badge { display: inline-block; margin-left: 6px; padding: 0 6px; border-radius: 4px; background: #7aa2f7; color: #0f1115; font-size: 11px; }
"#;

/// Render the full HTML document for `report`.
pub fn render_html(report: &NormalizedReport) -> String {
    let mut body = String::new();

    let _ = write!(
        body,
        "<h1>{}</h1>\n<h2>General</h2>\n<table>\n",
        escape_html(&report.filename)
    );
    row(&mut body, "Container", &report.general.container);
    row(&mut body, "Size", &report.general.size);
    row(&mut body, "Runtime", &report.general.runtime);
    row(&mut body, "Bitrate", &report.general.bitrate);
    body.push_str("</table>\n");

    if let Some(video) = &report.video {
        video_section(&mut body, video);
    }

    if !report.audio.is_empty() {
        body.push_str("<h2>Audio</h2>\n");
        for track in &report.audio {
            audio_row(&mut body, track);
        }
    }

    if !report.subtitles.is_empty() {
        body.push_str("<h2>Subtitles</h2>\n");
        for track in &report.subtitles {
            subtitle_row(&mut body, track);
        }
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>{STYLE}</style>\n</head>\n<body>\n<div class=\"card\">\n{body}</div>\n</body>\n</html>\n"
    )
}

fn video_section(out: &mut String, video: &VideoInfo) {
    out.push_str("<h2>Video</h2>\n<table>\n");
    row(out, "Codec", &video.codec);
    row(out, "Resolution", &video.resolution);
    row(out, "Aspect ratio", &video.aspect_ratio);
    row(out, "Frame rate", &video.frame_rate);
    row(out, "Frame count", &video.frame_count);
    row(out, "Bitrate", &video.bitrate);
    row(out, "Bit depth", &video.bit_depth);
    out.push_str("</table>\n");
}

fn audio_row(out: &mut String, track: &AudioTrack) {
    let _ = write!(
        out,
        "<div class=\"track\">#{} {} {} &middot; {} &middot; {} &middot; {}",
        track.index + 1,
        track.flag,
        escape_html(&track.language),
        escape_html(&track.codec),
        escape_html(&track.channels),
        escape_html(&track.bitrate),
    );
    if let Some(title) = &track.title {
        let _ = write!(out, " &middot; <i>{}</i>", escape_html(title));
    }
    if track.is_default {
        out.push_str("<span class=\"badge\">default</span>");
    }
    out.push_str("</div>\n");
}

fn subtitle_row(out: &mut String, track: &SubtitleTrack) {
    let _ = write!(
        out,
        "<div class=\"track\">#{} {} {} &middot; {}",
        track.index + 1,
        track.flag,
        escape_html(&track.language),
        escape_html(&track.format),
    );
    if let Some(title) = &track.title {
        let _ = write!(out, " &middot; <i>{}</i>", escape_html(title));
    }
    out.push_str("</div>\n");
}

fn row(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(
        out,
        "<tr><td class=\"k\">{key}</td><td>{}</td></tr>",
        escape_html(value)
    );
}
