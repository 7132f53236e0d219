//! Result normalizer.
//!
//! Turns [`RawTrack`]s into a [`NormalizedReport`]: every value a renderer
//! shows is computed here, with `"Unknown"` (or a documented default) for
//! anything the engine did not report. Normalization never fails.

pub mod aspect;
pub mod codec;
pub mod flags;
pub mod humanize;

use serde::Serialize;
use serde_json::Value;

use crate::engine::{FieldMap, RawTrack};

pub use aspect::aspect_ratio;
pub use codec::{audio_codec_label, channels_label, subtitle_format_label, video_codec_label};
pub use flags::{capitalize, language_flag, PLACEHOLDER_FLAG};
pub use humanize::{format_bitrate, format_file_size, format_frame_rate, format_runtime, UNKNOWN};

/// Bit depth assumed when the engine reports none.
pub const DEFAULT_BIT_DEPTH: &str = "8 bits";

/// Language code assumed when a track has none.
pub const UNDETERMINED_LANGUAGE: &str = "und";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedReport {
    pub filename: String,
    pub general: GeneralInfo,
    pub video: Option<VideoInfo>,
    pub audio: Vec<AudioTrack>,
    pub subtitles: Vec<SubtitleTrack>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralInfo {
    pub container: String,
    pub size: String,
    pub runtime: String,
    pub bitrate: String,
}

impl Default for GeneralInfo {
    fn default() -> Self {
        Self {
            container: UNKNOWN.to_string(),
            size: UNKNOWN.to_string(),
            runtime: UNKNOWN.to_string(),
            bitrate: UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub codec: String,
    pub resolution: String,
    pub aspect_ratio: String,
    pub frame_rate: String,
    pub frame_count: String,
    pub bitrate: String,
    pub bit_depth: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    pub index: usize,
    pub language: String,
    pub flag: String,
    pub codec: String,
    pub channels: String,
    pub bitrate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleTrack {
    pub index: usize,
    pub format: String,
    pub language: String,
    pub flag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Build the display report for `filename` from raw engine tracks.
///
/// The first General and first Video track are used; audio and subtitle
/// tracks keep engine discovery order and are indexed from zero.
pub fn normalize(filename: &str, tracks: &[RawTrack]) -> NormalizedReport {
    let mut general = None;
    let mut video = None;
    let mut audio = Vec::new();
    let mut subtitles = Vec::new();

    for track in tracks {
        match track {
            RawTrack::General(fields) => {
                general.get_or_insert_with(|| normalize_general(fields));
            }
            RawTrack::Video(fields) => {
                video.get_or_insert_with(|| normalize_video(fields));
            }
            RawTrack::Audio(fields) => audio.push(normalize_audio(audio.len(), fields)),
            RawTrack::Text(fields) => subtitles.push(normalize_subtitle(subtitles.len(), fields)),
        }
    }

    NormalizedReport {
        filename: filename.to_string(),
        general: general.unwrap_or_default(),
        video,
        audio,
        subtitles,
    }
}

fn normalize_general(fields: &FieldMap) -> GeneralInfo {
    GeneralInfo {
        container: text_or_unknown(fields, "Format"),
        size: field_u64(fields, "FileSize")
            .map(format_file_size)
            .unwrap_or_else(unknown),
        runtime: field_f64(fields, "Duration")
            .map(format_runtime)
            .unwrap_or_else(unknown),
        bitrate: field_f64(fields, "OverallBitRate")
            .map(format_bitrate)
            .unwrap_or_else(unknown),
    }
}

fn normalize_video(fields: &FieldMap) -> VideoInfo {
    let width = field_u64(fields, "Width");
    let height = field_u64(fields, "Height");

    let resolution = match (width, height) {
        (Some(w), Some(h)) => format!("{w}x{h}"),
        _ => unknown(),
    };
    let aspect_ratio = width
        .zip(height)
        .and_then(|(w, h)| aspect_ratio(w, h))
        .unwrap_or_else(unknown);

    VideoInfo {
        codec: video_codec_label(fields).unwrap_or_else(unknown),
        resolution,
        aspect_ratio,
        frame_rate: field_f64(fields, "FrameRate")
            .map(format_frame_rate)
            .unwrap_or_else(unknown),
        frame_count: field_u64(fields, "FrameCount")
            .map(|n| n.to_string())
            .unwrap_or_else(unknown),
        bitrate: field_f64(fields, "BitRate")
            .map(format_bitrate)
            .unwrap_or_else(unknown),
        bit_depth: field_u64(fields, "BitDepth")
            .map(|bits| format!("{bits} bits"))
            .unwrap_or_else(|| DEFAULT_BIT_DEPTH.to_string()),
    }
}

fn normalize_audio(index: usize, fields: &FieldMap) -> AudioTrack {
    let language = language_code(fields);
    AudioTrack {
        index,
        flag: language_flag(&language).to_string(),
        language: capitalize(&language),
        codec: audio_codec_label(fields).unwrap_or_else(unknown),
        channels: field_u64(fields, "Channels")
            .map(channels_label)
            .unwrap_or_else(unknown),
        bitrate: field_f64(fields, "BitRate")
            .map(format_bitrate)
            .unwrap_or_else(unknown),
        title: title(fields),
        is_default: is_default(fields),
    }
}

fn normalize_subtitle(index: usize, fields: &FieldMap) -> SubtitleTrack {
    let language = language_code(fields);
    SubtitleTrack {
        index,
        format: field_str(fields, "Format")
            .map(subtitle_format_label)
            .unwrap_or_else(unknown),
        flag: language_flag(&language).to_string(),
        language: capitalize(&language),
        title: title(fields),
    }
}

fn language_code(fields: &FieldMap) -> String {
    field_str(fields, "Language")
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unwrap_or(UNDETERMINED_LANGUAGE)
        .to_string()
}

fn title(fields: &FieldMap) -> Option<String> {
    field_str(fields, "Title")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn is_default(fields: &FieldMap) -> bool {
    match fields.get("Default") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(s)) => s == "Yes",
        _ => false,
    }
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

fn text_or_unknown(fields: &FieldMap, key: &str) -> String {
    field_str(fields, key)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(unknown)
}

pub(crate) fn field_str<'a>(fields: &'a FieldMap, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

fn field_f64(fields: &FieldMap, key: &str) -> Option<f64> {
    let value: f64 = match fields.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn field_u64(fields: &FieldMap, key: &str) -> Option<u64> {
    match fields.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
