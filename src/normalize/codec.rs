//! Codec and format labels.
//!
//! Audio codec names come from an ordered rule table; the first rule whose
//! predicate accepts the track decides the label. Codec families without a
//! rule fall through to the engine's `Format` unchanged.

use crate::engine::FieldMap;

use super::field_str;

/// One audio labelling rule.
pub struct CodecRule {
    pub name: &'static str,
    pub matches: fn(&CodecFields<'_>) -> bool,
    pub label: fn(&CodecFields<'_>) -> String,
}

/// The fields the rules look at, borrowed from an audio track.
#[derive(Debug, Default, Clone, Copy)]
pub struct CodecFields<'a> {
    pub format: &'a str,
    pub commercial_name: &'a str,
    pub profile: &'a str,
    pub additional_features: &'a str,
}

impl<'a> CodecFields<'a> {
    pub fn from_track(fields: &'a FieldMap) -> Self {
        Self {
            format: field_str(fields, "Format").unwrap_or_default(),
            commercial_name: field_str(fields, "Format_Commercial_IfAny").unwrap_or_default(),
            profile: field_str(fields, "Format_Profile").unwrap_or_default(),
            additional_features: field_str(fields, "Format_AdditionalFeatures")
                .unwrap_or_default(),
        }
    }

    fn mentions_atmos(&self) -> bool {
        contains_ignore_case(self.commercial_name, "atmos")
    }
}

pub static AUDIO_CODEC_RULES: &[CodecRule] = &[
    CodecRule {
        name: "truehd",
        matches: |f| {
            contains_ignore_case(f.format, "truehd")
                || contains_ignore_case(f.commercial_name, "truehd")
                || f.format == "MLP FBA"
        },
        label: |f| {
            if f.mentions_atmos() {
                "MLP FBA (Dolby Atmos)".to_string()
            } else {
                "MLP FBA".to_string()
            }
        },
    },
    CodecRule {
        name: "dts-hd-ma",
        matches: |f| {
            f.format.eq_ignore_ascii_case("DTS")
                && (mentions_ma(f.profile) || mentions_ma(f.additional_features))
        },
        label: |_| "DTS-HD MA".to_string(),
    },
    CodecRule {
        name: "eac3-atmos",
        matches: |f| f.format.eq_ignore_ascii_case("E-AC-3") && f.mentions_atmos(),
        label: |f| format!("{} (Dolby Atmos)", f.format),
    },
];

/// Display label for an audio codec.
pub fn audio_codec_label(fields: &FieldMap) -> Option<String> {
    let codec = CodecFields::from_track(fields);
    if let Some(rule) = AUDIO_CODEC_RULES.iter().find(|rule| (rule.matches)(&codec)) {
        return Some((rule.label)(&codec));
    }
    (!codec.format.is_empty()).then(|| codec.format.to_string())
}

/// `2 → "2ch"`.
pub fn channels_label(channels: u64) -> String {
    format!("{channels}ch")
}

/// Subtitle formats in priority order.
pub const SUBTITLE_FORMATS: &[&str] = &["UTF-8", "ASS", "SRT", "PGS", "VobSub"];

/// Canonical subtitle format name, or the raw format when none matches.
pub fn subtitle_format_label(format: &str) -> String {
    SUBTITLE_FORMATS
        .iter()
        .find(|known| contains_ignore_case(format, known))
        .map(|known| (*known).to_string())
        .unwrap_or_else(|| format.to_string())
}

/// Video codec: format with its profile, e.g. `"AVC (High@L4.1)"`.
pub fn video_codec_label(fields: &FieldMap) -> Option<String> {
    let format = field_str(fields, "Format")?;
    match field_str(fields, "Format_Profile") {
        Some(profile) if !profile.is_empty() => Some(format!("{format} ({profile})")),
        _ => Some(format.to_string()),
    }
}

fn mentions_ma(text: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| word == "MA")
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
