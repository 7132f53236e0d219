//! Field taxonomy for structured engine output.
//!
//! The engine reports every value as a string. Fields listed in
//! [`INT_FIELDS`] and [`FLOAT_FIELDS`] are coerced to JSON numbers; anything
//! else, including values that fail to parse, passes through untouched.

use serde_json::{Map, Number, Value};

use super::AnalysisError;

/// Field name to value for one track.
pub type FieldMap = Map<String, Value>;

/// Fields coerced to integers.
pub const INT_FIELDS: &[&str] = &[
    "AudioCount",
    "BitDepth",
    "BitRate",
    "BitRate_Maximum",
    "BitRate_Minimum",
    "BitRate_Nominal",
    "Channels",
    "Count",
    "ElementCount",
    "FileSize",
    "FrameCount",
    "Height",
    "MenuCount",
    "OverallBitRate",
    "OverallBitRate_Maximum",
    "Sampled_Height",
    "Sampled_Width",
    "SamplesPerFrame",
    "SamplingCount",
    "SamplingRate",
    "Stored_Height",
    "Stored_Width",
    "StreamCount",
    "StreamKindID",
    "StreamKindPos",
    "StreamOrder",
    "StreamSize",
    "TextCount",
    "VideoCount",
    "Width",
];

/// Fields coerced to floats.
pub const FLOAT_FIELDS: &[&str] = &[
    "Compression_Ratio",
    "Delay",
    "Delay_Original",
    "DisplayAspectRatio",
    "DisplayAspectRatio_Original",
    "Duration",
    "FrameRate",
    "FrameRate_Maximum",
    "FrameRate_Minimum",
    "FrameRate_Nominal",
    "FrameRate_Original",
    "PixelAspectRatio",
    "PixelAspectRatio_Original",
    "Video_Delay",
];

/// One track of structured engine output.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTrack {
    General(FieldMap),
    Video(FieldMap),
    Audio(FieldMap),
    Text(FieldMap),
}

impl RawTrack {
    /// Build a track from its `@type` and fields. Other track types (menus,
    /// images, chapters) are not part of a report and yield `None`.
    pub fn from_fields(kind: &str, fields: FieldMap) -> Option<Self> {
        let fields = coerce_fields(fields);
        match kind {
            "General" => Some(Self::General(fields)),
            "Video" => Some(Self::Video(fields)),
            "Audio" => Some(Self::Audio(fields)),
            "Text" => Some(Self::Text(fields)),
            _ => None,
        }
    }

    pub fn fields(&self) -> &FieldMap {
        match self {
            Self::General(f) | Self::Video(f) | Self::Audio(f) | Self::Text(f) => f,
        }
    }
}

/// Parse the engine's JSON output into typed tracks, in discovery order.
pub fn parse_tracks(output: &str) -> Result<Vec<RawTrack>, AnalysisError> {
    let root: Value = serde_json::from_str(output)
        .map_err(|e| AnalysisError::InvalidOutput(format!("engine output is not JSON: {e}")))?;

    let tracks = match root.get("media").and_then(|m| m.get("track")) {
        Some(Value::Array(tracks)) => tracks.clone(),
        Some(Value::Object(single)) => vec![Value::Object(single.clone())],
        // No media section: nothing recognizable in the window.
        _ => Vec::new(),
    };

    Ok(tracks
        .into_iter()
        .filter_map(|track| match track {
            Value::Object(mut fields) => {
                let kind = match fields.remove("@type") {
                    Some(Value::String(kind)) => kind,
                    _ => return None,
                };
                RawTrack::from_fields(&kind, fields)
            }
            _ => None,
        })
        .collect())
}

fn coerce_fields(fields: FieldMap) -> FieldMap {
    fields
        .into_iter()
        .map(|(key, value)| {
            let value = coerce_value(&key, value);
            (key, value)
        })
        .collect()
}

fn coerce_value(key: &str, value: Value) -> Value {
    let coerced = match &value {
        Value::String(raw) => coerce_str(key, raw.trim()),
        _ => None,
    };
    coerced.unwrap_or(value)
}

fn coerce_str(key: &str, raw: &str) -> Option<Value> {
    if INT_FIELDS.contains(&key) {
        if let Ok(n) = raw.parse::<i64>() {
            return Some(Value::Number(n.into()));
        }
        // Some integer fields come through as "48000.000".
        let f = raw.parse::<f64>().ok()?;
        (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then(|| Value::Number((f as i64).into()))
    } else if FLOAT_FIELDS.contains(&key) {
        raw.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
    } else {
        None
    }
}
