//! Language flags.

/// Shown for languages missing from [`LANGUAGE_FLAGS`].
pub const PLACEHOLDER_FLAG: &str = "🏳️";

/// `(keys, flag)`: ISO 639-1, ISO 639-2 (both B and T forms) and the
/// English name, all lower-case.
static LANGUAGE_FLAGS: &[(&[&str], &str)] = &[
    (&["en", "eng", "english"], "🇬🇧"),
    (&["es", "spa", "spanish"], "🇪🇸"),
    (&["fr", "fre", "fra", "french"], "🇫🇷"),
    (&["de", "ger", "deu", "german"], "🇩🇪"),
    (&["it", "ita", "italian"], "🇮🇹"),
    (&["pt", "por", "portuguese"], "🇵🇹"),
    (&["ru", "rus", "russian"], "🇷🇺"),
    (&["ja", "jpn", "japanese"], "🇯🇵"),
    (&["ko", "kor", "korean"], "🇰🇷"),
    (&["zh", "chi", "zho", "chinese"], "🇨🇳"),
    (&["hi", "hin", "hindi"], "🇮🇳"),
    (&["ta", "tam", "tamil"], "🇮🇳"),
    (&["te", "tel", "telugu"], "🇮🇳"),
    (&["ml", "mal", "malayalam"], "🇮🇳"),
    (&["kn", "kan", "kannada"], "🇮🇳"),
    (&["bn", "ben", "bengali"], "🇧🇩"),
    (&["ar", "ara", "arabic"], "🇸🇦"),
    (&["tr", "tur", "turkish"], "🇹🇷"),
    (&["nl", "dut", "nld", "dutch"], "🇳🇱"),
    (&["sv", "swe", "swedish"], "🇸🇪"),
    (&["no", "nor", "norwegian"], "🇳🇴"),
    (&["da", "dan", "danish"], "🇩🇰"),
    (&["fi", "fin", "finnish"], "🇫🇮"),
    (&["pl", "pol", "polish"], "🇵🇱"),
    (&["cs", "cze", "ces", "czech"], "🇨🇿"),
    (&["hu", "hun", "hungarian"], "🇭🇺"),
    (&["el", "gre", "ell", "greek"], "🇬🇷"),
    (&["he", "heb", "hebrew"], "🇮🇱"),
    (&["th", "tha", "thai"], "🇹🇭"),
    (&["vi", "vie", "vietnamese"], "🇻🇳"),
    (&["id", "ind", "indonesian"], "🇮🇩"),
    (&["ms", "may", "msa", "malay"], "🇲🇾"),
    (&["uk", "ukr", "ukrainian"], "🇺🇦"),
    (&["ro", "rum", "ron", "romanian"], "🇷🇴"),
    (&["fa", "per", "fas", "persian"], "🇮🇷"),
];

/// Flag for a language code or English name, matched case-insensitively.
pub fn language_flag(language: &str) -> &'static str {
    let key = language.trim().to_lowercase();
    LANGUAGE_FLAGS
        .iter()
        .find(|(keys, _)| keys.contains(&key.as_str()))
        .map(|(_, flag)| *flag)
        .unwrap_or(PLACEHOLDER_FLAG)
}

/// Upper-case the first character: `"en" → "En"`.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
