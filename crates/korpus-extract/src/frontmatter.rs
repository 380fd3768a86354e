//! Front-matter / body splitting.
//!
//! A note's front matter is a YAML block opened by a `---` delimiter on
//! the first line and closed by the next occurrence of the delimiter.
//! Documents tolerate malformed YAML (the whole text becomes the body);
//! entity notes parse strictly and fail at the note boundary.

use korpus_core::Result;

/// Front-matter delimiter token.
pub const DELIMITER: &str = "---";

/// Split off the raw (unparsed) front-matter text.
///
/// Returns `(raw_yaml, body)`; `raw_yaml` is `None` when the text does not
/// open with the delimiter or the block never closes.
pub fn split_raw(text: &str) -> (Option<&str>, &str) {
    if !text.starts_with(DELIMITER) {
        return (None, text);
    }

    let mut parts = text.splitn(3, DELIMITER);
    let _prefix = parts.next();
    match (parts.next(), parts.next()) {
        (Some(raw), Some(body)) => (Some(raw), body.trim_start_matches('\n')),
        _ => (None, text),
    }
}

/// Lenient split: parse the front matter, falling back to an empty mapping
/// and the whole text as body on any YAML error.
pub fn split_lenient(text: &str) -> (serde_yaml::Mapping, &str) {
    let (raw, body) = split_raw(text);
    let Some(raw) = raw else {
        return (serde_yaml::Mapping::new(), body);
    };

    match serde_yaml::from_str::<serde_yaml::Value>(raw) {
        Ok(serde_yaml::Value::Mapping(mapping)) => (mapping, body),
        Ok(_) | Err(_) => (serde_yaml::Mapping::new(), text),
    }
}

/// Strict parse of a raw front-matter block into a mapping.
///
/// Non-mapping YAML yields an empty mapping; malformed YAML is an error
/// the caller records at the note boundary.
pub fn parse_strict(raw: &str) -> Result<serde_yaml::Mapping> {
    match serde_yaml::from_str::<serde_yaml::Value>(raw)? {
        serde_yaml::Value::Mapping(mapping) => Ok(mapping),
        _ => Ok(serde_yaml::Mapping::new()),
    }
}

/// String-valued front-matter field.
pub fn get_str(mapping: &serde_yaml::Mapping, key: &str) -> Option<String> {
    match mapping.get(key)? {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Convert a YAML value into its JSON counterpart for storage.
pub fn yaml_to_json(value: &serde_yaml::Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}
