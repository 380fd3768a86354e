//! Typed cross-reference extraction and validation.
//!
//! The reference grammar is `[[/id/<type>/<uuid>]]`, optionally with an
//! `|alias` suffix, where `<type>` is one of `person`, `org`, `gpe`,
//! `place` and `<uuid>` is 36 characters of hex-and-dashes. `clean` is the
//! single normalization point: everything that ends up in a record passed
//! through it, so a reference either matches the strict grammar or is
//! dropped — partially-cleaned ids never propagate.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::warnings::ImportWarnings;

/// Front-matter fields known to contain free prose that incidentally
/// matches the link pattern; never scanned for references.
pub const FRONTMATTER_BLACKLIST: &[&str] = &["quote", "source_quote", "note", "doc", "page"];

static WIKILINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[/?(id/(?:person|org|gpe|place)/[0-9a-fA-F-]{36})(?:\|[^\]]+)?\]\]").unwrap()
});

static ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/id/(?:person|org|gpe|place)/[0-9a-fA-F-]{36}$").unwrap());

static FRONTMATTER_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[/id/[^\]]+\]\]").unwrap());

/// Clean and normalize a raw reference into a canonical id.
///
/// Strips surrounding brackets and any alias suffix, auto-prepends a
/// missing leading slash (logged, not an error), then validates against
/// the strict grammar. On mismatch the reference is logged and an error
/// returned; callers drop the link.
pub fn clean(
    raw_link: &str,
    warnings: &mut ImportWarnings,
    file: &str,
    line: usize,
) -> Result<String> {
    let mut cleaned = raw_link.trim_matches(|c| c == '[' || c == ']').to_string();

    if let Some((head, _alias)) = cleaned.split_once('|') {
        cleaned = head.to_string();
    }

    if !cleaned.starts_with('/') {
        warnings.log_slash_correction(file, line, raw_link);
        cleaned = format!("/{cleaned}");
    }

    if !ID_RE.is_match(&cleaned) {
        let error = format!("does not match /id/<type>/<uuid> grammar: {cleaned}");
        warnings.log_invalid_reference(file, line, raw_link, &error);
        return Err(Error::Reference(cleaned));
    }

    Ok(cleaned)
}

/// Extract every valid reference id from a text.
///
/// Invalid matches are logged and silently discarded; the result is a
/// de-duplicated set (order irrelevant).
pub fn extract_all(text: &str, warnings: &mut ImportWarnings, file: &str) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();

    for captures in WIKILINK_RE.captures_iter(text) {
        let raw_id = &captures[1];
        let line = line_of_offset(text, captures.get(0).map(|m| m.start()).unwrap_or(0));

        if let Ok(id) = clean(raw_id, warnings, file, line) {
            ids.insert(id);
        }
    }

    ids
}

/// Recursively extract references from a nested YAML structure.
///
/// String leaves go through [`extract_all`]; keys in `blacklist` are
/// skipped, both as exact field names and as segments of a dotted path.
pub fn extract_from_mapping(
    data: &serde_yaml::Value,
    blacklist: &[&str],
    warnings: &mut ImportWarnings,
    file: &str,
) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    scan_value(data, None, blacklist, warnings, file, &mut ids);
    ids
}

fn scan_value(
    value: &serde_yaml::Value,
    parent_key: Option<&str>,
    blacklist: &[&str],
    warnings: &mut ImportWarnings,
    file: &str,
    ids: &mut BTreeSet<String>,
) {
    if let Some(key) = parent_key {
        if blacklist.contains(&key) {
            return;
        }
        if key.contains('.') && blacklist.iter().any(|bl| key.contains(bl)) {
            return;
        }
    }

    match value {
        serde_yaml::Value::String(text) => {
            ids.extend(extract_all(text, warnings, file));
        }
        serde_yaml::Value::Mapping(mapping) => {
            for (k, v) in mapping {
                let key = yaml_key_string(k);
                let path = match parent_key {
                    Some(parent) => format!("{parent}.{key}"),
                    None => key,
                };
                scan_value(v, Some(&path), blacklist, warnings, file, ids);
            }
        }
        serde_yaml::Value::Sequence(items) => {
            for item in items {
                scan_value(item, parent_key, blacklist, warnings, file, ids);
            }
        }
        _ => {}
    }
}

fn yaml_key_string(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Flag wikilinks in a raw front-matter block that are not wrapped in
/// quotes. Unquoted links survive YAML parsing with mangled values, so
/// they are reported for upstream correction.
pub fn detect_unquoted_frontmatter(raw_yaml: &str, warnings: &mut ImportWarnings, file: &str) {
    for m in FRONTMATTER_LINK_RE.find_iter(raw_yaml) {
        let before = raw_yaml[..m.start()].chars().next_back();
        let after = raw_yaml[m.end()..].chars().next();
        if before == Some('"') || after == Some('"') {
            continue;
        }

        let line_start = raw_yaml[..m.start()].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line_text = &raw_yaml[line_start..m.start()];
        let field = line_text
            .split_once(':')
            .map(|(f, _)| f.trim())
            .unwrap_or("unknown");

        warnings.log_unquoted_frontmatter(file, field, m.as_str());
    }
}

/// Split resolved links into specific relation targets and generic
/// references: `(specific, all − specific − {self_id})`.
pub fn categorize(
    all_links: &BTreeSet<String>,
    specific_links: &BTreeSet<String>,
    self_id: &str,
) -> (BTreeSet<String>, BTreeSet<String>) {
    let generic = all_links
        .iter()
        .filter(|id| !specific_links.contains(*id) && id.as_str() != self_id)
        .cloned()
        .collect();
    (specific_links.clone(), generic)
}

fn line_of_offset(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID: &str = "3b1e2b2a-9c4d-4c1e-8f2a-1b2c3d4e5f6a";

    #[test]
    fn test_clean_valid_reference() {
        let mut warnings = ImportWarnings::new();
        let raw = format!("[[/id/person/{UUID}]]");
        let cleaned = clean(&raw, &mut warnings, "a.md", 1).unwrap();
        assert_eq!(cleaned, format!("/id/person/{UUID}"));
        assert!(warnings.slash_corrections.is_empty());
    }

    #[test]
    fn test_clean_strips_alias() {
        let mut warnings = ImportWarnings::new();
        let raw = format!("[[/id/gpe/{UUID}|Genève]]");
        let cleaned = clean(&raw, &mut warnings, "a.md", 1).unwrap();
        assert_eq!(cleaned, format!("/id/gpe/{UUID}"));
    }

    #[test]
    fn test_clean_auto_prepends_slash() {
        let mut warnings = ImportWarnings::new();
        let raw = format!("[[id/person/{UUID}]]");
        let cleaned = clean(&raw, &mut warnings, "a.md", 7).unwrap();
        assert_eq!(cleaned, format!("/id/person/{UUID}"));
        assert_eq!(warnings.slash_corrections.len(), 1);
        assert_eq!(warnings.slash_corrections[0].line, 7);
    }

    #[test]
    fn test_clean_rejects_bad_uuid() {
        let mut warnings = ImportWarnings::new();
        let result = clean("[[/id/person/not-a-uuid]]", &mut warnings, "a.md", 1);
        assert!(result.is_err());
        assert_eq!(warnings.invalid_references.len(), 1);
    }

    #[test]
    fn test_clean_rejects_unknown_type() {
        let mut warnings = ImportWarnings::new();
        let raw = format!("[[/id/ship/{UUID}]]");
        assert!(clean(&raw, &mut warnings, "a.md", 1).is_err());
    }

    #[test]
    fn test_extract_all_dedups() {
        let mut warnings = ImportWarnings::new();
        let text = format!(
            "Saw [[/id/person/{UUID}]] again; see [[/id/person/{UUID}|the same man]]."
        );
        let ids = extract_all(&text, &mut warnings, "a.md");
        assert_eq!(ids.len(), 1);
        assert!(ids.contains(&format!("/id/person/{UUID}")));
    }

    #[test]
    fn test_extract_all_skips_invalid_and_keeps_valid() {
        let mut warnings = ImportWarnings::new();
        // The scanner pattern only picks up 36-char candidates; a stray
        // bracketed slug is simply not a reference.
        let text = format!("[[/id/person/{UUID}]] and [[not a link]]");
        let ids = extract_all(&text, &mut warnings, "a.md");
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_extract_from_mapping_respects_blacklist() {
        let mut warnings = ImportWarnings::new();
        let yaml: serde_yaml::Value = serde_yaml::from_str(&format!(
            "gpe: \"[[/id/gpe/{UUID}]]\"\nquote: \"[[/id/person/{UUID}]]\"\n"
        ))
        .unwrap();

        let ids = extract_from_mapping(&yaml, FRONTMATTER_BLACKLIST, &mut warnings, "a.md");
        assert_eq!(ids.len(), 1);
        assert!(ids.contains(&format!("/id/gpe/{UUID}")));
    }

    #[test]
    fn test_extract_from_mapping_recurses_lists_and_maps() {
        let mut warnings = ImportWarnings::new();
        let yaml: serde_yaml::Value = serde_yaml::from_str(&format!(
            "occupations:\n  - organization: \"[[/id/org/{UUID}]]\"\n"
        ))
        .unwrap();

        let ids = extract_from_mapping(&yaml, FRONTMATTER_BLACKLIST, &mut warnings, "a.md");
        assert!(ids.contains(&format!("/id/org/{UUID}")));
    }

    #[test]
    fn test_extract_from_mapping_skips_blacklisted_nested_path() {
        let mut warnings = ImportWarnings::new();
        let yaml: serde_yaml::Value = serde_yaml::from_str(&format!(
            "provenance:\n  doc: \"[[/id/person/{UUID}]]\"\n"
        ))
        .unwrap();

        let ids = extract_from_mapping(&yaml, FRONTMATTER_BLACKLIST, &mut warnings, "a.md");
        assert!(ids.is_empty());
    }

    #[test]
    fn test_detect_unquoted_frontmatter() {
        let mut warnings = ImportWarnings::new();
        let raw = format!("gpe: [[/id/gpe/{UUID}]]\nplace: \"[[/id/gpe/{UUID}]]\"\n");
        detect_unquoted_frontmatter(&raw, &mut warnings, "a.md");
        assert_eq!(warnings.unquoted_frontmatter.len(), 1);
        assert_eq!(warnings.unquoted_frontmatter[0].field, "gpe");
    }

    #[test]
    fn test_categorize_excludes_specific_and_self() {
        let self_id = format!("/id/person/{UUID}");
        let other = "/id/gpe/aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee".to_string();
        let specific_target = "/id/org/aaaaaaaa-bbbb-4ccc-8ddd-ffffffffffff".to_string();

        let all: BTreeSet<String> = [self_id.clone(), other.clone(), specific_target.clone()]
            .into_iter()
            .collect();
        let specific: BTreeSet<String> = [specific_target.clone()].into_iter().collect();

        let (spec, generic) = categorize(&all, &specific, &self_id);
        assert_eq!(spec.len(), 1);
        assert_eq!(generic.len(), 1);
        assert!(generic.contains(&other));
    }
}
