//! Reified-structure parsing from entity markdown bodies.
//!
//! The body contract is literal: a level-2 heading from the fixed
//! per-label map opens a structure section, each `###` item inside holds
//! `- **Key**: value` property lines, and an optional `- **Provenance** :`
//! marker opens an indented sub-block of `- key : value` lines. Items
//! without a RID are discarded. Parsed as a tolerant line state machine.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use korpus_core::{EdtfDate, EntityLabel, JsonMap, StructureItem, StructureKind};

/// Heading → structure-kind map, per entity label.
pub fn section_map(label: EntityLabel) -> &'static [(&'static str, StructureKind)] {
    match label {
        EntityLabel::Person => &[
            ("## Appellations", StructureKind::Names),
            ("## Origines", StructureKind::Origins),
            ("## Lieux de résidence", StructureKind::Residences),
            ("## Occupations", StructureKind::Occupations),
            ("## Relations familiales", StructureKind::FamilyRelations),
            ("## Relations professionnelles", StructureKind::ProfessionalRelations),
        ],
        EntityLabel::Organization => {
            &[("## Appellations institutionnelles", StructureKind::Names)]
        }
        EntityLabel::Gpe => &[("## Appellations géographiques", StructureKind::Names)],
    }
}

static MAIN_PROP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-\s*\*\*(.+?)\*\*\s*:\s*(.+)$").unwrap());
static PROVENANCE_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-\s*\*\*Provenance\*\*\s*:?\s*$").unwrap());
static PROV_KV_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-\s*(.+?)\s*:\s*(.+)$").unwrap());
static UUID_TARGET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[(/id/\w+/[a-fA-F0-9-]{36})(?:\|[^\]]+)?\]\]").unwrap());
static SLUG_TARGET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[(/id/\w+/[a-zA-Z0-9_-]+)(?:\|[^\]]+)?\]\]").unwrap());
static DOC_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]|]+)(?:\|[^\]]+)?\]\]").unwrap());
static PARTS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\s*(\w+)\s*:\s*(.+)").unwrap());

/// Keys that hold wikilink-valued entity targets.
const WIKILINK_KEYS: &[&str] = &["place", "organization", "target", "organization_context"];

/// Parse all structure sections of a body for the given label.
pub fn parse_structures(
    label: EntityLabel,
    body: &str,
) -> BTreeMap<StructureKind, Vec<StructureItem>> {
    let mut structures: BTreeMap<StructureKind, Vec<StructureItem>> = BTreeMap::new();

    for (heading, kind) in section_map(label) {
        let items = parse_section(body, heading);
        if !items.is_empty() {
            structures.entry(*kind).or_default().extend(items);
        }
    }

    structures
}

/// Collect the `###` items of one level-2 section.
fn parse_section(body: &str, heading: &str) -> Vec<StructureItem> {
    let lines: Vec<&str> = body.lines().collect();

    let Some(start) = lines.iter().position(|l| l.trim_end() == heading) else {
        return Vec::new();
    };

    // Section runs until the next level-2 heading (### stays inside).
    let section: Vec<&str> = lines[start + 1..]
        .iter()
        .take_while(|l| !(l.starts_with("##") && !l.starts_with("###")))
        .copied()
        .collect();

    let mut items = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in section {
        if line.starts_with("###") {
            if let Some(item_lines) = current.take() {
                items.extend(parse_item(&item_lines));
            }
            current = Some(Vec::new());
            continue;
        }
        if let Some(item_lines) = current.as_mut() {
            item_lines.push(line);
        }
    }
    if let Some(item_lines) = current.take() {
        items.extend(parse_item(&item_lines));
    }

    items
}

/// Parse one `###` item into a structure record; items without a RID are
/// dropped.
fn parse_item(lines: &[&str]) -> Option<StructureItem> {
    let mut properties = JsonMap::new();
    let mut provenance: Vec<(String, String)> = Vec::new();
    let mut in_provenance = false;

    for raw in lines {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with("###") {
            continue;
        }

        if PROVENANCE_MARKER_RE.is_match(trimmed) {
            in_provenance = true;
            continue;
        }

        if in_provenance {
            let indented = raw.starts_with(' ') || raw.starts_with('\t');
            if indented && trimmed.starts_with("- ") {
                if let Some(caps) = PROV_KV_RE.captures(trimmed) {
                    let key = caps[1].trim().to_lowercase().replace(' ', "_");
                    let value = clean_provenance_value(&key, caps[2].trim());
                    provenance.push((key, value));
                }
                continue;
            }
            in_provenance = false;
        }

        if let Some(caps) = MAIN_PROP_RE.captures(trimmed) {
            if let Some(key) = normalize_property_key(caps[1].trim()) {
                if let Some(value) = parse_property_value(key, caps[2].trim()) {
                    properties.insert(key.to_string(), value);
                }
            }
        }
    }

    for (key, value) in provenance {
        // The sub-block uses "evidence"; records store "evidence_type".
        let key = if key == "evidence" { "evidence_type".to_string() } else { key };
        properties.entry(key).or_insert_with(|| value.clone().into());
    }

    apply_interval(&mut properties);

    if properties.is_empty() {
        return None;
    }

    let rid = properties
        .get("rid")
        .and_then(|v| v.as_str())
        .map(str::to_string)?;
    let target_id = properties
        .get("target")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Some(StructureItem {
        rid: Some(rid),
        target_id,
        properties,
    })
}

/// Derive `date_start`/`date_end`/`date_precision` from a raw `interval`
/// property.
pub(crate) fn apply_interval(properties: &mut JsonMap) {
    let Some(interval) = properties.get("interval").and_then(|v| v.as_str()) else {
        return;
    };
    let date = EdtfDate::parse(interval);
    if let Some(start) = date.start {
        properties.insert("date_start".to_string(), start.into());
    }
    if let Some(end) = date.end {
        properties.insert("date_end".to_string(), end.into());
    }
    properties.insert(
        "date_precision".to_string(),
        date.precision.as_str().into(),
    );
}

/// Markdown display key → record key.
fn normalize_property_key(key: &str) -> Option<&'static str> {
    Some(match key {
        "RID" => "rid",
        "Type" => "type",
        "Type de relation" => "relation_type",
        "Type d'activité" => "type_activity",
        "Display" => "display",
        "Parts" => "parts",
        "Lang" => "lang",
        "Intervalle" => "interval",
        "Spouse" => "spouse",
        "Mode" => "mode",
        "Lieu" => "place",
        "Organisation" => "organization",
        "Titre du poste" => "position_title",
        "Cible" => "target",
        "Organisation contexte" => "organization_context",
        "Note" => "note",
        _ => return None,
    })
}

fn parse_property_value(key: &str, value: &str) -> Option<serde_json::Value> {
    // Vocabulary tags stay verbatim.
    if value.starts_with('#') {
        return Some(value.into());
    }

    if WIKILINK_KEYS.contains(&key) {
        return extract_wikilink_id(value).map(Into::into);
    }

    if key == "parts" {
        return Some(parse_parts(value));
    }

    if value.is_empty() || value == "null" {
        return None;
    }

    Some(value.into())
}

/// Extract a target id from a wikilink, accepting UUID targets first and
/// textual slugs (`/id/gpe/geneve`) as a fallback.
fn extract_wikilink_id(text: &str) -> Option<String> {
    if let Some(caps) = UUID_TARGET_RE.captures(text) {
        return Some(caps[1].to_string());
    }
    SLUG_TARGET_RE
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Extract the bare document name from a `[[doc-name]]` provenance value.
fn extract_doc_link(text: &str) -> Option<String> {
    DOC_LINK_RE.captures(text).map(|caps| caps[1].to_string())
}

fn clean_provenance_value(key: &str, value: &str) -> String {
    match key {
        "doc" => extract_doc_link(value).unwrap_or_else(|| value.to_string()),
        "quote" => value.trim_matches('"').to_string(),
        _ => value.to_string(),
    }
}

fn parse_parts(text: &str) -> serde_json::Value {
    let mut parts = JsonMap::new();
    for caps in PARTS_RE.captures_iter(text) {
        let value = caps[2].trim();
        parts.insert(
            caps[1].to_string(),
            if value.is_empty() {
                serde_json::Value::Null
            } else {
                value.into()
            },
        );
    }
    serde_json::Value::Object(parts)
}
