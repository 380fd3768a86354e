//! Entity note extraction (Person, Organization, GPE).
//!
//! Classification comes from the note's directory under `id/`; notes with
//! an unrecognized directory or no `id` front-matter field are skipped,
//! not errors. Specific typed relations come from named front-matter
//! fields, each wrapped independently so one malformed field drops only
//! that relation. Reified structures merge two sources into the same
//! per-kind lists keyed by `rid`: legacy list-valued front-matter fields
//! and markdown body sections.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;

use korpus_core::reference::{self, FRONTMATTER_BLACKLIST};
use korpus_core::{
    EdgeType, EntityLabel, EntityRecord, ImportWarnings, JsonMap, Result, StructureItem,
    StructureKind,
};

use crate::entity_markdown::{self, apply_interval};
use crate::frontmatter;
use crate::vault::NoteSource;

static EXCESS_NEWLINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static ID_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[/id/[^\]]+\]\]").unwrap());
static ALIASED_ANY_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]|]+)\|([^\]]+)\]\]").unwrap());
static PLAIN_ANY_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap());
static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"  +").unwrap());

/// Extract an entity record from a note.
///
/// `Ok(None)` means the note does not classify as an entity; `Err` is a
/// note-boundary parse failure (malformed YAML, invalid asserted id).
pub fn extract(note: &NoteSource, warnings: &mut ImportWarnings) -> Result<Option<EntityRecord>> {
    let Some(label) = classify(&note.rel_path) else {
        return Ok(None);
    };

    let (raw_front_matter, body) = frontmatter::split_raw(&note.text);
    let front_matter = match raw_front_matter {
        Some(raw) => frontmatter::parse_strict(raw)?,
        None => serde_yaml::Mapping::new(),
    };

    let Some(raw_id) = frontmatter::get_str(&front_matter, "id") else {
        return Ok(None);
    };
    let entity_id = reference::clean(&raw_id, warnings, &note.rel_path, 0)?;

    if let Some(raw) = raw_front_matter {
        reference::detect_unquoted_frontmatter(raw, warnings, &note.rel_path);
    }

    // A legacy relation marker in the body usually means a mis-authored
    // note; flag it, keep parsing.
    if body.to_lowercase().contains("is_part_of") {
        warnings.log_legacy_marker_in_body(&note.rel_path, &entity_id);
    }

    let mut all_links = reference::extract_all(body, warnings, &note.rel_path);
    all_links.extend(reference::extract_from_mapping(
        &serde_yaml::Value::Mapping(front_matter.clone()),
        FRONTMATTER_BLACKLIST,
        warnings,
        &note.rel_path,
    ));

    let mut specific_links: BTreeSet<String> = BTreeSet::new();
    let mut specific_relations: BTreeMap<EdgeType, Vec<String>> = BTreeMap::new();

    if let Some(gpe_raw) = frontmatter::get_str(&front_matter, "gpe") {
        if let Ok(gpe_id) = reference::clean(&gpe_raw, warnings, &note.rel_path, 0) {
            specific_links.insert(gpe_id.clone());
            specific_relations.insert(EdgeType::LocatedIn, vec![gpe_id]);
        }
    }

    let parent_ids = parse_is_part_of(&front_matter, warnings, &note.rel_path);
    if !parent_ids.is_empty() {
        specific_links.extend(parent_ids.iter().cloned());
        specific_relations.insert(EdgeType::IsPartOf, parent_ids);
    }

    // Legacy front-matter structures (Person only), then markdown body
    // sections; both feed the same per-kind lists.
    let mut structures: BTreeMap<StructureKind, Vec<StructureItem>> = BTreeMap::new();
    if label == EntityLabel::Person {
        parse_legacy_structures(
            &front_matter,
            &entity_id,
            &mut structures,
            &mut specific_links,
            &mut specific_relations,
            warnings,
            &note.rel_path,
        );
    }

    let markdown_structures = entity_markdown::parse_structures(label, body);
    for (kind, items) in markdown_structures {
        for item in &items {
            harvest_structure_links(
                kind,
                item,
                &mut specific_links,
                &mut specific_relations,
            );
        }
        structures.entry(kind).or_default().extend(items);
    }

    let (_, generic_references) = reference::categorize(&all_links, &specific_links, &entity_id);

    let properties = build_properties(label, &front_matter, body);

    Ok(Some(EntityRecord {
        id: entity_id,
        label,
        properties,
        structures,
        specific_relations,
        generic_references,
    }))
}

/// Directory-to-label classification: the segment after `id/` decides.
fn classify(rel_path: &str) -> Option<EntityLabel> {
    let mut segments = rel_path.split('/');
    while let Some(segment) = segments.next() {
        if segment == "id" {
            return EntityLabel::from_dir_segment(segments.next()?);
        }
    }
    None
}

fn parse_is_part_of(
    front_matter: &serde_yaml::Mapping,
    warnings: &mut ImportWarnings,
    file: &str,
) -> Vec<String> {
    let raw_parts: Vec<String> = match front_matter.get("is_part_of") {
        Some(serde_yaml::Value::String(s)) => vec![s.clone()],
        Some(serde_yaml::Value::Sequence(seq)) => seq
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    raw_parts
        .iter()
        .filter_map(|raw| reference::clean(raw, warnings, file, 0).ok())
        .collect()
}

// =============================================================================
// LEGACY FRONT-MATTER STRUCTURES
// =============================================================================

#[allow(clippy::too_many_arguments)]
fn parse_legacy_structures(
    front_matter: &serde_yaml::Mapping,
    entity_id: &str,
    structures: &mut BTreeMap<StructureKind, Vec<StructureItem>>,
    specific_links: &mut BTreeSet<String>,
    specific_relations: &mut BTreeMap<EdgeType, Vec<String>>,
    warnings: &mut ImportWarnings,
    file: &str,
) {
    let field_kinds = [
        ("occupations", StructureKind::Occupations),
        ("names", StructureKind::Names),
        ("origins", StructureKind::Origins),
        ("relations_family", StructureKind::FamilyRelations),
        ("professional_relations", StructureKind::ProfessionalRelations),
    ];

    for (field, kind) in field_kinds {
        let Some(serde_yaml::Value::Sequence(items)) = front_matter.get(field) else {
            continue;
        };

        for item in items {
            let Some(mapping) = item.as_mapping() else {
                continue;
            };
            let Some(structure) = parse_legacy_item(kind, mapping, warnings, file) else {
                warnings.log_structure_missing_rid(entity_id, kind.as_str());
                continue;
            };
            harvest_structure_links(kind, &structure, specific_links, specific_relations);
            structures.entry(kind).or_default().push(structure);
        }
    }
}

/// Parse one legacy list item. `None` when the item lacks its `rid`.
fn parse_legacy_item(
    kind: StructureKind,
    item: &serde_yaml::Mapping,
    warnings: &mut ImportWarnings,
    file: &str,
) -> Option<StructureItem> {
    let mut properties = JsonMap::new();
    let mut target_id = None;

    let put_str = |props: &mut JsonMap, key: &str, value: Option<String>| {
        if let Some(value) = value {
            props.insert(key.to_string(), value.into());
        }
    };

    match kind {
        StructureKind::Occupations => {
            put_str(&mut properties, "type_activity", item_str(item, "type_activity"));
            put_str(&mut properties, "position_title", item_str(item, "position_title"));
            if let Some(org_raw) = item_str(item, "organization") {
                if let Ok(org_id) = reference::clean(&org_raw, warnings, file, 0) {
                    properties.insert("organization".to_string(), org_id.into());
                }
            }
        }
        StructureKind::Names => {
            put_str(&mut properties, "display", item_str(item, "display"));
            put_str(&mut properties, "lang", item_str(item, "lang"));
            put_str(&mut properties, "type", item_str(item, "type"));
            if let Some(serde_yaml::Value::Mapping(parts)) = item.get("parts") {
                put_str(&mut properties, "parts_family", item_str(parts, "family"));
                put_str(&mut properties, "parts_given", item_str(parts, "given"));
                put_str(&mut properties, "parts_particle", item_str(parts, "particle"));
            }
        }
        StructureKind::Origins => {
            put_str(&mut properties, "mode", item_str(item, "mode"));
            if let Some(place_raw) = item_str(item, "place") {
                if let Ok(place_id) = reference::clean(&place_raw, warnings, file, 0) {
                    properties.insert("place".to_string(), place_id.into());
                }
            }
            let is_primary = item
                .get("is_primary")
                .and_then(serde_yaml::Value::as_bool)
                .unwrap_or(false);
            properties.insert("is_primary".to_string(), is_primary.into());
        }
        StructureKind::FamilyRelations => {
            put_str(&mut properties, "relation_type", item_str(item, "relation_type"));
            if let Some(target_raw) = item_str(item, "target") {
                if let Ok(id) = reference::clean(&target_raw, warnings, file, 0) {
                    properties.insert("target".to_string(), id.clone().into());
                    target_id = Some(id);
                }
            }
        }
        StructureKind::ProfessionalRelations => {
            put_str(&mut properties, "relation_type", item_str(item, "relation_type"));
            if let Some(target_raw) = item_str(item, "target") {
                if let Ok(id) = reference::clean(&target_raw, warnings, file, 0) {
                    properties.insert("target".to_string(), id.clone().into());
                    target_id = Some(id);
                }
            }
            if let Some(org_raw) = item_str(item, "organization_context") {
                if let Ok(org_id) = reference::clean(&org_raw, warnings, file, 0) {
                    properties.insert("organization_context".to_string(), org_id.into());
                }
            }
        }
        StructureKind::Residences => {}
    }

    if let Some(interval) = item_str(item, "interval") {
        properties.insert("interval".to_string(), interval.into());
    }
    apply_interval(&mut properties);

    if let Some(serde_yaml::Value::Mapping(provenance)) = item.get("provenance") {
        for key in ["doc", "page", "quote", "evidence_type", "confidence"] {
            if let Some(value) = provenance.get(key) {
                properties.insert(key.to_string(), frontmatter::yaml_to_json(value));
            }
        }
    }

    let rid = item_str(item, "rid")?;
    properties.insert("rid".to_string(), rid.clone().into());

    Some(StructureItem {
        rid: Some(rid),
        target_id,
        properties,
    })
}

fn item_str(item: &serde_yaml::Mapping, key: &str) -> Option<String> {
    match item.get(key)? {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Pull specific relation targets out of a structure item: occupation
/// organizations become WORKED_FOR, relation targets and origin places
/// become specific links (so they never double as generic references).
fn harvest_structure_links(
    kind: StructureKind,
    item: &StructureItem,
    specific_links: &mut BTreeSet<String>,
    specific_relations: &mut BTreeMap<EdgeType, Vec<String>>,
) {
    match kind {
        StructureKind::Occupations => {
            if let Some(org_id) = item.property_str("organization") {
                specific_links.insert(org_id.to_string());
                let worked_for = specific_relations.entry(EdgeType::WorkedFor).or_default();
                if !worked_for.iter().any(|id| id == org_id) {
                    worked_for.push(org_id.to_string());
                }
            }
        }
        StructureKind::FamilyRelations | StructureKind::ProfessionalRelations => {
            if let Some(target_id) = &item.target_id {
                specific_links.insert(target_id.clone());
            }
        }
        StructureKind::Origins => {
            if let Some(place_id) = item.property_str("place") {
                specific_links.insert(place_id.to_string());
            }
        }
        StructureKind::Names | StructureKind::Residences => {}
    }
}

// =============================================================================
// BASE PROPERTIES
// =============================================================================

fn build_properties(
    label: EntityLabel,
    front_matter: &serde_yaml::Mapping,
    body: &str,
) -> JsonMap {
    let mut properties = JsonMap::new();

    properties.insert(
        "prefLabel_fr".to_string(),
        frontmatter::get_str(front_matter, "prefLabel_fr")
            .unwrap_or_default()
            .into(),
    );
    properties.insert(
        "prefLabel_de".to_string(),
        frontmatter::get_str(front_matter, "prefLabel_de")
            .unwrap_or_default()
            .into(),
    );
    properties.insert(
        "aliases".to_string(),
        front_matter
            .get("aliases")
            .map(frontmatter::yaml_to_json)
            .unwrap_or_else(|| serde_json::Value::Array(Vec::new())),
    );
    properties.insert(
        "sameAs".to_string(),
        front_matter
            .get("sameAs")
            .map(frontmatter::yaml_to_json)
            .unwrap_or_else(|| serde_json::Value::Array(Vec::new())),
    );
    properties.insert(
        "status".to_string(),
        frontmatter::get_str(front_matter, "status")
            .unwrap_or_else(|| "active".to_string())
            .into(),
    );

    match label {
        EntityLabel::Person => {
            if let Some(notice) = extract_notice_section(body, "Notice biographique") {
                properties.insert("notice_bio".to_string(), notice.into());
            }
        }
        EntityLabel::Organization => {
            if let Some(notice) = extract_notice_section(body, "Notice institutionnelle") {
                properties.insert("notice_institutionnelle".to_string(), notice.into());
            }
            properties.insert(
                "type".to_string(),
                frontmatter::get_str(front_matter, "type")
                    .unwrap_or_default()
                    .into(),
            );
        }
        EntityLabel::Gpe => {
            if let Some(notice) = extract_notice_section(body, "Notice géographique") {
                properties.insert("notice_geo".to_string(), notice.into());
            }
            apply_gpe_coordinates(front_matter, &mut properties);
            if let Some(geonames) = front_matter.get("geonames_id") {
                properties.insert("geonames_id".to_string(), frontmatter::yaml_to_json(geonames));
            }
        }
    }

    properties
}

/// GPE coordinates arrive either as an Obsidian-friendly list
/// (`['system WGS84', 'lat 53.8655', 'lon 10.6866']`) or as a `lat`/`lon`
/// mapping.
fn apply_gpe_coordinates(front_matter: &serde_yaml::Mapping, properties: &mut JsonMap) {
    match front_matter.get("coordinates") {
        Some(serde_yaml::Value::Sequence(items)) => {
            for item in items {
                let Some(text) = item.as_str() else { continue };
                let lower = text.to_lowercase();
                let key = if lower.starts_with("lat ") {
                    "coordinates_lat"
                } else if lower.starts_with("lon ") {
                    "coordinates_lon"
                } else {
                    continue;
                };
                if let Some(value) = text
                    .split_whitespace()
                    .nth(1)
                    .and_then(|v| v.parse::<f64>().ok())
                {
                    properties.insert(key.to_string(), value.into());
                }
            }
        }
        Some(serde_yaml::Value::Mapping(coords)) => {
            for (src, dst) in [("lat", "coordinates_lat"), ("lon", "coordinates_lon")] {
                if let Some(value) = coords.get(src) {
                    properties.insert(dst.to_string(), frontmatter::yaml_to_json(value));
                }
            }
        }
        _ => {}
    }
}

/// Extract a `## <title>` section's prose, wikilinks reduced to their
/// display text.
fn extract_notice_section(body: &str, title: &str) -> Option<String> {
    let lines: Vec<&str> = body.lines().collect();
    let start = lines.iter().position(|l| {
        l.strip_prefix("##")
            .map(|rest| !rest.starts_with('#') && rest.trim() == title)
            .unwrap_or(false)
    })?;

    let section: Vec<&str> = lines[start + 1..]
        .iter()
        .take_while(|l| !l.starts_with("##"))
        .copied()
        .collect();

    let content = section.join("\n");
    let content = EXCESS_NEWLINES_RE.replace_all(content.trim(), "\n\n");
    let content = ALIASED_ANY_LINK_RE.replace_all(&content, "$2");
    let content = ID_LINK_RE.replace_all(&content, "");
    let content = PLAIN_ANY_LINK_RE.replace_all(&content, "$1");
    let content = MULTI_SPACE_RE.replace_all(&content, " ");

    let content = content.trim().to_string();
    (content.len() > 10).then_some(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const UUID: &str = "3b1e2b2a-9c4d-4c1e-8f2a-1b2c3d4e5f6a";
    const GPE_UUID: &str = "aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee";
    const ORG_UUID: &str = "aaaaaaaa-bbbb-4ccc-8ddd-ffffffffffff";

    fn note(rel_path: &str, text: &str) -> NoteSource {
        NoteSource {
            path: PathBuf::from(format!("/vault/{rel_path}")),
            rel_path: rel_path.to_string(),
            file_name: rel_path.rsplit('/').next().unwrap().to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_unrecognized_directory_is_skipped() {
        let mut warnings = ImportWarnings::new();
        let n = note("sources/letter.md", "---\nid: x\n---\nBody\n");
        assert!(extract(&n, &mut warnings).unwrap().is_none());
    }

    #[test]
    fn test_missing_id_is_skipped() {
        let mut warnings = ImportWarnings::new();
        let n = note("id/person/dupont.md", "---\nprefLabel_fr: Dupont\n---\nBody\n");
        assert!(extract(&n, &mut warnings).unwrap().is_none());
    }

    #[test]
    fn test_person_with_gpe_specific_relation() {
        let mut warnings = ImportWarnings::new();
        let text = format!(
            "---\nid: \"[[/id/person/{UUID}]]\"\nprefLabel_fr: Dupont\ngpe: \"[[/id/gpe/{GPE_UUID}]]\"\n---\nBody also mentions [[/id/gpe/{GPE_UUID}]] inline.\n"
        );
        let n = note("id/person/dupont.md", &text);
        let entity = extract(&n, &mut warnings).unwrap().unwrap();

        assert_eq!(entity.label, EntityLabel::Person);
        assert_eq!(entity.id, format!("/id/person/{UUID}"));
        assert_eq!(
            entity.specific_relations.get(&EdgeType::LocatedIn),
            Some(&vec![format!("/id/gpe/{GPE_UUID}")])
        );
        // The identical body link must not surface again as generic.
        assert!(entity.generic_references.is_empty());
    }

    #[test]
    fn test_generic_reference_excludes_self() {
        let mut warnings = ImportWarnings::new();
        let text = format!(
            "---\nid: \"[[/id/person/{UUID}]]\"\n---\nSelf link [[/id/person/{UUID}]] and other [[/id/gpe/{GPE_UUID}]].\n"
        );
        let n = note("id/person/dupont.md", &text);
        let entity = extract(&n, &mut warnings).unwrap().unwrap();

        assert!(!entity.generic_references.contains(&entity.id));
        assert!(entity
            .generic_references
            .contains(&format!("/id/gpe/{GPE_UUID}")));
    }

    #[test]
    fn test_place_directory_maps_to_gpe() {
        let mut warnings = ImportWarnings::new();
        let text = format!("---\nid: \"[[/id/place/{GPE_UUID}]]\"\n---\nBody\n");
        let n = note("id/place/geneve.md", &text);
        let entity = extract(&n, &mut warnings).unwrap().unwrap();
        assert_eq!(entity.label, EntityLabel::Gpe);
    }

    #[test]
    fn test_legacy_occupations_feed_worked_for() {
        let mut warnings = ImportWarnings::new();
        let text = format!(
            "---\nid: \"[[/id/person/{UUID}]]\"\noccupations:\n  - rid: OCC-1\n    type_activity: diplomatie\n    organization: \"[[/id/org/{ORG_UUID}]]\"\n    interval: \"1941/1943\"\n    provenance:\n      doc: rapport-1942\n      confidence: high\n---\nBody\n"
        );
        let n = note("id/person/dupont.md", &text);
        let entity = extract(&n, &mut warnings).unwrap().unwrap();

        let occupations = entity.structures.get(&StructureKind::Occupations).unwrap();
        assert_eq!(occupations.len(), 1);
        assert_eq!(occupations[0].rid.as_deref(), Some("OCC-1"));
        assert_eq!(occupations[0].property_str("date_start"), Some("1941-01-01"));
        assert_eq!(occupations[0].property_str("confidence"), Some("high"));
        assert_eq!(
            entity.specific_relations.get(&EdgeType::WorkedFor),
            Some(&vec![format!("/id/org/{ORG_UUID}")])
        );
    }

    #[test]
    fn test_legacy_item_without_rid_warns_and_drops() {
        let mut warnings = ImportWarnings::new();
        let text = format!(
            "---\nid: \"[[/id/person/{UUID}]]\"\nnames:\n  - display: Dupont\n---\nBody\n"
        );
        let n = note("id/person/dupont.md", &text);
        let entity = extract(&n, &mut warnings).unwrap().unwrap();

        assert!(entity.structures.get(&StructureKind::Names).is_none());
        assert_eq!(warnings.structure_missing_rid.len(), 1);
    }

    #[test]
    fn test_markdown_and_frontmatter_structures_merge() {
        let mut warnings = ImportWarnings::new();
        let text = format!(
            "---\nid: \"[[/id/person/{UUID}]]\"\nnames:\n  - rid: NAME-1\n    display: Dupont\n---\n## Appellations\n\n### Variante\n- **RID** : NAME-2\n- **Display** : Du Pont\n"
        );
        let n = note("id/person/dupont.md", &text);
        let entity = extract(&n, &mut warnings).unwrap().unwrap();

        let names = entity.structures.get(&StructureKind::Names).unwrap();
        let rids: Vec<&str> = names.iter().filter_map(|i| i.rid.as_deref()).collect();
        assert_eq!(rids, ["NAME-1", "NAME-2"]);
    }

    #[test]
    fn test_is_part_of_in_body_raises_flag() {
        let mut warnings = ImportWarnings::new();
        let text = format!(
            "---\nid: \"[[/id/org/{ORG_UUID}]]\"\n---\nThis org has is_part_of written in prose.\n"
        );
        let n = note("id/org/division.md", &text);
        extract(&n, &mut warnings).unwrap().unwrap();
        assert_eq!(warnings.legacy_marker_in_body.len(), 1);
    }

    #[test]
    fn test_is_part_of_string_and_list_forms() {
        let mut warnings = ImportWarnings::new();
        let text = format!(
            "---\nid: \"[[/id/org/{ORG_UUID}]]\"\nis_part_of:\n  - \"[[/id/org/{UUID}]]\"\n---\nBody\n"
        );
        let n = note("id/org/division.md", &text);
        let entity = extract(&n, &mut warnings).unwrap().unwrap();
        assert_eq!(
            entity.specific_relations.get(&EdgeType::IsPartOf),
            Some(&vec![format!("/id/org/{UUID}")])
        );
    }

    #[test]
    fn test_gpe_coordinates_list_format() {
        let mut warnings = ImportWarnings::new();
        let text = format!(
            "---\nid: \"[[/id/gpe/{GPE_UUID}]]\"\ncoordinates:\n  - system WGS84\n  - lat 53.8655\n  - lon 10.6866\ngeonames_id: 2875601\n---\nBody\n"
        );
        let n = note("id/gpe/luebeck.md", &text);
        let entity = extract(&n, &mut warnings).unwrap().unwrap();

        assert_eq!(
            entity.properties.get("coordinates_lat").and_then(|v| v.as_f64()),
            Some(53.8655)
        );
        assert_eq!(
            entity.properties.get("coordinates_lon").and_then(|v| v.as_f64()),
            Some(10.6866)
        );
        assert_eq!(
            entity.properties.get("geonames_id").and_then(|v| v.as_i64()),
            Some(2875601)
        );
    }

    #[test]
    fn test_notice_section_extracted_and_cleaned() {
        let mut warnings = ImportWarnings::new();
        let text = format!(
            "---\nid: \"[[/id/person/{UUID}]]\"\n---\n## Notice biographique\n\nConsul suisse mentionné avec [[/id/gpe/{GPE_UUID}|Genève]] dans plusieurs rapports.\n\n## Appellations\n"
        );
        let n = note("id/person/dupont.md", &text);
        let entity = extract(&n, &mut warnings).unwrap().unwrap();

        let notice = entity.properties.get("notice_bio").and_then(|v| v.as_str()).unwrap();
        assert!(notice.contains("Genève"));
        assert!(!notice.contains("[["));
    }

    #[test]
    fn test_malformed_yaml_is_note_boundary_error() {
        let mut warnings = ImportWarnings::new();
        let n = note("id/person/dupont.md", "---\nkey: [unclosed\n---\nBody\n");
        assert!(extract(&n, &mut warnings).is_err());
    }

    #[test]
    fn test_default_status_is_active() {
        let mut warnings = ImportWarnings::new();
        let text = format!("---\nid: \"[[/id/person/{UUID}]]\"\n---\nBody\n");
        let n = note("id/person/dupont.md", &text);
        let entity = extract(&n, &mut warnings).unwrap().unwrap();
        assert_eq!(
            entity.properties.get("status").and_then(|v| v.as_str()),
            Some("active")
        );
    }
}
