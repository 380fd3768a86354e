//! Event block extraction.
//!
//! Events live in `#event_id:` blocks inside document notes. Participant
//! fields (victim/agent/place) resolve through the reference grammar with
//! the unknown-authority sentinel preserved; free-text description and
//! observation paragraphs accumulate by mode-switching on `**Description**`
//! / `**Observations**` label lines.

use std::collections::{BTreeMap, BTreeSet};

use korpus_core::reference;
use korpus_core::{
    canonical_event_id, document_id_base, AssertionRecord, EdtfDate, EventRecord, ImportWarnings,
    JsonMap, UNKNOWN_AUTHORITY,
};

use crate::blocks::{
    resolve_participant, scan_blocks, BlockKind, RawBlock, DESCRIPTION_LABEL_RE, KV_RE,
    OBSERVATION_LABEL_RE,
};
use crate::vault::NoteSource;

/// Participant keys resolved into entity ids.
const PARTICIPANT_KEYS: &[&str] = &["victim", "agent", "place"];

/// Extract every event block from a note.
pub fn extract(note: &NoteSource, warnings: &mut ImportWarnings) -> Vec<EventRecord> {
    let doc_id = document_id_base(&note.file_name);

    scan_blocks(&note.text, BlockKind::Event)
        .into_iter()
        .map(|block| parse_block(&block, &doc_id, &note.rel_path, warnings))
        .collect()
}

fn parse_block(
    block: &RawBlock,
    doc_id: &str,
    file: &str,
    warnings: &mut ImportWarnings,
) -> EventRecord {
    let event_id = canonical_event_id(&block.label);

    let mut data: BTreeMap<String, String> = BTreeMap::new();
    let mut specific: BTreeSet<String> = BTreeSet::new();
    let mut description = String::new();
    let mut observation = String::new();
    let mut in_description = false;
    let mut in_observation = false;

    for line in &block.lines {
        let stripped = line.trim();

        if DESCRIPTION_LABEL_RE.is_match(stripped) {
            in_description = true;
            in_observation = false;
            continue;
        } else if OBSERVATION_LABEL_RE.is_match(stripped) {
            in_observation = true;
            in_description = false;
            continue;
        } else if stripped.starts_with("**") || stripped.starts_with("---") {
            in_description = false;
            in_observation = false;
        }

        if in_description {
            description.push_str(line);
            description.push('\n');
        } else if in_observation {
            observation.push_str(line);
            observation.push('\n');
        }

        if stripped.is_empty() || stripped.starts_with("**") {
            continue;
        }

        if let Some(caps) = KV_RE.captures(line) {
            let key = caps[1].to_string();
            let value = caps[2].trim().to_string();

            if PARTICIPANT_KEYS.contains(&key.as_str()) {
                if let Some(entity_id) = resolve_participant(&value, warnings, file) {
                    specific.insert(entity_id.clone());
                    data.insert(format!("{key}_id"), entity_id);
                }
            } else {
                data.insert(key, value);
            }
        }
    }

    let description = description.trim().to_string();
    let observation = observation.trim().to_string();

    let mut all_links = BTreeSet::new();
    all_links.extend(reference::extract_all(&description, warnings, file));
    all_links.extend(reference::extract_all(&observation, warnings, file));
    let references: BTreeSet<String> = all_links.difference(&specific).cloned().collect();

    let date_edtf = data.get("date_edtf").cloned();
    let date = date_edtf.as_deref().map(EdtfDate::parse).unwrap_or_default();

    let confidence = data
        .get("confidence")
        .map(|c| c.trim().to_lowercase())
        .unwrap_or_default();
    let uncertainty_flag = confidence == "low" || confidence.ends_with("/low");
    let gap_flag = date_edtf.as_deref().is_some_and(|d| d.contains(".."));

    let agent_id = data
        .get("agent_id")
        .cloned()
        .unwrap_or_else(|| UNKNOWN_AUTHORITY.to_string());
    let unknown_agent = agent_id == UNKNOWN_AUTHORITY;

    let mut properties = JsonMap::new();
    properties.insert("event_id".to_string(), event_id.clone().into());
    properties.insert(
        "tags".to_string(),
        data.get("tags").cloned().unwrap_or_default().into(),
    );
    for key in [
        "event_type",
        "date_source",
        "agent_precision",
        "agent_role",
        "place_precision",
    ] {
        if let Some(value) = data.get(key) {
            properties.insert(key.to_string(), value.clone().into());
        }
    }
    if let Some(date_edtf) = &date_edtf {
        properties.insert("date_edtf".to_string(), date_edtf.clone().into());
    }
    if let Some(start) = &date.start {
        properties.insert("date_start".to_string(), start.clone().into());
    }
    if let Some(end) = &date.end {
        properties.insert("date_end".to_string(), end.clone().into());
    }
    properties.insert(
        "date_precision".to_string(),
        date.precision.as_str().into(),
    );
    if let Some(victim_id) = data.get("victim_id") {
        properties.insert("victim_id".to_string(), victim_id.clone().into());
    }
    properties.insert("agent_id".to_string(), agent_id.into());
    if let Some(place_id) = data.get("place_id") {
        properties.insert("place_id".to_string(), place_id.clone().into());
    }
    if !description.is_empty() {
        properties.insert("description".to_string(), description.into());
    }
    if !observation.is_empty() {
        properties.insert("observation".to_string(), observation.into());
    }
    properties.insert("uncertainty_flag".to_string(), uncertainty_flag.into());
    properties.insert("gap_flag".to_string(), gap_flag.into());
    properties.insert("unknown_agent".to_string(), unknown_agent.into());

    let mut assertion_properties = JsonMap::new();
    assertion_properties.insert("type".to_string(), "EVENT_ASSERTION".into());
    assertion_properties.insert(
        "confidence".to_string(),
        data.get("confidence")
            .cloned()
            .unwrap_or_else(|| "medium".to_string())
            .into(),
    );
    assertion_properties.insert(
        "evidence_type".to_string(),
        data.get("evidence_type")
            .cloned()
            .unwrap_or_else(|| "reported".to_string())
            .into(),
    );
    assertion_properties.insert(
        "source_quote".to_string(),
        data.get("source_quote").cloned().unwrap_or_default().into(),
    );
    if let Some(page) = data.get("page") {
        assertion_properties.insert("page".to_string(), page.clone().into());
    }

    EventRecord {
        id: event_id.clone(),
        properties,
        assertion: AssertionRecord {
            id: format!("{event_id}::assertion"),
            doc_id: doc_id.to_string(),
            properties: assertion_properties,
        },
        references,
    }
}
