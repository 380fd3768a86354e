//! Micro-action block extraction.
//!
//! Micro-actions are the per-document communication acts (`#micro_id:`
//! blocks): letters sent, receipts acknowledged, notes forwarded. Besides
//! the bullet fields, the extractor recovers reply anchor dates from
//! German/French phrases in the free text when a reply-flagged block does
//! not state one explicitly.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;

use korpus_core::reference;
use korpus_core::{
    canonical_micro_action_id, document_id_base, AssertionRecord, EdtfDate, ImportWarnings,
    JsonMap, MicroActionRecord,
};

use crate::blocks::{resolve_participant, scan_blocks, BlockKind, RawBlock, KV_RE};
use crate::vault::NoteSource;

/// Participant keys resolved into entity ids.
const PARTICIPANT_KEYS: &[&str] = &["actor", "recipient", "about"];

/// Free-text fields scanned for wikilinks.
const TEXT_FIELDS: &[&str] = &["description", "summary", "abstract", "observations"];

enum ReplyDateForm {
    /// `Schreiben vom 1942-03-29`
    Iso,
    /// `vom 29. März 1942` / `lettre du 29 mars 1942`
    LongMonth,
    /// `Telegramm vom 29.03.1942` / `télégramme du 29.03.1942`
    DottedNumeric,
}

static REPLY_DATE_PATTERNS: Lazy<Vec<(Regex, ReplyDateForm)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(?i)Schreiben\s+vom\s+(\d{4}-\d{2}-\d{2})").unwrap(),
            ReplyDateForm::Iso,
        ),
        (
            Regex::new(r"(?i)vom\s+(\d{1,2})\.\s*(\w+)\s+(\d{4})").unwrap(),
            ReplyDateForm::LongMonth,
        ),
        (
            Regex::new(r"(?i)Telegramm\s+(?:Nr\.\s*\d+\s+)?vom\s+(\d{2}\.\d{2}\.\d{4})").unwrap(),
            ReplyDateForm::DottedNumeric,
        ),
        (
            Regex::new(r"(?i)lettre\s+du\s+(\d{1,2})\s+(\w+)\s+(\d{4})").unwrap(),
            ReplyDateForm::LongMonth,
        ),
        (
            Regex::new(r"(?i)télégramme\s+du\s+(\d{2}\.\d{2}\.\d{4})").unwrap(),
            ReplyDateForm::DottedNumeric,
        ),
    ]
});

/// Extract every micro-action block from a note.
pub fn extract(note: &NoteSource, warnings: &mut ImportWarnings) -> Vec<MicroActionRecord> {
    let doc_id = document_id_base(&note.file_name);

    scan_blocks(&note.text, BlockKind::MicroAction)
        .into_iter()
        .map(|block| parse_block(&block, &doc_id, &note.rel_path, warnings))
        .collect()
}

fn parse_block(
    block: &RawBlock,
    doc_id: &str,
    file: &str,
    warnings: &mut ImportWarnings,
) -> MicroActionRecord {
    let micro_id = canonical_micro_action_id(&block.label);

    let mut data: BTreeMap<String, String> = BTreeMap::new();
    let mut specific: BTreeSet<String> = BTreeSet::new();

    for line in &block.lines {
        let stripped = line.trim();
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

    let mut all_links = BTreeSet::new();
    for field in TEXT_FIELDS {
        if let Some(text) = data.get(*field) {
            all_links.extend(reference::extract_all(text, warnings, file));
        }
    }

    // A person mentioned in free text without an `about` participant is a
    // likely authoring gap.
    let mentions_person = all_links.iter().any(|id| id.contains("/id/person/"));
    if mentions_person && !data.contains_key("about_id") {
        warnings.log_missing_about(file, &micro_id);
    }

    let references: BTreeSet<String> = all_links.difference(&specific).cloned().collect();

    let date_edtf = data.get("date_edtf").cloned();
    let date = date_edtf.as_deref().map(EdtfDate::parse).unwrap_or_default();

    let link_type = data.get("link_type").cloned();
    let mut in_reply_to_date = data.get("in_reply_to_date").cloned();

    if in_reply_to_date.is_none() {
        let is_reply = link_type
            .as_deref()
            .is_some_and(|lt| lt.contains("acknowledges_receipt") || lt.contains("replies_to"));
        if is_reply {
            let full_text = format!(
                "{} {}",
                data.get("description").map(String::as_str).unwrap_or(""),
                data.get("observations").map(String::as_str).unwrap_or("")
            );
            in_reply_to_date = extract_reply_date(&full_text);

            match &in_reply_to_date {
                Some(date) => warnings.log_reply_date_extracted(file, &micro_id, date),
                None => warnings.log_reply_missing_anchor_date(file, &micro_id),
            }
        }
    }

    let confidence = data
        .get("confidence")
        .map(|c| c.trim().to_lowercase())
        .unwrap_or_default();
    let uncertainty_flag = confidence == "low";
    let gap_flag = date_edtf.as_deref().is_some_and(|d| d.contains(".."));

    let mut properties = JsonMap::new();
    properties.insert("micro_id".to_string(), micro_id.clone().into());
    properties.insert(
        "tags".to_string(),
        data.get("tags").cloned().unwrap_or_default().into(),
    );
    for key in [
        "action_type",
        "link_type",
        "delivery_channel",
        "date_source",
        "actor_id",
        "recipient_id",
        "about_id",
        "summary",
        "description",
        "abstract",
        "observations",
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
    if let Some(anchor) = &in_reply_to_date {
        properties.insert("in_reply_to_date".to_string(), anchor.clone().into());
    }
    properties.insert("uncertainty_flag".to_string(), uncertainty_flag.into());
    properties.insert("gap_flag".to_string(), gap_flag.into());

    let mut assertion_properties = JsonMap::new();
    assertion_properties.insert("type".to_string(), "MICROACTION_ASSERTION".into());
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

    MicroActionRecord {
        id: micro_id.clone(),
        properties,
        assertion: AssertionRecord {
            id: format!("{micro_id}::assertion"),
            doc_id: doc_id.to_string(),
            properties: assertion_properties,
        },
        references,
    }
}

/// Recover a reply anchor date from German/French reply phrases.
fn extract_reply_date(text: &str) -> Option<String> {
    for (pattern, form) in REPLY_DATE_PATTERNS.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        match form {
            ReplyDateForm::Iso => return Some(caps[1].to_string()),
            ReplyDateForm::LongMonth => {
                let day: u32 = caps[1].parse().ok()?;
                let month = month_number(&caps[2])?;
                let year = &caps[3];
                return Some(format!("{year}-{month:02}-{day:02}"));
            }
            ReplyDateForm::DottedNumeric => {
                let parts: Vec<&str> = caps[1].split('.').collect();
                if let [day, month, year] = parts[..] {
                    return Some(format!("{year}-{month}-{day}"));
                }
            }
        }
    }
    None
}

/// German and French month names.
fn month_number(name: &str) -> Option<u32> {
    Some(match name.to_lowercase().as_str() {
        "januar" | "janvier" => 1,
        "februar" | "février" => 2,
        "märz" | "mars" => 3,
        "april" | "avril" => 4,
        "mai" => 5,
        "juni" | "juin" => 6,
        "juli" | "juillet" => 7,
        "august" | "août" => 8,
        "september" | "septembre" => 9,
        "oktober" | "octobre" => 10,
        "november" | "novembre" => 11,
        "dezember" | "décembre" => 12,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const ACTOR: &str = "3b1e2b2a-9c4d-4c1e-8f2a-1b2c3d4e5f6a";
    const RECIPIENT: &str = "aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee";
    const PERSON: &str = "aaaaaaaa-bbbb-4ccc-8ddd-ffffffffffff";

    fn note(text: &str) -> NoteSource {
        NoteSource {
            path: PathBuf::from("/vault/sources/letter.md"),
            rel_path: "sources/letter.md".to_string(),
            file_name: "letter.md".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_micro_block_basic() {
        let mut warnings = ImportWarnings::new();
        let text = format!(
            "#micro_id: letter-1942-03\n- action_type: letter_sent\n- date_edtf: 1942-03-29\n- actor: [[/id/person/{ACTOR}]]\n- recipient: [[/id/org/{RECIPIENT}]]\n- about: [[/id/person/{PERSON}]]\n"
        );
        let micros = extract(&note(&text), &mut warnings);
        assert_eq!(micros.len(), 1);

        let micro = &micros[0];
        assert!(micro.id.starts_with("/id/microaction/"));
        assert_eq!(
            micro.properties.get("actor_id").and_then(|v| v.as_str()),
            Some(format!("/id/person/{ACTOR}").as_str())
        );
        assert_eq!(
            micro.properties.get("about_id").and_then(|v| v.as_str()),
            Some(format!("/id/person/{PERSON}").as_str())
        );
        assert_eq!(micro.assertion.doc_id, document_id_base("letter.md"));
        assert!(warnings.missing_about.is_empty());
    }

    #[test]
    fn test_missing_about_flagged_when_person_in_text() {
        let mut warnings = ImportWarnings::new();
        let text = format!(
            "#micro_id: m1\n- actor: [[/id/person/{ACTOR}]]\n- description: Mentions [[/id/person/{PERSON}]] in passing.\n"
        );
        let micros = extract(&note(&text), &mut warnings);
        assert_eq!(warnings.missing_about.len(), 1);
        assert!(micros[0]
            .references
            .contains(&format!("/id/person/{PERSON}")));
    }

    #[test]
    fn test_reply_date_from_german_iso_phrase() {
        let mut warnings = ImportWarnings::new();
        let text = "#micro_id: m2\n- link_type: acknowledges_receipt\n- description: Bezieht sich auf das Schreiben vom 1942-03-29 des Konsulats.\n";
        let micros = extract(&note(text), &mut warnings);
        assert_eq!(
            micros[0].properties.get("in_reply_to_date").and_then(|v| v.as_str()),
            Some("1942-03-29")
        );
        assert_eq!(warnings.reply_date_extracted.len(), 1);
    }

    #[test]
    fn test_reply_date_from_french_long_month() {
        let mut warnings = ImportWarnings::new();
        let text = "#micro_id: m3\n- link_type: replies_to\n- description: En réponse à la lettre du 8 mai 1945 du consulat.\n";
        let micros = extract(&note(text), &mut warnings);
        assert_eq!(
            micros[0].properties.get("in_reply_to_date").and_then(|v| v.as_str()),
            Some("1945-05-08")
        );
    }

    #[test]
    fn test_reply_date_from_dotted_telegram() {
        let mut warnings = ImportWarnings::new();
        let text = "#micro_id: m4\n- link_type: replies_to\n- description: Antwort auf Telegramm Nr. 12 vom 29.03.1942.\n";
        let micros = extract(&note(text), &mut warnings);
        assert_eq!(
            micros[0].properties.get("in_reply_to_date").and_then(|v| v.as_str()),
            Some("1942-03-29")
        );
    }

    #[test]
    fn test_reply_without_anchor_date_flagged() {
        let mut warnings = ImportWarnings::new();
        let text = "#micro_id: m5\n- link_type: replies_to\n- description: Keine Datumsangabe.\n";
        extract(&note(text), &mut warnings);
        assert_eq!(warnings.reply_missing_anchor_date.len(), 1);
    }

    #[test]
    fn test_explicit_anchor_date_wins() {
        let mut warnings = ImportWarnings::new();
        let text = "#micro_id: m6\n- link_type: replies_to\n- in_reply_to_date: 1942-01-05\n- description: Schreiben vom 1942-03-29.\n";
        let micros = extract(&note(text), &mut warnings);
        assert_eq!(
            micros[0].properties.get("in_reply_to_date").and_then(|v| v.as_str()),
            Some("1942-01-05")
        );
        assert!(warnings.reply_date_extracted.is_empty());
    }

    #[test]
    fn test_unknown_authority_recipient_survives() {
        let mut warnings = ImportWarnings::new();
        let text = "#micro_id: m7\n- recipient: UNKNOWN_AUTHORITY\n";
        let micros = extract(&note(text), &mut warnings);
        assert_eq!(
            micros[0].properties.get("recipient_id").and_then(|v| v.as_str()),
            Some("UNKNOWN_AUTHORITY")
        );
    }

    #[test]
    fn test_non_reply_block_never_scans_for_anchor() {
        let mut warnings = ImportWarnings::new();
        let text = "#micro_id: m8\n- link_type: forwards\n- description: Schreiben vom 1942-03-29 weitergeleitet.\n";
        let micros = extract(&note(text), &mut warnings);
        assert!(micros[0].properties.get("in_reply_to_date").is_none());
        assert!(warnings.reply_missing_anchor_date.is_empty());
    }
}
