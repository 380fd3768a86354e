//! Archive-document extraction.
//!
//! A note is an archive document when its front matter carries any of the
//! archival reference keys. The extractor derives a narrative-text field
//! from the body (structured metadata and annotation markup removed) and
//! collects every resolvable cross-reference from both body and front
//! matter.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use korpus_core::reference::{self, FRONTMATTER_BLACKLIST};
use korpus_core::{DocumentRecord, EdtfDate, ImportConfig, ImportWarnings, JsonMap};

use crate::frontmatter;
use crate::vault::NoteSource;

/// Front-matter keys that classify a note as an archive document.
pub const ARCHIVE_KEYS: &[&str] = &[
    "archive_ref",
    "cote",
    "fonds",
    "reference",
    "versement",
    "shelfmark",
];

/// Structured-metadata line prefixes stripped from the narrative head.
const METADATA_PREFIXES: &[&str] = &["Sender:", "Recipient:", "Place:", "Date:", "Concerns:"];

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"%%[^%]*%%").unwrap());
static HIGHLIGHT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"==([^=]+)==").unwrap());
static ALIASED_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[/?(id/(?:person|org|gpe|place)/[0-9a-fA-F-]{36})\|([^\]]+)\]\]").unwrap()
});
static PLAIN_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[/?(id/(?:person|org|gpe|place)/[0-9a-fA-F-]{36})\]\]").unwrap()
});

/// A parsed archive document awaiting its derived id.
///
/// Ids are assigned later, over path-sorted records, so collision suffixes
/// stay deterministic no matter how notes were scheduled.
#[derive(Debug, Clone)]
pub struct PendingDocument {
    pub file_name: String,
    pub rel_path: String,
    pub properties: JsonMap,
    pub references: BTreeSet<String>,
}

impl PendingDocument {
    /// Finalize with the registry-assigned id.
    pub fn into_record(self, id: String) -> DocumentRecord {
        DocumentRecord {
            id,
            properties: self.properties,
            references: self.references,
        }
    }
}

/// Extract an archive document from a note, if it classifies as one.
pub fn extract(
    note: &NoteSource,
    config: &ImportConfig,
    warnings: &mut ImportWarnings,
) -> Option<PendingDocument> {
    let (front_matter, body) = frontmatter::split_lenient(&note.text);

    if !is_archive_doc(&front_matter) {
        return None;
    }

    let mut references = reference::extract_all(&note.text, warnings, &note.rel_path);
    references.extend(reference::extract_from_mapping(
        &serde_yaml::Value::Mapping(front_matter.clone()),
        FRONTMATTER_BLACKLIST,
        warnings,
        &note.rel_path,
    ));

    let date_norm = frontmatter::get_str(&front_matter, "date_norm")
        .or_else(|| frontmatter::get_str(&front_matter, "date"));
    let date = date_norm
        .as_deref()
        .map(EdtfDate::parse)
        .unwrap_or_default();

    let title = note
        .file_name
        .strip_suffix(".md")
        .unwrap_or(&note.file_name);

    let mut properties = JsonMap::new();
    properties.insert("title".to_string(), title.into());
    properties.insert("file_path".to_string(), note.rel_path.clone().into());
    properties.insert("source_path".to_string(), note.rel_path.clone().into());
    properties.insert(
        "content".to_string(),
        extract_narrative_text(&clean_markdown(body), config.narrative_min_chars).into(),
    );
    if let Some(date_norm) = date_norm {
        properties.insert("date_norm".to_string(), date_norm.into());
    }
    if let Some(start) = date.start {
        properties.insert("date_start".to_string(), start.into());
    }
    if let Some(end) = date.end {
        properties.insert("date_end".to_string(), end.into());
    }
    for key in ["cote", "fonds", "versement", "shelfmark"] {
        if let Some(value) = front_matter.get(key) {
            properties.insert(key.to_string(), frontmatter::yaml_to_json(value));
        }
    }
    if let Some(reference_value) = front_matter
        .get("reference")
        .or_else(|| front_matter.get("archive_ref"))
    {
        properties.insert(
            "reference".to_string(),
            frontmatter::yaml_to_json(reference_value),
        );
    }

    Some(PendingDocument {
        file_name: note.file_name.clone(),
        rel_path: note.rel_path.clone(),
        properties,
        references,
    })
}

fn is_archive_doc(front_matter: &serde_yaml::Mapping) -> bool {
    ARCHIVE_KEYS.iter().any(|key| front_matter.contains_key(*key))
}

/// Rewrite wikilinks into plain text so the narrative keeps alias text and
/// a readable id.
fn clean_markdown(body: &str) -> String {
    let body = ALIASED_LINK_RE.replace_all(body, "$2 (/$1)");
    PLAIN_LINK_RE.replace_all(&body, "(/$1)").into_owned()
}

/// Derive the narrative text of a document body.
///
/// Drops the trailing block after the last line-exact `---` divider,
/// skips leading structured-metadata lines and blanks, strips comment and
/// highlight markup, and falls back to the unmodified body when the
/// result undercuts `min_chars` (content-preservation guarantee).
fn extract_narrative_text(body: &str, min_chars: usize) -> String {
    let narrative_part = match body.rfind("\n---\n") {
        Some(idx) => &body[..idx],
        None => body,
    };

    let mut cleaned_lines: Vec<String> = Vec::new();
    let mut skip_metadata = true;

    for line in narrative_part.lines() {
        let stripped = line.trim();

        if skip_metadata {
            if METADATA_PREFIXES.iter().any(|p| stripped.starts_with(p)) || stripped.is_empty() {
                continue;
            }
            skip_metadata = false;
        }

        let line = COMMENT_RE.replace_all(line, "");
        let line = HIGHLIGHT_RE.replace_all(&line, "$1");

        if !line.trim().is_empty() {
            cleaned_lines.push(line.into_owned());
        }
    }

    let narrative = cleaned_lines.join("\n");
    if narrative.trim().len() < min_chars {
        body.to_string()
    } else {
        narrative
    }
}
