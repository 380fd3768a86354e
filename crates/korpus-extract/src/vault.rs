//! Vault traversal and per-note extraction.
//!
//! Notes are read once and handed to all four extractors; each note's
//! extraction is independent of every other note, so callers are free to
//! fan notes out across tasks. Failures never escape a note: they land in
//! that note's warning collector.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use korpus_core::{
    EntityRecord, EventRecord, ImportConfig, ImportWarnings, MicroActionRecord, Result,
};

use crate::document::{self, PendingDocument};
use crate::{entity, event, microaction};

/// One vault note, read once.
#[derive(Debug, Clone)]
pub struct NoteSource {
    pub path: PathBuf,
    /// Path relative to the vault root, `/`-separated.
    pub rel_path: String,
    pub file_name: String,
    pub text: String,
}

/// Everything the extractors produced for one note.
#[derive(Debug, Default)]
pub struct NoteExtraction {
    pub entity: Option<EntityRecord>,
    pub document: Option<PendingDocument>,
    pub events: Vec<EventRecord>,
    pub micro_actions: Vec<MicroActionRecord>,
    pub warnings: ImportWarnings,
}

/// Collect every markdown note under the vault root, path-sorted.
///
/// Unreadable files are recorded as parse errors and skipped; a missing
/// vault root is a hard error.
pub fn collect_notes(vault_path: &Path) -> Result<(Vec<NoteSource>, ImportWarnings)> {
    if !vault_path.is_dir() {
        return Err(korpus_core::Error::NotFound(format!(
            "vault root: {}",
            vault_path.display()
        )));
    }

    let mut notes = Vec::new();
    let mut warnings = ImportWarnings::new();

    for entry in WalkDir::new(vault_path).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }

        let rel_path = path
            .strip_prefix(vault_path)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        match std::fs::read_to_string(path) {
            Ok(text) => notes.push(NoteSource {
                path: path.to_path_buf(),
                file_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                rel_path,
                text,
            }),
            Err(e) => warnings.log_parse_error(&rel_path, &e.to_string()),
        }
    }

    notes.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

    info!(
        subsystem = "extract",
        component = "vault",
        op = "scan",
        note_count = notes.len(),
        "Collected vault notes"
    );

    Ok((notes, warnings))
}

/// Run all four extractors over one note.
///
/// Entity parse failures are caught here — recorded as `(file, error)` —
/// so a malformed note never aborts the run.
pub fn extract_note(note: &NoteSource, config: &ImportConfig) -> NoteExtraction {
    let mut warnings = ImportWarnings::new();

    let entity = match entity::extract(note, &mut warnings) {
        Ok(entity) => entity,
        Err(e) => {
            warnings.log_parse_error(&note.rel_path, &e.to_string());
            None
        }
    };

    let document = document::extract(note, config, &mut warnings);
    let events = event::extract(note, &mut warnings);
    let micro_actions = microaction::extract(note, &mut warnings);

    debug!(
        subsystem = "extract",
        component = "vault",
        op = "extract_note",
        file = %note.rel_path,
        entity = entity.is_some(),
        document = document.is_some(),
        record_count = events.len() + micro_actions.len(),
        "Extracted note"
    );

    NoteExtraction {
        entity,
        document,
        events,
        micro_actions,
        warnings,
    }
}
