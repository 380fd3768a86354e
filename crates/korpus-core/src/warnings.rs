//! Warning accumulation for a single import run.
//!
//! Warnings are collected, never thrown past the enclosing note's parse:
//! extractors and the projector push typed detail rows here and keep going.
//! `counts()` produces the machine-readable summary external report tooling
//! consumes.

use serde::Serialize;

/// A cross-reference that failed grammar validation and was dropped.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidReference {
    pub file: String,
    pub line: usize,
    pub raw: String,
    pub error: String,
}

/// A cross-reference missing its leading slash, auto-corrected.
#[derive(Debug, Clone, Serialize)]
pub struct SlashCorrection {
    pub file: String,
    pub line: usize,
    pub raw: String,
}

/// An unquoted wikilink inside a raw front-matter block.
#[derive(Debug, Clone, Serialize)]
pub struct UnquotedFrontmatter {
    pub file: String,
    pub field: String,
    pub raw: String,
}

/// Two files sharing a filename, hence a derived document id.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentIdCollision {
    pub file_name: String,
    pub original_path: String,
    pub current_path: String,
}

/// A note whose parse failed at the note boundary.
#[derive(Debug, Clone, Serialize)]
pub struct ParseFailure {
    pub file: String,
    pub error: String,
}

/// A file/record pair for record-scoped flags.
#[derive(Debug, Clone, Serialize)]
pub struct RecordFlag {
    pub file: String,
    pub record_id: String,
}

/// A reply anchor date recovered from free text.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyDateExtracted {
    pub file: String,
    pub record_id: String,
    pub date: String,
}

/// A structure item dropped because it carries no relation id.
#[derive(Debug, Clone, Serialize)]
pub struct StructureMissingRid {
    pub record_id: String,
    pub kind: String,
}

/// An edge skipped during projection because an endpoint was missing.
#[derive(Debug, Clone, Serialize)]
pub struct DroppedEdge {
    pub from: String,
    pub edge_type: String,
    pub to: String,
}

/// Accumulated warnings for one run (or one note; collectors merge).
#[derive(Debug, Clone, Default)]
pub struct ImportWarnings {
    pub invalid_references: Vec<InvalidReference>,
    pub slash_corrections: Vec<SlashCorrection>,
    pub unquoted_frontmatter: Vec<UnquotedFrontmatter>,
    pub document_id_collisions: Vec<DocumentIdCollision>,
    pub parse_errors: Vec<ParseFailure>,
    pub reply_missing_anchor_date: Vec<RecordFlag>,
    pub reply_date_extracted: Vec<ReplyDateExtracted>,
    pub missing_about: Vec<RecordFlag>,
    pub legacy_marker_in_body: Vec<RecordFlag>,
    pub structure_missing_rid: Vec<StructureMissingRid>,
    pub dropped_edges: Vec<DroppedEdge>,
}

impl ImportWarnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_invalid_reference(&mut self, file: &str, line: usize, raw: &str, error: &str) {
        self.invalid_references.push(InvalidReference {
            file: file.to_string(),
            line,
            raw: raw.to_string(),
            error: error.to_string(),
        });
    }

    pub fn log_slash_correction(&mut self, file: &str, line: usize, raw: &str) {
        self.slash_corrections.push(SlashCorrection {
            file: file.to_string(),
            line,
            raw: raw.to_string(),
        });
    }

    pub fn log_unquoted_frontmatter(&mut self, file: &str, field: &str, raw: &str) {
        self.unquoted_frontmatter.push(UnquotedFrontmatter {
            file: file.to_string(),
            field: field.to_string(),
            raw: raw.to_string(),
        });
    }

    pub fn log_document_id_collision(
        &mut self,
        file_name: &str,
        original_path: &str,
        current_path: &str,
    ) {
        self.document_id_collisions.push(DocumentIdCollision {
            file_name: file_name.to_string(),
            original_path: original_path.to_string(),
            current_path: current_path.to_string(),
        });
    }

    pub fn log_parse_error(&mut self, file: &str, error: &str) {
        self.parse_errors.push(ParseFailure {
            file: file.to_string(),
            error: error.to_string(),
        });
    }

    pub fn log_reply_missing_anchor_date(&mut self, file: &str, record_id: &str) {
        self.reply_missing_anchor_date.push(RecordFlag {
            file: file.to_string(),
            record_id: record_id.to_string(),
        });
    }

    pub fn log_reply_date_extracted(&mut self, file: &str, record_id: &str, date: &str) {
        self.reply_date_extracted.push(ReplyDateExtracted {
            file: file.to_string(),
            record_id: record_id.to_string(),
            date: date.to_string(),
        });
    }

    pub fn log_missing_about(&mut self, file: &str, record_id: &str) {
        self.missing_about.push(RecordFlag {
            file: file.to_string(),
            record_id: record_id.to_string(),
        });
    }

    pub fn log_legacy_marker_in_body(&mut self, file: &str, record_id: &str) {
        self.legacy_marker_in_body.push(RecordFlag {
            file: file.to_string(),
            record_id: record_id.to_string(),
        });
    }

    pub fn log_structure_missing_rid(&mut self, record_id: &str, kind: &str) {
        self.structure_missing_rid.push(StructureMissingRid {
            record_id: record_id.to_string(),
            kind: kind.to_string(),
        });
    }

    pub fn log_dropped_edge(&mut self, from: &str, edge_type: &str, to: &str) {
        self.dropped_edges.push(DroppedEdge {
            from: from.to_string(),
            edge_type: edge_type.to_string(),
            to: to.to_string(),
        });
    }

    /// Absorb another collector (typically one note's worth).
    pub fn merge(&mut self, other: ImportWarnings) {
        self.invalid_references.extend(other.invalid_references);
        self.slash_corrections.extend(other.slash_corrections);
        self.unquoted_frontmatter.extend(other.unquoted_frontmatter);
        self.document_id_collisions.extend(other.document_id_collisions);
        self.parse_errors.extend(other.parse_errors);
        self.reply_missing_anchor_date
            .extend(other.reply_missing_anchor_date);
        self.reply_date_extracted.extend(other.reply_date_extracted);
        self.missing_about.extend(other.missing_about);
        self.legacy_marker_in_body.extend(other.legacy_marker_in_body);
        self.structure_missing_rid.extend(other.structure_missing_rid);
        self.dropped_edges.extend(other.dropped_edges);
    }

    /// Per-category counters for the structured report.
    pub fn counts(&self) -> WarningCounts {
        WarningCounts {
            invalid_references_ignored: self.invalid_references.len(),
            slash_auto_corrected: self.slash_corrections.len(),
            frontmatter_unquoted_link: self.unquoted_frontmatter.len(),
            document_id_collisions: self.document_id_collisions.len(),
            parse_errors: self.parse_errors.len(),
            reply_missing_anchor_date: self.reply_missing_anchor_date.len(),
            in_reply_to_date_extracted: self.reply_date_extracted.len(),
            microaction_missing_about: self.missing_about.len(),
            legacy_marker_in_body: self.legacy_marker_in_body.len(),
            structure_missing_rid: self.structure_missing_rid.len(),
            dropped_edges: self.dropped_edges.len(),
        }
    }
}

/// Warning counters, one field per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WarningCounts {
    pub invalid_references_ignored: usize,
    pub slash_auto_corrected: usize,
    pub frontmatter_unquoted_link: usize,
    pub document_id_collisions: usize,
    pub parse_errors: usize,
    pub reply_missing_anchor_date: usize,
    pub in_reply_to_date_extracted: usize,
    pub microaction_missing_about: usize,
    pub legacy_marker_in_body: usize,
    pub structure_missing_rid: usize,
    pub dropped_edges: usize,
}

impl WarningCounts {
    /// Sum across every category.
    pub fn total(&self) -> usize {
        self.invalid_references_ignored
            + self.slash_auto_corrected
            + self.frontmatter_unquoted_link
            + self.document_id_collisions
            + self.parse_errors
            + self.reply_missing_anchor_date
            + self.in_reply_to_date_extracted
            + self.microaction_missing_about
            + self.legacy_marker_in_body
            + self.structure_missing_rid
            + self.dropped_edges
    }
}
