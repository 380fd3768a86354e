//! # korpus-extract
//!
//! Note extractors turning a vault of markdown notes into canonical
//! korpus records.
//!
//! This crate provides:
//! - Front-matter / body splitting with tolerant fallback
//! - The four content extractors (document, entity, event, micro-action)
//! - The markdown reified-structure parser
//! - Vault traversal with per-note, failure-isolated extraction

pub mod blocks;
pub mod document;
pub mod entity;
pub mod entity_markdown;
pub mod event;
pub mod frontmatter;
pub mod microaction;
pub mod vault;

pub use document::{PendingDocument, ARCHIVE_KEYS};
pub use vault::{collect_notes, extract_note, NoteExtraction, NoteSource};
