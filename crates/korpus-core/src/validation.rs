//! Cross-cutting consistency checks over canonical records.
//!
//! Default mode only counts problems; strict mode promotes invalid id
//! versions and missing structure provenance to record-level errors.
//! Calendar validity of dates is deliberately not checked anywhere.

use serde::Serialize;
use uuid::Uuid;

use crate::defaults::ImportConfig;
use crate::error::{Error, Result};
use crate::models::{EntityRecord, EventRecord, MicroActionRecord, StructureKind};

/// Structure kinds expected to carry provenance.
const PROVENANCE_KINDS: &[StructureKind] = &[
    StructureKind::Names,
    StructureKind::Occupations,
    StructureKind::Origins,
    StructureKind::FamilyRelations,
    StructureKind::ProfessionalRelations,
];

/// Counters for consistency checks, one field per check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationCounts {
    pub invalid_uuid_v4: usize,
    pub events_missing_quote: usize,
    pub events_missing_tags: usize,
    pub event_type_conflict: usize,
    pub structure_missing_provenance: usize,
    pub missing_pref_label_both: usize,
    pub missing_pref_label_fr: usize,
    pub missing_pref_label_de: usize,
}

impl ValidationCounts {
    pub fn total(&self) -> usize {
        self.invalid_uuid_v4
            + self.events_missing_quote
            + self.events_missing_tags
            + self.event_type_conflict
            + self.structure_missing_provenance
            + self.missing_pref_label_both
            + self.missing_pref_label_fr
            + self.missing_pref_label_de
    }
}

/// Validates canonical records before projection.
pub struct ConsistencyValidator {
    strict_mode: bool,
    provenance_required: bool,
    counts: ValidationCounts,
}

impl ConsistencyValidator {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            strict_mode: config.strict_mode,
            provenance_required: config.provenance_required,
            counts: ValidationCounts::default(),
        }
    }

    pub fn counts(&self) -> &ValidationCounts {
        &self.counts
    }

    pub fn into_counts(self) -> ValidationCounts {
        self.counts
    }

    /// Check entity ids, preferred labels, and structure provenance.
    pub fn validate_entities(&mut self, entities: &[EntityRecord]) -> Result<()> {
        for entity in entities {
            self.check_uuid_v4(&entity.id)?;
            self.check_pref_labels(entity);
            self.check_structure_provenance(entity)?;
        }
        Ok(())
    }

    /// Check event taxonomy and source quotes. Missing event types are
    /// defaulted from the tag suffix in place.
    pub fn validate_events(&mut self, events: &mut [EventRecord]) -> Result<()> {
        for event in events {
            let tags = event
                .properties
                .get("tags")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let event_type = event
                .properties
                .get("event_type")
                .and_then(|v| v.as_str())
                .map(str::to_string);

            if tags.is_empty() {
                self.counts.events_missing_tags += 1;
            }

            match event_type {
                None if !tags.is_empty() => {
                    let derived = tags.rsplit('/').next().unwrap_or(&tags).to_string();
                    event
                        .properties
                        .insert("event_type".to_string(), derived.into());
                }
                Some(event_type) if !tags.is_empty() && !tags.ends_with(&event_type) => {
                    self.counts.event_type_conflict += 1;
                }
                _ => {}
            }

            let quote = event
                .assertion
                .properties
                .get("source_quote")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            if quote.trim().is_empty() {
                self.counts.events_missing_quote += 1;
            }
        }
        Ok(())
    }

    /// Micro-actions carry their own parse-time flags; nothing is promoted
    /// here.
    pub fn validate_micro_actions(&mut self, _micro_actions: &[MicroActionRecord]) -> Result<()> {
        Ok(())
    }

    fn check_uuid_v4(&mut self, entity_id: &str) -> Result<()> {
        let tail = entity_id.rsplit('/').next().unwrap_or(entity_id);
        let valid = Uuid::parse_str(tail)
            .map(|u| u.get_version_num() == 4)
            .unwrap_or(false);

        if !valid {
            self.counts.invalid_uuid_v4 += 1;
            if self.strict_mode {
                return Err(Error::Validation(format!(
                    "entity id is not a UUIDv4: {entity_id}"
                )));
            }
        }
        Ok(())
    }

    fn check_pref_labels(&mut self, entity: &EntityRecord) {
        let has = |key: &str| {
            entity
                .properties
                .get(key)
                .and_then(|v| v.as_str())
                .map(|s| !s.is_empty())
                .unwrap_or(false)
        };

        let fr = has("prefLabel_fr");
        let de = has("prefLabel_de");

        if !fr && !de {
            self.counts.missing_pref_label_both += 1;
        } else if !fr {
            self.counts.missing_pref_label_fr += 1;
        } else if !de {
            self.counts.missing_pref_label_de += 1;
        }
    }

    fn check_structure_provenance(&mut self, entity: &EntityRecord) -> Result<()> {
        if !self.provenance_required {
            return Ok(());
        }

        for kind in PROVENANCE_KINDS {
            let Some(items) = entity.structures.get(kind) else {
                continue;
            };
            for item in items {
                let has = |key: &str| {
                    item.property_str(key)
                        .map(|s| !s.trim().is_empty())
                        .unwrap_or(false)
                };
                if !has("doc") || !has("confidence") {
                    self.counts.structure_missing_provenance += 1;
                    if self.strict_mode {
                        return Err(Error::Validation(format!(
                            "missing provenance: {}:{kind}",
                            entity.id
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
