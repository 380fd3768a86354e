//! Canonical record types and the graph vocabulary.
//!
//! Extractors build these records entirely in memory, one note at a time;
//! the projector commits them as ordered batches. Node labels and edge
//! types are closed enums so the graph vocabulary stays a compile-time
//! contract.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// JSON property map stored on a node.
pub type JsonMap = serde_json::Map<String, JsonValue>;

/// Sentinel participant value for an unidentified issuing authority.
/// Survives reference resolution intentionally; it is data, not an error.
pub const UNKNOWN_AUTHORITY: &str = "UNKNOWN_AUTHORITY";

// =============================================================================
// LABELS
// =============================================================================

/// Label of a primary entity node.
///
/// Ordering is the projection order: GPE nodes first, then Organizations,
/// then Persons, so specific-relation targets exist before their sources.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EntityLabel {
    #[serde(rename = "GPE")]
    Gpe,
    Organization,
    Person,
}

impl EntityLabel {
    /// Stable label string as stored in the graph.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpe => "GPE",
            Self::Organization => "Organization",
            Self::Person => "Person",
        }
    }

    /// Classify from the vault directory segment under `id/`.
    pub fn from_dir_segment(segment: &str) -> Option<Self> {
        match segment {
            "person" => Some(Self::Person),
            "org" => Some(Self::Organization),
            "gpe" | "place" => Some(Self::Gpe),
            _ => None,
        }
    }

    /// Corresponding node label.
    pub fn node_label(&self) -> NodeLabel {
        match self {
            Self::Gpe => NodeLabel::Gpe,
            Self::Organization => NodeLabel::Organization,
            Self::Person => NodeLabel::Person,
        }
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every node label the importer writes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum NodeLabel {
    Person,
    Organization,
    #[serde(rename = "GPE")]
    Gpe,
    ArchiveDocument,
    Event,
    MicroAction,
    Assertion,
    Occupation,
    Name,
    Origin,
    FamilyRelation,
    ProfessionalRelation,
    Residence,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Organization => "Organization",
            Self::Gpe => "GPE",
            Self::ArchiveDocument => "ArchiveDocument",
            Self::Event => "Event",
            Self::MicroAction => "MicroAction",
            Self::Assertion => "Assertion",
            Self::Occupation => "Occupation",
            Self::Name => "Name",
            Self::Origin => "Origin",
            Self::FamilyRelation => "FamilyRelation",
            Self::ProfessionalRelation => "ProfessionalRelation",
            Self::Residence => "Residence",
        }
    }

    /// Inverse of [`NodeLabel::as_str`], for store reads.
    pub fn parse(label: &str) -> Option<Self> {
        Some(match label {
            "Person" => Self::Person,
            "Organization" => Self::Organization,
            "GPE" => Self::Gpe,
            "ArchiveDocument" => Self::ArchiveDocument,
            "Event" => Self::Event,
            "MicroAction" => Self::MicroAction,
            "Assertion" => Self::Assertion,
            "Occupation" => Self::Occupation,
            "Name" => Self::Name,
            "Origin" => Self::Origin,
            "FamilyRelation" => Self::FamilyRelation,
            "ProfessionalRelation" => Self::ProfessionalRelation,
            "Residence" => Self::Residence,
            _ => return None,
        })
    }
}

impl std::fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// EDGE TYPES
// =============================================================================

/// Every edge type the importer writes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    // Specific relations from named front-matter fields.
    LocatedIn,
    IsPartOf,
    WorkedFor,
    // Generic resolvable cross-references.
    References,
    // Structural ownership: parent entity → reified structure node.
    HasOccupation,
    HasName,
    HasOrigin,
    HasFamilyRel,
    HasProfRel,
    HasResidence,
    // Structure-internal targets.
    AtOrganization,
    AtPlace,
    RelatesTo,
    InContextOf,
    // Assertion wiring.
    Supports,
    Claims,
    // Event participants.
    WasVictimOf,
    ActedAsAgent,
    OccurredAt,
    // Micro-action participants.
    Performed,
    Received,
    Concerns,
    // Inference-rule outputs.
    RepliesTo,
    NextInCommunicationChain,
    ActedInContextOf,
    FollowsInCase,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocatedIn => "LOCATED_IN",
            Self::IsPartOf => "IS_PART_OF",
            Self::WorkedFor => "WORKED_FOR",
            Self::References => "REFERENCES",
            Self::HasOccupation => "HAS_OCCUPATION",
            Self::HasName => "HAS_NAME",
            Self::HasOrigin => "HAS_ORIGIN",
            Self::HasFamilyRel => "HAS_FAMILY_REL",
            Self::HasProfRel => "HAS_PROF_REL",
            Self::HasResidence => "HAS_RESIDENCE",
            Self::AtOrganization => "AT_ORGANIZATION",
            Self::AtPlace => "AT_PLACE",
            Self::RelatesTo => "RELATES_TO",
            Self::InContextOf => "IN_CONTEXT_OF",
            Self::Supports => "SUPPORTS",
            Self::Claims => "CLAIMS",
            Self::WasVictimOf => "WAS_VICTIM_OF",
            Self::ActedAsAgent => "ACTED_AS_AGENT",
            Self::OccurredAt => "OCCURRED_AT",
            Self::Performed => "PERFORMED",
            Self::Received => "RECEIVED",
            Self::Concerns => "CONCERNS",
            Self::RepliesTo => "REPLIES_TO",
            Self::NextInCommunicationChain => "NEXT_IN_COMMUNICATION_CHAIN",
            Self::ActedInContextOf => "ACTED_IN_CONTEXT_OF",
            Self::FollowsInCase => "FOLLOWS_IN_CASE",
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// REIFIED STRUCTURES
// =============================================================================

/// Kind of a reified sub-structure attached to an entity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Occupations,
    Names,
    Origins,
    FamilyRelations,
    ProfessionalRelations,
    Residences,
}

impl StructureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Occupations => "occupations",
            Self::Names => "names",
            Self::Origins => "origins",
            Self::FamilyRelations => "family_relations",
            Self::ProfessionalRelations => "professional_relations",
            Self::Residences => "residences",
        }
    }

    /// Label of the materialized structure node.
    pub fn node_label(&self) -> NodeLabel {
        match self {
            Self::Occupations => NodeLabel::Occupation,
            Self::Names => NodeLabel::Name,
            Self::Origins => NodeLabel::Origin,
            Self::FamilyRelations => NodeLabel::FamilyRelation,
            Self::ProfessionalRelations => NodeLabel::ProfessionalRelation,
            Self::Residences => NodeLabel::Residence,
        }
    }

    /// Edge type of the parent → structure ownership edge.
    pub fn ownership_edge(&self) -> EdgeType {
        match self {
            Self::Occupations => EdgeType::HasOccupation,
            Self::Names => EdgeType::HasName,
            Self::Origins => EdgeType::HasOrigin,
            Self::FamilyRelations => EdgeType::HasFamilyRel,
            Self::ProfessionalRelations => EdgeType::HasProfRel,
            Self::Residences => EdgeType::HasResidence,
        }
    }
}

impl std::fmt::Display for StructureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reified sub-entity, materialized as its own node keyed by `rid`.
///
/// `target_id` is the resolved cross-entity target for relation-shaped
/// structures (family/professional); other target fields live in
/// `properties` (`organization`, `place`, `organization_context`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructureItem {
    pub rid: Option<String>,
    pub target_id: Option<String>,
    pub properties: JsonMap,
}

impl StructureItem {
    /// String-valued property accessor.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(JsonValue::as_str)
    }
}

// =============================================================================
// CANONICAL RECORDS
// =============================================================================

/// A parsed entity note, ready for projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Canonical `/id/<type>/<uuid>` id, externally asserted.
    pub id: String,
    pub label: EntityLabel,
    pub properties: JsonMap,
    pub structures: BTreeMap<StructureKind, Vec<StructureItem>>,
    pub specific_relations: BTreeMap<EdgeType, Vec<String>>,
    /// Resolvable references that are not specific relation targets and
    /// not the entity itself.
    pub generic_references: BTreeSet<String>,
}

/// A parsed archive document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Derived `/id/document/<hash>` id, suffixed on filename collision.
    pub id: String,
    pub properties: JsonMap,
    pub references: BTreeSet<String>,
}

/// Provenance record linking a source document to a claimed event or
/// micro-action. Exactly one per event/micro-action block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionRecord {
    pub id: String,
    pub doc_id: String,
    pub properties: JsonMap,
}

/// A parsed event block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub properties: JsonMap,
    pub assertion: AssertionRecord,
    pub references: BTreeSet<String>,
}

/// A parsed micro-action block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicroActionRecord {
    pub id: String,
    pub properties: JsonMap,
    pub assertion: AssertionRecord,
    pub references: BTreeSet<String>,
}

/// All canonical records of one run, handed to the projector as ordered
/// batches.
#[derive(Debug, Clone, Default)]
pub struct CanonicalBatch {
    pub entities: Vec<EntityRecord>,
    pub documents: Vec<DocumentRecord>,
    pub events: Vec<EventRecord>,
    pub micro_actions: Vec<MicroActionRecord>,
}

impl CanonicalBatch {
    /// Sort entities into projection order (GPE, Organization, Person),
    /// stable within a label.
    pub fn sort_entities(&mut self) {
        self.entities.sort_by_key(|e| e.label);
    }
}

// =============================================================================
// INFERENCE VIEWS
// =============================================================================

/// Committed micro-action state needed by the inference rules.
#[derive(Debug, Clone, Default)]
pub struct MicroActionView {
    pub id: String,
    pub actor_id: Option<String>,
    pub recipient_id: Option<String>,
    pub link_type: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    /// Persons reachable via CONCERNS or REFERENCES edges.
    pub concerned_persons: BTreeSet<String>,
    /// Whether a REPLIES_TO edge already leaves this node.
    pub has_reply_edge: bool,
}

/// Committed event state needed by the inference rules.
#[derive(Debug, Clone, Default)]
pub struct EventView {
    pub id: String,
    pub victim_id: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
}

/// An edge produced by an inference rule, merged into the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredEdge {
    pub from: String,
    pub edge_type: EdgeType,
    pub to: String,
    pub days_diff: Option<i64>,
}

/// Parse a stored `YYYY-MM-DD` property into a calendar date.
///
/// Stored dates are permissive strings; values that do not resolve to a
/// real calendar day are treated as absent by the inference rules.
pub fn parse_stored_date(value: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value?, "%Y-%m-%d").ok()
}
