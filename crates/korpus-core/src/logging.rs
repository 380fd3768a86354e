//! Structured logging schema and field name constants for korpus.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Run aborted, requires operator attention |
//! | WARN  | Record-level problem, item skipped, run continues |
//! | INFO  | Phase lifecycle (parse, project, infer), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-note / per-edge iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "extract", "graph", "import"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "entity", "document", "projector", "inference", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "scan", "project_entities", "merge_edge", "replies_to"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Vault-relative path of the note being processed.
pub const FILE: &str = "file";

/// Graph id of the record being operated on.
pub const RECORD_ID: &str = "record_id";

/// Edge type being written.
pub const EDGE_TYPE: &str = "edge_type";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of notes scanned in a vault pass.
pub const NOTE_COUNT: &str = "note_count";

/// Number of records committed in a phase.
pub const RECORD_COUNT: &str = "record_count";

/// Number of edges skipped because an endpoint was missing.
pub const DROPPED_EDGES: &str = "dropped_edges";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Retry attempt number for a backend call.
pub const ATTEMPT: &str = "attempt";
