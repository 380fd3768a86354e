//! The machine-readable run report.
//!
//! Human-facing report formatting belongs to downstream tooling; the core
//! contract is this serializable summary of counts and warnings.

use chrono::{DateTime, Utc};
use serde::Serialize;

use korpus_core::{ValidationCounts, WarningCounts};
use korpus_graph::{InferenceStats, ProjectionStats};

/// Structured summary of one import run.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub notes_scanned: usize,
    pub projection: ProjectionStats,
    pub inference: InferenceStats,
    pub validation: ValidationCounts,
    pub warnings: WarningCounts,
    pub total_nodes: i64,
    pub total_edges: i64,
}

impl ImportReport {
    /// Total warnings across validation and extraction/projection.
    pub fn total_warnings(&self) -> usize {
        self.validation.total() + self.warnings.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes() {
        let report = ImportReport {
            started_at: Utc::now(),
            duration_ms: 42,
            notes_scanned: 3,
            projection: ProjectionStats::default(),
            inference: InferenceStats::default(),
            validation: ValidationCounts::default(),
            warnings: WarningCounts::default(),
            total_nodes: 0,
            total_edges: 0,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["notes_scanned"], 3);
        assert!(json["projection"]["entities"].is_number());
        assert!(json["warnings"]["parse_errors"].is_number());
    }
}
