//! `DriftAnalysis`: the persisted result of comparing one documentation
//! chunk against the code entity it links to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::ChunkId;

/// Severity of a detected drift, as returned by the LLM drift prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftSeverity {
    /// No meaningful disagreement.
    None,
    /// Minor disagreement (e.g. a stale example).
    Minor,
    /// Major disagreement (e.g. a changed constant or removed API).
    Major,
}

impl DriftSeverity {
    /// Map to the [`crate::entities::DriftStatus`] persisted on the owning
    /// chunk.
    #[must_use]
    pub fn to_status(self) -> crate::entities::DriftStatus {
        match self {
            Self::None => crate::entities::DriftStatus::Aligned,
            Self::Minor => crate::entities::DriftStatus::MinorDrift,
            Self::Major => crate::entities::DriftStatus::MajorDrift,
        }
    }
}

/// One issue raised by the drift detector, quoting both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftIssue {
    /// Human-readable description of the disagreement.
    pub description: String,
    /// The exact doc text being disputed.
    pub doc_quote: String,
    /// The exact code text being disputed.
    pub code_quote: String,
}

/// The persisted result of one (doc-chunk, linked-entity) drift comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftAnalysis {
    /// The chunk this analysis was run for.
    pub chunk_id: ChunkId,
    /// Path of the documentation file.
    pub doc_path: String,
    /// Qualified name of the linked entity.
    pub entity_qn: String,
    /// What triggered this analysis (`"scheduled"`, `"file_changed"`,
    /// `"manual"`).
    pub trigger: String,
    /// Whether drift was detected at all.
    pub drift_detected: bool,
    /// Severity of the detected drift.
    pub drift_severity: DriftSeverity,
    /// Score in `[0, 1]`; forced to `0.0` when `drift_detected` is `false`.
    pub drift_score: f64,
    /// Individual disagreements found.
    pub issues: Vec<DriftIssue>,
    /// LLM-provided natural-language explanation.
    pub explanation: String,
    /// The doc excerpt compared.
    pub doc_excerpt: String,
    /// The code excerpt compared.
    pub code_excerpt: String,
    /// Content hash of the doc chunk at analysis time.
    pub doc_version_hash: String,
    /// Content hash of the code entity at analysis time.
    pub code_version_hash: String,
    /// When this analysis was run.
    pub analyzed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_maps_to_matching_status() {
        use crate::entities::DriftStatus;
        assert_eq!(DriftSeverity::None.to_status(), DriftStatus::Aligned);
        assert_eq!(DriftSeverity::Minor.to_status(), DriftStatus::MinorDrift);
        assert_eq!(DriftSeverity::Major.to_status(), DriftStatus::MajorDrift);
    }
}
