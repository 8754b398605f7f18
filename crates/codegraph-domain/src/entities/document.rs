//! Documentation-pipeline entities: `Document`, `DocumentChunk`, and
//! `DocumentLink`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::value_objects::{ChunkId, DocumentId, LinkId};

/// A scanned Markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique id, stable across re-indexing runs (derived from
    /// `project_name` + `file_path`).
    pub id: DocumentId,
    /// Project this document belongs to.
    pub project_name: String,
    /// Path relative to the documentation root.
    pub file_path: PathBuf,
    /// Title extracted from the first level-1 heading in the first 20
    /// lines, or the file stem if none is found.
    pub title: String,
    /// SHA-256 hex digest of the file's bytes.
    pub content_hash: String,
}

/// Drift status of a [`DocumentChunk`] against the code it links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DriftStatus {
    /// No drift detected against the latest analysis.
    Aligned,
    /// Minor disagreement between doc and code.
    MinorDrift,
    /// Major disagreement between doc and code.
    MajorDrift,
    /// No drift analysis has run yet.
    #[default]
    Unknown,
}

/// How a [`DocumentLink`] was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    /// Found by regex over doc text / fenced code blocks.
    Explicit,
    /// Proposed by vector similarity and confirmed by an LLM link-finder.
    Implicit,
}

/// A heading-bounded slice of a [`Document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Unique id.
    pub id: ChunkId,
    /// Owning document.
    pub document_id: DocumentId,
    /// Project this chunk belongs to.
    pub project_name: String,
    /// Chunk text.
    pub content: String,
    /// Stack of enclosing headings, outermost first (e.g. `["Auth",
    /// "Tokens"]`).
    pub heading_path: Vec<String>,
    /// Markdown heading level of the innermost heading, `0` if the chunk
    /// precedes any heading.
    pub heading_level: u8,
    /// 1-based, approximate start line.
    pub start_line: usize,
    /// 1-based, approximate end line.
    pub end_line: usize,
    /// SHA-256 hex digest of `content`.
    pub content_hash: String,
    /// Candidate reference strings found by the explicit-link regex pass,
    /// before QN matching.
    pub explicit_references: Vec<String>,
    /// Current drift status, updated by the drift detector.
    pub drift_status: DriftStatus,
    /// Current drift score in `[0, 1]`, if a drift analysis has run.
    pub drift_score: Option<f64>,
}

/// A link from a [`DocumentChunk`] to a code entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLink {
    /// Unique id.
    pub id: LinkId,
    /// The chunk this link originates from.
    pub chunk_id: ChunkId,
    /// Qualified name of the linked entity. Invariant: this QN existed in
    /// the symbol registry at link-creation time.
    pub entity_qn: String,
    /// `"class" | "function" | "method"`.
    pub entity_kind: String,
    /// Path of the file declaring the linked entity.
    pub file_path: PathBuf,
    /// How the link was established.
    pub link_type: LinkType,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Optional referenced line range within the entity.
    pub line_range_start: Option<usize>,
    /// Optional referenced line range within the entity.
    pub line_range_end: Option<usize>,
    /// Content hash of the code at link-creation time, used by the drift
    /// detector to detect "nothing changed" fast-paths.
    pub code_version_hash: Option<String>,
    /// LLM-provided justification, for implicit links.
    pub reasoning: Option<String>,
}

impl DocumentLink {
    /// Confidence lookup table for explicit-match patterns
    /// (§4.11): exact QN match, simple-name suffix match, two-segment
    /// suffix match.
    #[must_use]
    pub fn explicit_confidence(pattern: ExplicitMatchPattern) -> f64 {
        match pattern {
            ExplicitMatchPattern::ExactQn => 0.95,
            ExplicitMatchPattern::TwoSegmentSuffix => 0.8,
            ExplicitMatchPattern::SimpleNameSuffix => 0.6,
        }
    }

    /// Confidence lookup table for implicit-link LLM relevance verdicts.
    #[must_use]
    pub fn implicit_confidence(relevance: Relevance) -> f64 {
        match relevance {
            Relevance::High => 0.9,
            Relevance::Medium => 0.65,
            Relevance::Low => 0.35,
        }
    }
}

/// The three explicit-reference matching strategies from §4.11.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplicitMatchPattern {
    /// The reference string equals a known QN exactly.
    ExactQn,
    /// The reference matches the last two dotted segments of a known QN.
    TwoSegmentSuffix,
    /// The reference matches only the simple (last-segment) name.
    SimpleNameSuffix,
}

/// An LLM link-finder relevance verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    /// High relevance.
    High,
    /// Medium relevance.
    Medium,
    /// Low relevance.
    Low,
}
