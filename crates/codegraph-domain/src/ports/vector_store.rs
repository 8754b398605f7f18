//! Vector store port: collections of embedded points with payload-filtered
//! search and point lookup, per §6.

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::Result;

/// One point to upsert into a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorPoint {
    /// Point id.
    pub id: Uuid,
    /// The embedding vector.
    pub vector: Vec<f32>,
    /// Arbitrary string/number/string-list payload fields.
    pub payload: Map<String, Value>,
}

/// One hit returned by a search or scroll operation.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearchHit {
    /// Point id.
    pub id: Uuid,
    /// Similarity score (only meaningful for `search`, not `scroll`).
    pub score: f32,
    /// The point's payload.
    pub payload: Map<String, Value>,
}

/// An equality filter over payload fields, AND-combined.
///
/// Covers the filter keys named in §6: `file_path`, `project_name`,
/// `entity_type`, `language`, `document_path`, `document_type`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadFilter(pub Vec<(String, Value)>);

impl PayloadFilter {
    /// Build a filter matching a single payload field.
    #[must_use]
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self(vec![(key.into(), value.into())])
    }

    /// Add another equality condition, AND-combined with existing ones.
    #[must_use]
    pub fn and_eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }
}

/// A vector collection store (Qdrant-compatible).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create `collection` with the given embedding dimensionality if it
    /// does not already exist.
    async fn ensure_collection(&self, collection: &str, dimensions: usize) -> Result<()>;

    /// Insert or overwrite points by id.
    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<()>;

    /// Delete every point matching `filter`.
    async fn delete_by_filter(&self, collection: &str, filter: PayloadFilter) -> Result<()>;

    /// Nearest-neighbor search, optionally narrowed by `filter`.
    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        limit: usize,
        filter: Option<PayloadFilter>,
    ) -> Result<Vec<VectorSearchHit>>;

    /// Return up to `limit` points matching `filter`, unordered by
    /// similarity — used for existence/"needs update" checks and for
    /// project deletion.
    async fn scroll_by_filter(
        &self,
        collection: &str,
        filter: PayloadFilter,
        limit: usize,
    ) -> Result<Vec<VectorSearchHit>>;

    /// Whether the store can currently be reached.
    async fn ping(&self) -> Result<()>;
}
