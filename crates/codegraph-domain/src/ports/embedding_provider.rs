//! Embedding provider port: turns chunk text into vectors for the vector
//! store, per §6.

use async_trait::async_trait;

use crate::error::Result;

/// A function invoked after each item of a batch completes, given the
/// number of items embedded so far and the batch's total size.
pub type EmbedProgress<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

/// An embedding backend.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// The dimensionality of vectors this provider produces.
    fn dimensions(&self) -> usize;

    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving input order. Implementations
    /// bound concurrency internally (`indexing.max_concurrent_requests`)
    /// and retry rate-limited calls per [`crate::constants::retry`].
    async fn embed_batch(&self, texts: &[String], progress: Option<EmbedProgress<'_>>) -> Result<Vec<Vec<f32>>>;
}
