//! Port interfaces: boundary contracts between the domain and the external
//! collaborators named in the external-interfaces section of the
//! specification (graph store, vector store, relational store, LLM
//! provider, embedding provider).
//!
//! Following the dependency-inversion principle, the domain defines these
//! traits; `codegraph-infrastructure` and `codegraph-providers` implement
//! them.

mod embedding_provider;
mod graph_store;
mod llm_provider;
mod relational_store;
mod vector_store;

pub use embedding_provider::{EmbedProgress, EmbeddingProvider};
pub use graph_store::{GraphRow, GraphStore};
pub use llm_provider::{ChatMessage, ChatRole, LlmProvider};
pub use relational_store::RelationalStore;
pub use vector_store::{PayloadFilter, VectorPoint, VectorSearchHit, VectorStore};
