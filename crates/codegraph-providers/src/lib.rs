//! Feature-gated provider registration (§A.5): each module here registers
//! one or more concrete [`codegraph_infrastructure::adapters`] adapters into
//! `codegraph_domain::registry`'s `linkme` distributed slices, behind a
//! Cargo feature so a build only links the backends it actually enables.
//!
//! The orchestrator and CLI never match on a provider name directly — they
//! call `codegraph_domain::registry::resolve_*` and let the slice populated
//! here answer.

#[cfg(any(feature = "graphstore-neo4j", feature = "relationalstore-postgres"))]
mod blocking;

#[cfg(feature = "graphstore-neo4j")]
pub mod graph_store;

#[cfg(feature = "vectorstore-qdrant")]
pub mod vector_store;

#[cfg(feature = "relationalstore-postgres")]
pub mod relational_store;

#[cfg(any(feature = "llm-openai", feature = "llm-anthropic", feature = "llm-google"))]
pub mod llm;

#[cfg(feature = "embedding-openai")]
pub mod embedding;
