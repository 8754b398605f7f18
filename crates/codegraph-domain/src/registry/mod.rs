//! Provider auto-registration (§A.5): each port kind gets a `linkme`
//! distributed slice that concrete providers register into at link time,
//! resolved by name at startup from configuration.

mod embedding;
mod graph_store;
mod llm;
mod relational_store;
mod vector_store;

pub use embedding::{list_embedding_providers, resolve_embedding_provider, EmbeddingProviderConfig, EmbeddingProviderEntry, EMBEDDING_PROVIDERS};
pub use graph_store::{list_graph_store_providers, resolve_graph_store_provider, GraphStoreProviderConfig, GraphStoreProviderEntry, GRAPH_STORE_PROVIDERS};
pub use llm::{list_llm_providers, resolve_llm_provider, LlmProviderConfig, LlmProviderEntry, LLM_PROVIDERS};
pub use relational_store::{list_relational_store_providers, resolve_relational_store_provider, RelationalStoreProviderConfig, RelationalStoreProviderEntry, RELATIONAL_STORE_PROVIDERS};
pub use vector_store::{list_vector_store_providers, resolve_vector_store_provider, VectorStoreProviderConfig, VectorStoreProviderEntry, VECTOR_STORE_PROVIDERS};
