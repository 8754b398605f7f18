//! Concrete implementations of `codegraph_domain::ports` against real
//! backends. Each adapter is a thin transport: statement/query text and
//! batching policy stay in `codegraph-application`, per the ports' own
//! documentation.

pub mod embedding_provider;
pub mod graph_store;
pub mod llm_provider;
pub mod relational_store;
pub mod vector_store;

pub use embedding_provider::OpenAiEmbeddingProvider;
pub use graph_store::Neo4rsGraphStore;
pub use llm_provider::HttpLlmProvider;
pub use relational_store::PostgresStore;
pub use vector_store::QdrantVectorStore;
