//! Registers [`QdrantVectorStore`] as the `"qdrant"` vector store provider.
//!
//! [`QdrantVectorStore`]: codegraph_infrastructure::adapters::QdrantVectorStore

use std::sync::Arc;

use codegraph_domain::ports::VectorStore;
use codegraph_domain::registry::{VectorStoreProviderConfig, VectorStoreProviderEntry, VECTOR_STORE_PROVIDERS};
use codegraph_infrastructure::adapters::QdrantVectorStore;

fn build(config: &VectorStoreProviderConfig) -> Result<Arc<dyn VectorStore>, String> {
    let url = config.url.as_deref().ok_or("vector store provider \"qdrant\" requires `url`")?;
    let store = QdrantVectorStore::connect_with_api_key(url, config.api_key.as_deref()).map_err(|err| err.to_string())?;
    Ok(Arc::new(store))
}

#[linkme::distributed_slice(VECTOR_STORE_PROVIDERS)]
static QDRANT_VECTOR_STORE_PROVIDER: VectorStoreProviderEntry = VectorStoreProviderEntry { name: "qdrant", description: "Qdrant vector store over gRPC (qdrant-client)", build };
