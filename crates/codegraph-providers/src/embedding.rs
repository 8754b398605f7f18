//! Registers [`OpenAiEmbeddingProvider`] as the `"openai"` embedding
//! provider.
//!
//! [`OpenAiEmbeddingProvider`]: codegraph_infrastructure::adapters::OpenAiEmbeddingProvider

use std::sync::Arc;

use codegraph_domain::ports::EmbeddingProvider;
use codegraph_domain::registry::{EmbeddingProviderConfig, EmbeddingProviderEntry, EMBEDDING_PROVIDERS};
use codegraph_infrastructure::adapters::OpenAiEmbeddingProvider;

const DEFAULT_MODEL: &str = "text-embedding-3-small";
const DEFAULT_DIMENSIONS: usize = 1536;
const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 8;

fn build(config: &EmbeddingProviderConfig) -> Result<Arc<dyn EmbeddingProvider>, String> {
    let api_key = config.api_key.as_deref().ok_or("embedding provider \"openai\" requires `api_key`")?;
    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
    let dimensions = config.dimensions.unwrap_or(DEFAULT_DIMENSIONS);

    let mut provider = OpenAiEmbeddingProvider::new(model, api_key, dimensions, DEFAULT_MAX_CONCURRENT_REQUESTS);
    if let Some(base_url) = &config.base_url {
        provider = provider.with_base_url(base_url.clone());
    }
    Ok(Arc::new(provider))
}

#[linkme::distributed_slice(EMBEDDING_PROVIDERS)]
static OPENAI_EMBEDDING_PROVIDER: EmbeddingProviderEntry = EmbeddingProviderEntry { name: "openai", description: "OpenAI embeddings (reqwest)", build };
