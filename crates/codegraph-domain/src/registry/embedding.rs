//! Embedding provider registry.

use std::collections::HashMap;

/// Configuration for embedding provider construction. Providers use what
/// they need and ignore the rest.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingProviderConfig {
    /// Provider name (e.g. `"openai"`, `"ollama"`, `"null"`).
    pub provider: String,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub dimensions: Option<usize>,
    pub extra: HashMap<String, String>,
}

impl EmbeddingProviderConfig {
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self { provider: provider.into(), ..Default::default() }
    }
}

crate::impl_registry!(
    provider_trait: crate::ports::EmbeddingProvider,
    config_type: EmbeddingProviderConfig,
    entry_type: EmbeddingProviderEntry,
    slice_name: EMBEDDING_PROVIDERS,
    resolve_fn: resolve_embedding_provider,
    list_fn: list_embedding_providers
);
