//! Vector store provider registry.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct VectorStoreProviderConfig {
    /// Provider name (e.g. `"qdrant"`, `"in-memory"`).
    pub provider: String,
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub collection_prefix: Option<String>,
    pub extra: HashMap<String, String>,
}

impl VectorStoreProviderConfig {
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self { provider: provider.into(), ..Default::default() }
    }
}

crate::impl_registry!(
    provider_trait: crate::ports::VectorStore,
    config_type: VectorStoreProviderConfig,
    entry_type: VectorStoreProviderEntry,
    slice_name: VECTOR_STORE_PROVIDERS,
    resolve_fn: resolve_vector_store_provider,
    list_fn: list_vector_store_providers
);
