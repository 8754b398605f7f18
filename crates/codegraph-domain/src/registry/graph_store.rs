//! Graph store provider registry.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct GraphStoreProviderConfig {
    /// Provider name (e.g. `"neo4j"`, `"in-memory"`).
    pub provider: String,
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub extra: HashMap<String, String>,
}

impl GraphStoreProviderConfig {
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self { provider: provider.into(), ..Default::default() }
    }
}

crate::impl_registry!(
    provider_trait: crate::ports::GraphStore,
    config_type: GraphStoreProviderConfig,
    entry_type: GraphStoreProviderEntry,
    slice_name: GRAPH_STORE_PROVIDERS,
    resolve_fn: resolve_graph_store_provider,
    list_fn: list_graph_store_providers
);
