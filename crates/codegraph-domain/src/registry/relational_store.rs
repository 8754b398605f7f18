//! Relational (Postgres) store provider registry.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct RelationalStoreProviderConfig {
    /// Provider name (e.g. `"postgres"`, `"in-memory"`).
    pub provider: String,
    pub connection_string: Option<String>,
    pub max_connections: Option<u32>,
    pub extra: HashMap<String, String>,
}

impl RelationalStoreProviderConfig {
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self { provider: provider.into(), ..Default::default() }
    }
}

crate::impl_registry!(
    provider_trait: crate::ports::RelationalStore,
    config_type: RelationalStoreProviderConfig,
    entry_type: RelationalStoreProviderEntry,
    slice_name: RELATIONAL_STORE_PROVIDERS,
    resolve_fn: resolve_relational_store_provider,
    list_fn: list_relational_store_providers
);
