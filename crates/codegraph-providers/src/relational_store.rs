//! Registers [`PostgresStore`] as the `"postgres"` relational store
//! provider.
//!
//! [`PostgresStore`]: codegraph_infrastructure::adapters::PostgresStore

use std::sync::Arc;

use codegraph_domain::ports::RelationalStore;
use codegraph_domain::registry::{RelationalStoreProviderConfig, RelationalStoreProviderEntry, RELATIONAL_STORE_PROVIDERS};
use codegraph_infrastructure::adapters::PostgresStore;

fn build(config: &RelationalStoreProviderConfig) -> Result<Arc<dyn RelationalStore>, String> {
    let connection_string = config.connection_string.as_deref().ok_or("relational store provider \"postgres\" requires `connection_string`")?;

    let store = crate::blocking::run(PostgresStore::connect_with_max_connections(connection_string, config.max_connections)).map_err(|err| err.to_string())?;
    Ok(Arc::new(store))
}

#[linkme::distributed_slice(RELATIONAL_STORE_PROVIDERS)]
static POSTGRES_RELATIONAL_STORE_PROVIDER: RelationalStoreProviderEntry =
    RelationalStoreProviderEntry { name: "postgres", description: "Postgres relational store (sqlx)", build };
