//! Registers [`Neo4rsGraphStore`] as the `"neo4j"` graph store provider.
//!
//! The same Bolt wire protocol is spoken by Neo4j and Memgraph, so one
//! registration covers both; `config.url` picks the target.
//!
//! [`Neo4rsGraphStore`]: codegraph_infrastructure::adapters::Neo4rsGraphStore

use std::sync::Arc;

use codegraph_domain::ports::GraphStore;
use codegraph_domain::registry::{GraphStoreProviderConfig, GraphStoreProviderEntry, GRAPH_STORE_PROVIDERS};
use codegraph_infrastructure::adapters::Neo4rsGraphStore;

fn build(config: &GraphStoreProviderConfig) -> Result<Arc<dyn GraphStore>, String> {
    let url = config.url.as_deref().ok_or("graph store provider \"neo4j\" requires `url`")?;
    let username = config.username.as_deref().unwrap_or("neo4j");
    let password = config.password.as_deref().ok_or("graph store provider \"neo4j\" requires `password`")?;

    let store = crate::blocking::run(Neo4rsGraphStore::connect(url, username, password)).map_err(|err| err.to_string())?;
    Ok(Arc::new(store))
}

#[linkme::distributed_slice(GRAPH_STORE_PROVIDERS)]
static NEO4J_GRAPH_STORE_PROVIDER: GraphStoreProviderEntry = GraphStoreProviderEntry { name: "neo4j", description: "Neo4j/Memgraph graph store over Bolt (neo4rs)", build };
