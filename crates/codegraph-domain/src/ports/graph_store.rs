//! Graph store port: an openCypher-speaking property graph (Memgraph /
//! Neo4j compatible), per §6.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// One returned row of a graph query, as a property map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphRow(pub std::collections::BTreeMap<String, Value>);

impl GraphRow {
    /// Look up a column by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a column as a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Look up a column as an integer count.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }
}

/// An openCypher-speaking property graph store.
///
/// This is deliberately a thin transport: the batched graph writer and
/// incremental update engine (in `codegraph-application`) own the Cypher
/// statement text and parameter shaping. The port only executes a
/// parameterized statement and hands back rows.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Execute one parameterized Cypher statement, returning its result
    /// rows. `params` is a JSON object whose keys become query parameters
    /// (e.g. `$batch` for an `UNWIND $batch AS row` statement).
    async fn execute(&self, query: &str, params: Value) -> Result<Vec<GraphRow>>;

    /// Whether the store can currently be reached. Checked at stage entry;
    /// failure here is promoted to a fatal [`crate::error::Error::Indexing`].
    async fn ping(&self) -> Result<()>;
}
