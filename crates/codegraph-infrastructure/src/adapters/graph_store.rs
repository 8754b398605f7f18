//! `GraphStore` against a Bolt-speaking property graph (Memgraph or Neo4j),
//! via `neo4rs`.

use async_trait::async_trait;
use neo4rs::{query, BoltType, Graph};
use serde_json::Value;

use codegraph_domain::ports::{GraphRow, GraphStore};
use codegraph_domain::{Error, Result};

/// A `GraphStore` backed by a pooled `neo4rs::Graph` connection.
pub struct Neo4rsGraphStore {
    graph: Graph,
}

impl Neo4rsGraphStore {
    /// Connect to `uri` with the given credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Graph`] if the initial connection fails.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password).await.map_err(|err| Error::Graph { message: err.to_string(), source: None })?;
        Ok(Self { graph })
    }
}

#[async_trait]
impl GraphStore for Neo4rsGraphStore {
    async fn execute(&self, query_text: &str, params: Value) -> Result<Vec<GraphRow>> {
        let mut statement = query(query_text);
        if let Value::Object(map) = &params {
            for (key, value) in map {
                statement = statement.param(key, json_to_bolt(value));
            }
        }

        let mut stream = self.graph.execute(statement).await.map_err(|err| Error::Graph { message: err.to_string(), source: None })?;

        let mut rows = Vec::new();
        while let Some(row) = stream.next().await.map_err(|err| Error::Graph { message: err.to_string(), source: None })? {
            rows.push(row_to_graph_row(&row));
        }
        Ok(rows)
    }

    async fn ping(&self) -> Result<()> {
        self.graph.execute(query("RETURN 1")).await.map_err(|err| Error::Graph { message: err.to_string(), source: None })?;
        Ok(())
    }
}

fn json_to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(neo4rs::BoltNull),
        Value::Bool(b) => BoltType::from(*b),
        Value::Number(n) => n.as_i64().map_or_else(|| BoltType::from(n.as_f64().unwrap_or_default()), BoltType::from),
        Value::String(s) => BoltType::from(s.as_str()),
        Value::Array(items) => BoltType::List(items.iter().map(json_to_bolt).collect::<Vec<_>>().into()),
        Value::Object(_) => BoltType::from(value.to_string()),
    }
}

fn row_to_graph_row(row: &neo4rs::Row) -> GraphRow {
    let mut map = std::collections::BTreeMap::new();
    for key in row.keys() {
        let value = bolt_to_json(row, key);
        map.insert((*key).to_owned(), value);
    }
    GraphRow(map)
}

fn bolt_to_json(row: &neo4rs::Row, key: &str) -> Value {
    if let Ok(v) = row.get::<i64>(key) {
        return Value::from(v);
    }
    if let Ok(v) = row.get::<f64>(key) {
        return Value::from(v);
    }
    if let Ok(v) = row.get::<bool>(key) {
        return Value::from(v);
    }
    if let Ok(v) = row.get::<String>(key) {
        return Value::from(v);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_to_bolt_converts_each_scalar_kind() {
        assert!(matches!(json_to_bolt(&Value::Bool(true)), BoltType::Boolean(_)));
        assert!(matches!(json_to_bolt(&Value::String("x".to_owned())), BoltType::String(_)));
        assert!(matches!(json_to_bolt(&Value::from(3i64)), BoltType::Integer(_)));
        assert!(matches!(json_to_bolt(&Value::Null), BoltType::Null(_)));
    }
}
