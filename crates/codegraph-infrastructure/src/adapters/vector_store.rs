//! `VectorStore` against Qdrant, via `qdrant-client`'s builder API.

use async_trait::async_trait;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointId, PointStruct, ScrollPointsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};

use codegraph_domain::ports::{PayloadFilter, VectorPoint, VectorSearchHit, VectorStore};
use codegraph_domain::{Error, Result};

/// A `VectorStore` backed by a Qdrant collection per logical store (code
/// chunks, document chunks, etc).
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Connect to the Qdrant gRPC endpoint at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VectorStore`] if the client cannot be constructed.
    pub fn connect(url: &str) -> Result<Self> {
        Self::connect_with_api_key(url, None)
    }

    /// Connect to a Qdrant Cloud endpoint that requires an API key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VectorStore`] if the client cannot be constructed.
    pub fn connect_with_api_key(url: &str, api_key: Option<&str>) -> Result<Self> {
        let mut builder = Qdrant::from_url(url);
        if let Some(api_key) = api_key {
            builder = builder.api_key(api_key);
        }
        let client = builder.build().map_err(|err| Error::VectorStore { message: err.to_string(), source: None })?;
        Ok(Self { client })
    }
}

fn vector_store_err(err: impl std::fmt::Display) -> Error {
    Error::VectorStore { message: err.to_string(), source: None }
}

fn filter_to_qdrant(filter: PayloadFilter) -> Filter {
    let conditions = filter.0.into_iter().map(|(key, value)| Condition::matches(key, value)).collect::<Vec<_>>();
    Filter::must(conditions)
}

fn point_id_to_uuid(id: &Option<PointId>) -> uuid::Uuid {
    id.as_ref()
        .and_then(|point_id| match &point_id.point_id_options {
            Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid_str)) => uuid::Uuid::parse_str(uuid_str).ok(),
            _ => None,
        })
        .unwrap_or_default()
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn ensure_collection(&self, collection: &str, dimensions: usize) -> Result<()> {
        let exists = self.client.collection_exists(collection).await.map_err(vector_store_err)?;
        if exists {
            return Ok(());
        }
        self.client
            .create_collection(CreateCollectionBuilder::new(collection).vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)))
            .await
            .map_err(vector_store_err)?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<()> {
        let qdrant_points = points
            .into_iter()
            .map(|point| {
                let payload: Payload = serde_json::Value::Object(point.payload).try_into().map_err(vector_store_err)?;
                Ok(PointStruct::new(point.id.to_string(), point.vector, payload))
            })
            .collect::<Result<Vec<_>>>()?;

        self.client.upsert_points(UpsertPointsBuilder::new(collection, qdrant_points)).await.map_err(vector_store_err)?;
        Ok(())
    }

    async fn delete_by_filter(&self, collection: &str, filter: PayloadFilter) -> Result<()> {
        self.client.delete_points(DeletePointsBuilder::new(collection).points(filter_to_qdrant(filter))).await.map_err(vector_store_err)?;
        Ok(())
    }

    async fn search(&self, collection: &str, query_vector: &[f32], limit: usize, filter: Option<PayloadFilter>) -> Result<Vec<VectorSearchHit>> {
        let mut builder = SearchPointsBuilder::new(collection, query_vector.to_vec(), limit as u64).with_payload(true);
        if let Some(filter) = filter {
            builder = builder.filter(filter_to_qdrant(filter));
        }
        let response = self.client.search_points(builder).await.map_err(vector_store_err)?;

        Ok(response
            .result
            .into_iter()
            .map(|point| VectorSearchHit {
                id: point_id_to_uuid(&point.id),
                score: point.score,
                payload: payload_to_json_map(point.payload),
            })
            .collect())
    }

    async fn scroll_by_filter(&self, collection: &str, filter: PayloadFilter, limit: usize) -> Result<Vec<VectorSearchHit>> {
        let builder = ScrollPointsBuilder::new(collection).filter(filter_to_qdrant(filter)).limit(limit as u32).with_payload(true);
        let response = self.client.scroll(builder).await.map_err(vector_store_err)?;

        Ok(response
            .result
            .into_iter()
            .map(|point| VectorSearchHit { id: point_id_to_uuid(&point.id), score: 0.0, payload: payload_to_json_map(point.payload) })
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        self.client.health_check().await.map_err(vector_store_err)?;
        Ok(())
    }
}

fn payload_to_json_map(payload: std::collections::HashMap<String, qdrant_client::qdrant::Value>) -> serde_json::Map<String, serde_json::Value> {
    let value: serde_json::Value = Payload::from(payload).into();
    match value {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_to_qdrant_carries_every_equality_condition() {
        let filter = PayloadFilter::eq("project_name", json!("codegraph")).and_eq("language", json!("python"));
        let qdrant_filter = filter_to_qdrant(filter);
        assert_eq!(qdrant_filter.must.len(), 2);
    }
}
