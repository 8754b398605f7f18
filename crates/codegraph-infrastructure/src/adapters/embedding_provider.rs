//! `EmbeddingProvider` against the OpenAI-compatible embeddings endpoint,
//! via `reqwest`. Bounds request concurrency and retries rate-limited
//! calls internally, per the port's own contract.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use codegraph_domain::constants::retry::{backoff_delay, DEFAULT_MAX_RETRIES};
use codegraph_domain::ports::{EmbedProgress, EmbeddingProvider};
use codegraph_domain::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const EMBEDDINGS_PATH: &str = "/embeddings";

/// An `EmbeddingProvider` speaking the OpenAI embeddings request/response
/// shape.
pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    dimensions: usize,
    max_concurrent_requests: usize,
}

impl OpenAiEmbeddingProvider {
    /// Build a provider for `model`, whose output vectors are `dimensions`
    /// long, authenticating with `api_key` and bounding request
    /// concurrency at `max_concurrent_requests`.
    #[must_use]
    pub fn new(model: impl Into<String>, api_key: impl Into<String>, dimensions: usize, max_concurrent_requests: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            model: model.into(),
            api_key: api_key.into(),
            dimensions,
            max_concurrent_requests: max_concurrent_requests.max(1),
        }
    }

    /// Point at a self-hosted or alternate-vendor base URL instead of
    /// `https://api.openai.com/v1`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>> {
        let mut attempt = 0u32;
        loop {
            match self.embed_once(text).await {
                Ok(vector) => return Ok(vector),
                Err(Error::RateLimit { message }) if attempt < DEFAULT_MAX_RETRIES => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(attempt, delay_secs = delay.as_secs(), "embedding request rate-limited, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest { model: self.model.clone(), input: text.to_owned() };

        let response = self.client.post(format!("{}{EMBEDDINGS_PATH}", self.base_url)).bearer_auth(&self.api_key).json(&request).send().await.map_err(classify_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimit { message: format!("{} returned 429", self.base_url) });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("{} {status}: {body}", self.base_url);
            return Err(if Error::looks_like_rate_limit(&message) { Error::RateLimit { message } } else { Error::vector_store(message) });
        }

        let mut body: EmbeddingResponse = response.json().await.map_err(|err| Error::vector_store(err.to_string()))?;
        body.data
            .pop()
            .map(|datum| datum.embedding)
            .ok_or_else(|| Error::vector_store("empty data in embeddings response".to_owned()))
    }
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

fn classify_error(err: reqwest::Error) -> Error {
    let message = err.to_string();
    if err.is_timeout() || Error::looks_like_rate_limit(&message) {
        Error::RateLimit { message }
    } else {
        Error::vector_store(message)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_with_retry(text).await
    }

    async fn embed_batch(&self, texts: &[String], progress: Option<EmbedProgress<'_>>) -> Result<Vec<Vec<f32>>> {
        let total = texts.len();
        let completed = Arc::new(AtomicUsize::new(0));

        let results = stream::iter(texts.iter().enumerate())
            .map(|(index, text)| {
                let completed = Arc::clone(&completed);
                async move {
                    let result = self.embed_with_retry(text).await;
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(callback) = progress {
                        callback(done, total);
                    }
                    (index, result)
                }
            })
            .buffer_unordered(self.max_concurrent_requests)
            .collect::<Vec<_>>()
            .await;

        let mut ordered: Vec<Option<Vec<f32>>> = (0..total).map(|_| None).collect();
        for (index, result) in results {
            ordered[index] = Some(result?);
        }
        Ok(ordered.into_iter().map(|v| v.unwrap_or_default()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn embed_returns_the_vector_from_the_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EMBEDDINGS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.1, 0.2, 0.3]}]
            })))
            .mount(&server)
            .await;

        let provider = OpenAiEmbeddingProvider::new("text-embedding-3-small", "test-key", 3, 4).with_base_url(server.uri());
        let vector = provider.embed("hello world").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn embed_batch_preserves_input_order_and_reports_progress() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EMBEDDINGS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [1.0]}]
            })))
            .mount(&server)
            .await;

        let provider = OpenAiEmbeddingProvider::new("text-embedding-3-small", "test-key", 1, 2).with_base_url(server.uri());
        let texts = vec!["a".to_owned(), "b".to_owned(), "c".to_owned()];
        let seen = AtomicUsize::new(0);
        let callback = |done: usize, total: usize| {
            assert!(done <= total);
            seen.fetch_add(1, Ordering::SeqCst);
        };
        let result = provider.embed_batch(&texts, Some(&callback)).await.unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
