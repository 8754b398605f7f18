//! `LlmProvider` against an OpenAI-compatible chat completions endpoint, via
//! `reqwest`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use codegraph_domain::ports::{ChatMessage, ChatRole, LlmProvider};
use codegraph_domain::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// A chat-completion `LlmProvider` speaking the OpenAI request/response
/// shape, which Anthropic- and most self-hosted gateways also accept.
pub struct HttpLlmProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl HttpLlmProvider {
    /// Build a provider for `model`, authenticating with `api_key`.
    #[must_use]
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: DEFAULT_BASE_URL.to_owned(), model: model.into(), api_key: api_key.into() }
    }

    /// Point at a self-hosted or alternate-vendor base URL instead of
    /// `https://api.openai.com/v1`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatCompletionMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatCompletionMessage {
    role: &'static str,
    content: String,
}

impl From<&ChatMessage> for ChatCompletionMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: match message.role {
                ChatRole::System => "system",
                ChatRole::User => "user",
            },
            content: message.content.clone(),
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionResponseMessage,
}

#[derive(Deserialize)]
struct ChatCompletionResponseMessage {
    content: String,
}

#[async_trait]
impl LlmProvider for HttpLlmProvider {
    async fn complete(&self, messages: &[ChatMessage], max_tokens: Option<u32>, temperature: Option<f32>) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.iter().map(ChatCompletionMessage::from).collect(),
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(format!("{}{CHAT_COMPLETIONS_PATH}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| classify_error(&err))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimit { message: format!("{} returned 429", self.base_url) });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("{} {status}: {body}", self.base_url);
            return Err(if Error::looks_like_rate_limit(&message) { Error::RateLimit { message } } else { Error::Llm { message } });
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|err| Error::Llm { message: err.to_string() })?;
        body.choices.into_iter().next().map(|choice| choice.message.content).ok_or_else(|| Error::Llm { message: "empty choices in chat completion response".to_owned() })
    }
}

fn classify_error(err: &reqwest::Error) -> Error {
    let message = err.to_string();
    if err.is_timeout() || Error::looks_like_rate_limit(&message) {
        Error::RateLimit { message }
    } else {
        Error::Llm { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_domain::ports::ChatMessage;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn complete_returns_the_first_choices_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "hello"}}]
            })))
            .mount(&server)
            .await;

        let provider = HttpLlmProvider::new("gpt-4o-mini", "test-key").with_base_url(server.uri());
        let result = provider.complete(&[ChatMessage::user("hi")], None, None).await.unwrap();
        assert_eq!(result, "hello");
    }

    #[tokio::test]
    async fn a_429_response_is_classified_as_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).and(path(CHAT_COMPLETIONS_PATH)).respond_with(ResponseTemplate::new(429)).mount(&server).await;

        let provider = HttpLlmProvider::new("gpt-4o-mini", "test-key").with_base_url(server.uri());
        let err = provider.complete(&[ChatMessage::user("hi")], None, None).await.unwrap_err();
        assert!(matches!(err, Error::RateLimit { .. }));
    }
}
