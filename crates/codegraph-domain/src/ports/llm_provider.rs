//! LLM provider port: chat completion for summarization, implicit-link
//! judging, and drift explanation, per §6.

use async_trait::async_trait;

use crate::error::Result;

/// The role a chat message was authored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
}

/// One message in a chat completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

/// A chat-completion-capable LLM backend.
///
/// Callers are responsible for retrying on
/// [`crate::error::Error::RateLimit`] using [`crate::constants::retry`];
/// implementations only classify the failure.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one chat completion, returning the assistant's reply text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<String>;
}
