//! LLM-backed summarizer (§4.10): one of three prompt templates per entity
//! kind, concurrency-gated, retried on rate limit, empty summary on
//! permanent failure.

use std::sync::Arc;

use codegraph_domain::constants::retry::{backoff_delay, DEFAULT_MAX_RETRIES};
use codegraph_domain::entities::{CodeEntity, EntityKind, FileInfo};
use codegraph_domain::ports::{ChatMessage, LlmProvider};
use codegraph_domain::Result;
use tokio::sync::Semaphore;
use tracing::warn;

/// What is being summarized, to pick the right prompt template.
pub enum Subject<'a> {
    File { info: &'a FileInfo, entity_names: &'a [String] },
    Function(&'a CodeEntity),
    Class(&'a CodeEntity),
}

fn render_prompt(subject: &Subject<'_>) -> Vec<ChatMessage> {
    let system = ChatMessage::system("You summarize source code concisely for a code search index. Reply with plain text, two to four sentences, no markdown.");
    let user = match subject {
        Subject::File { info, entity_names } => {
            format!("Summarize the purpose of this file.\nPath: {}\nLanguage: {}\nTop-level entities: {}\n", info.relative_path.display(), info.language, entity_names.join(", "))
        }
        Subject::Function(entity) => {
            format!(
                "Summarize what this function does, including its inputs, outputs, and side effects.\nName: {}\nSignature: {}\nBody:\n{}\n",
                entity.name, entity.signature, entity.code
            )
        }
        Subject::Class(entity) => {
            let EntityKind::Class { base_classes, children } = &entity.kind else {
                unreachable!("Subject::Class only constructed over a Class entity")
            };
            let methods: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
            format!(
                "Summarize this class's responsibility and how it's used.\nName: {}\nBases: {}\nMethods: {}\n",
                entity.name,
                base_classes.join(", "),
                methods.join(", ")
            )
        }
    };
    vec![system, ChatMessage::user(user)]
}

/// Gates concurrent summarization requests process-wide (§5).
pub struct Summarizer {
    llm: Arc<dyn LlmProvider>,
    semaphore: Arc<Semaphore>,
}

impl Summarizer {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>, concurrency: usize) -> Self {
        Self { llm, semaphore: Arc::new(Semaphore::new(concurrency.max(1))) }
    }

    /// Render the template for `subject`, submit it to the LLM provider,
    /// and retry on rate-limit errors. A permanent (non-rate-limit)
    /// failure yields an empty summary rather than propagating, per
    /// §4.10 — a failed summary must never abort the pipeline.
    pub async fn summarize(&self, subject: Subject<'_>) -> String {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => return String::new(),
        };
        let messages = render_prompt(&subject);

        let mut attempt = 0u32;
        loop {
            match self.llm.complete(&messages, Some(256), Some(0.2)).await {
                Ok(text) => return text,
                Err(err) if matches!(err, codegraph_domain::Error::RateLimit { .. }) && attempt < DEFAULT_MAX_RETRIES => {
                    let delay = backoff_delay(attempt);
                    warn!(attempt, delay_secs = delay.as_secs(), "summarization rate-limited, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(error = %err, "summarization failed permanently, yielding empty summary");
                    return String::new();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codegraph_domain::value_objects::{Language, QualifiedName};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AlwaysFails;

    #[async_trait]
    impl LlmProvider for AlwaysFails {
        async fn complete(&self, _messages: &[ChatMessage], _max_tokens: Option<u32>, _temperature: Option<f32>) -> Result<String> {
            Err(codegraph_domain::Error::llm("boom"))
        }
    }

    struct RateLimitedThenOk {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for RateLimitedThenOk {
        async fn complete(&self, _messages: &[ChatMessage], _max_tokens: Option<u32>, _temperature: Option<f32>) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(codegraph_domain::Error::rate_limit("too many requests"))
            } else {
                Ok("a concise summary".to_owned())
            }
        }
    }

    fn function_entity() -> CodeEntity {
        CodeEntity {
            name: "f".to_owned(),
            qualified_name: QualifiedName::new("proj.a.f"),
            signature: "def f():".to_owned(),
            docstring: None,
            code: "pass".to_owned(),
            start_line: 1,
            end_line: 1,
            file_path: PathBuf::from("a.py"),
            kind: EntityKind::Function { is_async: false, calls: vec![] },
        }
    }

    #[tokio::test]
    async fn permanent_failure_yields_empty_summary() {
        let summarizer = Summarizer::new(Arc::new(AlwaysFails), 1);
        let entity = function_entity();
        let summary = summarizer.summarize(Subject::Function(&entity)).await;
        assert_eq!(summary, "");
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_call_retries_then_succeeds() {
        let summarizer = Summarizer::new(Arc::new(RateLimitedThenOk { calls: AtomicUsize::new(0) }), 1);
        let entity = function_entity();
        let handle = tokio::spawn(async move { summarizer.summarize(Subject::Function(&entity)).await });
        tokio::time::advance(std::time::Duration::from_secs(8)).await;
        let summary = handle.await.expect("task completes");
        assert_eq!(summary, "a concise summary");
    }
}
