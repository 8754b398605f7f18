//! LLM provider registry.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct LlmProviderConfig {
    /// Provider name (e.g. `"openai"`, `"anthropic"`, `"null"`).
    pub provider: String,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub extra: HashMap<String, String>,
}

impl LlmProviderConfig {
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self { provider: provider.into(), ..Default::default() }
    }
}

crate::impl_registry!(
    provider_trait: crate::ports::LlmProvider,
    config_type: LlmProviderConfig,
    entry_type: LlmProviderEntry,
    slice_name: LLM_PROVIDERS,
    resolve_fn: resolve_llm_provider,
    list_fn: list_llm_providers
);
