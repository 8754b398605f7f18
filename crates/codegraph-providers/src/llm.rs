//! Registers [`HttpLlmProvider`] under one name per vendor.
//!
//! `HttpLlmProvider` speaks the OpenAI chat-completions request/response
//! shape, which OpenAI itself, and most self-hosted or gateway deployments
//! of Anthropic/Google models (LiteLLM, OpenRouter, and similar proxies),
//! also accept — so the three vendor names share one adapter, differing
//! only in default model and whether a gateway `base_url` is required.
//!
//! [`HttpLlmProvider`]: codegraph_infrastructure::adapters::HttpLlmProvider

use std::sync::Arc;

use codegraph_domain::ports::LlmProvider;
use codegraph_domain::registry::{LlmProviderConfig, LlmProviderEntry, LLM_PROVIDERS};
use codegraph_infrastructure::adapters::HttpLlmProvider;

#[cfg(feature = "llm-openai")]
mod openai {
    use super::{Arc, HttpLlmProvider, LlmProvider, LlmProviderConfig};

    const DEFAULT_MODEL: &str = "gpt-4o-mini";

    fn build(config: &LlmProviderConfig) -> Result<Arc<dyn LlmProvider>, String> {
        let api_key = config.api_key.as_deref().ok_or("LLM provider \"openai\" requires `api_key`")?;
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

        let mut provider = HttpLlmProvider::new(model, api_key);
        if let Some(base_url) = &config.base_url {
            provider = provider.with_base_url(base_url.clone());
        }
        Ok(Arc::new(provider))
    }

    #[linkme::distributed_slice(super::LLM_PROVIDERS)]
    static OPENAI_LLM_PROVIDER: super::LlmProviderEntry = super::LlmProviderEntry { name: "openai", description: "OpenAI chat completions (reqwest)", build };
}

#[cfg(feature = "llm-anthropic")]
mod anthropic {
    use super::{Arc, HttpLlmProvider, LlmProvider, LlmProviderConfig};

    const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

    fn build(config: &LlmProviderConfig) -> Result<Arc<dyn LlmProvider>, String> {
        let api_key = config.api_key.as_deref().ok_or("LLM provider \"anthropic\" requires `api_key`")?;
        let base_url = config.base_url.as_deref().ok_or("LLM provider \"anthropic\" requires `base_url` (an OpenAI-compatible gateway in front of Claude)")?;
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

        let provider = HttpLlmProvider::new(model, api_key).with_base_url(base_url);
        Ok(Arc::new(provider))
    }

    #[linkme::distributed_slice(super::LLM_PROVIDERS)]
    static ANTHROPIC_LLM_PROVIDER: super::LlmProviderEntry =
        super::LlmProviderEntry { name: "anthropic", description: "Anthropic Claude via an OpenAI-compatible gateway (reqwest)", build };
}

#[cfg(feature = "llm-google")]
mod google {
    use super::{Arc, HttpLlmProvider, LlmProvider, LlmProviderConfig};

    const DEFAULT_MODEL: &str = "gemini-2.5-flash";

    fn build(config: &LlmProviderConfig) -> Result<Arc<dyn LlmProvider>, String> {
        let api_key = config.api_key.as_deref().ok_or("LLM provider \"google\" requires `api_key`")?;
        let base_url = config.base_url.as_deref().ok_or("LLM provider \"google\" requires `base_url` (an OpenAI-compatible gateway in front of Gemini)")?;
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

        let provider = HttpLlmProvider::new(model, api_key).with_base_url(base_url);
        Ok(Arc::new(provider))
    }

    #[linkme::distributed_slice(super::LLM_PROVIDERS)]
    static GOOGLE_LLM_PROVIDER: super::LlmProviderEntry =
        super::LlmProviderEntry { name: "google", description: "Google Gemini via an OpenAI-compatible gateway (reqwest)", build };
}
