use std::sync::Arc;

use anyhow::Result;

use common::{Credentials, LlmAdapter, LlmConfig};

/// Core trait for text-generation backends
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for `request.prompt` using `request.model`
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;
}

/// Request structure for LLM generation
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Model identifier understood by the backend
    pub model: String,
    pub prompt: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

/// Response from LLM generation
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: UsageMetadata,
    pub model: String,
}

/// Token usage metadata
#[derive(Debug, Clone, Default)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

pub mod gemini;
pub mod remote;
pub mod summarizer;

/// Build the provider selected by `llm.adapter`. The API key is read from the
/// resolved credentials; a missing key yields an empty string and the request
/// pipeline refuses to run before any call is made.
pub fn create_llm_provider(config: &LlmConfig, credentials: &Credentials) -> Arc<dyn LlmProvider> {
    let api_key = credentials.llm.value().unwrap_or_default().to_string();
    match config.adapter {
        LlmAdapter::Gemini => Arc::new(gemini::GeminiProvider::new(&config.api_url, api_key)),
        LlmAdapter::OpenAi => Arc::new(remote::RemoteLlmProvider::new(&config.api_url, api_key)),
    }
}
