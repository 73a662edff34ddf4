use async_trait::async_trait;

use crate::error::Result;

/// Request to send to an LLM provider
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
}

impl LlmRequest {
    /// Create a request with only a user prompt set
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }
}

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

/// Token usage information
#[derive(Debug, Clone)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Callback receiving the accumulated text of a streaming completion
pub type PartialCallback<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a completion request
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse>;

    /// Execute a completion request, reporting accumulated text as it arrives.
    ///
    /// Providers without native streaming report the whole completion once.
    async fn complete_stream(
        &self,
        request: LlmRequest,
        on_partial: PartialCallback<'_>,
    ) -> Result<LlmResponse> {
        let response = self.complete(request).await?;
        on_partial(&response.content);
        Ok(response)
    }

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Model identifier this provider instance sends requests for
    fn model(&self) -> &str;

    /// Check if the provider is available (API key set, endpoint configured, etc.)
    fn is_available(&self) -> Result<()>;
}
