//! Mock LLM provider for testing
//!
//! Provides a configurable mock provider that can simulate failures,
//! blank completions, and streamed or one-shot successful responses.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse, PartialCallback};

/// A mock provider for testing retry and fallback behavior
pub struct MockProvider {
    /// Number of times to fail before succeeding (0 = always succeed)
    fail_count: AtomicUsize,
    /// Current call count (both streaming and non-streaming)
    call_count: AtomicUsize,
    /// Number of streaming calls
    stream_calls: AtomicUsize,
    /// Error to return on failure (None = always succeed)
    fail_with: Mutex<Option<LlmError>>,
    /// Whether only streaming calls fail
    fail_streaming_only: bool,
    /// Response content to return on success
    success_response: String,
    /// Model identifier reported in responses
    model: String,
    /// Last request received, for assertions on prompt/sampling
    last_request: Mutex<Option<LlmRequest>>,
}

impl MockProvider {
    fn build(fail_count: usize, error: Option<LlmError>, response: &str) -> Self {
        Self {
            fail_count: AtomicUsize::new(fail_count),
            call_count: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
            fail_with: Mutex::new(error),
            fail_streaming_only: false,
            success_response: response.to_string(),
            model: "mock-model".to_string(),
            last_request: Mutex::new(None),
        }
    }

    /// Create a provider that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: LlmError, response: &str) -> Self {
        Self::build(n, Some(error), response)
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: LlmError) -> Self {
        Self::build(usize::MAX, Some(error), "")
    }

    /// Create a provider that always succeeds
    pub fn always_succeeds(response: &str) -> Self {
        Self::build(0, None, response)
    }

    /// Create a provider whose streaming calls fail while plain calls succeed
    pub fn stream_fails(error: LlmError, response: &str) -> Self {
        let mut provider = Self::build(usize::MAX, Some(error), response);
        provider.fail_streaming_only = true;
        provider
    }

    /// Get the number of times complete() or complete_stream() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get the number of streaming calls
    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    /// Last request seen by the provider
    pub fn last_request(&self) -> Option<LlmRequest> {
        self.last_request.lock().unwrap().clone()
    }

    /// Set a custom model identifier (useful for testing fallback scenarios)
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn respond(&self, request: LlmRequest, streaming: bool) -> Result<LlmResponse> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);

        let should_fail = if self.fail_streaming_only {
            streaming
        } else {
            call_num < self.fail_count.load(Ordering::SeqCst)
        };

        if should_fail {
            let error = self.fail_with.lock().unwrap();
            if let Some(err) = error.as_ref() {
                return Err(clone_error(err));
            }
        }

        Ok(LlmResponse {
            content: self.success_response.clone(),
            model: self.model.clone(),
            usage: None,
        })
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.respond(request, false)
    }

    async fn complete_stream(
        &self,
        request: LlmRequest,
        on_partial: PartialCallback<'_>,
    ) -> Result<LlmResponse> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        let response = self.respond(request, true)?;

        // Emit the text in two halves to mimic incremental delivery
        let chars: Vec<char> = response.content.chars().collect();
        let half: String = chars[..chars.len() / 2].iter().collect();
        if !half.is_empty() {
            on_partial(&half);
        }
        on_partial(&response.content);

        Ok(response)
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Clone an LlmError (needed because LlmError doesn't implement Clone)
fn clone_error(err: &LlmError) -> LlmError {
    match err {
        LlmError::ServerOverloaded { message } => LlmError::ServerOverloaded {
            message: message.clone(),
        },
        LlmError::MissingApiKey { provider, env_var } => LlmError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        LlmError::Unauthorized(s) => LlmError::Unauthorized(s.clone()),
        LlmError::RateLimited { retry_after } => LlmError::RateLimited {
            retry_after: *retry_after,
        },
        LlmError::ApiError {
            message,
            status_code,
        } => LlmError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        LlmError::EmptyCompletion(s) => LlmError::EmptyCompletion(s.clone()),
        LlmError::ProviderUnavailable(s) => LlmError::ProviderUnavailable(s.clone()),
        LlmError::ConfigError(s) => LlmError::ConfigError(s.clone()),
        LlmError::InvalidPreset(s) => LlmError::InvalidPreset(s.clone()),
        // For Io and Toml errors, we create a generic error since they can't be cloned
        LlmError::Io(_) => LlmError::ConfigError("IO error (mock)".to_string()),
        LlmError::TomlParse(_) => LlmError::ConfigError("TOML parse error (mock)".to_string()),
        LlmError::TomlSerialize(_) => {
            LlmError::ConfigError("TOML serialize error (mock)".to_string())
        }
    }
}
