//! Reply generation across a chain of models.

use anyhow::{Context, Result, anyhow, bail};
use llm_client::{
    Config, LlmError, LlmProvider, LlmRequest, LlmResponse, PartialCallback, get_providers,
};
use log::{debug, info, warn};

use crate::prompt::{Intensity, generation_request};
use crate::reply::{ResponseTriple, normalize};

/// Program name used to look up a per-program default preset.
pub const PROGRAM_NAME: &str = "audit-reply";

const CONNECTION_TEST_PROMPT: &str = "请回复'测试成功'";
const CONNECTION_TEST_SYSTEM: &str = "你是一个专业的AI助手。";

/// Result of one successful generation.
#[derive(Debug, Clone)]
pub struct Generation {
    pub responses: ResponseTriple,
    /// Model that produced the completion
    pub model: String,
    /// Completion text before normalization
    pub raw: String,
}

/// Outcome of a connection test.
#[derive(Debug, Clone)]
pub struct ConnectionReport {
    pub provider: &'static str,
    pub model: String,
    pub reply: String,
}

/// Generates reply triples, trying each configured model in order.
pub struct ReplyGenerator {
    providers: Vec<Box<dyn LlmProvider>>,
    stream: bool,
}

impl ReplyGenerator {
    pub fn new(providers: Vec<Box<dyn LlmProvider>>, stream: bool) -> Self {
        Self { providers, stream }
    }

    /// Build from the shared LLM config.
    ///
    /// If preset_name is None, uses the default preset for this program.
    pub fn from_config(config: &Config, preset_name: Option<&str>, stream: bool) -> Result<Self> {
        let preset_name = preset_name.unwrap_or_else(|| config.get_default_for_program(PROGRAM_NAME));
        let preset = config
            .get_preset(preset_name)
            .context(format!("Unknown preset: {}", preset_name))?;

        let provider_config = config.get_provider_config(&preset.provider);
        let providers = get_providers(preset, provider_config).context(format!(
            "Failed to initialize provider '{}' for preset '{}'",
            preset.provider, preset_name
        ))?;

        debug!(
            "Using preset '{}' with models: {}",
            preset_name,
            preset.models().collect::<Vec<_>>().join(", ")
        );

        Ok(Self::new(providers, stream))
    }

    /// Model identifiers in the order they are tried.
    pub fn models(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.model()).collect()
    }

    /// Generate three replies to `message` at the given tone.
    ///
    /// When streaming, `on_partial` receives the accumulated completion text
    /// as it arrives. A later model restarts the text from scratch.
    pub async fn generate(
        &self,
        message: &str,
        intensity: Intensity,
        on_partial: Option<PartialCallback<'_>>,
    ) -> Result<Generation> {
        if self.providers.is_empty() {
            bail!("No models configured");
        }

        let noop = |_: &str| {};
        let on_partial: PartialCallback<'_> = on_partial.unwrap_or(&noop);
        let request = generation_request(message, intensity);

        let mut last_error: Option<LlmError> = None;

        for provider in &self.providers {
            let model = provider.model();
            debug!("Requesting replies from {}", model);

            match self.attempt(provider.as_ref(), &request, on_partial).await {
                Ok(response) if response.content.trim().is_empty() => {
                    warn!("Model {} returned an empty completion", model);
                    last_error = Some(LlmError::EmptyCompletion(model.to_string()));
                }
                Ok(response) => {
                    info!("Got completion from {}", model);
                    if let Some(usage) = &response.usage {
                        debug!(
                            "Tokens: {} in, {} out",
                            usage.input_tokens, usage.output_tokens
                        );
                    }
                    let responses = normalize(&response.content);
                    return Ok(Generation {
                        responses,
                        model: model.to_string(),
                        raw: response.content,
                    });
                }
                Err(e) if e.is_fatal() => {
                    return Err(e).context(format!("Model {} failed", model));
                }
                Err(e) => {
                    warn!("Model {} failed: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(anyhow!(e).context("All models failed")),
            None => bail!("All models failed"),
        }
    }

    /// Stream when enabled, retrying the same model without streaming on a
    /// recoverable streaming failure.
    async fn attempt(
        &self,
        provider: &dyn LlmProvider,
        request: &LlmRequest,
        on_partial: PartialCallback<'_>,
    ) -> llm_client::Result<LlmResponse> {
        if self.stream {
            match provider.complete_stream(request.clone(), on_partial).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(
                        "Streaming from {} failed ({}), retrying without streaming",
                        provider.model(),
                        e
                    );
                }
            }
        }

        provider.complete(request.clone()).await
    }

    /// Send a tiny prompt to the first model and report what came back.
    pub async fn check_connection(&self) -> Result<ConnectionReport> {
        let provider = self
            .providers
            .first()
            .ok_or_else(|| anyhow!("No models configured"))?;

        provider
            .is_available()
            .context(format!("Provider {} is not available", provider.name()))?;

        let request = LlmRequest {
            max_tokens: Some(50),
            temperature: Some(0.7),
            ..LlmRequest::new(CONNECTION_TEST_PROMPT).with_system_prompt(CONNECTION_TEST_SYSTEM)
        };

        let response = provider
            .complete(request)
            .await
            .context(format!("Connection test against {} failed", provider.model()))?;

        Ok(ConnectionReport {
            provider: provider.name(),
            model: response.model,
            reply: response.content.trim().to_string(),
        })
    }
}
