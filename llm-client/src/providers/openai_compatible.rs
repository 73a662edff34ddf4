//! OpenAI-compatible API provider
//!
//! Used for providers that implement the OpenAI chat completions API:
//! - OpenRouter
//! - Self-hosted or proxy endpoints speaking the same protocol

use async_trait::async_trait;
use futures_util::StreamExt;
use log::debug;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse, PartialCallback, TokenUsage};
use crate::sse::{SseDecoder, SseEvent};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

// OpenRouter uses these for app attribution on its dashboard
const OPENROUTER_REFERER: &str = "https://audit-chat.vercel.app";
const OPENROUTER_TITLE: &str = "Audit Communication Tool";

/// Provider for OpenAI-compatible APIs
pub struct OpenAICompatibleProvider {
    model: String,
    base_url: String,
    api_key: String,
    name: &'static str,
    client: Client,
}

impl OpenAICompatibleProvider {
    /// Create a new OpenAI-compatible provider
    pub fn new(model: &str, base_url: &str, api_key: String, name: &'static str) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(LlmError::ConfigError(format!(
                "{} requires a base_url",
                name
            )));
        }

        let client = Client::new();

        Ok(Self {
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            name,
            client,
        })
    }

    /// Create an OpenRouter provider, optionally against a custom base URL
    pub fn openrouter(model: &str, api_key: String, base_url: Option<&str>) -> Result<Self> {
        Self::new(
            model,
            base_url.unwrap_or(OPENROUTER_BASE_URL),
            api_key,
            "OpenRouter",
        )
    }

    fn build_request(&self, request: &LlmRequest, stream: bool) -> ChatCompletionRequest {
        let mut messages = Vec::new();

        if let Some(system) = &request.system_prompt {
            messages.push(Message {
                role: "system".to_string(),
                content: system.clone(),
            });
        }

        messages.push(Message {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            frequency_penalty: request.frequency_penalty,
            presence_penalty: request.presence_penalty,
            stream,
        }
    }

    /// POST the request and map non-success statuses to typed errors
    async fn send(&self, request: &LlmRequest, stream: bool) -> Result<Response> {
        let chat_request = self.build_request(request, stream);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            "POST {} (model: {}, stream: {})",
            url, self.model, stream
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", OPENROUTER_REFERER)
            .header("X-Title", OPENROUTER_TITLE)
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| LlmError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let error_text = response.text().await.unwrap_or_default();
        Err(status_error(status, retry_after, &error_text))
    }
}

/// Map an HTTP error status and body to the matching error variant
fn status_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> LlmError {
    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error_response) => error_response.error.message,
        Err(_) => body.to_string(),
    };

    match status.as_u16() {
        401 => LlmError::Unauthorized(message),
        429 => LlmError::RateLimited { retry_after },
        // Handle 503 (server overloaded) separately for retry logic
        503 => LlmError::ServerOverloaded { message },
        code => LlmError::ApiError {
            message,
            status_code: Some(code),
        },
    }
}

// OpenAI API request/response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    // Some free models answer with `"content": null`
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[async_trait]
impl LlmProvider for OpenAICompatibleProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let response = self.send(&request, false).await?;

        let chat_response: ChatCompletionResponse =
            response.json().await.map_err(|e| LlmError::ApiError {
                message: format!("Failed to parse response: {}", e),
                status_code: None,
            })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let usage = chat_response.usage.map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        Ok(LlmResponse {
            content,
            model: self.model.clone(),
            usage,
        })
    }

    async fn complete_stream(
        &self,
        request: LlmRequest,
        on_partial: PartialCallback<'_>,
    ) -> Result<LlmResponse> {
        let response = self.send(&request, true).await?;

        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut content = String::new();

        'stream: while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| LlmError::ApiError {
                message: format!("Stream interrupted: {}", e),
                status_code: None,
            })?;

            for event in decoder.push(&chunk) {
                match event {
                    SseEvent::Content(fragment) => {
                        content.push_str(&fragment);
                        on_partial(&content);
                    }
                    SseEvent::Done => break 'stream,
                    SseEvent::Error {
                        message,
                        status_code,
                    } => {
                        return Err(LlmError::ApiError {
                            message: format!("Stream error: {}", message),
                            status_code,
                        });
                    }
                }
            }
        }

        match decoder.finish() {
            Some(SseEvent::Content(fragment)) => {
                content.push_str(&fragment);
                on_partial(&content);
            }
            Some(SseEvent::Error {
                message,
                status_code,
            }) => {
                return Err(LlmError::ApiError {
                    message: format!("Stream error: {}", message),
                    status_code,
                });
            }
            Some(SseEvent::Done) | None => {}
        }

        Ok(LlmResponse {
            content,
            model: self.model.clone(),
            usage: None,
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> Result<()> {
        // API key was provided in constructor
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAICompatibleProvider {
        OpenAICompatibleProvider::openrouter("test/model:free", "sk-test".into(), None).unwrap()
    }

    #[test]
    fn test_openrouter_default_base_url() {
        let p = provider();
        assert_eq!(p.base_url, OPENROUTER_BASE_URL);
        assert_eq!(p.name(), "OpenRouter");
        assert_eq!(p.model(), "test/model:free");
    }

    #[test]
    fn test_custom_base_url_trailing_slash() {
        let p = OpenAICompatibleProvider::openrouter(
            "m",
            "k".into(),
            Some("http://localhost:8080/v1/"),
        )
        .unwrap();
        assert_eq!(p.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let result = OpenAICompatibleProvider::new("m", " ", "k".into(), "Custom");
        assert!(matches!(result, Err(LlmError::ConfigError(_))));
    }

    #[test]
    fn test_request_omits_unset_sampling_fields() {
        let p = provider();
        let body = serde_json::to_value(p.build_request(&LlmRequest::new("hi"), false)).unwrap();
        assert_eq!(body["model"], "test/model:free");
        assert_eq!(body["stream"], false);
        assert!(body.get("temperature").is_none());
        assert!(body.get("top_p").is_none());
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_request_includes_sampling_and_system() {
        let p = provider();
        let request = LlmRequest {
            temperature: Some(0.6),
            max_tokens: Some(2000),
            presence_penalty: Some(0.4),
            ..LlmRequest::new("hi").with_system_prompt("sys")
        };
        let body = serde_json::to_value(p.build_request(&request, true)).unwrap();
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 2000);
        assert!(body.get("presence_penalty").is_some());
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_status_error_mapping() {
        let body = r#"{"error":{"message":"No auth credentials found"}}"#;
        match status_error(StatusCode::UNAUTHORIZED, None, body) {
            LlmError::Unauthorized(msg) => assert_eq!(msg, "No auth credentials found"),
            other => panic!("unexpected: {other:?}"),
        }

        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, Some(12), ""),
            LlmError::RateLimited {
                retry_after: Some(12)
            }
        ));

        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, None, "busy"),
            LlmError::ServerOverloaded { .. }
        ));

        match status_error(StatusCode::BAD_REQUEST, None, "plain text") {
            LlmError::ApiError {
                message,
                status_code,
            } => {
                assert_eq!(message, "plain text");
                assert_eq!(status_code, Some(400));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_null_content_parses() {
        let json = r#"{"choices":[{"message":{"content":null}}],"usage":null}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
