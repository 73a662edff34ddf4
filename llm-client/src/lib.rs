//! LLM client library for the audit-reply workspace
//!
//! Provides a unified interface over chat-completion providers:
//! - OpenRouter (multi-model access, free-tier models)
//! - Any other OpenAI-compatible endpoint
//!
//! Streaming completions are supported through [`LlmProvider::complete_stream`].

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;
pub mod sse;

pub use config::{Config, ModelPreset, ProviderConfig};
pub use error::{LlmError, Result};
pub use provider::{LlmProvider, LlmRequest, LlmResponse, PartialCallback, TokenUsage};
pub use providers::{MockProvider, ProviderKind, get_provider, get_providers};
