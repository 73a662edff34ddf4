//! LLM provider implementations

pub mod mock;
mod openai_compatible;

pub use mock::MockProvider;
pub use openai_compatible::{OPENROUTER_BASE_URL, OpenAICompatibleProvider};

use crate::config::{ModelPreset, ProviderConfig};
use crate::error::{LlmError, Result};
use crate::provider::LlmProvider;

const OPENROUTER_KEY_VAR: &str = "OPENROUTER_API_KEY";
const OPENROUTER_URL_VAR: &str = "OPENROUTER_API_BASE_URL";

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenRouter,
    OpenAICompatible,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openrouter" => Ok(Self::OpenRouter),
            "openai-compatible" | "openai_compatible" | "openai" => Ok(Self::OpenAICompatible),
            _ => Err(LlmError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::OpenRouter => OPENROUTER_KEY_VAR,
            Self::OpenAICompatible => "OPENAI_API_KEY",
        }
    }
}

/// Create a provider instance for one model of a preset
pub fn get_provider(
    provider: &str,
    model: &str,
    provider_config: Option<&ProviderConfig>,
) -> Result<Box<dyn LlmProvider>> {
    let kind = ProviderKind::from_str(provider)?;
    let api_key = get_api_key(provider_config, kind.env_var(), provider)?;

    match kind {
        ProviderKind::OpenRouter => {
            let base_url = provider_config
                .and_then(|c| c.base_url.clone())
                .or_else(|| std::env::var(OPENROUTER_URL_VAR).ok());
            Ok(Box::new(OpenAICompatibleProvider::openrouter(
                model,
                api_key,
                base_url.as_deref(),
            )?))
        }
        ProviderKind::OpenAICompatible => {
            let base_url = provider_config
                .and_then(|c| c.base_url.as_deref())
                .ok_or_else(|| {
                    LlmError::ConfigError(format!(
                        "Provider '{}' needs base_url in [providers.{}]",
                        provider, provider
                    ))
                })?;
            Ok(Box::new(OpenAICompatibleProvider::new(
                model,
                base_url,
                api_key,
                "OpenAI-compatible",
            )?))
        }
    }
}

/// Create one provider per model of the preset, primary model first
pub fn get_providers(
    preset: &ModelPreset,
    provider_config: Option<&ProviderConfig>,
) -> Result<Vec<Box<dyn LlmProvider>>> {
    preset
        .models()
        .map(|model| get_provider(&preset.provider, model, provider_config))
        .collect()
}

/// Get API key from config or environment variable
fn get_api_key(
    config: Option<&ProviderConfig>,
    env_var: &str,
    provider_name: &str,
) -> Result<String> {
    // Check config first
    if let Some(key) = config.and_then(|c| c.api_key.clone()) {
        return Ok(key);
    }

    std::env::var(env_var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| LlmError::MissingApiKey {
            provider: provider_name.to_string(),
            env_var: env_var.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_key() -> ProviderConfig {
        ProviderConfig {
            api_key: Some("sk-config".to_string()),
            base_url: None,
        }
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!(ProviderKind::from_str("OpenRouter").unwrap(), ProviderKind::OpenRouter);
        assert_eq!(
            ProviderKind::from_str("openai_compatible").unwrap(),
            ProviderKind::OpenAICompatible
        );
        assert!(ProviderKind::from_str("claude-cli").is_err());
    }

    #[test]
    fn test_get_providers_one_per_model() {
        let preset = ModelPreset {
            provider: "openrouter".to_string(),
            model: "a:free".to_string(),
            fallback_models: vec!["b:free".to_string(), "c:free".to_string()],
        };
        let providers = get_providers(&preset, Some(&with_key())).unwrap();
        let models: Vec<&str> = providers.iter().map(|p| p.model()).collect();
        assert_eq!(models, vec!["a:free", "b:free", "c:free"]);
    }

    #[test]
    fn test_openai_compatible_requires_base_url() {
        let result = get_provider("openai-compatible", "m", Some(&with_key()));
        assert!(matches!(result, Err(LlmError::ConfigError(_))));

        let config = ProviderConfig {
            base_url: Some("http://localhost:11434/v1".to_string()),
            ..with_key()
        };
        let provider = get_provider("openai-compatible", "qwen", Some(&config)).unwrap();
        assert_eq!(provider.name(), "OpenAI-compatible");
    }

    #[test]
    fn test_config_key_takes_precedence() {
        let key = get_api_key(Some(&with_key()), "AUDIT_REPLY_TEST_UNSET_VAR", "Test").unwrap();
        assert_eq!(key, "sk-config");
    }

    #[test]
    fn test_missing_api_key() {
        let result = get_api_key(None, "AUDIT_REPLY_TEST_UNSET_VAR", "Test");
        assert!(matches!(result, Err(LlmError::MissingApiKey { .. })));
    }
}
