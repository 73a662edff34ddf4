use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{LlmError, Result};

/// Free OpenRouter models tried in order by the default preset
pub const DEFAULT_FREE_MODELS: &[&str] = &[
    "kwaipilot/kat-coder-pro:free",
    "minimax/minimax-m2:free",
    "nvidia/nemotron-nano-12b-v2-vl:free",
];

const DEFAULT_PRESET: &str = "openrouter-free";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default preset to use when no --model flag is provided (fallback)
    #[serde(default = "default_preset")]
    pub default_preset: String,

    /// Per-program default presets (program name -> preset name)
    #[serde(default)]
    pub defaults: HashMap<String, String>,

    /// Named model presets for quick access
    #[serde(default)]
    pub presets: HashMap<String, ModelPreset>,

    /// Provider-specific configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}

/// A named model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPreset {
    /// Provider identifier (openrouter, openai-compatible)
    pub provider: String,

    /// Primary model name/identifier for the provider
    pub model: String,

    /// Models tried in order when the primary model fails
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_models: Vec<String>,
}

impl ModelPreset {
    /// Primary model followed by the fallbacks, in the order they are tried
    pub fn models(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.model.as_str()).chain(self.fallback_models.iter().map(String::as_str))
    }
}

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom base URL (for API providers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home =
            std::env::var("HOME").map_err(|_| LlmError::ConfigError("HOME not set".into()))?;
        Ok(PathBuf::from(home).join(".config/audit-reply/llm.toml"))
    }

    /// Get a preset by name
    pub fn get_preset(&self, name: &str) -> Result<&ModelPreset> {
        self.presets
            .get(name)
            .ok_or_else(|| LlmError::InvalidPreset(name.to_string()))
    }

    /// Get the default preset name for a specific program
    ///
    /// Falls back to `default_preset` if no program-specific default is set.
    pub fn get_default_for_program(&self, program: &str) -> &str {
        self.defaults
            .get(program)
            .map(String::as_str)
            .unwrap_or(&self.default_preset)
    }

    /// Get provider config by provider name
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut presets = HashMap::new();

        presets.insert(
            DEFAULT_PRESET.to_string(),
            ModelPreset {
                provider: "openrouter".to_string(),
                model: DEFAULT_FREE_MODELS[0].to_string(),
                fallback_models: DEFAULT_FREE_MODELS[1..]
                    .iter()
                    .map(|m| m.to_string())
                    .collect(),
            },
        );

        Self {
            default_preset: default_preset(),
            defaults: HashMap::new(),
            presets,
            providers: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_preset, "openrouter-free");

        let preset = config.get_preset("openrouter-free").unwrap();
        assert_eq!(preset.provider, "openrouter");
        assert_eq!(preset.model, "kwaipilot/kat-coder-pro:free");
        assert_eq!(preset.fallback_models.len(), 2);
    }

    #[test]
    fn test_preset_model_order() {
        let config = Config::default();
        let preset = config.get_preset("openrouter-free").unwrap();
        let models: Vec<&str> = preset.models().collect();
        assert_eq!(models, DEFAULT_FREE_MODELS);
    }

    #[test]
    fn test_invalid_preset() {
        let config = Config::default();
        let result = config.get_preset("nonexistent");
        assert!(matches!(result, Err(LlmError::InvalidPreset(_))));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_preset, config.default_preset);
        let preset = parsed.get_preset("openrouter-free").unwrap();
        assert_eq!(preset.fallback_models.len(), 2);
    }

    #[test]
    fn test_preset_without_fallbacks() {
        let toml_str = r#"
default_preset = "solo"

[presets.solo]
provider = "openrouter"
model = "deepseek/deepseek-chat"

[providers.openrouter]
base_url = "http://localhost:8080/v1"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let preset = config.get_preset("solo").unwrap();
        assert!(preset.fallback_models.is_empty());
        assert_eq!(preset.models().count(), 1);
        assert_eq!(
            config
                .get_provider_config("openrouter")
                .and_then(|p| p.base_url.as_deref()),
            Some("http://localhost:8080/v1")
        );
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path().unwrap();
        assert!(path.to_string_lossy().contains(".config/audit-reply/llm.toml"));
    }

    #[test]
    fn test_get_default_for_program() {
        let mut config = Config::default();

        assert_eq!(config.get_default_for_program("audit-reply"), "openrouter-free");

        config
            .defaults
            .insert("audit-reply".to_string(), "local".to_string());

        assert_eq!(config.get_default_for_program("audit-reply"), "local");
        assert_eq!(config.get_default_for_program("other"), "openrouter-free");
    }
}
