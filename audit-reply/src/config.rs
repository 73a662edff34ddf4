//! audit-reply application settings.
//!
//! Model and provider settings live in the shared llm-client config; this
//! file only holds the tool's own defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::prompt::Intensity;

const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tone used when `--intensity` is not given (1-10)
    #[serde(default)]
    pub default_intensity: Intensity,

    /// Print partial output while the model is still generating
    #[serde(default = "default_stream")]
    pub stream: bool,

    /// Number of generations kept in history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_stream() -> bool {
    true
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_intensity: Intensity::default(),
            stream: default_stream(),
            history_limit: default_history_limit(),
        }
    }
}

impl AppConfig {
    /// Get the config file path: ~/.config/audit-reply/audit-reply.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("audit-reply")
            .join("audit-reply.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.default_intensity.level(), 5);
        assert!(config.stream);
        assert_eq!(config.history_limit, 10);
    }

    #[test]
    fn test_config_path() {
        let path = AppConfig::config_path().unwrap();
        assert!(path.ends_with("audit-reply/audit-reply.toml"));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
default_intensity = 8
stream = false
history_limit = 25
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_intensity.level(), 8);
        assert!(!config.stream);
        assert_eq!(config.history_limit, 25);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_out_of_range_intensity_rejected() {
        assert!(toml::from_str::<AppConfig>("default_intensity = 11").is_err());
        assert!(toml::from_str::<AppConfig>("default_intensity = 0").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("audit-reply.toml");

        let mut config = AppConfig::default();
        config.default_intensity = Intensity::new(3).unwrap();
        config.history_limit = 4;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_gives_default() {
        let dir = TempDir::new().unwrap();
        let loaded = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, AppConfig::default());
    }
}
