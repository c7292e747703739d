use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::request::AspectRatio;
use super::request::GenerationOptions;
use super::request::ImageModel;
use super::state::EngineSettings;
use super::state::DEFAULT_GENERATION_TIMEOUT_MS;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub generation: GenerationConfig,
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GenerationConfig {
    pub default_model: ImageModel,
    pub default_aspect_ratio: Option<AspectRatio>,
    /// Zero disables the stale-request sweep.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_model: ImageModel::default(),
            default_aspect_ratio: None,
            timeout_secs: DEFAULT_GENERATION_TIMEOUT_MS / 1000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoint: Option<String>,
    pub api_key_env: String,
    pub simulate: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key_env: "STATICKIT_API_KEY".to_string(),
            simulate: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Loads TOML or YAML, picked by file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            generation_timeout_ms: match self.generation.timeout_secs {
                0 => None,
                secs => Some(secs.saturating_mul(1000)),
            },
            default_options: GenerationOptions {
                aspect_ratio: self.generation.default_aspect_ratio,
                model: self.generation.default_model,
            },
        }
    }
}
