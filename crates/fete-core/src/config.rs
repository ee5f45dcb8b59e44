use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CardTypeConfig, Catalog, CatalogError, SectionConfig};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default, rename = "log_level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai: Option<AiConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,

    /// Overrides and additions to the built-in section catalog.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<String, SectionConfig>,

    #[serde(
        default,
        rename = "card-types",
        alias = "card_types",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub card_types: BTreeMap<String, CardTypeConfig>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, toml::Value>,
}

pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_AI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AiConfig {
    #[serde(rename = "base-url", alias = "base_url", default)]
    pub base_url: String,

    #[serde(default)]
    pub model: String,

    #[serde(rename = "api-key-env", alias = "api_key_env", default)]
    pub api_key_env: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(rename = "timeout-secs", alias = "timeout_secs", default)]
    pub timeout_secs: u64,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, toml::Value>,
}

impl AiConfig {
    pub fn effective_base_url(&self) -> &str {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            DEFAULT_AI_BASE_URL
        } else {
            trimmed
        }
    }

    pub fn effective_model(&self) -> &str {
        let trimmed = self.model.trim();
        if trimmed.is_empty() {
            DEFAULT_AI_MODEL
        } else {
            trimmed
        }
    }

    pub fn effective_api_key_env(&self) -> &str {
        let trimmed = self.api_key_env.trim();
        if trimmed.is_empty() {
            DEFAULT_AI_API_KEY_ENV
        } else {
            trimmed
        }
    }

    pub fn effective_timeout_secs(&self) -> u64 {
        if self.timeout_secs == 0 {
            DEFAULT_AI_TIMEOUT_SECS
        } else {
            self.timeout_secs
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StorageBackend {
    #[serde(rename = "file")]
    #[default]
    File,
    #[serde(rename = "http")]
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Endpoint for the `http` backend.
    #[serde(default)]
    pub url: String,

    #[serde(
        rename = "token-env",
        alias = "token_env",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub token_env: Option<String>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("http storage requires `url`")]
    StorageUrlMissing,
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl ConfigFile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(temperature) = self.ai.as_ref().and_then(|ai| ai.temperature) {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidValue {
                    key: "ai.temperature".to_owned(),
                    value: temperature.to_string(),
                });
            }
        }

        let storage = self.effective_storage();
        if storage.backend == StorageBackend::Http && storage.url.trim().is_empty() {
            return Err(ConfigError::StorageUrlMissing);
        }

        self.catalog()?;
        Ok(())
    }

    /// Built-in catalog with `[sections]` and `[card-types]` applied.
    pub fn catalog(&self) -> Result<Catalog, ConfigError> {
        let catalog = Catalog::builtin().with_overrides(&self.sections, &self.card_types);
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn effective_ai(&self) -> AiConfig {
        self.ai.clone().unwrap_or_default()
    }

    pub fn effective_storage(&self) -> StorageConfig {
        self.storage.clone().unwrap_or_default()
    }
}
