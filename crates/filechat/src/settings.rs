use std::env;
use std::fmt::{self, Debug, Formatter};
use std::str::FromStr;

use filechat_anthropic_model::{AnthropicConfig, AnthropicConfigBuilder};
use filechat_core::ingest::DEFAULT_MAX_FILE_CHARS;
use filechat_core::{ConfigError, IngestOptions, ModelConfig, ModelRegistry};

const API_KEY: &str = "ANTHROPIC_API_KEY";
const BASE_URL: &str = "ANTHROPIC_BASE_URL";
const MODEL: &str = "FILECHAT_MODEL";
const MAX_TOKENS: &str = "FILECHAT_MAX_TOKENS";
const TEMPERATURE: &str = "FILECHAT_TEMPERATURE";
const MAX_FILE_CHARS: &str = "FILECHAT_MAX_FILE_CHARS";

/// Settings read once when the process starts.
#[derive(Clone, PartialEq)]
pub struct Settings {
    api_key: String,
    base_url: Option<String>,
    model_config: ModelConfig,
    max_file_chars: usize,
}

impl Settings {
    /// Reads the settings from the environment.
    #[inline]
    pub fn from_env(registry: &ModelRegistry) -> Result<Self, ConfigError> {
        Self::from_lookup(registry, |name| env::var(name).ok())
    }

    /// Reads the settings through `lookup`, which maps a variable name to
    /// its value. Blank values count as unset.
    pub fn from_lookup<F>(
        registry: &ModelRegistry,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let api_key = lookup(API_KEY)
            .ok_or_else(|| ConfigError::Missing(API_KEY.to_owned()))?;
        let base_url = lookup(BASE_URL);

        let defaults = registry.default_config();
        let mut model_config = defaults.clone();
        if let Some(model) = lookup(MODEL) {
            model_config = model_config.with_model_id(model)?;
        }
        if let Some(value) = lookup(MAX_TOKENS) {
            model_config =
                model_config.with_max_tokens(parse(MAX_TOKENS, value)?)?;
        }
        if let Some(value) = lookup(TEMPERATURE) {
            model_config =
                model_config.with_temperature(parse(TEMPERATURE, value)?)?;
        }
        registry.validate(&model_config)?;

        let max_file_chars = match lookup(MAX_FILE_CHARS) {
            Some(value) => match parse(MAX_FILE_CHARS, value.clone())? {
                0 => {
                    return Err(ConfigError::Invalid {
                        name: MAX_FILE_CHARS.to_owned(),
                        value,
                    });
                }
                chars => chars,
            },
            None => DEFAULT_MAX_FILE_CHARS,
        };

        Ok(Self {
            api_key,
            base_url,
            model_config,
            max_file_chars,
        })
    }

    /// Returns the provider configuration.
    pub fn anthropic_config(&self) -> AnthropicConfig {
        let mut builder = AnthropicConfigBuilder::with_api_key(&self.api_key);
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url);
        }
        builder.build()
    }

    /// Returns the initial model configuration.
    #[inline]
    pub fn model_config(&self) -> &ModelConfig {
        &self.model_config
    }

    /// Returns the ingestion options.
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            max_chars: self.max_file_chars,
            ..IngestOptions::default()
        }
    }
}

impl Debug for Settings {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<deducted>")
            .field("base_url", &self.base_url)
            .field("model_config", &self.model_config)
            .field("max_file_chars", &self.max_file_chars)
            .finish()
    }
}

fn parse<T: FromStr>(name: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name: name.to_owned(),
        value,
    })
}
