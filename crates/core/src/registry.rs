use std::ops::RangeInclusive;

use serde::Serialize;

use crate::error::ConfigError;

/// Models offered when nothing else is configured. The first one is the
/// default selection.
pub const BUILTIN_MODELS: &[&str] = &[
    "claude-sonnet-4-20250514",
    "claude-3-5-sonnet-20241022",
    "claude-3-5-haiku-20241022",
    "claude-3-opus-20240229",
];

/// Default token limit of a request.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Accepted token limits.
pub const MAX_TOKENS_RANGE: RangeInclusive<u32> = 100..=8000;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Accepted sampling temperatures.
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=1.0;

/// The fixed list of model identifiers a user can choose from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelRegistry {
    models: Vec<String>,
}

impl ModelRegistry {
    /// Creates a registry of [`BUILTIN_MODELS`].
    pub fn builtin() -> Self {
        Self {
            models: BUILTIN_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Creates a registry from a custom list. The first model becomes the
    /// default, so the list must not be empty.
    pub fn new<I, S>(models: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let models: Vec<String> = models.into_iter().map(Into::into).collect();
        if models.is_empty() {
            return Err(ConfigError::Missing("model list".to_owned()));
        }
        Ok(Self { models })
    }

    /// Returns all model ids in display order.
    #[inline]
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Returns the default model id.
    #[inline]
    pub fn default_model(&self) -> &str {
        &self.models[0]
    }

    /// Looks up a model id.
    #[inline]
    pub fn lookup(&self, model_id: &str) -> Option<&str> {
        self.models
            .iter()
            .find(|m| *m == model_id)
            .map(String::as_str)
    }

    /// Returns `true` if the registry lists `model_id`.
    #[inline]
    pub fn contains(&self, model_id: &str) -> bool {
        self.lookup(model_id).is_some()
    }

    /// Returns the default model with the default sampling settings.
    pub fn default_config(&self) -> ModelConfig {
        ModelConfig {
            model_id: self.default_model().to_owned(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Checks that `config` names a model of this registry.
    pub fn validate(&self, config: &ModelConfig) -> Result<(), ConfigError> {
        if self.contains(config.model_id()) {
            Ok(())
        } else {
            Err(ConfigError::UnknownModel(config.model_id().to_owned()))
        }
    }
}

impl Default for ModelRegistry {
    #[inline]
    fn default() -> Self {
        Self::builtin()
    }
}

/// The model settings of one request.
///
/// A `ModelConfig` is an immutable snapshot: changing a setting produces a
/// new value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelConfig {
    model_id: String,
    max_tokens: u32,
    temperature: f32,
}

impl ModelConfig {
    /// Creates a validated configuration.
    pub fn new<S: Into<String>>(
        model_id: S,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Self, ConfigError> {
        let model_id = model_id.into();
        if model_id.trim().is_empty() {
            return Err(ConfigError::Missing("model id".to_owned()));
        }
        if !MAX_TOKENS_RANGE.contains(&max_tokens) {
            return Err(ConfigError::OutOfRange {
                name: "max tokens".to_owned(),
                value: max_tokens.to_string(),
                range: format!(
                    "{}..={}",
                    MAX_TOKENS_RANGE.start(),
                    MAX_TOKENS_RANGE.end()
                ),
            });
        }
        // `contains` is false for NaN as well.
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(ConfigError::OutOfRange {
                name: "temperature".to_owned(),
                value: temperature.to_string(),
                range: format!(
                    "{}..={}",
                    TEMPERATURE_RANGE.start(),
                    TEMPERATURE_RANGE.end()
                ),
            });
        }
        Ok(Self {
            model_id,
            max_tokens,
            temperature,
        })
    }

    /// Returns the model identifier.
    #[inline]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Returns the token limit.
    #[inline]
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Returns the sampling temperature.
    #[inline]
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Returns a copy using another model.
    #[inline]
    pub fn with_model_id<S: Into<String>>(
        &self,
        model_id: S,
    ) -> Result<Self, ConfigError> {
        Self::new(model_id, self.max_tokens, self.temperature)
    }

    /// Returns a copy with another token limit.
    #[inline]
    pub fn with_max_tokens(&self, max_tokens: u32) -> Result<Self, ConfigError> {
        Self::new(self.model_id.clone(), max_tokens, self.temperature)
    }

    /// Returns a copy with another temperature.
    #[inline]
    pub fn with_temperature(
        &self,
        temperature: f32,
    ) -> Result<Self, ConfigError> {
        Self::new(self.model_id.clone(), self.max_tokens, temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = ModelRegistry::builtin();
        assert_eq!(registry.models().len(), 4);
        assert_eq!(registry.default_model(), "claude-sonnet-4-20250514");
        assert_eq!(
            registry.lookup("claude-3-opus-20240229"),
            Some("claude-3-opus-20240229")
        );
        assert!(!registry.contains("gpt-4"));

        let config = registry.default_config();
        assert_eq!(config.max_tokens(), DEFAULT_MAX_TOKENS);
        assert_eq!(config.temperature(), DEFAULT_TEMPERATURE);
        assert!(registry.validate(&config).is_ok());
    }

    #[test]
    fn test_custom_registry() {
        assert!(ModelRegistry::new(Vec::<String>::new()).is_err());

        let registry = ModelRegistry::new(["local-model"]).unwrap();
        assert_eq!(registry.default_model(), "local-model");
        let foreign = ModelConfig::new("claude-3-opus-20240229", 1000, 0.2)
            .unwrap();
        assert_eq!(
            registry.validate(&foreign),
            Err(ConfigError::UnknownModel(
                "claude-3-opus-20240229".to_owned()
            ))
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(ModelConfig::new("m", 100, 0.0).is_ok());
        assert!(ModelConfig::new("m", 8000, 1.0).is_ok());
        assert!(matches!(
            ModelConfig::new(" ", 4096, 0.7),
            Err(ConfigError::Missing(_))
        ));
        assert!(matches!(
            ModelConfig::new("m", 99, 0.7),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            ModelConfig::new("m", 4096, 1.5),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(ModelConfig::new("m", 4096, f32::NAN).is_err());
    }

    #[test]
    fn test_config_is_a_snapshot() {
        let config = ModelConfig::new("m", 4096, 0.7).unwrap();
        let hotter = config.with_temperature(0.9).unwrap();
        assert_eq!(config.temperature(), 0.7);
        assert_eq!(hotter.temperature(), 0.9);
        assert_eq!(hotter.model_id(), "m");
        assert!(config.with_max_tokens(9000).is_err());
        assert_eq!(
            config.with_model_id("n").unwrap().max_tokens(),
            config.max_tokens()
        );
    }
}
