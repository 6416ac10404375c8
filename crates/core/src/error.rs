use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use filechat_model::{ErrorKind, ModelProviderError};

/// A setting is missing or unusable.
///
/// Raised while the process starts, before any conversation exists, and
/// when the user picks an invalid model configuration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConfigError {
    /// A required setting is absent or empty.
    Missing(String),
    /// A setting could not be parsed.
    Invalid {
        /// Name of the setting.
        name: String,
        /// The rejected value.
        value: String,
    },
    /// A numeric setting is outside of its allowed range.
    OutOfRange {
        /// Name of the setting.
        name: String,
        /// The rejected value.
        value: String,
        /// Human-readable bounds, like `100..=8000`.
        range: String,
    },
    /// The model is not in the registry.
    UnknownModel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{name} is not set"),
            ConfigError::Invalid { name, value } => {
                write!(f, "{name} has an invalid value `{value}`")
            }
            ConfigError::OutOfRange { name, value, range } => {
                write!(f, "{name} must be within {range}, got {value}")
            }
            ConfigError::UnknownModel(model) => {
                write!(f, "unknown model `{model}`")
            }
        }
    }
}

impl StdError for ConfigError {}

/// An uploaded file could not be turned into a message.
///
/// The file is not marked as ingested, so uploading it again retries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IngestError {
    /// The bytes are not valid UTF-8 text.
    Decode {
        /// Name of the file.
        name: String,
        /// Byte offset of the first invalid sequence.
        valid_up_to: usize,
    },
    /// The extension is not in the allow-list.
    UnsupportedExtension {
        /// Name of the file.
        name: String,
    },
}

impl IngestError {
    /// Returns the name of the file that failed.
    #[inline]
    pub fn file_name(&self) -> &str {
        match self {
            IngestError::Decode { name, .. }
            | IngestError::UnsupportedExtension { name } => name,
        }
    }
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Decode { name, valid_up_to } => write!(
                f,
                "cannot read `{name}`: invalid UTF-8 after byte {valid_up_to}"
            ),
            IngestError::UnsupportedExtension { name } => {
                write!(f, "`{name}` is not a supported file type")
            }
        }
    }
}

impl StdError for IngestError {}

/// A completion request failed.
///
/// These never escape the streaming controller; they are turned into a
/// visible assistant message instead.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RequestError {
    /// The credential was rejected.
    Auth(String),
    /// The model id was rejected.
    ModelNotFound(String),
    /// Anything else, including network faults. The user may resubmit.
    Transient(String),
}

impl RequestError {
    /// Classifies a provider error.
    pub fn from_provider(err: &dyn ModelProviderError) -> Self {
        let detail = err.to_string();
        match err.kind() {
            ErrorKind::Authentication => RequestError::Auth(detail),
            ErrorKind::ModelNotFound => RequestError::ModelNotFound(detail),
            ErrorKind::RateLimitExceeded | ErrorKind::Other => {
                RequestError::Transient(detail)
            }
        }
    }

    /// Returns the markdown text shown in the transcript for this error.
    pub fn transcript(&self) -> String {
        match self {
            RequestError::Auth(_) => "❌ **Authentication error**: check \
                                      that the API key is correct."
                .to_owned(),
            RequestError::ModelNotFound(detail) => format!(
                "❌ **Model not found**: {detail}. Check the model name."
            ),
            RequestError::Transient(detail) => format!("❌ **Error**: {detail}"),
        }
    }
}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Auth(detail) => {
                write!(f, "authentication failed: {detail}")
            }
            RequestError::ModelNotFound(detail) => {
                write!(f, "model not found: {detail}")
            }
            RequestError::Transient(detail) => {
                write!(f, "request failed: {detail}")
            }
        }
    }
}

impl StdError for RequestError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FakeError(ErrorKind);

    impl Display for FakeError {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(f, "fake {:?}", self.0)
        }
    }

    impl StdError for FakeError {}

    impl ModelProviderError for FakeError {
        fn kind(&self) -> ErrorKind {
            self.0
        }
    }

    #[test]
    fn test_classify_provider_errors() {
        assert_eq!(
            RequestError::from_provider(&FakeError(ErrorKind::Authentication)),
            RequestError::Auth("fake Authentication".to_owned())
        );
        assert_eq!(
            RequestError::from_provider(&FakeError(ErrorKind::ModelNotFound)),
            RequestError::ModelNotFound("fake ModelNotFound".to_owned())
        );
        assert!(matches!(
            RequestError::from_provider(&FakeError(
                ErrorKind::RateLimitExceeded
            )),
            RequestError::Transient(_)
        ));
    }

    #[test]
    fn test_transcripts() {
        assert_eq!(
            RequestError::Auth("401".to_owned()).transcript(),
            "❌ **Authentication error**: check that the API key is correct."
        );
        assert_eq!(
            RequestError::ModelNotFound("model: foo".to_owned()).transcript(),
            "❌ **Model not found**: model: foo. Check the model name."
        );
        assert_eq!(
            RequestError::Transient("timeout".to_owned()).transcript(),
            "❌ **Error**: timeout"
        );
    }
}
