use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The credential was rejected by the provider.
    Authentication,
    /// The requested model doesn't exist.
    ModelNotFound,
    /// The model provider is rate limited or overloaded.
    RateLimitExceeded,
    /// Any other errors, including network faults.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Authentication => write!(f, "Authentication failed"),
            ErrorKind::ModelNotFound => write!(f, "Model not found"),
            ErrorKind::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            ErrorKind::Other => write!(f, "Request failed"),
        }
    }
}
