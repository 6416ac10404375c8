use filechat_model::{ErrorKind, ModelFinishReason, ModelMessage, ModelRequest};
use serde::{Deserialize, Serialize};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    MessageStart,
    ContentBlockStart,
    ContentBlockDelta { delta: ContentDelta },
    ContentBlockStop,
    MessageDelta { delta: MessageDeltaBody },
    MessageStop,
    Ping,
    Error { error: ErrorBody },
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MessageDeltaBody {
    pub stop_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub r#type: String,
    pub message: String,
}

/// The JSON body of a non-2xx response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Message {
    role: &'static str,
    content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
    stream: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(req: &ModelRequest) -> MessagesRequest {
    MessagesRequest {
        model: req.model.clone(),
        max_tokens: req.max_tokens,
        temperature: req.temperature,
        messages: req.messages.iter().map(create_message).collect(),
        stream: true,
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    Message {
        role: msg.role(),
        content: msg.content().to_owned(),
    }
}

pub fn finish_reason(stop_reason: &str) -> ModelFinishReason {
    match stop_reason {
        "max_tokens" => ModelFinishReason::MaxTokens,
        "stop_sequence" => ModelFinishReason::StopSequence,
        _ => ModelFinishReason::EndTurn,
    }
}

/// Maps the `error.type` reported by the server to an [`ErrorKind`].
pub fn error_kind(error_type: &str) -> ErrorKind {
    match error_type {
        "authentication_error" | "permission_error" => {
            ErrorKind::Authentication
        }
        "not_found_error" => ErrorKind::ModelNotFound,
        "rate_limit_error" | "overloaded_error" => ErrorKind::RateLimitExceeded,
        _ => ErrorKind::Other,
    }
}
