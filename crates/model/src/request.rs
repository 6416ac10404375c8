/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelRequest {
    /// Identifier of the model that should answer.
    pub model: String,
    /// Upper bound of tokens the model may generate.
    pub max_tokens: u32,
    /// Sampling temperature, in `0.0..=1.0`.
    pub temperature: f32,
    /// The input messages, oldest first.
    pub messages: Vec<ModelMessage>,
}

/// A complete message.
///
/// There is intentionally no system variant: providers addressed through
/// this protocol only receive alternating user and assistant turns.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// A user input text.
    User(String),
    /// An assistant text.
    Assistant(String),
}

impl ModelMessage {
    /// Returns the role name used on the wire.
    #[inline]
    pub fn role(&self) -> &'static str {
        match self {
            ModelMessage::User(_) => "user",
            ModelMessage::Assistant(_) => "assistant",
        }
    }

    /// Returns the text of the message.
    #[inline]
    pub fn content(&self) -> &str {
        match self {
            ModelMessage::User(content) | ModelMessage::Assistant(content) => {
                content
            }
        }
    }
}
