use filechat_model::{ModelMessage, ModelRequest};

use crate::conversation::{ConversationState, Role};
use crate::registry::ModelConfig;

/// A fabricated instruction and acknowledgment placed ahead of the real
/// history, for steering a model that has no system-role slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Preamble {
    /// The fabricated user turn.
    pub instruction: String,
    /// The fabricated assistant turn.
    pub acknowledgment: String,
}

impl Preamble {
    /// Creates a preamble.
    #[inline]
    pub fn new<I: Into<String>, A: Into<String>>(
        instruction: I,
        acknowledgment: A,
    ) -> Self {
        Self {
            instruction: instruction.into(),
            acknowledgment: acknowledgment.into(),
        }
    }
}

/// Builds the request payload out of a conversation.
#[derive(Clone, Debug, Default)]
pub struct PromptAssembler {
    preamble: Option<Preamble>,
}

impl PromptAssembler {
    /// Creates an assembler that sends the history as is.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an assembler that prepends `preamble` to every request.
    #[inline]
    pub fn with_preamble(preamble: Preamble) -> Self {
        Self {
            preamble: Some(preamble),
        }
    }

    /// Returns the preamble, if any.
    #[inline]
    pub fn preamble(&self) -> Option<&Preamble> {
        self.preamble.as_ref()
    }

    /// Assembles the request for the current state of the conversation.
    ///
    /// The preamble is generated here on every call and never stored.
    /// Display-only messages are left out.
    pub fn assemble(
        &self,
        state: &ConversationState,
        config: &ModelConfig,
    ) -> ModelRequest {
        let preamble = self.preamble.iter().flat_map(|p| {
            [
                ModelMessage::User(p.instruction.clone()),
                ModelMessage::Assistant(p.acknowledgment.clone()),
            ]
        });
        let history = state
            .messages()
            .iter()
            .filter(|m| !m.is_display_only())
            .map(|m| match m.role {
                Role::User => ModelMessage::User(m.content.clone()),
                Role::Assistant => ModelMessage::Assistant(m.content.clone()),
            });

        ModelRequest {
            model: config.model_id().to_owned(),
            max_tokens: config.max_tokens(),
            temperature: config.temperature(),
            messages: preamble.chain(history).collect(),
        }
    }
}

/// Builds the text to store for a user submission, consuming the pending
/// template if there is one.
pub fn compose_user_input(state: &mut ConversationState, text: &str) -> String {
    match state.take_pending_template() {
        Some(template) => {
            debug!("applying pending template");
            format!("{template} {text}")
        }
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Message;

    fn config() -> ModelConfig {
        ModelConfig::new("claude-3-5-haiku-20241022", 1024, 0.3).unwrap()
    }

    #[test]
    fn test_assemble_history() {
        let mut state = ConversationState::new();
        state.append(Message::user("Hi"));
        state.append(Message::assistant("Hello!"));
        state.append(Message::user("Explain"));

        let request = PromptAssembler::new().assemble(&state, &config());
        assert_eq!(request.model, "claude-3-5-haiku-20241022");
        assert_eq!(request.max_tokens, 1024);
        assert_eq!(request.temperature, 0.3);
        assert_eq!(
            request.messages,
            vec![
                ModelMessage::User("Hi".to_owned()),
                ModelMessage::Assistant("Hello!".to_owned()),
                ModelMessage::User("Explain".to_owned()),
            ]
        );
    }

    #[test]
    fn test_notices_are_excluded() {
        let mut state = ConversationState::new();
        state.append(Message::notice("I am your code assistant."));
        state.append(Message::user("Hi"));
        state.append(Message::error("❌ **Error**: timeout"));

        let request = PromptAssembler::new().assemble(&state, &config());
        assert_eq!(
            request.messages,
            vec![
                ModelMessage::User("Hi".to_owned()),
                ModelMessage::Assistant("❌ **Error**: timeout".to_owned()),
            ]
        );
        assert!(
            request
                .messages
                .iter()
                .all(|m| m.content() != "I am your code assistant.")
        );
    }

    #[test]
    fn test_preamble_is_fresh_every_time() {
        let assembler = PromptAssembler::with_preamble(Preamble::new(
            "Act as a senior reviewer.",
            "Understood.",
        ));
        let mut state = ConversationState::new();
        state.append(Message::user("Hi"));

        for _ in 0..2 {
            let request = assembler.assemble(&state, &config());
            assert_eq!(
                request.messages,
                vec![
                    ModelMessage::User("Act as a senior reviewer.".to_owned()),
                    ModelMessage::Assistant("Understood.".to_owned()),
                    ModelMessage::User("Hi".to_owned()),
                ]
            );
        }
        // Nothing was written back into the history.
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_template_consumed_once() {
        let mut state = ConversationState::new();
        state.set_pending_template("Review this code:");

        assert_eq!(compose_user_input(&mut state, "x"), "Review this code: x");
        assert_eq!(state.pending_template(), None);
        assert_eq!(compose_user_input(&mut state, "x"), "x");
    }
}
