//! Conversation-related types.
//!
//! A [`ConversationState`] is owned by exactly one user session: it is
//! created empty when the session starts, handed by reference to every
//! handler, and dropped with the session. Nothing in it is persisted.

use serde::Serialize;

/// The author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting, or a file they uploaded.
    User,
    /// The model.
    Assistant,
}

/// What a stored message is for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// A real conversation turn.
    #[default]
    Chat,
    /// A display-only note, such as the identity banner shown when a
    /// session starts. Never sent to the model.
    Notice,
    /// A failed request reported in place of the assistant reply.
    Error,
}

/// One turn in a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Message {
    /// The author of this message.
    pub role: Role,
    /// The purpose of this message.
    pub kind: MessageKind,
    /// The markdown text of this message.
    pub content: String,
}

impl Message {
    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            kind: MessageKind::Chat,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            kind: MessageKind::Chat,
            content: content.into(),
        }
    }

    /// Creates a display-only assistant notice.
    #[inline]
    pub fn notice<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            kind: MessageKind::Notice,
            content: content.into(),
        }
    }

    /// Creates an assistant message reporting a failed request.
    #[inline]
    pub fn error<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            kind: MessageKind::Error,
            content: content.into(),
        }
    }

    /// Returns `true` if this message only exists for display.
    #[inline]
    pub fn is_display_only(&self) -> bool {
        self.kind == MessageKind::Notice
    }
}

/// The ordered, session-scoped history of messages plus the ingestion
/// bookkeeping.
#[derive(Clone, Default, Debug)]
pub struct ConversationState {
    messages: Vec<Message>,
    ingested_files: Vec<String>,
    pending_template: Option<String>,
}

impl ConversationState {
    /// Creates an empty conversation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message to the end of the conversation.
    pub fn append(&mut self, message: Message) {
        trace!(
            "appending {:?}/{:?} message ({} chars)",
            message.role,
            message.kind,
            message.content.len()
        );
        self.messages.push(message);
    }

    /// Empties the conversation, forgets every ingested file, and drops the
    /// pending template.
    pub fn reset(&mut self) {
        debug!(
            "resetting conversation with {} messages",
            self.messages.len()
        );
        self.messages.clear();
        self.ingested_files.clear();
        self.pending_template = None;
    }

    /// Records `file_id` as ingested.
    ///
    /// Returns `false` without doing anything if the id was already
    /// recorded. Ids are compared verbatim, so two different files sharing
    /// a name are treated as the same file.
    pub fn mark_ingested<S: AsRef<str>>(&mut self, file_id: S) -> bool {
        let file_id = file_id.as_ref();
        if self.is_ingested(file_id) {
            return false;
        }
        self.ingested_files.push(file_id.to_owned());
        true
    }

    /// Returns `true` if `file_id` has been ingested in this session.
    #[inline]
    pub fn is_ingested(&self, file_id: &str) -> bool {
        self.ingested_files.iter().any(|f| f == file_id)
    }

    /// Returns the ingested file ids in ingestion order.
    #[inline]
    pub fn ingested_files(&self) -> &[String] {
        &self.ingested_files
    }

    /// Returns all messages, oldest first.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the newest message.
    #[inline]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if there are no messages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Holds `template` until the next user submission, replacing any
    /// template selected before.
    #[inline]
    pub fn set_pending_template<S: Into<String>>(&mut self, template: S) {
        self.pending_template = Some(template.into());
    }

    /// Returns the template waiting for the next submission.
    #[inline]
    pub fn pending_template(&self) -> Option<&str> {
        self.pending_template.as_deref()
    }

    /// Removes and returns the pending template.
    #[inline]
    pub fn take_pending_template(&mut self) -> Option<String> {
        self.pending_template.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_order() {
        let mut state = ConversationState::new();
        state.append(Message::user("first"));
        state.append(Message::assistant("second"));
        state.append(Message::user("third"));

        let contents: Vec<_> =
            state.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["first", "second", "third"]);
        assert_eq!(state.last_message().unwrap().content, "third");
        assert_eq!(state.len(), 3);
    }

    #[test]
    fn test_mark_ingested_once_per_name() {
        let mut state = ConversationState::new();
        let uploads = ["a.php", "b.js", "a.php", "c.md", "b.js", "a.php"];
        let accepted: Vec<_> =
            uploads.iter().filter(|f| state.mark_ingested(f)).collect();
        assert_eq!(accepted, [&"a.php", &"b.js", &"c.md"]);
        assert_eq!(state.ingested_files(), ["a.php", "b.js", "c.md"]);
    }

    #[test]
    fn test_mark_ingested_order_independent() {
        let names = ["x.txt", "y.txt", "x.txt", "z.txt", "y.txt"];
        let mut reversed = names;
        reversed.reverse();

        for order in [names, reversed] {
            let mut state = ConversationState::new();
            let accepted =
                order.iter().filter(|f| state.mark_ingested(f)).count();
            assert_eq!(accepted, 3);
        }
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = ConversationState::new();
        state.append(Message::user("hello"));
        state.append(Message::assistant("hi"));
        state.mark_ingested("index.php");
        state.set_pending_template("Review this:");

        state.reset();

        assert!(state.is_empty());
        assert!(state.ingested_files().is_empty());
        assert_eq!(state.pending_template(), None);
        // A file can be ingested again after a reset.
        assert!(state.mark_ingested("index.php"));
    }

    #[test]
    fn test_pending_template_is_taken_once() {
        let mut state = ConversationState::new();
        state.set_pending_template("Explain:");
        state.set_pending_template("Review:");
        assert_eq!(state.take_pending_template().as_deref(), Some("Review:"));
        assert_eq!(state.take_pending_template(), None);
    }

    #[test]
    fn test_serialize_message() {
        let value = serde_json::to_value(Message::error("boom")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "role": "assistant",
                "kind": "error",
                "content": "boom",
            })
        );
        assert!(Message::notice("hi").is_display_only());
        assert!(!Message::error("boom").is_display_only());
    }
}
