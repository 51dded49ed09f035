//! Append-only chat log scoped to the active session.
//!
//! The thread only stores entries; sending (and the one-outstanding-request
//! rule) is orchestrated by the study controller, which owns the notes used
//! as context.

use shared::types::ChatMessage;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatThread {
    messages: Vec<ChatMessage>,
    pending: bool,
}

impl ChatThread {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// True while a send is awaiting its reply.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }

    pub(crate) fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::user(text));
    }

    pub(crate) fn push_ai(&mut self, text: impl Into<String>) {
        let text: String = text.into();
        if text.is_empty() {
            self.messages
                .push(ChatMessage::ai("Sorry, I couldn't get a response."));
        } else {
            self.messages.push(ChatMessage::ai(text));
        }
    }

    /// Record a failed turn as a synthetic AI entry, so the error is
    /// visible in the thread itself.
    pub(crate) fn push_failure(&mut self, error_text: &str) {
        self.messages
            .push(ChatMessage::ai(format!("Error: {error_text}")));
    }
}
