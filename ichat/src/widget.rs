//! Chat widget state machine: visibility, transcript, and loading/error state.

use icommon::MessageId;
use iprovider::Role;

use crate::{ChatError, ChatService, ChatSession};

const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetState {
    Idle,
    AwaitingResponse,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
}

/// A submitted user message waiting for its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    pub message_id: MessageId,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ChatWidget {
    open: bool,
    state: WidgetState,
    messages: Vec<ChatMessage>,
    last_id: MessageId,
}

impl Default for ChatWidget {
    fn default() -> Self {
        Self {
            open: false,
            state: WidgetState::Idle,
            messages: Vec::new(),
            last_id: MessageId::new(0),
        }
    }
}

impl ChatWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == WidgetState::AwaitingResponse
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            WidgetState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Accepts input unless it is blank or a reply is outstanding.
    pub fn submit(&mut self, input: &str) -> Option<PendingTurn> {
        let text = input.trim();
        if text.is_empty() || self.is_loading() {
            return None;
        }

        let message_id = self.push(Role::User, text.to_string());
        self.state = WidgetState::AwaitingResponse;
        Some(PendingTurn {
            message_id,
            text: text.to_string(),
        })
    }

    /// Returns false when no reply was outstanding.
    pub fn resolve_success(&mut self, reply: impl Into<String>) -> bool {
        if !self.is_loading() {
            return false;
        }

        self.push(Role::Assistant, reply.into());
        self.state = WidgetState::Idle;
        true
    }

    pub fn resolve_failure(&mut self, message: impl Into<String>) -> bool {
        if !self.is_loading() {
            return false;
        }

        let message = message.into();
        self.state = if message.trim().is_empty() {
            WidgetState::Error(FALLBACK_ERROR_MESSAGE.to_string())
        } else {
            WidgetState::Error(message)
        };
        true
    }

    /// Drives one full turn through `service`. Returns the pending turn when
    /// the input was accepted, whatever the outcome of generation.
    pub async fn submit_and_wait(
        &mut self,
        service: &ChatService,
        session: &ChatSession,
        input: &str,
    ) -> Option<PendingTurn> {
        let pending = self.submit(input)?;

        match service.send_turn(session, &pending.text).await {
            Ok(result) => {
                self.resolve_success(result.reply.content);
            }
            Err(error) => {
                self.resolve_failure(display_message(&error));
            }
        }
        Some(pending)
    }

    fn push(&mut self, role: Role, content: String) -> MessageId {
        self.last_id = self.last_id.next();
        self.messages.push(ChatMessage {
            id: self.last_id,
            role,
            content,
        });
        self.last_id
    }
}

fn display_message(error: &ChatError) -> String {
    if error.message.trim().is_empty() {
        FALLBACK_ERROR_MESSAGE.to_string()
    } else {
        error.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_submit_never_leaves_idle() {
        let mut widget = ChatWidget::new();
        assert_eq!(widget.submit("   "), None);
        assert_eq!(widget.submit(""), None);
        assert_eq!(widget.state(), &WidgetState::Idle);
        assert!(widget.messages().is_empty());
    }

    #[test]
    fn submit_trims_and_awaits_reply() {
        let mut widget = ChatWidget::new();
        let pending = widget.submit("  hello  ").expect("submit should be accepted");

        assert_eq!(pending.text, "hello");
        assert_eq!(pending.message_id, MessageId::new(1));
        assert!(widget.is_loading());
        assert_eq!(widget.messages()[0].content, "hello");

        assert_eq!(widget.submit("queued?"), None);
        assert_eq!(widget.messages().len(), 1);

        assert!(widget.resolve_success("hi"));
        assert_eq!(widget.state(), &WidgetState::Idle);
        assert_eq!(widget.messages()[1].role, Role::Assistant);
        assert_eq!(widget.messages()[1].id, MessageId::new(2));
    }

    #[test]
    fn failure_sets_error_and_next_submit_clears_it() {
        let mut widget = ChatWidget::new();
        widget.submit("hello").expect("submit should be accepted");
        assert!(widget.resolve_failure("backend down"));

        assert_eq!(widget.error(), Some("backend down"));
        assert_eq!(widget.messages().len(), 1);

        widget.submit("retry").expect("submit from error should be accepted");
        assert_eq!(widget.error(), None);
        assert!(widget.is_loading());
    }

    #[test]
    fn stray_resolutions_are_ignored() {
        let mut widget = ChatWidget::new();
        assert!(!widget.resolve_success("unsolicited"));
        assert!(!widget.resolve_failure("unsolicited"));
        assert_eq!(widget.state(), &WidgetState::Idle);
        assert!(widget.messages().is_empty());
    }

    #[test]
    fn blank_failure_message_uses_fallback() {
        let mut widget = ChatWidget::new();
        widget.submit("hello").expect("submit should be accepted");
        widget.resolve_failure("");
        assert_eq!(widget.error(), Some(FALLBACK_ERROR_MESSAGE));
    }

    #[test]
    fn visibility_toggles_independently_of_state() {
        let mut widget = ChatWidget::new();
        assert!(!widget.is_open());
        widget.open();
        widget.submit("hello").expect("submit should be accepted");
        widget.close();
        assert!(!widget.is_open());
        assert!(widget.is_loading());
        widget.toggle();
        assert!(widget.is_open());
    }
}
