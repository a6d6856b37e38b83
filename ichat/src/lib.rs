//! Primed assistant conversations and the chat widget that drives them.
//!
//! ```rust
//! use ichat::{ChatWidget, PrimingScript, WidgetState};
//!
//! let script = PrimingScript::imaginify_default().expect("shipped script should load");
//! assert_eq!(script.len(), 8);
//!
//! let mut widget = ChatWidget::new();
//! assert!(widget.submit("   ").is_none());
//! let pending = widget.submit("Which model removes backgrounds?").expect("accepted");
//! assert_eq!(widget.state(), &WidgetState::AwaitingResponse);
//! widget.resolve_success("Cloudinary's removeBackground.");
//! assert_eq!(widget.messages().len(), 2);
//! assert_eq!(pending.text, "Which model removes backgrounds?");
//! ```

mod error;
mod priming;
mod service;
mod session;
mod widget;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ChatMessage, ChatService, ChatServiceBuilder, ChatSession,
        ChatTurnResult, ChatWidget, HistoryPolicy, PendingTurn, PrimingScript, WidgetState,
    };
}

pub use error::{ChatError, ChatErrorKind};
pub use priming::PrimingScript;
pub use service::{ChatService, ChatServiceBuilder, ChatTurnResult, DEFAULT_CHAT_MODEL};
pub use session::{ChatSession, HistoryPolicy};
pub use widget::{ChatMessage, ChatWidget, PendingTurn, WidgetState};
