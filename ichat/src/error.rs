//! Chat-layer errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use iprovider::{ProviderError, ProviderErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    GenerationFailed,
    /// Another turn is already in flight on the session.
    SessionBusy,
    Configuration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    /// Set when the failure came from the generative backend.
    pub provider_kind: Option<ProviderErrorKind>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provider_kind: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::GenerationFailed, message)
    }

    pub fn session_busy(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::SessionBusy, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Configuration, message)
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        Self {
            kind: ChatErrorKind::GenerationFailed,
            message: value.message,
            provider_kind: Some(value.kind),
        }
    }
}
