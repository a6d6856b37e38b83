//! Facade-level errors for configuration and runtime wiring.

use std::error::Error;
use std::fmt::{Display, Formatter};

use iaccount::AccountError;
use ichat::ChatError;
use iprovider::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImaginifyErrorKind {
    Configuration,
    Provider,
    Account,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImaginifyError {
    pub kind: ImaginifyErrorKind,
    pub message: String,
}

impl ImaginifyError {
    pub fn new(kind: ImaginifyErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ImaginifyErrorKind::Configuration, message)
    }
}

impl Display for ImaginifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ImaginifyError {}

impl From<ProviderError> for ImaginifyError {
    fn from(value: ProviderError) -> Self {
        Self::new(ImaginifyErrorKind::Provider, value.to_string())
    }
}

impl From<AccountError> for ImaginifyError {
    fn from(value: AccountError) -> Self {
        Self::new(ImaginifyErrorKind::Account, value.to_string())
    }
}

impl From<ChatError> for ImaginifyError {
    fn from(value: ChatError) -> Self {
        Self::new(ImaginifyErrorKind::Chat, value.to_string())
    }
}
