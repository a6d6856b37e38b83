//! Account-layer errors for identity reconciliation and credit accounting.

use std::error::Error;
use std::fmt::{Display, Formatter};

use iprovider::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountErrorKind {
    NotFound,
    ProviderUnavailable,
    UpdateFailed,
    InsufficientCredits,
    Conflict,
    InvalidRequest,
    Storage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountError {
    pub kind: AccountErrorKind,
    pub message: String,
}

impl AccountError {
    pub fn new(kind: AccountErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(AccountErrorKind::NotFound, message)
    }

    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        Self::new(AccountErrorKind::ProviderUnavailable, message)
    }

    pub fn update_failed(message: impl Into<String>) -> Self {
        Self::new(AccountErrorKind::UpdateFailed, message)
    }

    pub fn insufficient_credits(message: impl Into<String>) -> Self {
        Self::new(AccountErrorKind::InsufficientCredits, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(AccountErrorKind::Conflict, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(AccountErrorKind::InvalidRequest, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(AccountErrorKind::Storage, message)
    }
}

impl Display for AccountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for AccountError {}

impl From<ProviderError> for AccountError {
    fn from(value: ProviderError) -> Self {
        AccountError::provider_unavailable(value.to_string())
    }
}

/// Opt-in conversion for callers that treat a failed account lookup as "no user".
///
/// ```rust
/// use iaccount::{AccountError, AccountResultExt};
///
/// let missing: Result<u32, AccountError> = Err(AccountError::not_found("user_1"));
/// assert_eq!(missing.or_absent(), None);
/// ```
pub trait AccountResultExt<T> {
    fn or_absent(self) -> Option<T>;
}

impl<T> AccountResultExt<T> for Result<T, AccountError> {
    fn or_absent(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(
                    phase = "account",
                    event = "failure_suppressed",
                    error_kind = ?error.kind,
                    error = %error
                );
                None
            }
        }
    }
}
