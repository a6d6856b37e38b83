//! Errors raised by the Gemini and Clerk integrations.
//!
//! Retryability is decided by the kind: throttling and transient network or
//! upstream faults may succeed on a resend, anything the caller has to fix
//! will not. Upstreams can attach a wait hint that the retry loop honors.
//!
//! ```rust
//! use std::time::Duration;
//! use iprovider::{ProviderError, ProviderErrorKind};
//!
//! assert!(!ProviderError::authentication("bad key").retryable);
//!
//! let throttled = ProviderError::for_status(429, "quota exhausted")
//!     .with_retry_after(Duration::from_secs(2));
//! assert_eq!(throttled.kind, ProviderErrorKind::RateLimited);
//! assert!(throttled.retryable);
//! assert_eq!(throttled.retry_after, Some(Duration::from_secs(2)));
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Authentication,
    RateLimited,
    InvalidRequest,
    Timeout,
    Transport,
    Unavailable,
    NotFound,
    Other,
}

impl ProviderErrorKind {
    /// Whether an unchanged resend of the same call can succeed.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Timeout | Self::Transport | Self::Unavailable
        )
    }

    /// Classifies a non-success HTTP status returned by Gemini or Clerk.
    pub fn for_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            404 => Self::NotFound,
            408 | 504 => Self::Timeout,
            429 => Self::RateLimited,
            400 | 422 => Self::InvalidRequest,
            500..=599 => Self::Unavailable,
            _ => Self::Transport,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
    /// Wait requested by the upstream before the call may be repeated.
    pub retry_after: Option<Duration>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.is_transient(),
            retry_after: None,
        }
    }

    pub fn for_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::for_status(status), message)
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotFound, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message)
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)?;
        if let Some(wait) = self.retry_after {
            write!(f, " (retry after {}s)", wait.as_secs_f64())?;
        }
        Ok(())
    }
}

impl Error for ProviderError {}

/// Reads a `Retry-After` header given in delta-seconds. HTTP-date values are
/// ignored and fall back to the policy backoff.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
