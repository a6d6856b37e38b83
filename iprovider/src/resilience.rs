//! Retry schedules for the two remote calls the application makes: Gemini
//! `generate` and the Clerk `get_user` profile lookup.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::time::Duration;

use crate::{ProviderError, ProviderErrorKind, ProviderId};

/// A remote call that goes through [`execute_with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderOperation {
    Generate,
    GetUser,
}

impl ProviderOperation {
    pub fn provider(self) -> ProviderId {
        match self {
            Self::Generate => ProviderId::Gemini,
            Self::GetUser => ProviderId::Clerk,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::GetUser => "get_user",
        }
    }

    /// A timed-out generation has already spent the chat turn's wait budget,
    /// so only the idempotent profile lookup resends after a timeout.
    pub fn retries(self, error: &ProviderError) -> bool {
        match (self, error.kind) {
            (Self::Generate, ProviderErrorKind::Timeout) => false,
            _ => error.retryable,
        }
    }
}

impl Display for ProviderOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider(), self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Generation is slow and quota-bound: few attempts, long gaps.
    /// Profile lookups are cheap: more attempts, short gaps.
    pub fn for_operation(operation: ProviderOperation) -> Self {
        match operation {
            ProviderOperation::Generate => Self {
                max_attempts: 3,
                initial_backoff: Duration::from_millis(500),
                max_backoff: Duration::from_secs(8),
                backoff_multiplier: 2.0,
            },
            ProviderOperation::GetUser => Self {
                max_attempts: 4,
                initial_backoff: Duration::from_millis(100),
                max_backoff: Duration::from_secs(1),
                backoff_multiplier: 2.0,
            },
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Wait before resending after `attempt` failed with `error`, or `None`
    /// when the call should give up. An upstream hint longer than
    /// `max_backoff` ends the loop so the caller sees the throttle at once.
    pub fn next_delay(
        &self,
        operation: ProviderOperation,
        attempt: u32,
        error: &ProviderError,
    ) -> Option<Duration> {
        if attempt >= self.max_attempts || !operation.retries(error) {
            return None;
        }

        match error.retry_after {
            Some(hint) if hint > self.max_backoff => None,
            Some(hint) => Some(hint),
            None => Some(self.backoff(attempt)),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let scaled = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(scaled.clamp(0.0, self.max_backoff.as_secs_f64()))
    }
}

/// Observation points around each remote call; every method defaults to a
/// no-op. `operation` is [`ProviderOperation::as_str`].
pub trait ProviderOperationHooks: Send + Sync {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: &str, _attempt: u32) {}

    fn on_retry_scheduled(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
    }

    fn on_success(&self, _provider: ProviderId, _operation: &str, _attempts: u32) {}

    fn on_failure(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _attempts: u32,
        _error: &ProviderError,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOperationHooks;

impl ProviderOperationHooks for NoopOperationHooks {}

/// Runs `call` until it succeeds or `policy` gives up. `sleep` is injected so
/// the loop stays runtime-agnostic.
pub async fn execute_with_retry<T, Call, CallFuture, Sleep, SleepFuture>(
    operation: ProviderOperation,
    policy: &RetryPolicy,
    hooks: &dyn ProviderOperationHooks,
    mut call: Call,
    mut sleep: Sleep,
) -> Result<T, ProviderError>
where
    Call: FnMut(u32) -> CallFuture,
    CallFuture: Future<Output = Result<T, ProviderError>>,
    Sleep: FnMut(Duration) -> SleepFuture,
    SleepFuture: Future<Output = ()>,
{
    let provider = operation.provider();
    let name = operation.as_str();

    let mut attempt = 1;
    loop {
        hooks.on_attempt_start(provider, name, attempt);

        let error = match call(attempt).await {
            Ok(value) => {
                hooks.on_success(provider, name, attempt);
                return Ok(value);
            }
            Err(error) => error,
        };

        let Some(delay) = policy.next_delay(operation, attempt, &error) else {
            hooks.on_failure(provider, name, attempt, &error);
            return Err(error);
        };
        hooks.on_retry_scheduled(provider, name, attempt, delay, &error);
        sleep(delay).await;
        attempt += 1;
    }
}
