//! Tracing-based observability hooks for provider calls and account operations.
//!
//! ```rust
//! use iaccount::AccountHooks;
//! use iobserve::TracingObservabilityHooks;
//!
//! fn accepts_account_hooks(_hooks: &dyn AccountHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_account_hooks(&hooks);
//! ```

use std::time::Duration;

use iaccount::{AccountError, AccountHooks, Resolution};
use icommon::ExternalId;
use iprovider::{ProviderError, ProviderId, ProviderOperationHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, attempt: u32) {
        tracing::info!(
            phase = "provider",
            event = "attempt_start",
            provider = %provider,
            operation,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "provider",
            event = "retry_scheduled",
            provider = %provider,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        tracing::info!(
            phase = "provider",
            event = "success",
            provider = %provider,
            operation,
            attempts
        );
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider = %provider,
            operation,
            attempts,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl AccountHooks for TracingObservabilityHooks {
    fn on_user_resolved(&self, external_id: &ExternalId, resolution: Resolution) {
        tracing::info!(
            phase = "account",
            event = "user_resolved",
            external_id = %external_id,
            resolution = resolution.as_str()
        );
    }

    fn on_user_updated(&self, external_id: &ExternalId) {
        tracing::info!(
            phase = "account",
            event = "user_updated",
            external_id = %external_id
        );
    }

    fn on_user_deleted(&self, external_id: &ExternalId) {
        tracing::info!(
            phase = "account",
            event = "user_deleted",
            external_id = %external_id
        );
    }

    fn on_credits_adjusted(&self, external_id: &ExternalId, delta: i64, balance: i64) {
        tracing::info!(
            phase = "account",
            event = "credits_adjusted",
            external_id = %external_id,
            delta,
            balance
        );
    }

    fn on_operation_failure(&self, operation: &str, external_id: &ExternalId, error: &AccountError) {
        tracing::error!(
            phase = "account",
            event = "failure",
            operation,
            external_id = %external_id,
            error_kind = ?error.kind,
            error = %error
        );
    }
}
