//! Metrics-based observability hooks for provider calls and account operations.
//!
//! ```rust
//! use iobserve::MetricsObservabilityHooks;
//! use iprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_provider_hooks(&hooks);
//! ```

use std::time::Duration;

use iaccount::{AccountError, AccountHooks, Resolution};
use icommon::ExternalId;
use iprovider::{ProviderError, ProviderId, ProviderOperationHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ProviderOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, _attempt: u32) {
        metrics::counter!(
            "imaginify_provider_attempt_start_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        _attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "imaginify_provider_retry_scheduled_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "imaginify_provider_retry_delay_seconds",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        metrics::counter!(
            "imaginify_provider_success_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "imaginify_provider_attempts_per_success",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "imaginify_provider_failure_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "imaginify_provider_attempts_per_failure",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }
}

impl AccountHooks for MetricsObservabilityHooks {
    fn on_user_resolved(&self, _external_id: &ExternalId, resolution: Resolution) {
        metrics::counter!(
            "imaginify_account_user_resolved_total",
            "resolution" => resolution.as_str()
        )
        .increment(1);
    }

    fn on_user_updated(&self, _external_id: &ExternalId) {
        metrics::counter!("imaginify_account_user_updated_total").increment(1);
    }

    fn on_user_deleted(&self, _external_id: &ExternalId) {
        metrics::counter!("imaginify_account_user_deleted_total").increment(1);
    }

    fn on_credits_adjusted(&self, _external_id: &ExternalId, delta: i64, _balance: i64) {
        let direction = if delta < 0 { "debit" } else { "credit" };
        metrics::counter!(
            "imaginify_account_credit_adjustments_total",
            "direction" => direction
        )
        .increment(1);
        metrics::counter!(
            "imaginify_account_credits_moved_total",
            "direction" => direction
        )
        .increment(delta.unsigned_abs());
    }

    fn on_operation_failure(&self, operation: &str, _external_id: &ExternalId, error: &AccountError) {
        metrics::counter!(
            "imaginify_account_failure_total",
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }
}
