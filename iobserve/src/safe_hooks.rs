use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use iaccount::{AccountError, AccountHooks, Resolution};
use icommon::ExternalId;
use iprovider::{ProviderError, ProviderId, ProviderOperationHooks};

/// Hook wrapper that contains panics raised by the inner hooks.
pub struct SafeProviderHooks<H> {
    inner: H,
}

impl<H> SafeProviderHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ProviderOperationHooks for SafeProviderHooks<H>
where
    H: ProviderOperationHooks,
{
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(provider, operation, attempt)
        }));
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_retry_scheduled(provider, operation, attempt, delay, error)
        }));
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(provider, operation, attempts)
        }));
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(provider, operation, attempts, error)
        }));
    }
}

pub struct SafeAccountHooks<H> {
    inner: H,
}

impl<H> SafeAccountHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> AccountHooks for SafeAccountHooks<H>
where
    H: AccountHooks,
{
    fn on_user_resolved(&self, external_id: &ExternalId, resolution: Resolution) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_user_resolved(external_id, resolution)
        }));
    }

    fn on_user_updated(&self, external_id: &ExternalId) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_user_updated(external_id)));
    }

    fn on_user_deleted(&self, external_id: &ExternalId) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_user_deleted(external_id)));
    }

    fn on_credits_adjusted(&self, external_id: &ExternalId, delta: i64, balance: i64) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_credits_adjusted(external_id, delta, balance)
        }));
    }

    fn on_operation_failure(&self, operation: &str, external_id: &ExternalId, error: &AccountError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_operation_failure(operation, external_id, error)
        }));
    }
}
