use std::sync::{Arc, Mutex};
use std::time::Duration;

use iaccount::{AccountError, AccountHooks, Resolution};
use icommon::ExternalId;
use iprovider::{ProviderError, ProviderId, ProviderOperationHooks};

use crate::{
    MetricsObservabilityHooks, SafeAccountHooks, SafeProviderHooks, TracingObservabilityHooks,
};

fn exercise_provider_hooks(hooks: &dyn ProviderOperationHooks) {
    let provider_error = ProviderError::timeout("provider timeout");

    hooks.on_attempt_start(ProviderId::Gemini, "generate", 1);
    hooks.on_retry_scheduled(
        ProviderId::Gemini,
        "generate",
        1,
        Duration::from_millis(10),
        &provider_error,
    );
    hooks.on_success(ProviderId::Clerk, "get_user", 2);
    hooks.on_failure(ProviderId::Gemini, "generate", 2, &provider_error);
}

fn exercise_account_hooks(hooks: &dyn AccountHooks) {
    let external_id = ExternalId::from("user_2abcde");
    let error = AccountError::not_found("no such account");

    hooks.on_user_resolved(&external_id, Resolution::Created);
    hooks.on_user_resolved(&external_id, Resolution::Rebound);
    hooks.on_user_updated(&external_id);
    hooks.on_credits_adjusted(&external_id, -5, 5);
    hooks.on_credits_adjusted(&external_id, 5, 10);
    hooks.on_user_deleted(&external_id);
    hooks.on_operation_failure("adjust_credits", &external_id, &error);
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    exercise_provider_hooks(&TracingObservabilityHooks);
    exercise_account_hooks(&TracingObservabilityHooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    exercise_provider_hooks(&MetricsObservabilityHooks);
    exercise_account_hooks(&MetricsObservabilityHooks);
}

#[derive(Default, Clone)]
struct RecordingProviderHooks {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl ProviderOperationHooks for RecordingProviderHooks {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: &str, _attempt: u32) {
        self.events
            .lock()
            .expect("events lock")
            .push("attempt_start");
    }

    fn on_retry_scheduled(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
        self.events
            .lock()
            .expect("events lock")
            .push("retry_scheduled");
    }

    fn on_success(&self, _provider: ProviderId, _operation: &str, _attempts: u32) {
        self.events.lock().expect("events lock").push("success");
    }

    fn on_failure(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _attempts: u32,
        _error: &ProviderError,
    ) {
        self.events.lock().expect("events lock").push("failure");
    }
}

#[derive(Default, Clone)]
struct RecordingAccountHooks {
    events: Arc<Mutex<Vec<String>>>,
}

impl AccountHooks for RecordingAccountHooks {
    fn on_user_resolved(&self, _external_id: &ExternalId, resolution: Resolution) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("resolved:{}", resolution.as_str()));
    }

    fn on_user_updated(&self, _external_id: &ExternalId) {
        self.events
            .lock()
            .expect("events lock")
            .push("updated".to_string());
    }

    fn on_user_deleted(&self, _external_id: &ExternalId) {
        self.events
            .lock()
            .expect("events lock")
            .push("deleted".to_string());
    }

    fn on_credits_adjusted(&self, _external_id: &ExternalId, delta: i64, balance: i64) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("credits:{delta}:{balance}"));
    }

    fn on_operation_failure(
        &self,
        operation: &str,
        _external_id: &ExternalId,
        error: &AccountError,
    ) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("failure:{operation}:{:?}", error.kind));
    }
}

struct PanicProviderHooks;

impl ProviderOperationHooks for PanicProviderHooks {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: &str, _attempt: u32) {
        panic!("attempt_start panic");
    }

    fn on_success(&self, _provider: ProviderId, _operation: &str, _attempts: u32) {
        panic!("success panic");
    }
}

struct PanicAccountHooks;

impl AccountHooks for PanicAccountHooks {
    fn on_user_resolved(&self, _external_id: &ExternalId, _resolution: Resolution) {
        panic!("resolved panic");
    }

    fn on_credits_adjusted(&self, _external_id: &ExternalId, _delta: i64, _balance: i64) {
        panic!("credits panic");
    }

    fn on_operation_failure(
        &self,
        _operation: &str,
        _external_id: &ExternalId,
        _error: &AccountError,
    ) {
        panic!("failure panic");
    }
}

#[test]
fn safe_provider_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingProviderHooks::default();
    let events = Arc::clone(&inner.events);
    let hooks = SafeProviderHooks::new(inner);

    exercise_provider_hooks(&hooks);

    assert_eq!(
        events.lock().expect("events lock").clone(),
        vec!["attempt_start", "retry_scheduled", "success", "failure"]
    );
}

#[test]
fn safe_account_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingAccountHooks::default();
    let events = Arc::clone(&inner.events);
    let hooks = SafeAccountHooks::new(inner);

    exercise_account_hooks(&hooks);

    assert_eq!(
        events.lock().expect("events lock").clone(),
        vec![
            "resolved:created".to_string(),
            "resolved:rebound".to_string(),
            "updated".to_string(),
            "credits:-5:5".to_string(),
            "credits:5:10".to_string(),
            "deleted".to_string(),
            "failure:adjust_credits:NotFound".to_string(),
        ]
    );
}

#[test]
fn safe_provider_hooks_swallow_panics() {
    exercise_provider_hooks(&SafeProviderHooks::new(PanicProviderHooks));
}

#[test]
fn safe_account_hooks_swallow_panics() {
    exercise_account_hooks(&SafeAccountHooks::new(PanicAccountHooks));
}
