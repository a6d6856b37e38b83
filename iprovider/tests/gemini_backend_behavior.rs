#![cfg(feature = "backend-gemini")]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use iprovider::{
    FinishReason, GeminiBackend, GeminiCandidate, GeminiRequest, GeminiResponse, GeminiRole,
    GeminiTransport, GenerationRequest, GenerativeBackend, Message, ProviderError,
    ProviderErrorKind, ProviderFuture, ProviderId, ProviderOperationHooks, RetryPolicy,
    SecretString, TokenUsage,
};

#[derive(Debug, Default)]
struct FlakyTransport {
    calls: Mutex<u32>,
    last_request: Mutex<Option<GeminiRequest>>,
}

impl GeminiTransport for FlakyTransport {
    fn generate<'a>(
        &'a self,
        request: GeminiRequest,
        _api_key: SecretString,
    ) -> ProviderFuture<'a, Result<GeminiResponse, ProviderError>> {
        Box::pin(async move {
            let call = {
                let mut calls = self.calls.lock().expect("calls lock");
                *calls += 1;
                *calls
            };
            *self.last_request.lock().expect("request lock") = Some(request);

            if call == 1 {
                return Err(ProviderError::rate_limited("slow down"));
            }

            Ok(GeminiResponse {
                model: "gemini-1.5-flash".to_string(),
                candidates: vec![GeminiCandidate {
                    text: "integration-ok".to_string(),
                    finish_reason: FinishReason::Stop,
                }],
                usage: TokenUsage {
                    input_tokens: 3,
                    output_tokens: 1,
                    total_tokens: 4,
                },
            })
        })
    }
}

#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<String>>,
}

impl ProviderOperationHooks for EventLog {
    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        _delay: Duration,
        error: &ProviderError,
    ) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("retry:{provider}:{operation}:{attempt}:{:?}", error.kind));
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("success:{provider}:{operation}:{attempts}"));
    }
}

fn quick_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(1),
        backoff_multiplier: 1.0,
    }
}

#[tokio::test]
async fn gemini_backend_retries_rate_limits_and_reports_hooks() {
    let transport = Arc::new(FlakyTransport::default());
    let hooks = Arc::new(EventLog::default());
    let backend = GeminiBackend::new(SecretString::new("integration-key"), transport.clone())
        .with_hooks(hooks.clone())
        .with_retry_policy(quick_policy());

    let request = GenerationRequest::builder("gemini-1.5-flash")
        .message(Message::user("hello"))
        .max_tokens(2000)
        .temperature(0.7)
        .build()
        .expect("request should build");

    let response = backend
        .generate(request)
        .await
        .expect("retry should recover");
    assert_eq!(backend.id(), ProviderId::Gemini);
    assert_eq!(response.text, "integration-ok");
    assert_eq!(response.provider, ProviderId::Gemini);

    let sent = transport
        .last_request
        .lock()
        .expect("request lock")
        .clone()
        .expect("request should be recorded");
    assert_eq!(sent.contents[0].role, GeminiRole::User);
    assert_eq!(sent.max_output_tokens, Some(2000));

    let events = hooks.events.lock().expect("events lock").clone();
    assert_eq!(
        events,
        vec![
            "retry:gemini:generate:1:RateLimited".to_string(),
            "success:gemini:generate:2".to_string(),
        ]
    );
}

#[tokio::test]
async fn gemini_backend_gives_up_after_attempt_limit() {
    #[derive(Debug)]
    struct AlwaysDown;

    impl GeminiTransport for AlwaysDown {
        fn generate<'a>(
            &'a self,
            _request: GeminiRequest,
            _api_key: SecretString,
        ) -> ProviderFuture<'a, Result<GeminiResponse, ProviderError>> {
            Box::pin(async { Err(ProviderError::unavailable("down")) })
        }
    }

    let backend = GeminiBackend::new(SecretString::new("key"), Arc::new(AlwaysDown))
        .with_retry_policy(quick_policy());

    let request = GenerationRequest::new_validated("gemini-1.5-flash", vec![Message::user("hi")])
        .expect("request should validate");
    let error = backend.generate(request).await.expect_err("should fail");
    assert_eq!(error.kind, ProviderErrorKind::Unavailable);
}
