//! Turn orchestration over a generative backend.

use std::sync::Arc;
use std::time::Duration;

use icommon::GenerationOptions;
use iprovider::{FinishReason, GenerationRequest, GenerativeBackend, Message, TokenUsage};

use crate::{ChatError, ChatSession, HistoryPolicy, PrimingScript};

pub const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurnResult {
    pub reply: Message,
    pub finish_reason: FinishReason,
    pub usage: TokenUsage,
    /// Turns sent to the backend, priming included.
    pub sent_turns: usize,
}

#[derive(Clone)]
pub struct ChatService {
    backend: Arc<dyn GenerativeBackend>,
    model: String,
    options: GenerationOptions,
    priming: Arc<[Message]>,
    history_policy: HistoryPolicy,
    turn_timeout: Option<Duration>,
}

impl ChatService {
    pub fn builder(backend: Arc<dyn GenerativeBackend>) -> ChatServiceBuilder {
        ChatServiceBuilder::new(backend)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn options(&self) -> GenerationOptions {
        self.options
    }

    pub fn history_policy(&self) -> HistoryPolicy {
        self.history_policy
    }

    /// A fresh session preloaded with the configured priming turns.
    pub fn start_session(&self) -> ChatSession {
        ChatSession::new(Arc::clone(&self.priming))
    }

    /// Sends one user turn and appends the reply.
    ///
    /// Rejects blank input and concurrent turns on the same session. When the
    /// backend fails the user turn is withdrawn, leaving history unchanged.
    pub async fn send_turn(
        &self,
        session: &ChatSession,
        user_text: &str,
    ) -> Result<ChatTurnResult, ChatError> {
        if user_text.trim().is_empty() {
            return Err(ChatError::invalid_request("user text must not be blank"));
        }

        let mut live = session.try_begin_turn()?;
        live.push(Message::user(user_text));

        let skip = self
            .history_policy
            .overflow(live.len())
            .min(live.len().saturating_sub(1));
        let messages: Vec<Message> = session
            .priming_turns()
            .iter()
            .chain(live[skip..].iter())
            .cloned()
            .collect();
        let sent_turns = messages.len();

        tracing::debug!(
            phase = "chat",
            event = "turn_started",
            model = %self.model,
            sent_turns
        );

        match self.generate(messages).await {
            Ok(response) => {
                let reply = Message::assistant(response.text);
                live.push(reply.clone());
                self.history_policy.trim(&mut live);

                tracing::debug!(
                    phase = "chat",
                    event = "turn_completed",
                    live_turns = live.len(),
                    output_tokens = response.usage.output_tokens
                );
                Ok(ChatTurnResult {
                    reply,
                    finish_reason: response.finish_reason,
                    usage: response.usage,
                    sent_turns,
                })
            }
            Err(error) => {
                live.pop();
                tracing::warn!(
                    phase = "chat",
                    event = "turn_failed",
                    error_kind = ?error.kind,
                    provider_error_kind = ?error.provider_kind,
                    error = %error
                );
                Err(error)
            }
        }
    }

    async fn generate(
        &self,
        messages: Vec<Message>,
    ) -> Result<iprovider::GenerationResponse, ChatError> {
        let request = GenerationRequest::new(self.model.clone(), messages).with_options(self.options);
        let call = self.backend.generate(request);

        let response = match self.turn_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result.map_err(ChatError::from)?,
                Err(_) => {
                    return Err(ChatError::generation_failed(format!(
                        "generation timed out after {}ms",
                        limit.as_millis()
                    )));
                }
            },
            None => call.await.map_err(ChatError::from)?,
        };

        // Blank model turns are never recorded.
        if response.text.trim().is_empty() {
            return Err(ChatError::generation_failed(format!(
                "backend returned an empty reply (finish reason {:?})",
                response.finish_reason
            )));
        }
        Ok(response)
    }
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("backend", &self.backend.id())
            .field("model", &self.model)
            .field("options", &self.options)
            .field("priming_turns", &self.priming.len())
            .field("history_policy", &self.history_policy)
            .field("turn_timeout", &self.turn_timeout)
            .finish()
    }
}

pub struct ChatServiceBuilder {
    backend: Arc<dyn GenerativeBackend>,
    model: String,
    options: GenerationOptions,
    priming: Option<PrimingScript>,
    history_policy: HistoryPolicy,
    turn_timeout: Option<Duration>,
}

impl ChatServiceBuilder {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            model: DEFAULT_CHAT_MODEL.to_string(),
            options: GenerationOptions::chat_default(),
            priming: None,
            history_policy: HistoryPolicy::default(),
            turn_timeout: None,
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn priming(mut self, priming: PrimingScript) -> Self {
        self.priming = Some(priming);
        self
    }

    pub fn history_policy(mut self, history_policy: HistoryPolicy) -> Self {
        self.history_policy = history_policy;
        self
    }

    pub fn turn_timeout(mut self, turn_timeout: Duration) -> Self {
        self.turn_timeout = Some(turn_timeout);
        self
    }

    /// Falls back to the shipped priming script when none was supplied.
    pub fn build(self) -> Result<ChatService, ChatError> {
        if self.model.trim().is_empty() {
            return Err(ChatError::configuration("chat model must not be empty"));
        }
        if self.turn_timeout == Some(Duration::ZERO) {
            return Err(ChatError::configuration("turn timeout must be positive"));
        }

        let priming = match self.priming {
            Some(priming) => priming,
            None => PrimingScript::imaginify_default()?,
        };

        Ok(ChatService {
            backend: self.backend,
            model: self.model,
            options: self.options,
            priming: priming.turns().to_vec().into(),
            history_policy: self.history_policy,
            turn_timeout: self.turn_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use iprovider::{
        GenerationResponse, ProviderError, ProviderErrorKind, ProviderFuture, ProviderId, Role,
    };

    use super::*;
    use crate::ChatErrorKind;

    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().expect("requests lock").clone()
        }
    }

    impl GenerativeBackend for ScriptedBackend {
        fn id(&self) -> ProviderId {
            ProviderId::Gemini
        }

        fn generate<'a>(
            &'a self,
            request: GenerationRequest,
        ) -> ProviderFuture<'a, Result<GenerationResponse, ProviderError>> {
            Box::pin(async move {
                let model = request.model.clone();
                self.requests.lock().expect("requests lock").push(request);
                let text = self
                    .replies
                    .lock()
                    .expect("replies lock")
                    .pop_front()
                    .unwrap_or_else(|| Err(ProviderError::other("no scripted reply")))?;
                Ok(GenerationResponse {
                    provider: ProviderId::Gemini,
                    model,
                    text,
                    finish_reason: FinishReason::Stop,
                    usage: TokenUsage::default(),
                })
            })
        }
    }

    fn two_turn_priming() -> PrimingScript {
        PrimingScript::new(
            1,
            vec![Message::user("You help with images."), Message::assistant("Sure.")],
        )
        .expect("priming should validate")
    }

    #[tokio::test]
    async fn send_turn_appends_user_and_reply() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok("Hi there".to_string())]));
        let service = ChatService::builder(backend.clone())
            .priming(two_turn_priming())
            .build()
            .expect("service should build");
        let session = service.start_session();

        let result = service
            .send_turn(&session, "hello")
            .await
            .expect("turn should succeed");

        assert_eq!(result.reply, Message::assistant("Hi there"));
        assert_eq!(result.sent_turns, 3);
        let history = session.history().await;
        assert_eq!(history.len(), 4);
        assert_eq!(history[2], Message::user("hello"));

        let sent = backend.requests();
        assert_eq!(sent[0].options.max_tokens, Some(2000));
        assert_eq!(sent[0].options.temperature, Some(0.7));
        assert_eq!(sent[0].model, DEFAULT_CHAT_MODEL);
    }

    #[tokio::test]
    async fn failed_turn_restores_history() {
        let backend = Arc::new(ScriptedBackend::new(vec![Err(ProviderError::unavailable(
            "overloaded",
        ))]));
        let service = ChatService::builder(backend)
            .priming(two_turn_priming())
            .build()
            .expect("service should build");
        let session = service.start_session();
        let before = session.history().await;

        let error = service
            .send_turn(&session, "hello")
            .await
            .expect_err("turn should fail");

        assert_eq!(error.kind, ChatErrorKind::GenerationFailed);
        assert_eq!(error.provider_kind, Some(ProviderErrorKind::Unavailable));
        assert_eq!(session.history().await, before);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn empty_reply_is_withdrawn_and_session_keeps_working() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok(String::new()),
            Ok("Try the restore transformation.".to_string()),
        ]));
        let service = ChatService::builder(backend.clone())
            .priming(two_turn_priming())
            .build()
            .expect("service should build");
        let session = service.start_session();

        let error = service
            .send_turn(&session, "hello")
            .await
            .expect_err("empty reply should fail");
        assert_eq!(error.kind, ChatErrorKind::GenerationFailed);
        assert_eq!(error.provider_kind, None);
        assert_eq!(session.history().await.len(), 2);

        let result = service
            .send_turn(&session, "hello again")
            .await
            .expect("next turn should succeed");
        assert_eq!(result.sent_turns, 3);
        assert!(
            backend
                .requests()
                .iter()
                .all(|request| request.messages.iter().all(|m| !m.content.is_empty()))
        );
    }

    #[tokio::test]
    async fn blank_text_is_rejected_before_the_backend() {
        let backend = Arc::new(ScriptedBackend::default());
        let service = ChatService::builder(backend.clone())
            .priming(two_turn_priming())
            .build()
            .expect("service should build");
        let session = service.start_session();

        let error = service
            .send_turn(&session, " \n\t")
            .await
            .expect_err("blank input should fail");
        assert_eq!(error.kind, ChatErrorKind::InvalidRequest);
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn capped_history_drops_oldest_pairs_but_keeps_priming() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok("a1".to_string()),
            Ok("a2".to_string()),
            Ok("a3".to_string()),
        ]));
        let service = ChatService::builder(backend.clone())
            .priming(two_turn_priming())
            .history_policy(HistoryPolicy::capped(2))
            .build()
            .expect("service should build");
        let session = service.start_session();

        for text in ["q1", "q2", "q3"] {
            service
                .send_turn(&session, text)
                .await
                .expect("turn should succeed");
        }

        let history = session.history().await;
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].content, "You help with images.");
        assert_eq!(history[2], Message::user("q3"));
        assert_eq!(history[3], Message::assistant("a3"));

        let last = backend.requests().pop().expect("request should be recorded");
        assert_eq!(last.messages.len(), 3);
        assert_eq!(last.messages[2].role, Role::User);
    }

    #[tokio::test]
    async fn turn_timeout_maps_to_generation_failure() {
        struct StalledBackend;

        impl GenerativeBackend for StalledBackend {
            fn id(&self) -> ProviderId {
                ProviderId::Gemini
            }

            fn generate<'a>(
                &'a self,
                _request: GenerationRequest,
            ) -> ProviderFuture<'a, Result<GenerationResponse, ProviderError>> {
                Box::pin(std::future::pending())
            }
        }

        let service = ChatService::builder(Arc::new(StalledBackend))
            .priming(two_turn_priming())
            .turn_timeout(Duration::from_millis(10))
            .build()
            .expect("service should build");
        let session = service.start_session();

        let error = service
            .send_turn(&session, "hello")
            .await
            .expect_err("stalled turn should time out");
        assert_eq!(error.kind, ChatErrorKind::GenerationFailed);
        assert_eq!(session.history().await.len(), 2);
    }

    #[test]
    fn builder_rejects_blank_model() {
        let error = ChatService::builder(Arc::new(ScriptedBackend::default()))
            .model("  ")
            .build()
            .expect_err("blank model should fail");
        assert_eq!(error.kind, ChatErrorKind::Configuration);
    }

    #[test]
    fn builder_defaults_to_shipped_priming() {
        let service = ChatService::builder(Arc::new(ScriptedBackend::default()))
            .build()
            .expect("service should build");
        assert_eq!(service.start_session().priming_turns().len(), 8);
    }
}
