//! Gemini backend implementation over transport and shared models.

use std::sync::Arc;

use crate::{
    GenerationRequest, GenerationResponse, GenerativeBackend, NoopOperationHooks, ProviderError,
    ProviderFuture, ProviderId, ProviderOperation, ProviderOperationHooks, RetryPolicy,
    SecretString, execute_with_retry,
};

use super::transport::GeminiTransport;
use super::types::{GeminiContent, GeminiRequest};

#[derive(Clone)]
pub struct GeminiBackend {
    api_key: SecretString,
    transport: Arc<dyn GeminiTransport>,
    retry_policy: RetryPolicy,
    hooks: Arc<dyn ProviderOperationHooks>,
}

impl GeminiBackend {
    pub fn new(api_key: SecretString, transport: Arc<dyn GeminiTransport>) -> Self {
        Self {
            api_key,
            transport,
            retry_policy: RetryPolicy::for_operation(ProviderOperation::Generate),
            hooks: Arc::new(NoopOperationHooks),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub(crate) fn build_gemini_request(&self, request: GenerationRequest) -> GeminiRequest {
        GeminiRequest {
            model: request.model,
            contents: request
                .messages
                .into_iter()
                .map(GeminiContent::from)
                .collect(),
            max_output_tokens: request.options.max_tokens,
            temperature: request.options.temperature,
        }
    }
}

impl GenerativeBackend for GeminiBackend {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn generate<'a>(
        &'a self,
        request: GenerationRequest,
    ) -> ProviderFuture<'a, Result<GenerationResponse, ProviderError>> {
        Box::pin(async move {
            request.validate()?;
            let gemini_request = self.build_gemini_request(request);

            let response = execute_with_retry(
                ProviderOperation::Generate,
                &self.retry_policy,
                self.hooks.as_ref(),
                |_attempt| {
                    self.transport
                        .generate(gemini_request.clone(), self.api_key.clone())
                },
                tokio::time::sleep,
            )
            .await?;

            response.into_generation_response()
        })
    }
}
