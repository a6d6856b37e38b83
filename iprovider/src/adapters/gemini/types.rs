//! Gemini adapter types and backend-agnostic conversion logic.

use crate::{FinishReason, GenerationResponse, Message, ProviderError, ProviderId, Role, TokenUsage};

#[derive(Debug, Clone, PartialEq)]
pub struct GeminiRequest {
    pub model: String,
    pub contents: Vec<GeminiContent>,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiContent {
    pub role: GeminiRole,
    pub text: String,
}

impl From<Message> for GeminiContent {
    fn from(value: Message) -> Self {
        Self {
            role: value.role.into(),
            text: value.content,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiRole {
    User,
    Model,
}

impl GeminiRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

impl From<Role> for GeminiRole {
    fn from(value: Role) -> Self {
        match value {
            Role::User => Self::User,
            Role::Assistant => Self::Model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiCandidate {
    pub text: String,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiResponse {
    pub model: String,
    pub candidates: Vec<GeminiCandidate>,
    pub usage: TokenUsage,
}

impl GeminiResponse {
    /// Uses the first candidate. A missing or blank candidate is an error so
    /// callers never record an empty model turn.
    pub(crate) fn into_generation_response(self) -> Result<GenerationResponse, ProviderError> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::other("Gemini returned no candidates"))?;

        if candidate.text.trim().is_empty() {
            return Err(match candidate.finish_reason {
                FinishReason::Safety => ProviderError::invalid_request(
                    "Gemini blocked the response with its safety filters",
                ),
                reason => ProviderError::other(format!(
                    "Gemini returned an empty reply (finish reason {reason:?})"
                )),
            });
        }

        Ok(GenerationResponse {
            provider: ProviderId::Gemini,
            model: self.model,
            text: candidate.text,
            finish_reason: candidate.finish_reason,
            usage: self.usage,
        })
    }
}
