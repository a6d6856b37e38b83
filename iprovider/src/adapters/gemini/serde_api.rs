//! Gemini HTTP payload serde models and conversion helpers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{FinishReason, ProviderError, TokenUsage};

use super::types::{GeminiCandidate, GeminiRequest, GeminiResponse};

pub(crate) fn build_api_request(request: GeminiRequest) -> Result<GeminiApiRequest, ProviderError> {
    if request.contents.is_empty() {
        return Err(ProviderError::invalid_request(
            "Gemini request requires at least one content entry",
        ));
    }

    let contents = request
        .contents
        .into_iter()
        .map(|content| {
            if content.text.trim().is_empty() {
                return Err(ProviderError::invalid_request(
                    "Gemini content text must not be empty",
                ));
            }

            Ok(GeminiApiContent {
                role: Some(content.role.as_str().to_string()),
                parts: vec![GeminiApiPart {
                    text: Some(content.text),
                }],
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let generation_config =
        if request.max_output_tokens.is_none() && request.temperature.is_none() {
            None
        } else {
            Some(GeminiApiGenerationConfig {
                max_output_tokens: request.max_output_tokens,
                temperature: request.temperature,
            })
        };

    Ok(GeminiApiRequest {
        contents,
        generation_config,
    })
}

pub(crate) fn parse_finish_reason(value: Option<&str>) -> FinishReason {
    match value {
        Some("STOP") => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::MaxTokens,
        Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") | Some("PROHIBITED_CONTENT") => {
            FinishReason::Safety
        }
        _ => FinishReason::Other,
    }
}

pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<GeminiApiErrorEnvelope>(body).ok()?;
    Some(parsed.error.message)
}

/// Reads the `google.rpc.RetryInfo` detail Gemini attaches to quota errors,
/// e.g. `"retryDelay": "37s"`.
pub(crate) fn extract_retry_delay(body: &str) -> Option<Duration> {
    let parsed = serde_json::from_str::<GeminiApiErrorEnvelope>(body).ok()?;
    parsed
        .error
        .details
        .into_iter()
        .filter_map(|detail| detail.retry_delay)
        .find_map(|delay| {
            let seconds = delay.trim().strip_suffix('s')?.parse::<f64>().ok()?;
            (seconds.is_finite() && seconds >= 0.0).then(|| Duration::from_secs_f64(seconds))
        })
}

pub(crate) fn into_gemini_response(api: GeminiApiResponse, requested_model: &str) -> GeminiResponse {
    let candidates = api
        .candidates
        .into_iter()
        .map(|candidate| {
            let text = candidate
                .content
                .map(|content| {
                    content
                        .parts
                        .into_iter()
                        .filter_map(|part| part.text)
                        .collect::<String>()
                })
                .unwrap_or_default();

            GeminiCandidate {
                text,
                finish_reason: parse_finish_reason(candidate.finish_reason.as_deref()),
            }
        })
        .collect();

    let usage = api
        .usage_metadata
        .map(|usage| TokenUsage {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
            total_tokens: usage.total_token_count,
        })
        .unwrap_or_default();

    GeminiResponse {
        model: api
            .model_version
            .unwrap_or_else(|| requested_model.to_string()),
        candidates,
        usage,
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiApiErrorEnvelope {
    pub error: GeminiApiError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiApiError {
    pub message: String,
    #[serde(default)]
    pub details: Vec<GeminiApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiErrorDetail {
    pub retry_delay: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiRequest {
    pub contents: Vec<GeminiApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiApiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GeminiApiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GeminiApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiApiCandidate>,
    #[serde(default)]
    pub usage_metadata: Option<GeminiApiUsage>,
    #[serde(default)]
    pub model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiCandidate {
    #[serde(default)]
    pub content: Option<GeminiApiContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiUsage {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
    #[serde(default)]
    pub total_token_count: u32,
}
