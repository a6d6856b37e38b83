//! Clerk users API adapter for [`IdentityProvider`].

use std::sync::Arc;

use icommon::{BoxFuture, ExternalId};
use iprovider::{
    NoopOperationHooks, ProviderError, ProviderOperation, ProviderOperationHooks, RetryPolicy,
    SecretString, execute_with_retry, parse_retry_after,
};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, Url};
use serde::Deserialize;

use crate::identity::IdentityProvider;
use crate::types::IdentityProfile;

#[derive(Debug, Deserialize)]
pub(crate) struct ClerkUser {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    email_addresses: Vec<ClerkEmailAddress>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClerkEmailAddress {
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct ClerkErrorEnvelope {
    #[serde(default)]
    errors: Vec<ClerkErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ClerkErrorItem {
    #[serde(default)]
    message: String,
    #[serde(default)]
    long_message: Option<String>,
}

impl From<ClerkUser> for IdentityProfile {
    fn from(user: ClerkUser) -> Self {
        Self {
            email: user
                .email_addresses
                .into_iter()
                .next()
                .map(|address| address.email_address),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar_url: user.image_url,
        }
    }
}

pub struct ClerkIdentityProvider {
    client: Client,
    base_url: String,
    secret_key: SecretString,
    retry_policy: RetryPolicy,
    hooks: Arc<dyn ProviderOperationHooks>,
}

impl ClerkIdentityProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.clerk.com/v1";

    pub fn new(client: Client, secret_key: SecretString) -> Self {
        Self {
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            secret_key,
            retry_policy: RetryPolicy::for_operation(ProviderOperation::GetUser),
            hooks: Arc::new(NoopOperationHooks),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// The id is pushed as a single percent-encoded path segment, so `/`, `?`
    /// and `#` inside it never reach another endpoint.
    pub(crate) fn user_endpoint(&self, external_id: &ExternalId) -> Result<Url, ProviderError> {
        let id = external_id.as_str().trim();
        // The url crate drops dot segments on push, which would address `/users`.
        if matches!(id, "." | "..") {
            return Err(ProviderError::invalid_request(format!(
                "external id {id:?} is not a valid Clerk user id"
            )));
        }

        let mut url = Url::parse(&self.base_url).map_err(|err| {
            ProviderError::invalid_request(format!("invalid Clerk base url: {err}"))
        })?;
        url.path_segments_mut()
            .map_err(|()| ProviderError::invalid_request("Clerk base url cannot carry a path"))?
            .pop_if_empty()
            .push("users")
            .push(id);
        Ok(url)
    }

    async fn fetch_once(&self, external_id: &ExternalId) -> Result<IdentityProfile, ProviderError> {
        let response = self
            .client
            .get(self.user_endpoint(external_id)?)
            .bearer_auth(self.secret_key.expose())
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ProviderError::timeout(err.to_string())
                } else {
                    ProviderError::transport(err.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(parse_error(response).await);
        }

        let user: ClerkUser = response
            .json()
            .await
            .map_err(|err| ProviderError::transport(err.to_string()))?;
        Ok(user.into())
    }
}

impl std::fmt::Debug for ClerkIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClerkIdentityProvider")
            .field("base_url", &self.base_url)
            .field("secret_key", &self.secret_key)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

impl IdentityProvider for ClerkIdentityProvider {
    fn get_profile<'a>(
        &'a self,
        external_id: &'a ExternalId,
    ) -> BoxFuture<'a, Result<IdentityProfile, ProviderError>> {
        Box::pin(async move {
            if external_id.is_blank() {
                return Err(ProviderError::invalid_request("external id must not be blank"));
            }

            execute_with_retry(
                ProviderOperation::GetUser,
                &self.retry_policy,
                self.hooks.as_ref(),
                |_| self.fetch_once(external_id),
                tokio::time::sleep,
            )
            .await
        })
    }
}

async fn parse_error(response: Response) -> ProviderError {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let body = response.text().await.unwrap_or_default();
    classify_failure(status, retry_after.as_deref(), &body)
}

/// Clerk throttles with `429` plus a `Retry-After` header in seconds.
pub(crate) fn classify_failure(status: u16, retry_after: Option<&str>, body: &str) -> ProviderError {
    let message = extract_error_message(body)
        .unwrap_or_else(|| format!("Clerk request failed with status {status}"));
    let error = ProviderError::for_status(status, message);

    match retry_after.and_then(parse_retry_after) {
        Some(wait) => error.with_retry_after(wait),
        None => error,
    }
}

pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let envelope: ClerkErrorEnvelope = serde_json::from_str(body).ok()?;
    let first = envelope.errors.into_iter().next()?;
    let message = first.long_message.unwrap_or(first.message);
    (!message.trim().is_empty()).then_some(message)
}
