//! Construction of the vendor-backed collaborators: the generative backend and
//! the identity provider.

use std::sync::Arc;
use std::time::Duration;

use iaccount::IdentityProvider;
use iobserve::{SafeProviderHooks, TracingObservabilityHooks};
use iprovider::{GenerativeBackend, ProviderError, ProviderOperationHooks, SecretString};
use reqwest::Client;

use crate::config::DEFAULT_PROVIDER_TIMEOUT;

#[derive(Clone)]
pub struct ProviderBuildConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub hooks: Arc<dyn ProviderOperationHooks>,
}

impl ProviderBuildConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
            hooks: Arc::new(SafeProviderHooks::new(TracingObservabilityHooks)),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    fn secret(&self, label: &str) -> Result<SecretString, ProviderError> {
        SecretString::non_empty(self.api_key.as_str()).ok_or_else(|| {
            ProviderError::authentication(format!("{label} API key must not be empty"))
        })
    }

    fn http_client(&self) -> Result<Client, ProviderError> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| ProviderError::transport(err.to_string()))
    }
}

impl std::fmt::Debug for ProviderBuildConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderBuildConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(feature = "backend-gemini")]
pub fn build_gemini_backend(
    config: ProviderBuildConfig,
) -> Result<Arc<dyn GenerativeBackend>, ProviderError> {
    use iprovider::{GeminiBackend, GeminiHttpTransport};

    let api_key = config.secret("Gemini")?;
    let mut transport = GeminiHttpTransport::new(config.http_client()?);
    if let Some(base_url) = config.base_url {
        transport = transport.with_base_url(base_url);
    }

    Ok(Arc::new(
        GeminiBackend::new(api_key, Arc::new(transport)).with_hooks(config.hooks),
    ))
}

#[cfg(not(feature = "backend-gemini"))]
pub fn build_gemini_backend(
    _config: ProviderBuildConfig,
) -> Result<Arc<dyn GenerativeBackend>, ProviderError> {
    Err(ProviderError::invalid_request(
        "backend-gemini feature is not enabled on imaginify",
    ))
}

#[cfg(feature = "identity-clerk")]
pub fn build_clerk_identity_provider(
    config: ProviderBuildConfig,
) -> Result<Arc<dyn IdentityProvider>, ProviderError> {
    use iaccount::ClerkIdentityProvider;

    let secret_key = config.secret("Clerk")?;
    let mut provider =
        ClerkIdentityProvider::new(config.http_client()?, secret_key).with_hooks(config.hooks);
    if let Some(base_url) = config.base_url {
        provider = provider.with_base_url(base_url);
    }

    Ok(Arc::new(provider))
}

#[cfg(not(feature = "identity-clerk"))]
pub fn build_clerk_identity_provider(
    _config: ProviderBuildConfig,
) -> Result<Arc<dyn IdentityProvider>, ProviderError> {
    Err(ProviderError::invalid_request(
        "identity-clerk feature is not enabled on imaginify",
    ))
}

#[cfg(test)]
mod tests {
    use iprovider::ProviderErrorKind;

    use super::*;

    #[cfg(feature = "backend-gemini")]
    #[test]
    fn blank_gemini_key_is_rejected_before_any_client_is_built() {
        let error = build_gemini_backend(ProviderBuildConfig::new("   "))
            .err()
            .expect("blank key should fail");
        assert_eq!(error.kind, ProviderErrorKind::Authentication);
    }

    #[cfg(feature = "identity-clerk")]
    #[test]
    fn blank_clerk_key_is_rejected_before_any_client_is_built() {
        let error = build_clerk_identity_provider(ProviderBuildConfig::new(""))
            .err()
            .expect("blank key should fail");
        assert_eq!(error.kind, ProviderErrorKind::Authentication);
    }

    #[cfg(not(feature = "backend-gemini"))]
    #[test]
    fn gemini_backend_is_unavailable_without_its_feature() {
        let error = build_gemini_backend(ProviderBuildConfig::new("gemini-key"))
            .err()
            .expect("backend should not build");
        assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
        assert!(error.message.contains("backend-gemini"));
    }

    #[cfg(not(feature = "identity-clerk"))]
    #[test]
    fn clerk_provider_is_unavailable_without_its_feature() {
        let error = build_clerk_identity_provider(ProviderBuildConfig::new("sk_test"))
            .err()
            .expect("provider should not build");
        assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
        assert!(error.message.contains("identity-clerk"));
    }

    #[cfg(feature = "backend-gemini")]
    #[test]
    fn gemini_backend_builds_with_custom_base_url() {
        use iprovider::ProviderId;

        let backend = build_gemini_backend(
            ProviderBuildConfig::new("gemini-key")
                .with_base_url("http://127.0.0.1:9/v1beta")
                .with_timeout(Duration::from_secs(5)),
        )
        .expect("backend should build");

        assert_eq!(backend.id(), ProviderId::Gemini);
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let rendered = format!("{:?}", ProviderBuildConfig::new("sk_live_secret"));
        assert!(!rendered.contains("sk_live_secret"));
    }
}
