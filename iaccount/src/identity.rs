//! Identity provider contract and a fixed in-process implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use icommon::{BoxFuture, ExternalId};
use iprovider::ProviderError;

use crate::types::IdentityProfile;

/// Source of profile data for an external identity.
pub trait IdentityProvider: Send + Sync {
    fn get_profile<'a>(
        &'a self,
        external_id: &'a ExternalId,
    ) -> BoxFuture<'a, Result<IdentityProfile, ProviderError>>;
}

/// Profiles registered up front; unknown ids report `NotFound`.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    profiles: RwLock<HashMap<ExternalId, IdentityProfile>>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, external_id: impl Into<ExternalId>, profile: IdentityProfile) -> Self {
        self.register(external_id, profile);
        self
    }

    pub fn register(&self, external_id: impl Into<ExternalId>, profile: IdentityProfile) {
        if let Ok(mut profiles) = self.profiles.write() {
            profiles.insert(external_id.into(), profile);
        }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn get_profile<'a>(
        &'a self,
        external_id: &'a ExternalId,
    ) -> BoxFuture<'a, Result<IdentityProfile, ProviderError>> {
        Box::pin(async move {
            let profiles = self
                .profiles
                .read()
                .map_err(|_| ProviderError::other("identity profile lock poisoned"))?;
            profiles.get(external_id).cloned().ok_or_else(|| {
                ProviderError::not_found(format!("identity '{external_id}' is unknown"))
            })
        })
    }
}
