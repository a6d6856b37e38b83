//! Identity reconciliation between the external provider and local records.

use std::sync::Arc;

use icommon::ExternalId;

use crate::error::{AccountError, AccountErrorKind};
use crate::hooks::{AccountHooks, NoopAccountHooks, NoopViewInvalidator, Resolution, ViewInvalidator};
use crate::identity::IdentityProvider;
use crate::store::UserStore;
use crate::types::{IdentityProfile, NewUser, ProfileDefaults, UserPatch, UserRecord};

/// Path refreshed after an account is removed.
pub const ROOT_VIEW_PATH: &str = "/";

/// Keeps exactly one local record per external identity.
///
/// Lookups go by external id first and by email second; a record matched by
/// email is rebound to the new external id instead of being duplicated.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn UserStore>,
    identity: Arc<dyn IdentityProvider>,
    invalidator: Arc<dyn ViewInvalidator>,
    hooks: Arc<dyn AccountHooks>,
    defaults: ProfileDefaults,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn UserStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            store,
            identity,
            invalidator: Arc::new(NoopViewInvalidator),
            hooks: Arc::new(NoopAccountHooks),
            defaults: ProfileDefaults::default(),
        }
    }

    pub fn with_view_invalidator(mut self, invalidator: Arc<dyn ViewInvalidator>) -> Self {
        self.invalidator = invalidator;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn AccountHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_defaults(mut self, defaults: ProfileDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &ProfileDefaults {
        &self.defaults
    }

    pub(crate) fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub(crate) fn hooks(&self) -> &Arc<dyn AccountHooks> {
        &self.hooks
    }

    /// Inserts `user` unless a record with the same external id exists, in
    /// which case the existing record is returned untouched.
    pub async fn create_user(&self, user: NewUser) -> Result<UserRecord, AccountError> {
        let external_id = user.external_id.clone();
        let result: Result<UserRecord, AccountError> = async {
            ensure_external_id(&external_id)?;
            if let Some(existing) = self.store.find_by_external_id(&external_id).await? {
                return Ok(existing);
            }
            self.insert_or_reload(user).await
        }
        .await;
        self.observe("create_user", &external_id, result)
    }

    pub async fn resolve_or_create_user(
        &self,
        external_id: &ExternalId,
        profile: &IdentityProfile,
    ) -> Result<UserRecord, AccountError> {
        let result = self.resolve(external_id, profile).await;
        if let Ok((_, resolution)) = &result {
            self.hooks.on_user_resolved(external_id, *resolution);
        }
        self.observe(
            "resolve_or_create_user",
            external_id,
            result.map(|(record, _)| record),
        )
    }

    /// Returns the local record, materializing it from the identity provider
    /// when missing. A provider failure surfaces as `ProviderUnavailable`.
    pub async fn get_user_by_id(&self, external_id: &ExternalId) -> Result<UserRecord, AccountError> {
        let result = self.materialize(external_id).await;
        self.observe("get_user_by_id", external_id, result)
    }

    /// `get_user_by_id` without the failure hook, for callers that report
    /// the failure under their own operation name.
    pub(crate) async fn materialize(
        &self,
        external_id: &ExternalId,
    ) -> Result<UserRecord, AccountError> {
        ensure_external_id(external_id)?;
        if let Some(existing) = self.store.find_by_external_id(external_id).await? {
            return Ok(existing);
        }

        let profile = self
            .identity
            .get_profile(external_id)
            .await
            .map_err(|error| {
                AccountError::provider_unavailable(format!(
                    "identity provider could not supply profile for '{external_id}': {error}"
                ))
            })?;
        let (record, resolution) = self.resolve(external_id, &profile).await?;
        self.hooks.on_user_resolved(external_id, resolution);
        Ok(record)
    }

    pub async fn update_user(
        &self,
        external_id: &ExternalId,
        patch: UserPatch,
    ) -> Result<UserRecord, AccountError> {
        let result: Result<UserRecord, AccountError> = async {
            ensure_external_id(external_id)?;
            if patch.is_empty() {
                return Err(AccountError::invalid_request(
                    "user patch must set at least one field",
                ));
            }

            self.store
                .update_by_external_id(external_id, patch)
                .await?
                .ok_or_else(|| {
                    AccountError::update_failed(format!("no user matches '{external_id}'"))
                })
        }
        .await;

        if result.is_ok() {
            self.hooks.on_user_updated(external_id);
        }
        self.observe("update_user", external_id, result)
    }

    /// Removes the record and refreshes the root view.
    pub async fn delete_user(&self, external_id: &ExternalId) -> Result<UserRecord, AccountError> {
        let result: Result<UserRecord, AccountError> = async {
            ensure_external_id(external_id)?;
            self.store
                .delete_by_external_id(external_id)
                .await?
                .ok_or_else(|| AccountError::not_found(format!("no user matches '{external_id}'")))
        }
        .await;

        if result.is_ok() {
            self.invalidator.invalidate(ROOT_VIEW_PATH);
            self.hooks.on_user_deleted(external_id);
        }
        self.observe("delete_user", external_id, result)
    }

    async fn resolve(
        &self,
        external_id: &ExternalId,
        profile: &IdentityProfile,
    ) -> Result<(UserRecord, Resolution), AccountError> {
        ensure_external_id(external_id)?;

        if let Some(existing) = self.store.find_by_external_id(external_id).await? {
            return Ok((existing, Resolution::Existing));
        }

        if let Some(email) = profile.reconciliation_email()
            && let Some(matched) = self.store.find_by_email(&email).await?
            && let Some(rebound) = self
                .store
                .rebind_external_id(matched.id, external_id)
                .await?
        {
            tracing::debug!(
                phase = "account",
                event = "user_rebound",
                external_id = %external_id,
                previous_external_id = %matched.external_id
            );
            return Ok((rebound, Resolution::Rebound));
        }

        let record = self
            .insert_or_reload(self.defaults.new_user(external_id, profile))
            .await?;
        Ok((record, Resolution::Created))
    }

    /// A concurrent writer may win the insert; its record is then the answer.
    async fn insert_or_reload(&self, user: NewUser) -> Result<UserRecord, AccountError> {
        let external_id = user.external_id.clone();
        match self.store.insert(user).await {
            Ok(record) => Ok(record),
            Err(error) if error.kind == AccountErrorKind::Conflict => self
                .store
                .find_by_external_id(&external_id)
                .await?
                .ok_or(error),
            Err(error) => Err(error),
        }
    }

    fn observe<T>(
        &self,
        operation: &str,
        external_id: &ExternalId,
        result: Result<T, AccountError>,
    ) -> Result<T, AccountError> {
        if let Err(error) = &result {
            self.hooks.on_operation_failure(operation, external_id, error);
        }
        result
    }
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

pub(crate) fn ensure_external_id(external_id: &ExternalId) -> Result<(), AccountError> {
    if external_id.is_blank() {
        return Err(AccountError::invalid_request("external id must not be blank"));
    }
    Ok(())
}
