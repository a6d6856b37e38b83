//! Credit balance adjustments on top of the identity resolver.

use icommon::ExternalId;

use crate::error::AccountError;
use crate::resolver::{IdentityResolver, ensure_external_id};
use crate::types::{CreditPolicy, CreditUpdate, UserRecord};

#[derive(Debug, Clone)]
pub struct CreditLedger {
    resolver: IdentityResolver,
    policy: CreditPolicy,
}

impl CreditLedger {
    pub fn new(resolver: IdentityResolver) -> Self {
        Self {
            resolver,
            policy: CreditPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CreditPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> CreditPolicy {
        self.policy
    }

    /// Adds `delta` (negative to spend) to the balance and returns the
    /// post-adjustment record.
    ///
    /// A missing record is materialized through the resolver first. If that
    /// fails the call reports `NotFound` and nothing is written.
    pub async fn adjust_credits(
        &self,
        external_id: &ExternalId,
        delta: i64,
    ) -> Result<UserRecord, AccountError> {
        let result = self.apply(external_id, delta).await;
        match &result {
            Ok(record) => {
                self.resolver
                    .hooks()
                    .on_credits_adjusted(external_id, delta, record.credit_balance);
            }
            Err(error) => {
                self.resolver
                    .hooks()
                    .on_operation_failure("adjust_credits", external_id, error);
            }
        }
        result
    }

    /// Current balance without materializing a missing record.
    pub async fn balance(&self, external_id: &ExternalId) -> Result<i64, AccountError> {
        ensure_external_id(external_id)?;
        self.resolver
            .store()
            .find_by_external_id(external_id)
            .await?
            .map(|record| record.credit_balance)
            .ok_or_else(|| AccountError::not_found(format!("no such account '{external_id}'")))
    }

    async fn apply(&self, external_id: &ExternalId, delta: i64) -> Result<UserRecord, AccountError> {
        ensure_external_id(external_id)?;
        let store = self.resolver.store();

        if store.find_by_external_id(external_id).await?.is_none() {
            self.resolver
                .materialize(external_id)
                .await
                .map_err(|error| {
                    AccountError::not_found(format!(
                        "no such account '{external_id}': {}",
                        error.message
                    ))
                })?;
        }

        match store
            .increment_credits(external_id, delta, self.policy.floor)
            .await?
        {
            CreditUpdate::Applied(record) => Ok(record),
            CreditUpdate::Missing => Err(AccountError::not_found(format!(
                "no such account '{external_id}'"
            ))),
            CreditUpdate::BelowFloor { balance } => {
                Err(AccountError::insufficient_credits(format!(
                    "balance {balance} cannot cover {delta} for '{external_id}' (floor {})",
                    self.policy.floor.unwrap_or_default()
                )))
            }
        }
    }
}
