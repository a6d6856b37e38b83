//! Account operation hooks and the view invalidation seam.

use icommon::ExternalId;

use crate::error::AccountError;

/// How `resolve_or_create_user` arrived at its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Existing,
    /// Matched by email and moved to the new external id.
    Rebound,
    Created,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Existing => "existing",
            Self::Rebound => "rebound",
            Self::Created => "created",
        }
    }
}

pub trait AccountHooks: Send + Sync {
    fn on_user_resolved(&self, _external_id: &ExternalId, _resolution: Resolution) {}

    fn on_user_updated(&self, _external_id: &ExternalId) {}

    fn on_user_deleted(&self, _external_id: &ExternalId) {}

    fn on_credits_adjusted(&self, _external_id: &ExternalId, _delta: i64, _balance: i64) {}

    fn on_operation_failure(
        &self,
        _operation: &str,
        _external_id: &ExternalId,
        _error: &AccountError,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAccountHooks;

impl AccountHooks for NoopAccountHooks {}

/// Asks the presentation layer to refresh cached views of a path.
pub trait ViewInvalidator: Send + Sync {
    fn invalidate(&self, path: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopViewInvalidator;

impl ViewInvalidator for NoopViewInvalidator {
    fn invalidate(&self, _path: &str) {}
}
