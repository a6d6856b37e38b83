//! User store trait and in-memory store implementation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use icommon::{BoxFuture, ExternalId};

use crate::backends::sqlite::default_sqlite_path;
use crate::error::AccountError;
use crate::types::{CreditUpdate, NewUser, UserPatch, UserRecord, normalize_email};

pub use crate::backends::sqlite::SqliteUserStore;

/// Persistence contract for local user records.
///
/// Implementations enforce uniqueness of both the external id and the
/// (non-blank) email, and apply credit increments atomically per record.
pub trait UserStore: Send + Sync {
    fn find_by_external_id<'a>(
        &'a self,
        external_id: &'a ExternalId,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AccountError>>;

    fn find_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AccountError>>;

    /// Fails with `Conflict` when the external id or email is already taken.
    fn insert<'a>(&'a self, user: NewUser) -> BoxFuture<'a, Result<UserRecord, AccountError>>;

    fn update_by_external_id<'a>(
        &'a self,
        external_id: &'a ExternalId,
        patch: UserPatch,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AccountError>>;

    /// Points an existing record (by surrogate id) at a new external id.
    fn rebind_external_id<'a>(
        &'a self,
        record_id: i64,
        external_id: &'a ExternalId,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AccountError>>;

    fn increment_credits<'a>(
        &'a self,
        external_id: &'a ExternalId,
        delta: i64,
        floor: Option<i64>,
    ) -> BoxFuture<'a, Result<CreditUpdate, AccountError>>;

    fn delete_by_external_id<'a>(
        &'a self,
        external_id: &'a ExternalId,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AccountError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStoreConfig {
    Sqlite { path: PathBuf },
    InMemory,
}

impl Default for UserStoreConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

pub fn create_user_store(config: UserStoreConfig) -> Result<Arc<dyn UserStore>, AccountError> {
    match config {
        UserStoreConfig::Sqlite { path } => Ok(Arc::new(SqliteUserStore::new(path)?)),
        UserStoreConfig::InMemory => Ok(Arc::new(InMemoryUserStore::new())),
    }
}

pub fn create_default_user_store() -> Result<Arc<dyn UserStore>, AccountError> {
    create_user_store(UserStoreConfig::default())
}

/// Computes the post-increment balance, or why it cannot be applied.
pub(crate) fn checked_balance(
    current: i64,
    delta: i64,
    floor: Option<i64>,
) -> Result<Result<i64, i64>, AccountError> {
    let next = current.checked_add(delta).ok_or_else(|| {
        AccountError::invalid_request(format!(
            "credit adjustment of {delta} overflows balance {current}"
        ))
    })?;

    match floor {
        Some(floor) if next < floor => Ok(Err(current)),
        _ => Ok(Ok(next)),
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    state: Mutex<InMemoryState>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    next_id: i64,
    users: BTreeMap<i64, UserRecord>,
}

impl InMemoryState {
    fn id_for_external(&self, external_id: &ExternalId) -> Option<i64> {
        self.users
            .values()
            .find(|user| &user.external_id == external_id)
            .map(|user| user.id)
    }

    fn id_for_email(&self, email: &str) -> Option<i64> {
        let email = normalize_email(email);
        if email.is_empty() {
            return None;
        }
        self.users
            .values()
            .find(|user| user.email == email)
            .map(|user| user.id)
    }
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, InMemoryState>, AccountError> {
        self.state
            .lock()
            .map_err(|_| AccountError::storage("user store lock poisoned"))
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_external_id<'a>(
        &'a self,
        external_id: &'a ExternalId,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AccountError>> {
        Box::pin(async move {
            let state = self.state()?;
            Ok(state
                .id_for_external(external_id)
                .and_then(|id| state.users.get(&id).cloned()))
        })
    }

    fn find_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AccountError>> {
        Box::pin(async move {
            let state = self.state()?;
            Ok(state
                .id_for_email(email)
                .and_then(|id| state.users.get(&id).cloned()))
        })
    }

    fn insert<'a>(&'a self, user: NewUser) -> BoxFuture<'a, Result<UserRecord, AccountError>> {
        Box::pin(async move {
            let mut state = self.state()?;
            if state.id_for_external(&user.external_id).is_some() {
                return Err(AccountError::conflict(format!(
                    "user '{}' already exists",
                    user.external_id
                )));
            }
            if state.id_for_email(&user.email).is_some() {
                return Err(AccountError::conflict(format!(
                    "email '{}' is already bound to another user",
                    user.email
                )));
            }

            state.next_id += 1;
            let now = SystemTime::now();
            let record = UserRecord {
                id: state.next_id,
                external_id: user.external_id,
                email: normalize_email(&user.email),
                username: user.username,
                first_name: user.first_name,
                last_name: user.last_name,
                photo: user.photo,
                credit_balance: user.credit_balance,
                created_at: now,
                updated_at: now,
            };
            state.users.insert(record.id, record.clone());
            Ok(record)
        })
    }

    fn update_by_external_id<'a>(
        &'a self,
        external_id: &'a ExternalId,
        patch: UserPatch,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AccountError>> {
        Box::pin(async move {
            let mut state = self.state()?;
            let Some(id) = state.id_for_external(external_id) else {
                return Ok(None);
            };
            let Some(record) = state.users.get_mut(&id) else {
                return Ok(None);
            };

            patch.apply_to(record);
            record.updated_at = SystemTime::now();
            Ok(Some(record.clone()))
        })
    }

    fn rebind_external_id<'a>(
        &'a self,
        record_id: i64,
        external_id: &'a ExternalId,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AccountError>> {
        Box::pin(async move {
            let mut state = self.state()?;
            if let Some(owner) = state.id_for_external(external_id)
                && owner != record_id
            {
                return Err(AccountError::conflict(format!(
                    "user '{external_id}' already exists"
                )));
            }
            let Some(record) = state.users.get_mut(&record_id) else {
                return Ok(None);
            };

            record.external_id = external_id.clone();
            record.updated_at = SystemTime::now();
            Ok(Some(record.clone()))
        })
    }

    fn increment_credits<'a>(
        &'a self,
        external_id: &'a ExternalId,
        delta: i64,
        floor: Option<i64>,
    ) -> BoxFuture<'a, Result<CreditUpdate, AccountError>> {
        Box::pin(async move {
            let mut state = self.state()?;
            let Some(id) = state.id_for_external(external_id) else {
                return Ok(CreditUpdate::Missing);
            };
            let Some(record) = state.users.get_mut(&id) else {
                return Ok(CreditUpdate::Missing);
            };

            match checked_balance(record.credit_balance, delta, floor)? {
                Ok(next) => {
                    record.credit_balance = next;
                    record.updated_at = SystemTime::now();
                    Ok(CreditUpdate::Applied(record.clone()))
                }
                Err(balance) => Ok(CreditUpdate::BelowFloor { balance }),
            }
        })
    }

    fn delete_by_external_id<'a>(
        &'a self,
        external_id: &'a ExternalId,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AccountError>> {
        Box::pin(async move {
            let mut state = self.state()?;
            Ok(state
                .id_for_external(external_id)
                .and_then(|id| state.users.remove(&id)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccountErrorKind;

    fn ada() -> NewUser {
        NewUser::new("user_ada", "ada")
            .with_email("Ada@Example.com")
            .with_credit_balance(10)
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_normalizes_email() {
        let store = InMemoryUserStore::new();
        let first = store.insert(ada()).await.expect("insert should succeed");
        let second = store
            .insert(NewUser::new("user_bob", "bob"))
            .await
            .expect("insert should succeed");

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.email, "ada@example.com");

        let by_email = store
            .find_by_email(" ADA@example.com")
            .await
            .expect("lookup should succeed")
            .expect("record should exist");
        assert_eq!(by_email.external_id, ExternalId::from("user_ada"));
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_keys() {
        let store = InMemoryUserStore::new();
        store.insert(ada()).await.expect("insert should succeed");

        let same_id = store
            .insert(NewUser::new("user_ada", "other"))
            .await
            .expect_err("duplicate id should fail");
        assert_eq!(same_id.kind, AccountErrorKind::Conflict);

        let same_email = store
            .insert(NewUser::new("user_other", "other").with_email("ada@example.com"))
            .await
            .expect_err("duplicate email should fail");
        assert_eq!(same_email.kind, AccountErrorKind::Conflict);
    }

    #[tokio::test]
    async fn blank_emails_never_collide_or_match() {
        let store = InMemoryUserStore::new();
        store
            .insert(NewUser::new("user_a", "a"))
            .await
            .expect("insert should succeed");
        store
            .insert(NewUser::new("user_b", "b"))
            .await
            .expect("blank email should not conflict");

        assert!(
            store
                .find_by_email("")
                .await
                .expect("lookup should succeed")
                .is_none()
        );
    }

    #[tokio::test]
    async fn increment_respects_floor_and_overflow() {
        let store = InMemoryUserStore::new();
        let ada_id = ExternalId::from("user_ada");
        store.insert(ada()).await.expect("insert should succeed");

        let applied = store
            .increment_credits(&ada_id, -12, None)
            .await
            .expect("increment should succeed");
        match applied {
            CreditUpdate::Applied(record) => assert_eq!(record.credit_balance, -2),
            other => panic!("unexpected update: {other:?}"),
        }

        let refused = store
            .increment_credits(&ada_id, -1, Some(0))
            .await
            .expect("increment should succeed");
        assert_eq!(refused, CreditUpdate::BelowFloor { balance: -2 });

        let overflow = store
            .increment_credits(&ada_id, i64::MIN, None)
            .await
            .expect_err("overflow should fail");
        assert_eq!(overflow.kind, AccountErrorKind::InvalidRequest);

        let missing = store
            .increment_credits(&ExternalId::from("user_ghost"), 5, None)
            .await
            .expect("increment should succeed");
        assert_eq!(missing, CreditUpdate::Missing);
    }

    #[tokio::test]
    async fn rebind_moves_record_to_new_external_id() {
        let store = InMemoryUserStore::new();
        let record = store.insert(ada()).await.expect("insert should succeed");
        let new_id = ExternalId::from("user_ada_v2");

        let rebound = store
            .rebind_external_id(record.id, &new_id)
            .await
            .expect("rebind should succeed")
            .expect("record should exist");
        assert_eq!(rebound.external_id, new_id);
        assert!(
            store
                .find_by_external_id(&ExternalId::from("user_ada"))
                .await
                .expect("lookup should succeed")
                .is_none()
        );
    }

    #[tokio::test]
    async fn delete_returns_removed_record() {
        let store = InMemoryUserStore::new();
        store.insert(ada()).await.expect("insert should succeed");
        let ada_id = ExternalId::from("user_ada");

        let deleted = store
            .delete_by_external_id(&ada_id)
            .await
            .expect("delete should succeed");
        assert_eq!(deleted.map(|user| user.username), Some("ada".to_string()));
        assert!(
            store
                .delete_by_external_id(&ada_id)
                .await
                .expect("delete should succeed")
                .is_none()
        );
    }

    #[test]
    fn checked_balance_reports_floor_violation_with_current_balance() {
        assert_eq!(checked_balance(3, -5, None).expect("no overflow"), Ok(-2));
        assert_eq!(checked_balance(3, -5, Some(0)).expect("no overflow"), Err(3));
        assert!(checked_balance(i64::MAX, 1, None).is_err());
    }
}
