use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use icommon::{BoxFuture, ExternalId};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior, params};

use crate::error::AccountError;
use crate::store::{UserStore, checked_balance};
use crate::types::{CreditUpdate, NewUser, UserPatch, UserRecord, normalize_email};

const USER_COLUMNS: &str = "
    id, external_id, email, username, first_name, last_name, photo, credit_balance,
    created_at_secs, created_at_nanos, updated_at_secs, updated_at_nanos
";

#[derive(Debug)]
pub struct SqliteUserStore {
    connection: Mutex<Connection>,
}

impl SqliteUserStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AccountError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                AccountError::storage(format!(
                    "failed to create sqlite parent directory: {error}"
                ))
            })?;
        }

        let connection = Connection::open(path).map_err(|error| {
            AccountError::storage(format!("failed to open sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    pub fn new_in_memory() -> Result<Self, AccountError> {
        let connection = Connection::open_in_memory().map_err(|error| {
            AccountError::storage(format!("failed to open in-memory sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, AccountError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                AccountError::storage(format!("failed to configure sqlite busy timeout: {error}"))
            })?;
        let store = Self {
            connection: Mutex::new(connection),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, AccountError> {
        self.connection
            .lock()
            .map_err(|_| AccountError::storage("sqlite user store lock poisoned"))
    }

    fn initialize_schema(&self) -> Result<(), AccountError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                username TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                photo TEXT NOT NULL,
                credit_balance INTEGER NOT NULL,
                created_at_secs INTEGER NOT NULL,
                created_at_nanos INTEGER NOT NULL,
                updated_at_secs INTEGER NOT NULL,
                updated_at_nanos INTEGER NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email
            ON users(email) WHERE email <> '';
            ",
        )
        .map_err(|error| {
            AccountError::storage(format!("failed to initialize sqlite schema: {error}"))
        })?;

        Ok(())
    }

    fn select_by_external_id(
        conn: &Connection,
        external_id: &ExternalId,
    ) -> Result<Option<UserRecord>, AccountError> {
        let raw = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE external_id = ?1"),
                params![external_id.as_str()],
                RawUserRow::from_row,
            )
            .optional()
            .map_err(|error| {
                AccountError::storage(format!("failed to query user by external id: {error}"))
            })?;
        raw.map(RawUserRow::into_record).transpose()
    }

    fn select_by_id(conn: &Connection, id: i64) -> Result<Option<UserRecord>, AccountError> {
        let raw = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                RawUserRow::from_row,
            )
            .optional()
            .map_err(|error| {
                AccountError::storage(format!("failed to query user by id: {error}"))
            })?;
        raw.map(RawUserRow::into_record).transpose()
    }
}

impl UserStore for SqliteUserStore {
    fn find_by_external_id<'a>(
        &'a self,
        external_id: &'a ExternalId,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AccountError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            Self::select_by_external_id(&conn, external_id)
        })
    }

    fn find_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AccountError>> {
        Box::pin(async move {
            let email = normalize_email(email);
            if email.is_empty() {
                return Ok(None);
            }

            let conn = self.connection()?;
            let raw = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                    params![email],
                    RawUserRow::from_row,
                )
                .optional()
                .map_err(|error| {
                    AccountError::storage(format!("failed to query user by email: {error}"))
                })?;
            raw.map(RawUserRow::into_record).transpose()
        })
    }

    fn insert<'a>(&'a self, user: NewUser) -> BoxFuture<'a, Result<UserRecord, AccountError>> {
        Box::pin(async move {
            let (secs, nanos) = encode_system_time(SystemTime::now())?;
            let conn = self.connection()?;
            conn.execute(
                "
                INSERT INTO users (
                    external_id,
                    email,
                    username,
                    first_name,
                    last_name,
                    photo,
                    credit_balance,
                    created_at_secs,
                    created_at_nanos,
                    updated_at_secs,
                    updated_at_nanos
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?8, ?9)
                ",
                params![
                    user.external_id.as_str(),
                    normalize_email(&user.email),
                    &user.username,
                    &user.first_name,
                    &user.last_name,
                    &user.photo,
                    user.credit_balance,
                    secs,
                    nanos,
                ],
            )
            .map_err(|error| write_error("insert user", &user.external_id, error))?;

            Self::select_by_id(&conn, conn.last_insert_rowid())?
                .ok_or_else(|| AccountError::storage("inserted user row could not be read back"))
        })
    }

    fn update_by_external_id<'a>(
        &'a self,
        external_id: &'a ExternalId,
        patch: UserPatch,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AccountError>> {
        Box::pin(async move {
            let (secs, nanos) = encode_system_time(SystemTime::now())?;
            let conn = self.connection()?;
            let changed = conn
                .execute(
                    "
                    UPDATE users SET
                        username = COALESCE(?2, username),
                        first_name = COALESCE(?3, first_name),
                        last_name = COALESCE(?4, last_name),
                        photo = COALESCE(?5, photo),
                        updated_at_secs = ?6,
                        updated_at_nanos = ?7
                    WHERE external_id = ?1
                    ",
                    params![
                        external_id.as_str(),
                        patch.username.as_deref(),
                        patch.first_name.as_deref(),
                        patch.last_name.as_deref(),
                        patch.photo.as_deref(),
                        secs,
                        nanos,
                    ],
                )
                .map_err(|error| write_error("update user", external_id, error))?;

            if changed == 0 {
                return Ok(None);
            }
            Self::select_by_external_id(&conn, external_id)
        })
    }

    fn rebind_external_id<'a>(
        &'a self,
        record_id: i64,
        external_id: &'a ExternalId,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AccountError>> {
        Box::pin(async move {
            let (secs, nanos) = encode_system_time(SystemTime::now())?;
            let conn = self.connection()?;
            let changed = conn
                .execute(
                    "
                    UPDATE users SET
                        external_id = ?2,
                        updated_at_secs = ?3,
                        updated_at_nanos = ?4
                    WHERE id = ?1
                    ",
                    params![record_id, external_id.as_str(), secs, nanos],
                )
                .map_err(|error| write_error("rebind user", external_id, error))?;

            if changed == 0 {
                return Ok(None);
            }
            Self::select_by_id(&conn, record_id)
        })
    }

    fn increment_credits<'a>(
        &'a self,
        external_id: &'a ExternalId,
        delta: i64,
        floor: Option<i64>,
    ) -> BoxFuture<'a, Result<CreditUpdate, AccountError>> {
        Box::pin(async move {
            let (secs, nanos) = encode_system_time(SystemTime::now())?;
            let mut conn = self.connection()?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|error| {
                    AccountError::storage(format!("failed to begin credit transaction: {error}"))
                })?;

            let current: Option<i64> = tx
                .query_row(
                    "SELECT credit_balance FROM users WHERE external_id = ?1",
                    params![external_id.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|error| {
                    AccountError::storage(format!("failed to read credit balance: {error}"))
                })?;
            let Some(current) = current else {
                return Ok(CreditUpdate::Missing);
            };

            if let Err(balance) = checked_balance(current, delta, floor)? {
                return Ok(CreditUpdate::BelowFloor { balance });
            }

            tx.execute(
                "
                UPDATE users SET
                    credit_balance = credit_balance + ?2,
                    updated_at_secs = ?3,
                    updated_at_nanos = ?4
                WHERE external_id = ?1
                ",
                params![external_id.as_str(), delta, secs, nanos],
            )
            .map_err(|error| write_error("adjust credits", external_id, error))?;

            let record = Self::select_by_external_id(&tx, external_id)?;
            tx.commit().map_err(|error| {
                AccountError::storage(format!("failed to commit credit transaction: {error}"))
            })?;

            Ok(record.map_or(CreditUpdate::Missing, CreditUpdate::Applied))
        })
    }

    fn delete_by_external_id<'a>(
        &'a self,
        external_id: &'a ExternalId,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AccountError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let Some(record) = Self::select_by_external_id(&conn, external_id)? else {
                return Ok(None);
            };

            conn.execute("DELETE FROM users WHERE id = ?1", params![record.id])
                .map_err(|error| write_error("delete user", external_id, error))?;
            Ok(Some(record))
        })
    }
}

struct RawUserRow {
    id: i64,
    external_id: String,
    email: String,
    username: String,
    first_name: String,
    last_name: String,
    photo: String,
    credit_balance: i64,
    created_at: (i64, i64),
    updated_at: (i64, i64),
}

impl RawUserRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            external_id: row.get(1)?,
            email: row.get(2)?,
            username: row.get(3)?,
            first_name: row.get(4)?,
            last_name: row.get(5)?,
            photo: row.get(6)?,
            credit_balance: row.get(7)?,
            created_at: (row.get(8)?, row.get(9)?),
            updated_at: (row.get(10)?, row.get(11)?),
        })
    }

    fn into_record(self) -> Result<UserRecord, AccountError> {
        Ok(UserRecord {
            id: self.id,
            external_id: ExternalId::from(self.external_id),
            email: self.email,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            photo: self.photo,
            credit_balance: self.credit_balance,
            created_at: decode_system_time(self.created_at.0, self.created_at.1)?,
            updated_at: decode_system_time(self.updated_at.0, self.updated_at.1)?,
        })
    }
}

fn write_error(action: &str, external_id: &ExternalId, error: rusqlite::Error) -> AccountError {
    match &error {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            AccountError::conflict(format!(
                "failed to {action} for '{external_id}': unique key already taken"
            ))
        }
        _ => AccountError::storage(format!("failed to {action} for '{external_id}': {error}")),
    }
}

fn encode_system_time(value: SystemTime) -> Result<(i64, i64), AccountError> {
    let duration = value.duration_since(UNIX_EPOCH).map_err(|error| {
        AccountError::invalid_request(format!("timestamp predates unix epoch: {error}"))
    })?;
    Ok((
        duration.as_secs() as i64,
        i64::from(duration.subsec_nanos()),
    ))
}

fn decode_system_time(seconds: i64, nanos: i64) -> Result<SystemTime, AccountError> {
    if seconds < 0 {
        return Err(AccountError::storage(format!(
            "timestamp seconds must be non-negative, got {seconds}"
        )));
    }
    if !(0..1_000_000_000).contains(&nanos) {
        return Err(AccountError::storage(format!(
            "timestamp nanos must be in [0, 1_000_000_000), got {nanos}"
        )));
    }
    Ok(UNIX_EPOCH + Duration::new(seconds as u64, nanos as u32))
}

pub(crate) fn default_sqlite_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("IMAGINIFY_DB_PATH") {
        return PathBuf::from(explicit);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home)
            .join(".imaginify")
            .join("users.sqlite3");
    }

    PathBuf::from("imaginify-users.sqlite3")
}
