//! Environment-driven configuration for the runtime.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use iaccount::{CreditPolicy, UserStoreConfig};
use ichat::{DEFAULT_CHAT_MODEL, HistoryPolicy};
use iprovider::SecretString;

use crate::ImaginifyError;

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(90);

/// Value of `IMAGINIFY_DB_PATH` that selects the in-memory store.
pub const IN_MEMORY_DB_PATH: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImaginifyConfig {
    pub gemini_api_key: Option<SecretString>,
    pub gemini_api_base: Option<String>,
    pub gemini_model: String,
    pub clerk_secret_key: Option<SecretString>,
    pub clerk_api_base: Option<String>,
    pub store: UserStoreConfig,
    pub priming_path: Option<PathBuf>,
    pub provider_timeout: Duration,
    pub credit_policy: CreditPolicy,
    pub history_policy: HistoryPolicy,
}

impl Default for ImaginifyConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_api_base: None,
            gemini_model: DEFAULT_CHAT_MODEL.to_string(),
            clerk_secret_key: None,
            clerk_api_base: None,
            store: UserStoreConfig::default(),
            priming_path: None,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            credit_policy: CreditPolicy::default(),
            history_policy: HistoryPolicy::uncapped(),
        }
    }
}

impl ImaginifyConfig {
    pub fn from_env() -> Result<Self, ImaginifyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ImaginifyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self {
            gemini_api_key: read("GEMINI_API_KEY")
                .or_else(|| read("GOOGLE_API_KEY"))
                .map(SecretString::new),
            gemini_api_base: read("GEMINI_API_BASE"),
            clerk_secret_key: read("CLERK_SECRET_KEY").map(SecretString::new),
            clerk_api_base: read("CLERK_API_BASE"),
            priming_path: read("IMAGINIFY_PRIMING_PATH").map(PathBuf::from),
            ..Self::default()
        };

        if let Some(model) = read("GEMINI_MODEL") {
            config.gemini_model = model;
        }

        match read("IMAGINIFY_DB_PATH") {
            Some(path) if path == IN_MEMORY_DB_PATH => config.store = UserStoreConfig::InMemory,
            Some(path) => {
                config.store = UserStoreConfig::Sqlite {
                    path: PathBuf::from(path),
                }
            }
            None => {}
        }

        if let Some(secs) = parse_var::<u64>("IMAGINIFY_PROVIDER_TIMEOUT_SECS", &read)? {
            if secs == 0 {
                return Err(ImaginifyError::configuration(
                    "IMAGINIFY_PROVIDER_TIMEOUT_SECS must be greater than zero",
                ));
            }
            config.provider_timeout = Duration::from_secs(secs);
        }

        if let Some(floor) = parse_var::<i64>("IMAGINIFY_CREDIT_FLOOR", &read)? {
            config.credit_policy = CreditPolicy::with_floor(floor);
        }

        if let Some(max_turns) = parse_var::<usize>("IMAGINIFY_HISTORY_MAX_TURNS", &read)? {
            config.history_policy = HistoryPolicy::capped(max_turns);
        }

        Ok(config)
    }

    pub fn with_gemini_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.gemini_api_key = SecretString::non_empty(api_key);
        self
    }

    pub fn with_clerk_secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.clerk_secret_key = SecretString::non_empty(secret_key);
        self
    }

    pub fn with_store(mut self, store: UserStoreConfig) -> Self {
        self.store = store;
        self
    }
}

fn parse_var<T>(
    key: &str,
    read: &impl Fn(&str) -> Option<String>,
) -> Result<Option<T>, ImaginifyError>
where
    T: FromStr,
{
    let Some(raw) = read(key) else {
        return Ok(None);
    };

    raw.parse::<T>().map(Some).map_err(|_| {
        ImaginifyError::configuration(format!("{key} has an invalid value '{raw}'"))
    })
}
