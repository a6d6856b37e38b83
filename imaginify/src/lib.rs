//! Unified facade over the imaginify workspace crates.
//!
//! Re-exports the account, chat, and provider crates and adds environment
//! configuration, logging bootstrap, runtime wiring, and transformation stats.
//!
//! ```rust
//! use imaginify::{Dimensions, TransformationKind, TransformationStats};
//!
//! let stats = TransformationStats::compute(
//!     TransformationKind::Restore,
//!     Dimensions::new(640, 480),
//!     Some(Dimensions::new(1280, 960)),
//! )
//! .expect("restore reports stats");
//!
//! assert_eq!(stats.quality_improvement_percent, 85);
//! assert_eq!(stats.pixels_enhanced, 921_600);
//! ```

mod config;
mod error;
mod providers;
mod runtime;
mod stats;

pub mod logging;
pub mod prelude;

pub use iaccount;
pub use ichat;
pub use icommon;
pub use iobserve;
pub use iprovider;

pub use iaccount::{
    AccountError, AccountErrorKind, AccountHooks, AccountResultExt, CreditLedger, CreditPolicy,
    IdentityProfile, IdentityProvider, IdentityResolver, InMemoryUserStore, NewUser,
    ProfileDefaults, StaticIdentityProvider, UserPatch, UserRecord, UserStore, UserStoreConfig,
    ViewInvalidator,
};
pub use ichat::{
    ChatError, ChatErrorKind, ChatMessage, ChatService, ChatSession, ChatTurnResult, ChatWidget,
    HistoryPolicy, PendingTurn, PrimingScript, WidgetState,
};
pub use icommon::{BoxFuture, ExternalId, GenerationOptions, MessageId};
pub use iobserve::{
    MetricsObservabilityHooks, SafeAccountHooks, SafeProviderHooks, TracingObservabilityHooks,
};
pub use iprovider::{
    GenerativeBackend, Message, ProviderError, ProviderErrorKind, ProviderId, ProviderOperation,
    RetryPolicy, Role, SecretString,
};

pub use config::{DEFAULT_PROVIDER_TIMEOUT, IN_MEMORY_DB_PATH, ImaginifyConfig};
pub use error::{ImaginifyError, ImaginifyErrorKind};
pub use logging::init_logging;
pub use providers::{ProviderBuildConfig, build_clerk_identity_provider, build_gemini_backend};
pub use runtime::{AccountServices, Runtime, RuntimeBuilder};
pub use stats::{
    Dimensions, RESTORE_QUALITY_IMPROVEMENT_PERCENT, TransformationKind, TransformationStats,
};
