//! Local user records, identity reconciliation, and credit accounting.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use iaccount::{
//!     CreditLedger, IdentityProfile, IdentityResolver, InMemoryUserStore,
//!     StaticIdentityProvider,
//! };
//! use icommon::ExternalId;
//!
//! let runtime = tokio::runtime::Builder::new_current_thread()
//!     .build()
//!     .expect("runtime should build");
//!
//! runtime.block_on(async {
//!     let resolver = IdentityResolver::new(
//!         Arc::new(InMemoryUserStore::new()),
//!         Arc::new(StaticIdentityProvider::new()),
//!     );
//!     let ledger = CreditLedger::new(resolver.clone());
//!
//!     let id = ExternalId::from("user_2xYz9");
//!     let user = resolver
//!         .resolve_or_create_user(&id, &IdentityProfile::default())
//!         .await
//!         .expect("user should be created");
//!     assert_eq!(user.username, "user2xYz9");
//!
//!     let user = ledger.adjust_credits(&id, -1).await.expect("spend");
//!     assert_eq!(user.credit_balance, 9);
//! });
//! ```

mod backends;
#[cfg(feature = "identity-clerk")]
mod clerk;
mod error;
mod hooks;
mod identity;
mod ledger;
mod resolver;
mod store;
mod types;

pub mod prelude {
    pub use crate::{
        AccountError, AccountErrorKind, AccountHooks, AccountResultExt, CreditLedger,
        CreditPolicy, IdentityProfile, IdentityProvider, IdentityResolver, NewUser, UserPatch,
        UserRecord, UserStore, UserStoreConfig, ViewInvalidator, create_user_store,
    };
}

#[cfg(feature = "identity-clerk")]
pub use clerk::ClerkIdentityProvider;
pub use error::{AccountError, AccountErrorKind, AccountResultExt};
pub use hooks::{AccountHooks, NoopAccountHooks, NoopViewInvalidator, Resolution, ViewInvalidator};
pub use identity::{IdentityProvider, StaticIdentityProvider};
pub use ledger::CreditLedger;
pub use resolver::{IdentityResolver, ROOT_VIEW_PATH};
pub use store::{
    InMemoryUserStore, SqliteUserStore, UserStore, UserStoreConfig, create_default_user_store,
    create_user_store,
};
pub use types::{
    CreditPolicy, CreditUpdate, IdentityProfile, NewUser, ProfileDefaults, UserPatch, UserRecord,
    normalize_email,
};
