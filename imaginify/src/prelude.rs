//! Common imports for most imaginify applications.

pub use crate::{
    AccountError, AccountErrorKind, AccountResultExt, ChatError, ChatErrorKind, ChatService,
    ChatSession, ChatWidget, CreditLedger, Dimensions, ExternalId, IdentityProfile,
    IdentityResolver, ImaginifyConfig, ImaginifyError, Message, Role, Runtime, TransformationKind,
    TransformationStats, UserPatch, UserRecord, WidgetState, init_logging,
};
