//! Common `iprovider` imports for downstream crates.

pub use crate::{
    FinishReason, GenerationRequest, GenerationRequestBuilder, GenerationResponse,
    GenerativeBackend, Message, NoopOperationHooks, ProviderError, ProviderErrorKind,
    ProviderFuture, ProviderId, ProviderOperation, ProviderOperationHooks, RetryPolicy, Role, SecretString,
    TokenUsage, execute_with_retry,
};
pub use icommon::{BoxFuture, GenerationOptions};
