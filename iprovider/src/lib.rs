//! Generative backend contracts, retry policy, and vendor adapters.
//!
//! ```rust
//! use iprovider::{GenerationRequest, Message, Role};
//!
//! let request = GenerationRequest::builder("gemini-1.5-flash")
//!     .message(Message::new(Role::User, "Which model removes backgrounds?"))
//!     .max_tokens(2000)
//!     .temperature(0.7)
//!     .build()
//!     .expect("request should validate");
//!
//! assert_eq!(request.messages.len(), 1);
//! ```

mod adapters;
mod credentials;
mod error;
mod model;
mod provider;
mod resilience;

pub mod prelude;

pub use credentials::SecretString;
pub use error::{ProviderError, ProviderErrorKind, parse_retry_after};
pub use model::{
    FinishReason, GenerationRequest, GenerationRequestBuilder, GenerationResponse, Message,
    ProviderId, Role, TokenUsage,
};
pub use provider::{GenerativeBackend, ProviderFuture};
pub use resilience::{
    NoopOperationHooks, ProviderOperation, ProviderOperationHooks, RetryPolicy,
    execute_with_retry,
};

#[cfg(feature = "backend-gemini")]
pub use adapters::gemini::{
    GeminiBackend, GeminiCandidate, GeminiContent, GeminiHttpTransport, GeminiRequest,
    GeminiResponse, GeminiRole, GeminiTransport,
};
