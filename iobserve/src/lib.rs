//! Production-friendly observability hooks for provider calls and account operations.
//!
//! ```rust
//! use iobserve::{MetricsObservabilityHooks, SafeAccountHooks, SafeProviderHooks, TracingObservabilityHooks};
//!
//! let _provider_hooks = SafeProviderHooks::new(TracingObservabilityHooks);
//! let _account_hooks = SafeAccountHooks::new(MetricsObservabilityHooks);
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeAccountHooks, SafeProviderHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeAccountHooks, SafeProviderHooks, TracingObservabilityHooks,
    };
}

#[cfg(test)]
mod tests;
