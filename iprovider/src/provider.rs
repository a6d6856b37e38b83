use std::future::Future;
use std::pin::Pin;

use crate::{GenerationRequest, GenerationResponse, ProviderError, ProviderId};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Text generation over an ordered turn history.
///
/// A single call is one blocking round trip; implementations do not stream.
pub trait GenerativeBackend: Send + Sync {
    fn id(&self) -> ProviderId;

    fn generate<'a>(
        &'a self,
        request: GenerationRequest,
    ) -> ProviderFuture<'a, Result<GenerationResponse, ProviderError>>;
}
