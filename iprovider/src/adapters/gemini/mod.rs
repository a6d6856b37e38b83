mod backend;
mod serde_api;
mod transport;
mod types;

pub use backend::GeminiBackend;
pub use transport::{GeminiHttpTransport, GeminiTransport};
pub use types::{GeminiCandidate, GeminiContent, GeminiRequest, GeminiResponse, GeminiRole};
