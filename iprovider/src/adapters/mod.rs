#[cfg(feature = "backend-gemini")]
pub mod gemini;
