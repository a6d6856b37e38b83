//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use icommon::{ExternalId, GenerationOptions, MessageId};
//!
//! let user = ExternalId::from("user_2abcDEF12345");
//! let message = MessageId::new(7);
//!
//! let options = GenerationOptions::chat_default();
//! assert_eq!(user.trailing_chars(5), "12345");
//! assert_eq!(message.to_string(), "7");
//! assert_eq!(options.max_tokens, Some(2000));
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use icommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Identifier newtypes shared across crates.
    //!
    //! ```rust
    //! use icommon::ExternalId;
    //!
    //! let id = ExternalId::new("user_42");
    //! assert_eq!(id.as_str(), "user_42");
    //! ```

    use std::fmt::{Display, Formatter};

    /// Identity issued by the external authentication provider.
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct ExternalId(String);

    impl ExternalId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }

        pub fn is_blank(&self) -> bool {
            self.0.trim().is_empty()
        }

        /// Last `count` characters, or the whole id when it is shorter.
        pub fn trailing_chars(&self, count: usize) -> &str {
            let len = self.0.chars().count();
            if len <= count {
                return self.0.as_str();
            }

            let start = self
                .0
                .char_indices()
                .nth(len - count)
                .map(|(index, _)| index)
                .unwrap_or(0);
            &self.0[start..]
        }
    }

    impl Display for ExternalId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for ExternalId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for ExternalId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct MessageId(u64);

    impl MessageId {
        pub fn new(value: u64) -> Self {
            Self(value)
        }

        pub fn value(self) -> u64 {
            self.0
        }

        pub fn next(self) -> Self {
            Self(self.0.saturating_add(1))
        }
    }

    impl Display for MessageId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }
}

pub mod model {
    //! Shared generation settings used by request types.
    //!
    //! ```rust
    //! use icommon::GenerationOptions;
    //!
    //! let options = GenerationOptions::default()
    //!     .with_temperature(0.2)
    //!     .with_max_tokens(128);
    //!
    //! assert_eq!(options.temperature, Some(0.2));
    //! assert_eq!(options.max_tokens, Some(128));
    //! ```

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct GenerationOptions {
        pub temperature: Option<f32>,
        pub max_tokens: Option<u32>,
    }

    impl GenerationOptions {
        pub const CHAT_MAX_TOKENS: u32 = 2000;
        pub const CHAT_TEMPERATURE: f32 = 0.7;

        /// Budget used for assistant chat turns.
        pub fn chat_default() -> Self {
            Self::default()
                .with_max_tokens(Self::CHAT_MAX_TOKENS)
                .with_temperature(Self::CHAT_TEMPERATURE)
        }

        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = Some(temperature);
            self
        }

        pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
            self.max_tokens = Some(max_tokens);
            self
        }
    }
}

pub use context::{ExternalId, MessageId};
pub use future::BoxFuture;
pub use model::GenerationOptions;

#[cfg(test)]
mod tests {
    use super::{ExternalId, GenerationOptions, MessageId};

    #[test]
    fn external_id_round_trips_strings() {
        let id = ExternalId::new("user_1");
        let other = ExternalId::from("user_1".to_string());

        assert_eq!(id, other);
        assert_eq!(id.as_str(), "user_1");
        assert_eq!(id.to_string(), "user_1");
        assert!(!id.is_blank());
        assert!(ExternalId::from("  ").is_blank());
    }

    #[test]
    fn trailing_chars_handles_short_and_multibyte_ids() {
        assert_eq!(ExternalId::from("user_2xYz9").trailing_chars(5), "2xYz9");
        assert_eq!(ExternalId::from("abc").trailing_chars(5), "abc");
        assert_eq!(ExternalId::from("idé日本語ab").trailing_chars(3), "語ab");
    }

    #[test]
    fn message_ids_increase() {
        let first = MessageId::new(1);
        assert_eq!(first.next(), MessageId::new(2));
        assert!(first < first.next());
        assert_eq!(MessageId::new(u64::MAX).next().value(), u64::MAX);
    }

    #[test]
    fn chat_default_uses_fixed_budget() {
        let options = GenerationOptions::chat_default();

        assert_eq!(options.max_tokens, Some(2000));
        assert_eq!(options.temperature, Some(0.7));
        assert_eq!(GenerationOptions::default().max_tokens, None);
    }
}
