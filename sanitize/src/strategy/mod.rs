//! Redaction strategies: how a matched value is rewritten.
//!
//! The engine never decides *how* to redact. A [`Rule`](crate::Rule) binds a
//! member name to a [`RedactionStrategy`], and the engine hands matched values
//! to it:
//!
//! - **Text strategies** (`text`): [`TextStrategy`] and its configuration types
//!   (`KeepConfig`, `MaskConfig`, `EmailConfig`).
//! - **Markers** (`markers`): zero-sized, `Default`-constructible strategies such
//!   as [`Asterisk`] or [`Token`] that can be named in `#[mask(...)]` attributes
//!   and in `register_rule::<T, S>()`.
//!
//! # Custom strategies
//!
//! ```rust
//! use sanitize::{RedactionStrategy, TextPolicy, TextStrategy};
//!
//! #[derive(Default)]
//! struct LastTwo;
//!
//! impl TextPolicy for LastTwo {
//!     fn policy() -> TextStrategy {
//!         TextStrategy::keep_last(2)
//!     }
//! }
//!
//! assert_eq!(LastTwo.redact("abcdef"), "****ef");
//! ```

use std::sync::Arc;

mod markers;
mod text;

#[cfg(feature = "hash")]
pub use markers::Hashed;
pub use markers::{
    Asterisk, BlockchainAddress, CreditCard, Email, Full, IpAddress, PhoneNumber, Pii, TextPolicy,
    Token,
};
pub use text::{EmailConfig, KeepConfig, MASK_CHAR, MaskConfig, REDACTED_PLACEHOLDER, TextStrategy};

/// A pluggable redaction capability.
///
/// `redact` rewrites a single text value. `redact_keys` rewrites only the parts
/// of a structured text payload addressed by `keys` (JSONPath such as
/// `$.data.values[0].ak`, JSON Pointer, or plain key names). The default
/// `redact_keys` parses the payload as JSON and applies `redact` to every
/// addressed node; payloads that are not JSON are redacted whole.
pub trait RedactionStrategy: Send + Sync {
    /// Returns the redacted form of `value`.
    fn redact(&self, value: &str) -> String;

    /// Whether nested keys declared on a rule are forwarded to this strategy.
    ///
    /// When `false`, the engine ignores a rule's keys and always calls `redact`.
    fn accepts_keys(&self) -> bool {
        true
    }

    /// Returns `value` with the nodes addressed by `keys` redacted.
    fn redact_keys(&self, value: &str, keys: &[String]) -> String {
        #[cfg(feature = "json")]
        {
            crate::nested::redact_text_payload(value, keys, &|leaf: &str| self.redact(leaf))
        }
        #[cfg(not(feature = "json"))]
        {
            let _ = keys;
            self.redact(value)
        }
    }
}

impl std::fmt::Debug for dyn RedactionStrategy + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RedactionStrategy")
    }
}

/// Constructs a shared strategy instance from its type.
///
/// This is the factory used by declared rules: `#[mask(Asterisk)]` expands to a
/// declaration holding `strategy_of::<Asterisk>`.
pub fn strategy_of<S>() -> Arc<dyn RedactionStrategy>
where
    S: RedactionStrategy + Default + 'static,
{
    Arc::new(S::default())
}
