//! Marker strategies.
//!
//! Each marker is a zero-sized, `Default`-constructible type that names a kind
//! of sensitive data. Markers are what `#[mask(...)]` attributes and
//! `register_rule::<T, S>()` refer to.

use super::{RedactionStrategy, TextStrategy};

/// Binds a marker type to a [`TextStrategy`].
///
/// Any `TextPolicy` is a [`RedactionStrategy`].
pub trait TextPolicy {
    fn policy() -> TextStrategy;
}

impl<P> RedactionStrategy for P
where
    P: TextPolicy + Send + Sync,
{
    fn redact(&self, value: &str) -> String {
        P::policy().apply_to(value)
    }
}

macro_rules! text_marker {
    ($(#[$meta:meta])* $name:ident => $policy:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl TextPolicy for $name {
            fn policy() -> TextStrategy {
                $policy
            }
        }
    };
}

text_marker! {
    /// Fixed-width asterisks, independent of the input length: `"Alice"` → `"******"`.
    Asterisk => TextStrategy::full_with("******")
}

text_marker! {
    /// Replaces the value with `"[REDACTED]"`.
    Full => TextStrategy::default()
}

text_marker! {
    /// Tokens and API keys: keeps the last 4 characters.
    Token => TextStrategy::keep_last(4)
}

text_marker! {
    /// Personally identifiable text: keeps the last 2 characters.
    Pii => TextStrategy::keep_last(2)
}

text_marker! {
    /// Keeps the first 2 characters of the local part and the domain.
    Email => TextStrategy::email_local(2)
}

text_marker! {
    CreditCard => TextStrategy::keep_last(4)
}

text_marker! {
    PhoneNumber => TextStrategy::keep_last(4)
}

text_marker! {
    IpAddress => TextStrategy::keep_last(4)
}

text_marker! {
    /// Wallet addresses: keeps the last 6 characters.
    BlockchainAddress => TextStrategy::keep_last(6)
}

/// Replaces the value with a short blake3 digest so equal inputs stay
/// correlatable in logs without revealing them.
#[cfg(feature = "hash")]
#[derive(Clone, Copy, Debug, Default)]
pub struct Hashed;

#[cfg(feature = "hash")]
impl Hashed {
    const PREFIX_LEN: usize = 16;
}

#[cfg(feature = "hash")]
impl RedactionStrategy for Hashed {
    fn redact(&self, value: &str) -> String {
        let digest = blake3::hash(value.as_bytes()).to_hex();
        format!("blake3:{}", &digest[..Self::PREFIX_LEN])
    }
}
