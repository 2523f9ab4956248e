//! `Inspect` implementations for std and ecosystem types.
//!
//! ## Terminals
//!
//! Scalars, text and the allow-listed value types (`Duration`, IP addresses,
//! `PathBuf`, and the `chrono` / `time` / `uuid` types behind their features)
//! are printed through their text form and never descended into. Under a rule
//! they print as `strategy.redact(text)`. Masking rewrites text through the
//! strategy and resets other terminals to a neutral value (`0`, `false`,
//! `'*'`, the epoch, a zeroed address prefix).
//!
//! ## Map keys are never redacted
//!
//! Only values are rewritten, so hashing and ordering invariants hold. Text
//! keys are matched against the map pseudo-type's rules.
//!
//! ## Sets can shrink
//!
//! Set elements are masked and reinserted. Elements that redact to the same
//! value collapse into one.

mod cells;
mod extras;
#[cfg(feature = "json")]
mod json;
mod maps;
mod passthrough;
mod sequences;
mod sets;
mod wrappers;

pub(crate) use maps::mask_entry;

/// `fn type_key` for impls keyed by their own type.
macro_rules! own_type_key {
    () => {
        fn type_key(&self) -> $crate::inspect::TypeKey {
            $crate::inspect::TypeKey::of::<Self>()
        }
    };
}

pub(super) use own_type_key;
