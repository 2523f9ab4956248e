//! Rule-driven masking and cycle-safe diagnostic printing.
//!
//! This crate separates:
//! - **Rules**: which members of which types are sensitive, declared with
//!   `#[derive(Sanitize)]` attributes or registered at runtime.
//! - **Strategies**: how a matched value is redacted (`Asterisk`, `Token`,
//!   `Email`, your own [`RedactionStrategy`]).
//!
//! On top of those it offers two walks over any value implementing [`Inspect`]:
//! - [`mask`] / [`mask_deep_copy`] rewrite matched members in place or on a copy;
//! - [`print`] renders a bounded `Name(field=value)` string that never follows a
//!   cycle, never descends past a depth limit and never enumerates huge
//!   collections.
//!
//! What it does not do:
//! - decide which fields are sensitive
//! - serialize to a wire format; printing produces a debug string only
//!
//! The free functions use the process-wide [`RuleRegistry::global`]. Use
//! [`Masker`] and [`Printer`] directly to work against a scoped registry.
//!
//! ```
//! use sanitize::{Pii, Sanitize, SanitizeExt};
//!
//! #[derive(Clone, Sanitize)]
//! struct Patient {
//!     #[mask(Pii)]
//!     name: String,
//!     ward: u8,
//! }
//!
//! let patient = Patient { name: "Alice Smith".into(), ward: 4 };
//! assert_eq!(patient.printed().to_string(), "Patient(name=*********th, ward=4)");
//! assert_eq!(patient.masked().unwrap().name, "*********th");
//! ```

// <https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html>
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_copy_implementations,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]
// <https://rust-lang.github.io/rust-clippy/stable>
#![warn(
    clippy::all,
    clippy::cargo,
    clippy::dbg_macro,
    clippy::float_cmp_const,
    clippy::get_unwrap,
    clippy::mem_forget,
    clippy::nursery,
    clippy::pedantic,
    clippy::todo,
    clippy::unwrap_used,
    clippy::uninlined_format_args
)]
// Allow some clippy lints
#![allow(
    clippy::default_trait_access,
    clippy::doc_markdown,
    clippy::if_not_else,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::use_self,
    clippy::cargo_common_metadata,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::result_large_err,
    clippy::option_if_let_else,
    clippy::trivially_copy_pass_by_ref
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::non_ascii_literal, clippy::unwrap_used))]

use std::fmt;

pub use sanitize_derive::Sanitize;

#[allow(unused_extern_crates)]
extern crate self as sanitize;

mod error;
mod inspect;
mod mask;
#[cfg(feature = "json")]
pub mod nested;
mod print;
mod rules;
#[cfg(feature = "slog")]
pub mod slog;
mod strategy;
pub mod tracing;

pub use error::{MaskFailure, SanitizeError};
pub use inspect::{Elements, Entries, Inspect, Literal, Record, Shape, SharedCell, TypeKey};
pub use mask::{CopyPolicy, MaskContext, Masker, mask_record};
pub use print::{CYCLE_TAG, NULL_TOKEN, PrintOptions, Printer, UNAVAILABLE};
pub use rules::{
    EntryRedaction, NameMatcher, Redaction, Rule, RuleDeclaration, RuleGroup, RuleRegistry,
};
#[cfg(feature = "hash")]
pub use strategy::Hashed;
pub use strategy::{
    Asterisk, BlockchainAddress, CreditCard, Email, EmailConfig, Full, IpAddress, KeepConfig,
    MASK_CHAR, MaskConfig, PhoneNumber, Pii, REDACTED_PLACEHOLDER, RedactionStrategy, TextPolicy,
    TextStrategy, Token, strategy_of,
};

/// The process-wide registry used by the free functions.
pub fn registry() -> &'static RuleRegistry {
    RuleRegistry::global()
}

/// Masks `value` in place against the global registry.
pub fn mask<T: Inspect>(value: &mut T) -> Result<(), SanitizeError> {
    Masker::new(registry()).mask(value)
}

/// Masks a copy of `value`; `value` and every cell it shares stay untouched.
pub fn mask_deep_copy<T: Inspect + Clone>(value: &T) -> Result<T, SanitizeError> {
    Masker::new(registry()).mask_copy(value)
}

/// Renders `value` against the global registry with default [`PrintOptions`].
pub fn print<T: Inspect>(value: &T) -> String {
    print_dyn(value)
}

pub fn print_dyn(value: &dyn Inspect) -> String {
    Printer::new(registry()).print(value)
}

/// Whether any rule governs `T` in the global registry.
pub fn requires_masking<T: Inspect>() -> bool {
    registry().requires_masking(TypeKey::of::<T>())
}

/// Registers a rule for member `member` of `T`, redacted with `S`.
///
/// `keys` address nested values when the member holds a map or a structured
/// payload.
pub fn register_rule<T, S>(member: &str, keys: &[&str]) -> Result<(), SanitizeError>
where
    T: Inspect,
    S: RedactionStrategy + Default + 'static,
{
    let rule = Rule::new(member, keys.iter().copied(), strategy_of::<S>())?;
    register::<T>(rule);
    Ok(())
}

/// Registers a prebuilt rule for `T`.
pub fn register<T: Inspect>(rule: Rule) {
    registry().register_rule(TypeKey::of::<T>(), rule);
}

/// Registers a rule for text entries of every map under key `key`.
pub fn register_map_rule<S>(key: &str, keys: &[&str]) -> Result<(), SanitizeError>
where
    S: RedactionStrategy + Default + 'static,
{
    let rule = Rule::new(key, keys.iter().copied(), strategy_of::<S>())?;
    registry().register_rule(TypeKey::map(), rule);
    Ok(())
}

/// Drops the rules registered for `T`; its declared rules apply again.
pub fn clear_rules<T: Inspect>() {
    registry().clear_rules(TypeKey::of::<T>());
}

pub fn clear_members<T: Inspect>(members: &[&str]) {
    registry().clear_members(TypeKey::of::<T>(), members);
}

pub fn clear_all_rules() {
    registry().clear_all();
}

/// Method-style access to the global registry.
pub trait SanitizeExt: Inspect + Sized {
    /// A masked copy of `self`.
    fn masked(&self) -> Result<Self, SanitizeError>
    where
        Self: Clone,
    {
        mask_deep_copy(self)
    }

    /// A `Display` wrapper rendering `self` through [`print`].
    fn printed(&self) -> Printed<'_, Self> {
        Printed(self)
    }
}

impl<T: Inspect> SanitizeExt for T {}

/// Renders the wrapped value through [`print`] when formatted.
#[derive(Clone, Copy)]
pub struct Printed<'a, T>(&'a T);

impl<T: Inspect> fmt::Display for Printed<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&print(self.0))
    }
}

impl<T: Inspect> fmt::Debug for Printed<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
