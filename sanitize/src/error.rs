//! Error types for rule construction, masking, and printing.
//!
//! - [`SanitizeError`]: what public entry points return.
//! - [`MaskFailure`]: what a single value reports when it cannot be masked.
//!   Records wrap member failures in [`MaskFailure::Member`] so the final error
//!   names the path that failed.

use thiserror::Error;

/// Errors surfaced by the public API.
#[derive(Debug, Error)]
pub enum SanitizeError {
    /// A required input was empty or malformed (rule names, keys, patterns).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A member could not be read or written while masking.
    #[error("masking failed: {0}")]
    Masking(#[from] MaskFailure),

    /// Rendering failed. Only observable through `Printer::try_print`; the
    /// infallible `print` entry points log it and return an empty string.
    #[error("printing failed: {0}")]
    Printing(String),
}

impl SanitizeError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

impl From<std::fmt::Error> for SanitizeError {
    fn from(_: std::fmt::Error) -> Self {
        Self::Printing("a Display implementation returned an error".to_string())
    }
}

/// Failure reported by a value while it is being masked.
#[derive(Debug, Error)]
pub enum MaskFailure {
    /// A member of a record failed; `source` carries the underlying cause.
    #[error("cannot mask `{owner}.{member}`")]
    Member {
        owner: &'static str,
        member: &'static str,
        #[source]
        source: Box<MaskFailure>,
    },

    /// The value has no strategy-redacted form (records, borrowed text).
    #[error("`{type_name}` cannot be redacted by a strategy")]
    Unsupported { type_name: &'static str },

    /// A `RefCell` was already borrowed elsewhere.
    #[error("`{type_name}` is already borrowed")]
    Busy { type_name: &'static str },

    /// A lock guarding a shared value was poisoned by a panicking writer.
    #[error("lock guarding `{type_name}` is poisoned")]
    Poisoned { type_name: &'static str },

    /// A nested key whose first step cannot select map entries (an index,
    /// slice or filter applied to a map).
    #[error("nested key `{key}` cannot address map entries")]
    Unaddressable { key: String },
}

impl MaskFailure {
    pub(crate) fn in_member(self, owner: &'static str, member: &'static str) -> Self {
        Self::Member {
            owner,
            member,
            source: Box::new(self),
        }
    }
}
