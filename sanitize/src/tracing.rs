//! Adapters for emitting sanitized values through `tracing`.
//!
//! ```
//! use sanitize::{Sanitize, Token, tracing::TracingPrintedExt};
//!
//! #[derive(Sanitize)]
//! struct Session {
//!     #[mask(Token)]
//!     token: String,
//! }
//!
//! let session = Session { token: "tok_1234567890".into() };
//! tracing::info!(session = %session.tracing_printed(), "session opened");
//! ```

use tracing::field::{DisplayValue, display};

use crate::inspect::Inspect;

/// Extension trait for logging values through the safe printer.
///
/// The value is rendered with [`crate::print`], so member rules, cycle markers
/// and the depth and size limits all apply to the logged text.
pub trait TracingPrintedExt {
    /// Wraps the printed form of the value as a `tracing` display value.
    fn tracing_printed(&self) -> DisplayValue<String>;
}

impl<T: Inspect> TracingPrintedExt for T {
    fn tracing_printed(&self) -> DisplayValue<String> {
        display(crate::print(self))
    }
}
