//! Adapters for emitting sanitized values through `slog`.
//!
//! The logged representation is always the printer's output, never the
//! original value. Printing does not fail, so neither does serialization: a
//! value whose rendering fails is logged as an empty string.

use slog::{Key, Record, Result as SlogResult, Serializer, Value as SlogValue};

use crate::{Printed, inspect::Inspect};

/// Printed text ready to be logged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrintedValue(String);

impl PrintedValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SlogValue for PrintedValue {
    fn serialize(
        &self,
        _record: &Record<'_>,
        key: Key,
        serializer: &mut dyn Serializer,
    ) -> SlogResult {
        serializer.emit_str(key, &self.0)
    }
}

impl<T: Inspect> SlogValue for Printed<'_, T> {
    fn serialize(
        &self,
        _record: &Record<'_>,
        key: Key,
        serializer: &mut dyn Serializer,
    ) -> SlogResult {
        serializer.emit_str(key, &self.to_string())
    }
}

/// Extension trait for logging values through the safe printer.
///
/// ```ignore
/// use sanitize::slog::SlogPrintedExt;
///
/// info!(logger, "login"; "request" => request.slog_printed());
/// ```
pub trait SlogPrintedExt: Inspect + Sized {
    /// Renders `self` now; the result owns its text, so it can outlive `self`.
    fn slog_printed(&self) -> PrintedValue {
        PrintedValue(crate::print(self))
    }
}

impl<T: Inspect> SlogPrintedExt for T {}
