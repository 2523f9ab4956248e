//! The value model walked by the masker and the printer.
//!
//! Every value the engine can see implements [`Inspect`]. The trait is object
//! safe, so traversal works on `&dyn Inspect` / `&mut dyn Inspect` and never
//! needs to know concrete types:
//!
//! - [`Inspect::shape`] is the read-only dispatch used by the printer.
//! - [`Inspect::mask_with`] is the in-place dispatch used by the masker.
//! - [`Inspect::redact_with`] / [`Inspect::redacted_text`] apply a matched rule.
//!
//! Records (structs and data-carrying enum variants) expose their members
//! through [`Record`], which `#[derive(Sanitize)]` generates. Shared cells
//! (`Rc<RefCell<T>>`, `Arc<Mutex<T>>`, `Arc<RwLock<T>>`) are the only way to
//! build cyclic graphs and expose an identity through [`SharedCell`].

use std::{
    any::{Any, TypeId, type_name},
    fmt,
};

use crate::{
    error::MaskFailure,
    mask::MaskContext,
    rules::{Redaction, RuleDeclaration},
};

mod containers;

// =============================================================================
// Inspect
// =============================================================================

/// A value the masker and printer can traverse.
///
/// Implemented for std scalars, text, wrappers, collections, maps and shared
/// cells, and for user types through `#[derive(Sanitize)]`.
pub trait Inspect: Any {
    /// Registry key for this value's type.
    fn type_key(&self) -> TypeKey;

    /// How the value is laid out, for read-only traversal.
    fn shape(&self) -> Shape<'_>;

    /// Walks the value and redacts every member matched by a rule.
    ///
    /// Terminals have nothing to walk.
    fn mask_with(&mut self, cx: &mut MaskContext<'_>) -> Result<(), MaskFailure> {
        let _ = cx;
        Ok(())
    }

    /// Rewrites the value with a matched rule's strategy.
    ///
    /// # Errors
    ///
    /// Returns [`MaskFailure::Unsupported`] for values without a redacted form.
    fn redact_with(
        &mut self,
        redaction: &Redaction<'_>,
        cx: &mut MaskContext<'_>,
    ) -> Result<(), MaskFailure> {
        let _ = (redaction, cx);
        Err(MaskFailure::Unsupported {
            type_name: self.type_key().name(),
        })
    }

    /// Printed form of the value under a matched rule.
    ///
    /// `None` tells the printer to recurse structurally and redact the leaves.
    fn redacted_text(&self, redaction: &Redaction<'_>) -> Option<String> {
        let _ = redaction;
        None
    }

    /// Whether the value is absent (`None`, JSON `null`, `()`).
    fn is_null(&self) -> bool {
        matches!(self.shape(), Shape::Null)
    }

    /// The value as text, if it is text. Used to match map keys against rules.
    fn as_text(&self) -> Option<&str> {
        None
    }

    /// Numbers, booleans and characters. Sequences of primitives are never
    /// masked and are exempt from the printer's size limit.
    fn is_primitive() -> bool
    where
        Self: Sized,
    {
        false
    }

    /// Rules declared on the type itself.
    fn declared_rules() -> Vec<RuleDeclaration>
    where
        Self: Sized,
    {
        Vec::new()
    }
}

// =============================================================================
// TypeKey
// =============================================================================

/// Identifies a type in the rule registry.
///
/// Equality and hashing use the [`TypeId`] only; the name and the declared
/// rule function ride along so the registry can synthesize a group on first
/// lookup without knowing the concrete type.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    declared: fn() -> Vec<RuleDeclaration>,
}

/// Marker behind [`TypeKey::map`].
struct MapPseudoType;

impl TypeKey {
    #[must_use]
    pub fn of<T: Inspect>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            declared: T::declared_rules,
        }
    }

    /// The pseudo-type whose group governs text-keyed map entries.
    #[must_use]
    pub fn map() -> Self {
        Self {
            id: TypeId::of::<MapPseudoType>(),
            name: "map",
            declared: Vec::new,
        }
    }

    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name with module paths stripped: `Vec<Node>`, `HashMap<String, u8>`.
    #[must_use]
    pub fn short_name(&self) -> String {
        short_name(self.name)
    }

    #[must_use]
    pub fn declared_rules(&self) -> Vec<RuleDeclaration> {
        (self.declared)()
    }

    #[must_use]
    pub fn is_map(&self) -> bool {
        self.id == TypeId::of::<MapPseudoType>()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl std::hash::Hash for TypeKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

pub(crate) fn short_name(full: &str) -> String {
    fn push_segment(out: &mut String, segment: &str) {
        out.push_str(segment.rsplit("::").next().unwrap_or(segment));
    }

    let mut out = String::with_capacity(full.len());
    let mut start = 0;
    for (index, ch) in full.char_indices() {
        if matches!(ch, '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&') {
            push_segment(&mut out, &full[start..index]);
            out.push(ch);
            start = index + ch.len_utf8();
        }
    }
    push_segment(&mut out, &full[start..]);
    out
}

// =============================================================================
// Shape
// =============================================================================

/// Read-only view of a value's layout.
pub enum Shape<'a> {
    /// `None`, JSON `null`, `()`.
    Null,
    /// Rendered through its text form; never descended into.
    Terminal(Literal<'a>),
    Seq(Elements<'a>),
    Map(Entries<'a>),
    Object(&'a dyn Record),
    Shared(&'a dyn SharedCell),
}

impl<'a> Shape<'a> {
    pub fn display(value: &'a dyn fmt::Display) -> Self {
        Self::Terminal(Literal::Borrowed(value))
    }

    pub fn rendered(text: String) -> Self {
        Self::Terminal(Literal::Owned(text))
    }

    /// Text of a terminal; `None` for every other shape.
    #[must_use]
    pub fn terminal_text(&self) -> Option<String> {
        match self {
            Self::Terminal(literal) => Some(literal.to_string()),
            _ => None,
        }
    }
}

/// Text form of a terminal value.
pub enum Literal<'a> {
    Borrowed(&'a dyn fmt::Display),
    /// For types without a `Display` impl (`Duration`, `PathBuf`).
    Owned(String),
}

impl fmt::Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Borrowed(value) => value.fmt(f),
            Self::Owned(text) => f.write_str(text),
        }
    }
}

/// Elements of a sequence-shaped value.
pub struct Elements<'a> {
    pub len: usize,
    /// Elements are primitives.
    pub primitive: bool,
    pub items: Box<dyn Iterator<Item = &'a dyn Inspect> + 'a>,
}

impl<'a> Elements<'a> {
    pub fn of<T, I>(len: usize, items: I) -> Self
    where
        T: Inspect,
        I: Iterator<Item = &'a T> + 'a,
    {
        Self {
            len,
            primitive: T::is_primitive(),
            items: Box::new(items.map(|item| -> &dyn Inspect { item })),
        }
    }
}

/// Entries of a map-shaped value.
pub struct Entries<'a> {
    pub len: usize,
    pub entries: Box<dyn Iterator<Item = (&'a dyn Inspect, &'a dyn Inspect)> + 'a>,
}

impl<'a> Entries<'a> {
    pub fn of<K, V, I>(len: usize, entries: I) -> Self
    where
        K: Inspect,
        V: Inspect,
        I: Iterator<Item = (&'a K, &'a V)> + 'a,
    {
        Self {
            len,
            entries: Box::new(entries.map(|(key, value)| -> (&dyn Inspect, &dyn Inspect) {
                (key, value)
            })),
        }
    }
}

// =============================================================================
// Record / SharedCell
// =============================================================================

/// The per-type member table of a struct or enum variant.
///
/// Generated by `#[derive(Sanitize)]`. Tuple members are named `"0"`, `"1"`, ...
pub trait Record: Inspect {
    /// Struct name, or variant name for enums.
    fn record_name(&self) -> &'static str;

    fn members(&self) -> Vec<(&'static str, &dyn Inspect)>;

    fn members_mut(&mut self) -> Vec<(&'static str, &mut dyn Inspect)>;
}

/// A shared, interior-mutable allocation seen by the printer.
pub trait SharedCell {
    /// Address of the shared allocation; the value's identity.
    fn address(&self) -> usize;

    /// Key of the value inside the cell.
    fn inner_key(&self) -> TypeKey;

    /// Calls `visit` with the inner value without blocking.
    ///
    /// Returns `false` when the cell is mutably borrowed or locked elsewhere.
    fn with_inner(&self, visit: &mut dyn FnMut(&dyn Inspect)) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_strips_paths() {
        assert_eq!(short_name("alloc::vec::Vec<app::model::Node>"), "Vec<Node>");
        assert_eq!(
            short_name("std::collections::hash::map::HashMap<alloc::string::String, u8>"),
            "HashMap<String, u8>"
        );
        assert_eq!(short_name("[i32; 4]"), "[i32; 4]");
        assert_eq!(short_name("Person"), "Person");
    }

    #[test]
    fn type_keys_compare_by_type_id() {
        assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
        assert_ne!(TypeKey::of::<String>(), TypeKey::of::<u8>());
        assert_ne!(TypeKey::map(), TypeKey::of::<String>());
        assert!(TypeKey::map().is_map());
        assert!(TypeKey::map().declared_rules().is_empty());
    }

    #[test]
    fn null_detection() {
        let none: Option<String> = None;
        assert!(none.is_null());
        assert!(!Some("x".to_string()).is_null());
    }
}
