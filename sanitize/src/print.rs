//! The safe recursive printer.
//!
//! [`Printer`] renders any [`Inspect`] value to a bounded debug string:
//!
//! - records as `Name(field=value, ...)`, sequences as `[a, b]`, maps as
//!   `{key=value}`;
//! - members matched by a rule are printed through the rule's strategy;
//! - values that can be reached twice (records, non-primitive sequences, maps
//!   and shared cells) are tracked by identity for the duration of one call,
//!   and a second visit prints a cycle marker instead of descending;
//! - descending into records stops at [`PrintOptions::max_depth`], and
//!   non-primitive collections longer than
//!   [`PrintOptions::max_collection_size`] are not enumerated.
//!
//! Printing never fails from the caller's point of view: errors and panics are
//! logged and turn into an empty string. [`Printer::try_print`] is the fallible
//! form.

use std::{
    any::TypeId,
    fmt::Write as _,
    mem::size_of_val,
    panic::{self, AssertUnwindSafe},
    ptr,
};

use indexmap::IndexSet;

use crate::{
    error::SanitizeError,
    inspect::{Elements, Entries, Inspect, Literal, Record, Shape, SharedCell, TypeKey},
    rules::{EntryRedaction, Redaction, Rule, RuleRegistry},
    strategy::REDACTED_PLACEHOLDER,
};

/// Printed for `None`, JSON `null` and `()`.
pub const NULL_TOKEN: &str = "null";

/// Prefix of the marker printed on a second visit to the same value.
pub const CYCLE_TAG: &str = "<cycle>";

/// Printed for a shared cell whose lock is held elsewhere.
pub const UNAVAILABLE: &str = "<unavailable>";

/// Bounds applied by the printer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct PrintOptions {
    /// How many records deep the printer descends.
    pub max_depth: usize,
    /// Longest non-primitive collection that is enumerated.
    pub max_collection_size: usize,
}

impl PrintOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 3;
    pub const DEFAULT_MAX_COLLECTION_SIZE: usize = 128;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_max_collection_size(mut self, max_collection_size: usize) -> Self {
        self.max_collection_size = max_collection_size;
        self
    }
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_collection_size: Self::DEFAULT_MAX_COLLECTION_SIZE,
        }
    }
}

/// Renders values against a registry.
///
/// ```
/// use sanitize::{Asterisk, Printer, Rule, RuleRegistry, Sanitize, TypeKey, strategy_of};
///
/// #[derive(Sanitize)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// let registry = RuleRegistry::new();
/// registry.register_rule(
///     TypeKey::of::<Person>(),
///     Rule::simple("name", strategy_of::<Asterisk>()).unwrap(),
/// );
///
/// let person = Person { name: "Alice".into(), age: 30 };
/// assert_eq!(Printer::new(&registry).print(&person), "Person(name=******, age=30)");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Printer<'r> {
    registry: &'r RuleRegistry,
    options: PrintOptions,
}

impl<'r> Printer<'r> {
    #[must_use]
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self {
            registry,
            options: PrintOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: PrintOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn options(&self) -> PrintOptions {
        self.options
    }

    /// Renders `value`; returns an empty string if rendering fails.
    pub fn print(&self, value: &dyn Inspect) -> String {
        match panic::catch_unwind(AssertUnwindSafe(|| self.try_print(value))) {
            Ok(Ok(text)) => text,
            Ok(Err(error)) => {
                tracing::warn!(
                    type_name = value.type_key().name(),
                    %error,
                    "printing failed, emitting an empty string"
                );
                String::new()
            }
            Err(_) => {
                tracing::warn!(
                    type_name = value.type_key().name(),
                    "printing panicked, emitting an empty string"
                );
                String::new()
            }
        }
    }

    /// Renders `value`.
    ///
    /// # Errors
    ///
    /// Returns [`SanitizeError::Printing`] when a `Display` implementation
    /// reached during the walk fails, or panics while a shared cell is read.
    pub fn try_print(&self, value: &dyn Inspect) -> Result<String, SanitizeError> {
        let mut walk = Walk::new(self.registry, self.options);
        walk.render(value, None)?;
        Ok(walk.out)
    }
}

/// How a value is recognised when it is reached again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Identity {
    /// A shared cell, by allocation.
    Shared(usize),
    /// Anything else, by address and type.
    Value(usize, TypeId),
}

struct Tracked {
    identity: Identity,
    name: String,
}

impl Tracked {
    /// Identity of values that can be reached twice. Terminals, primitive
    /// sequences and zero-sized values are not tracked.
    fn of(value: &dyn Inspect, shape: &Shape<'_>) -> Option<Self> {
        let (identity, name) = match shape {
            Shape::Shared(cell) => (
                Identity::Shared(cell.address()),
                cell.inner_key().short_name(),
            ),
            Shape::Object(record) if size_of_val(*record) != 0 => (
                Identity::Value(address_of(*record), record.type_key().id()),
                record.record_name().to_string(),
            ),
            Shape::Seq(elements) if !elements.primitive && size_of_val(value) != 0 => (
                Identity::Value(address_of(value), value.type_key().id()),
                value.type_key().short_name(),
            ),
            Shape::Map(_) if size_of_val(value) != 0 => (
                Identity::Value(address_of(value), value.type_key().id()),
                value.type_key().short_name(),
            ),
            _ => return None,
        };
        Some(Self { identity, name })
    }
}

fn address_of<T: ?Sized>(value: &T) -> usize {
    ptr::from_ref(value).cast::<()>() as usize
}

fn literal_text(literal: &Literal<'_>) -> Result<String, SanitizeError> {
    let mut text = String::new();
    write!(text, "{literal}")?;
    Ok(text)
}

/// State of one `print` call.
struct Walk<'r> {
    registry: &'r RuleRegistry,
    options: PrintOptions,
    out: String,
    /// Never shrinks within a call; a value printed once is a cycle marker
    /// everywhere after.
    visited: IndexSet<Identity>,
    /// Records currently being printed.
    depth: usize,
}

impl<'r> Walk<'r> {
    fn new(registry: &'r RuleRegistry, options: PrintOptions) -> Self {
        Self {
            registry,
            options,
            out: String::new(),
            visited: IndexSet::new(),
            depth: 0,
        }
    }

    fn enter(&mut self, tracked: Option<Tracked>) {
        if let Some(tracked) = tracked {
            self.visited.insert(tracked.identity);
        }
    }

    /// Renders `value`, through `redaction` when a rule governs it.
    fn render(
        &mut self,
        value: &dyn Inspect,
        redaction: Option<&Redaction<'_>>,
    ) -> Result<(), SanitizeError> {
        let shape = value.shape();
        let tracked = Tracked::of(value, &shape);
        if let Some(tracked) = &tracked {
            if let Some(ordinal) = self.visited.get_index_of(&tracked.identity) {
                write!(self.out, "{CYCLE_TAG}[{}@{ordinal}]", tracked.name)?;
                return Ok(());
            }
        }

        if let Some(text) = redaction.and_then(|redaction| value.redacted_text(redaction)) {
            self.out.push_str(&text);
            return Ok(());
        }

        match shape {
            Shape::Null => self.out.push_str(NULL_TOKEN),
            Shape::Terminal(literal) => match redaction {
                Some(redaction) => {
                    let text = literal_text(&literal)?;
                    self.out.push_str(&redaction.apply(&text));
                }
                None => write!(self.out, "{literal}")?,
            },
            Shape::Object(_) if redaction.is_some() => self.out.push_str(REDACTED_PLACEHOLDER),
            Shape::Object(record) => self.render_record(record, tracked)?,
            Shape::Seq(elements) => self.render_seq(value, elements, tracked, redaction)?,
            Shape::Map(entries) => self.render_map(value, entries, tracked, redaction)?,
            Shape::Shared(cell) => self.render_shared(cell, tracked, redaction)?,
        }
        Ok(())
    }

    fn render_record(
        &mut self,
        record: &dyn Record,
        tracked: Option<Tracked>,
    ) -> Result<(), SanitizeError> {
        let name = record.record_name();
        let max_depth = self.options.max_depth;
        if self.depth >= max_depth {
            write!(self.out, "{name} exceeds depth limit {max_depth}")?;
            return Ok(());
        }
        self.enter(tracked);

        let group = self.registry.require_group(record.type_key());
        self.depth += 1;
        write!(self.out, "{name}(")?;
        for (index, (member, value)) in record.members().into_iter().enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            write!(self.out, "{member}=")?;
            let redaction = group.matches(member).map(Rule::redaction);
            self.render(value, redaction.as_ref())?;
        }
        self.out.push(')');
        self.depth -= 1;
        Ok(())
    }

    fn render_seq(
        &mut self,
        value: &dyn Inspect,
        elements: Elements<'_>,
        tracked: Option<Tracked>,
        redaction: Option<&Redaction<'_>>,
    ) -> Result<(), SanitizeError> {
        let max_size = self.options.max_collection_size;
        if !elements.primitive && elements.len > max_size {
            let name = value.type_key().short_name();
            write!(self.out, "{name} exceeds size limit {max_size}")?;
            return Ok(());
        }
        self.enter(tracked);

        self.out.push('[');
        for (index, item) in elements.items.enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            self.render(item, redaction)?;
        }
        self.out.push(']');
        Ok(())
    }

    /// Text keys consult the map group; under a member rule with nested keys
    /// each entry gets what the keys address in it.
    fn render_map(
        &mut self,
        value: &dyn Inspect,
        entries: Entries<'_>,
        tracked: Option<Tracked>,
        redaction: Option<&Redaction<'_>>,
    ) -> Result<(), SanitizeError> {
        let max_size = self.options.max_collection_size;
        if entries.len > max_size {
            let name = value.type_key().short_name();
            write!(self.out, "{name} exceeds size limit {max_size}")?;
            return Ok(());
        }
        self.enter(tracked);

        let map_group = redaction
            .is_none()
            .then(|| self.registry.require_group(TypeKey::map()));
        self.out.push('{');
        for (index, (key, item)) in entries.entries.enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            self.render(key, None)?;
            self.out.push('=');
            match (redaction, map_group.as_deref()) {
                (Some(redaction), _) if !redaction.keys().is_empty() => {
                    let entry = match key.as_text() {
                        Some(name) => redaction
                            .for_entry(name, item)
                            .map_err(|failure| SanitizeError::Printing(failure.to_string()))?,
                        None => None,
                    };
                    let entry = entry.as_ref().map(EntryRedaction::redaction);
                    self.render(item, entry.as_ref())?;
                }
                (Some(redaction), _) => self.render(item, Some(redaction))?,
                (None, Some(group)) => {
                    let rule = key.as_text().and_then(|name| group.matches(name));
                    self.render(item, rule.map(Rule::redaction).as_ref())?;
                }
                (None, None) => self.render(item, None)?,
            }
        }
        self.out.push('}');
        Ok(())
    }

    fn render_shared(
        &mut self,
        cell: &dyn SharedCell,
        tracked: Option<Tracked>,
        redaction: Option<&Redaction<'_>>,
    ) -> Result<(), SanitizeError> {
        self.enter(tracked);
        // A panic must not unwind through the cell's guard and poison it.
        let mut outcome = Ok(());
        let available = cell.with_inner(&mut |inner| {
            outcome = panic::catch_unwind(AssertUnwindSafe(|| self.render(inner, redaction)))
                .unwrap_or_else(|_| {
                    Err(SanitizeError::Printing(format!(
                        "rendering `{}` panicked",
                        inner.type_key().name()
                    )))
                });
        });
        outcome?;
        if !available {
            self.out.push_str(UNAVAILABLE);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::RefCell,
        collections::BTreeMap,
        fmt,
        rc::Rc,
        sync::{Arc, Mutex, RwLock},
    };

    use super::*;
    use crate::{
        Sanitize,
        strategy::{Asterisk, strategy_of},
    };

    fn rule(name: &str) -> Rule {
        Rule::simple(name, strategy_of::<Asterisk>()).unwrap()
    }

    #[derive(Sanitize)]
    struct Person {
        name: String,
        age: u32,
    }

    #[test]
    fn matched_members_print_through_the_strategy() {
        let registry = RuleRegistry::new();
        registry.register_rule(TypeKey::of::<Person>(), rule("name"));
        let person = Person {
            name: "Alice".into(),
            age: 30,
        };
        assert_eq!(
            Printer::new(&registry).print(&person),
            "Person(name=******, age=30)"
        );
    }

    #[test]
    fn self_references_print_a_cycle_marker() {
        #[derive(Clone, Sanitize)]
        struct Node {
            id: u32,
            next: Option<Rc<RefCell<Node>>>,
        }

        let node = Rc::new(RefCell::new(Node { id: 1, next: None }));
        node.borrow_mut().next = Some(Rc::clone(&node));

        let registry = RuleRegistry::new();
        let text = Printer::new(&registry).print(&node);
        assert_eq!(text, "Node(id=1, next=<cycle>[Node@0])");
        assert_eq!(text.matches(CYCLE_TAG).count(), 1);

        node.borrow_mut().next = None;
    }

    #[test]
    fn nesting_stops_at_the_depth_limit() {
        #[derive(Sanitize)]
        struct Node {
            value: u32,
            next: Option<Box<Node>>,
        }

        let chain = (1..=5).rev().fold(None, |next, value| {
            Some(Box::new(Node { value, next }))
        });
        let registry = RuleRegistry::new();
        assert_eq!(
            Printer::new(&registry).print(&chain),
            "Node(value=1, next=Node(value=2, next=Node(value=3, next=Node exceeds depth limit 3)))"
        );
    }

    #[derive(Clone, Sanitize)]
    struct Item {
        id: usize,
    }

    #[test]
    fn long_collections_are_not_enumerated() {
        let registry = RuleRegistry::new();
        let printer = Printer::new(&registry);

        let items: Vec<Item> = (0..129).map(|id| Item { id }).collect();
        assert_eq!(printer.print(&items), "Vec<Item> exceeds size limit 128");

        let items: Vec<Item> = (0..128).map(|id| Item { id }).collect();
        let text = printer.print(&items);
        assert!(text.starts_with("[Item(id=0), Item(id=1)"));
        assert!(text.ends_with("Item(id=127)]"));
    }

    #[test]
    fn primitive_sequences_are_printed_in_full() {
        let registry = RuleRegistry::new();
        let bytes = vec![7_u8; 200];
        let text = Printer::new(&registry).print(&bytes);
        assert_eq!(text.matches('7').count(), 200);
    }

    #[test]
    fn options_change_the_limits() {
        let registry = RuleRegistry::new();
        let printer = Printer::new(&registry)
            .with_options(PrintOptions::new().with_max_collection_size(2).with_max_depth(0));
        let items = vec![Item { id: 1 }, Item { id: 2 }, Item { id: 3 }];
        assert_eq!(printer.print(&items), "Vec<Item> exceeds size limit 2");
        assert_eq!(printer.print(&Item { id: 1 }), "Item exceeds depth limit 0");
    }

    #[test]
    fn map_entries_consult_the_map_group() {
        let registry = RuleRegistry::new();
        registry.register_rule(TypeKey::map(), rule("password"));
        let mut map = BTreeMap::new();
        map.insert("password".to_string(), "hunter2".to_string());
        map.insert("user".to_string(), "ada".to_string());
        assert_eq!(
            Printer::new(&registry).print(&map),
            "{password=******, user=ada}"
        );
    }

    #[test]
    fn members_under_nested_keys_redact_only_matching_entries() {
        #[derive(Sanitize)]
        struct Request {
            headers: BTreeMap<String, String>,
        }

        let registry = RuleRegistry::new();
        registry.register_rule(
            TypeKey::of::<Request>(),
            Rule::new("headers", ["authorization"], strategy_of::<Asterisk>()).unwrap(),
        );
        let mut headers = BTreeMap::new();
        headers.insert("authorization".to_string(), "Bearer abc".to_string());
        headers.insert("accept".to_string(), "*/*".to_string());
        assert_eq!(
            Printer::new(&registry).print(&Request { headers }),
            "Request(headers={accept=*/*, authorization=******})"
        );
    }

    #[test]
    fn records_under_a_rule_print_a_placeholder() {
        #[derive(Sanitize)]
        struct Account {
            owner: Person,
            balance: Option<u64>,
        }

        let registry = RuleRegistry::new();
        registry.register_rule(TypeKey::of::<Account>(), rule("owner"));
        registry.register_rule(TypeKey::of::<Account>(), rule("balance"));
        let account = Account {
            owner: Person {
                name: "Alice".into(),
                age: 30,
            },
            balance: None,
        };
        assert_eq!(
            Printer::new(&registry).print(&account),
            "Account(owner=[REDACTED], balance=null)"
        );
    }

    #[test]
    fn locked_cells_print_as_unavailable() {
        let registry = RuleRegistry::new();
        let cell = Arc::new(Mutex::new(5_u8));
        let guard = cell.lock().unwrap();
        assert_eq!(Printer::new(&registry).print(&cell), UNAVAILABLE);
        drop(guard);
        assert_eq!(Printer::new(&registry).print(&cell), "5");
    }

    #[test]
    fn failing_display_yields_an_empty_string() {
        #[derive(Sanitize)]
        #[inspect(terminal)]
        struct Broken;

        impl fmt::Display for Broken {
            fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
                Err(fmt::Error)
            }
        }

        let registry = RuleRegistry::new();
        let printer = Printer::new(&registry);
        assert!(matches!(
            printer.try_print(&Broken),
            Err(SanitizeError::Printing(_))
        ));
        assert_eq!(printer.print(&Broken), "");
    }

    #[test]
    fn panicking_display_leaves_the_cell_usable() {
        #[derive(Clone, Sanitize)]
        #[inspect(terminal)]
        struct Exploding;

        impl fmt::Display for Exploding {
            fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
                panic!("display exploded")
            }
        }

        let registry = RuleRegistry::new();
        let printer = Printer::new(&registry);

        let mutex = Arc::new(Mutex::new(Exploding));
        assert_eq!(printer.print(&mutex), "");
        assert!(!mutex.is_poisoned());
        assert!(matches!(
            printer.try_print(&mutex),
            Err(SanitizeError::Printing(_))
        ));

        let lock = Arc::new(RwLock::new(Exploding));
        assert_eq!(printer.print(&lock), "");
        assert!(!lock.is_poisoned());
        assert!(lock.write().is_ok());
    }
}
