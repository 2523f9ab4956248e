//! Nested keys applied to the entries of a map-shaped member.
//!
//! A map under a rule with keys is addressed like a JSON object. Plain names
//! select entries through the rule's derived group. JSONPath and JSON Pointer
//! keys are split at their first step: the step selects entries by key, and
//! the remaining path is handed to each selected value.
//!
//! | Key                   | Entry `data` receives                   |
//! |-----------------------|-----------------------------------------|
//! | `$.data`, `/data`     | the whole strategy                      |
//! | `$.data.values[0].ak` | `$.values[0].ak`                        |
//! | `/data/values/0/ak`   | `/values/0/ak`                          |
//! | `$.*.ak`              | `$.ak`, as does every other entry       |
//! | `$..ak`               | `$..ak` unless it holds plain text      |
//! | `$[0].ak`             | [`MaskFailure::Unaddressable`]          |

use std::borrow::Cow;

use super::Redaction;
use crate::{error::MaskFailure, inspect::Inspect, strategy::RedactionStrategy};

/// Whether `key` is a JSONPath or JSON Pointer rather than a member name.
pub(crate) fn is_path(key: &str) -> bool {
    key.starts_with(['$', '/'])
}

/// What a rule's keys ask of one map entry.
#[derive(Debug)]
pub struct EntryRedaction<'a> {
    strategy: &'a dyn RedactionStrategy,
    /// Empty when the whole value is redacted.
    keys: Vec<String>,
}

impl<'a> EntryRedaction<'a> {
    fn whole(strategy: &'a dyn RedactionStrategy) -> Self {
        Self {
            strategy,
            keys: Vec::new(),
        }
    }

    #[must_use]
    pub fn redaction(&self) -> Redaction<'_> {
        Redaction {
            strategy: self.strategy,
            keys: &self.keys,
            nested: None,
        }
    }
}

impl<'a> Redaction<'a> {
    /// Resolves the nested keys against the entry stored under `entry`.
    ///
    /// `Ok(None)` leaves the entry untouched.
    ///
    /// # Errors
    ///
    /// Returns [`MaskFailure::Unaddressable`] for a JSONPath key whose first
    /// step is not a member name or a wildcard.
    pub fn for_entry(
        &self,
        entry: &str,
        value: &dyn Inspect,
    ) -> Result<Option<EntryRedaction<'a>>, MaskFailure> {
        if self.nested.is_some_and(|group| group.matches(entry).is_some()) {
            return Ok(Some(EntryRedaction::whole(self.strategy)));
        }
        let mut rest = Vec::new();
        for key in self.keys.iter().filter(|key| is_path(key)) {
            match descend(key, entry) {
                Descent::Miss => {}
                Descent::Whole => return Ok(Some(EntryRedaction::whole(self.strategy))),
                Descent::Rest(path) => rest.push(path),
                Descent::Search => {
                    if holds_document(value) {
                        rest.push(key.clone());
                    }
                }
                Descent::SelectAndSearch(path) => {
                    rest.push(path);
                    if holds_document(value) {
                        rest.push(key.clone());
                    }
                }
                Descent::Unaddressable => {
                    return Err(MaskFailure::Unaddressable { key: key.clone() });
                }
            }
        }
        Ok((!rest.is_empty()).then(|| EntryRedaction {
            strategy: self.strategy,
            keys: rest,
        }))
    }
}

/// Plain text is a leaf; descendant searches only enter structured values.
fn holds_document(value: &dyn Inspect) -> bool {
    value
        .as_text()
        .is_none_or(|text| text.trim_start().starts_with(['{', '[']))
}

#[derive(Debug, PartialEq, Eq)]
enum Descent {
    Miss,
    Whole,
    Rest(String),
    /// A descendant key that does not select the entry itself.
    Search,
    /// A descendant key selecting the entry, with the path below it.
    SelectAndSearch(String),
    Unaddressable,
}

#[derive(Debug, PartialEq, Eq)]
enum Step<'k> {
    Name(Cow<'k, str>),
    Wildcard,
    Other,
}

fn descend(key: &str, entry: &str) -> Descent {
    if let Some(pointer) = key.strip_prefix('/') {
        let (token, rest) = match pointer.split_once('/') {
            Some((token, rest)) => (token, Some(rest)),
            None => (pointer, None),
        };
        if unescape_pointer(token) != entry {
            return Descent::Miss;
        }
        return match rest {
            Some(rest) => Descent::Rest(format!("/{rest}")),
            None => Descent::Whole,
        };
    }

    let Some(path) = key.strip_prefix('$') else {
        return Descent::Miss;
    };
    if path.is_empty() {
        return Descent::Whole;
    }
    let (descendant, path) = match path.strip_prefix("..") {
        Some(path) => (true, path),
        None => (false, path),
    };
    let Some((step, rest)) = first_step(path, descendant) else {
        return Descent::Unaddressable;
    };
    let selected = match step {
        Step::Name(name) => name == entry,
        Step::Wildcard => true,
        Step::Other if descendant => false,
        Step::Other => return Descent::Unaddressable,
    };
    match (descendant, selected, rest.is_empty()) {
        (_, true, true) => Descent::Whole,
        (false, true, false) => Descent::Rest(format!("${rest}")),
        (false, false, _) => Descent::Miss,
        (true, true, false) => Descent::SelectAndSearch(format!("${rest}")),
        (true, false, _) => Descent::Search,
    }
}

fn unescape_pointer(token: &str) -> Cow<'_, str> {
    if token.contains('~') {
        Cow::Owned(token.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Splits the first selector off a JSONPath with its leading `$` (and `..`)
/// removed.
fn first_step(path: &str, descendant: bool) -> Option<(Step<'_>, &str)> {
    let shorthand = if descendant {
        Some(path)
    } else {
        path.strip_prefix('.')
    };
    if let Some(shorthand) = shorthand.filter(|shorthand| !shorthand.starts_with('[')) {
        let end = shorthand.find(['.', '[']).unwrap_or(shorthand.len());
        let (name, rest) = shorthand.split_at(end);
        if name.is_empty() {
            return None;
        }
        let step = if name == "*" {
            Step::Wildcard
        } else {
            Step::Name(Cow::Borrowed(name))
        };
        return Some((step, rest));
    }

    let inner = path.strip_prefix('[')?;
    let end = closing_bracket(inner)?;
    let (selector, rest) = (inner[..end].trim(), &inner[end + 1..]);
    let step = if selector == "*" {
        Step::Wildcard
    } else {
        quoted_name(selector).map_or(Step::Other, Step::Name)
    };
    Some((step, rest))
}

/// Byte offset of the `]` closing a bracketed selector, skipping quoted text.
fn closing_bracket(inner: &str) -> Option<usize> {
    let mut quote = None;
    let mut escaped = false;
    for (index, ch) in inner.char_indices() {
        match (quote, ch) {
            (Some(_), _) if escaped => escaped = false,
            (Some(_), '\\') => escaped = true,
            (Some(open), ch) if ch == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, ']') => return Some(index),
            (None, _) => {}
        }
    }
    None
}

/// The name in a single quoted selector (`'data'`, `"data"`); `None` for
/// anything else, including selector lists.
fn quoted_name(selector: &str) -> Option<Cow<'_, str>> {
    let quote = selector.chars().next().filter(|ch| matches!(ch, '\'' | '"'))?;
    let body = selector.strip_prefix(quote)?.strip_suffix(quote)?;
    if !body.contains(['\\', quote]) {
        return Some(Cow::Borrowed(body));
    }
    let mut name = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => name.push(chars.next()?),
            ch if ch == quote => return None,
            ch => name.push(ch),
        }
    }
    Some(Cow::Owned(name))
}
