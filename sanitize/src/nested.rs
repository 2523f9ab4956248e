//! Redaction of nodes inside structured payloads.
//!
//! A rule's nested keys address nodes of a JSON document. The key syntax is
//! detected from its first character:
//!
//! - `$...` is JSONPath (RFC 9535): `$.data.values[0].ak`, `$..token`
//! - `/...` is JSON Pointer (RFC 6901): `/data/values/0/ak`
//! - anything else is a member name, matched against object keys at any depth
//!   with the usual rule matching semantics.
//!
//! Addressed string leaves are replaced by the strategy's output. Numbers,
//! booleans and whole sub-documents are replaced by the redacted form of their
//! compact JSON text. Nulls stay null.

use serde_json::Value;
use serde_json_path::JsonPath;

use crate::rules::NameMatcher;

/// One parsed nested key.
#[derive(Debug, Clone)]
enum KeySelector {
    Path(JsonPath),
    Pointer(String),
    Name(NameMatcher),
}

impl KeySelector {
    fn parse(key: &str) -> Option<Self> {
        let parsed = if key.starts_with('$') {
            JsonPath::parse(key).map(Self::Path).map_err(|err| err.to_string())
        } else if key.starts_with('/') {
            Ok(Self::Pointer(key.to_string()))
        } else {
            NameMatcher::new(key).map(Self::Name).map_err(|err| err.to_string())
        };
        parsed
            .inspect_err(|err| tracing::warn!(key, %err, "ignoring unusable nested key"))
            .ok()
    }

    /// Pointers to every node this selector addresses in `doc`.
    fn resolve(&self, doc: &Value) -> Vec<String> {
        match self {
            Self::Path(path) => path
                .query_located(doc)
                .locations()
                .map(|location| location.to_json_pointer())
                .collect(),
            Self::Pointer(pointer) => vec![pointer.clone()],
            Self::Name(matcher) => {
                let mut found = Vec::new();
                collect_named(doc, matcher, String::new(), &mut found);
                found
            }
        }
    }
}

fn collect_named(node: &Value, matcher: &NameMatcher, at: String, found: &mut Vec<String>) {
    match node {
        Value::Object(members) => {
            for (name, child) in members {
                let pointer = format!("{at}/{}", escape_token(name));
                if matcher.matches(name) {
                    found.push(pointer);
                } else {
                    collect_named(child, matcher, pointer, found);
                }
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_named(child, matcher, format!("{at}/{index}"), found);
            }
        }
        _ => {}
    }
}

fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Redacts the nodes of `doc` addressed by `keys` in place.
pub fn redact_document(doc: &mut Value, keys: &[String], redact: &dyn Fn(&str) -> String) {
    for selector in keys.iter().filter_map(|key| KeySelector::parse(key)) {
        for pointer in selector.resolve(doc) {
            if let Some(node) = doc.pointer_mut(&pointer) {
                redact_leaf(node, redact);
            }
        }
    }
}

/// Redacts a whole value: strings through `redact`, other non-null values
/// through their compact JSON text.
pub fn redact_leaf(node: &mut Value, redact: &dyn Fn(&str) -> String) {
    let replacement = match node {
        Value::Null => return,
        Value::String(text) => redact(text),
        ref other => redact(&other.to_string()),
    };
    *node = Value::String(replacement);
}

/// Redacts `keys` inside a text payload holding a JSON object or array.
///
/// Anything else is redacted whole.
pub(crate) fn redact_text_payload(
    text: &str,
    keys: &[String],
    redact: &dyn Fn(&str) -> String,
) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(mut doc) if doc.is_object() || doc.is_array() => {
            redact_document(&mut doc, keys, redact);
            doc.to_string()
        }
        _ => redact(text),
    }
}
