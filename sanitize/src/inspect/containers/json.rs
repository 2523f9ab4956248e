//! `serde_json::Value`: objects are maps, arrays are sequences.
//!
//! Under a rule with nested keys only the addressed nodes are redacted;
//! without keys the whole value is.

use serde_json::Value;

use super::{mask_entry, own_type_key};
use crate::{
    error::MaskFailure,
    inspect::{Elements, Entries, Inspect, Shape, TypeKey},
    mask::MaskContext,
    nested,
    rules::Redaction,
};

fn redact_value(value: &mut Value, redaction: &Redaction<'_>) {
    let strategy = redaction.strategy();
    let redact = |text: &str| strategy.redact(text);
    if redaction.keys().is_empty() {
        nested::redact_leaf(value, &redact);
    } else {
        nested::redact_document(value, redaction.keys(), &redact);
    }
}

impl Inspect for Value {
    own_type_key!();

    fn shape(&self) -> Shape<'_> {
        match self {
            Value::Null => Shape::Null,
            Value::Bool(flag) => Shape::display(flag),
            Value::Number(number) => Shape::display(number),
            Value::String(text) => Shape::display(text),
            Value::Array(items) => Shape::Seq(Elements::of(items.len(), items.iter())),
            Value::Object(members) => Shape::Map(Entries::of(members.len(), members.iter())),
        }
    }

    fn mask_with(&mut self, cx: &mut MaskContext<'_>) -> Result<(), MaskFailure> {
        match self {
            Value::Array(items) => items.iter_mut().try_for_each(|item| item.mask_with(cx)),
            Value::Object(members) if !members.is_empty() => {
                let group = cx.registry().require_group(TypeKey::map());
                for (key, value) in members.iter_mut() {
                    mask_entry(&group, key, value, cx)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn redact_with(
        &mut self,
        redaction: &Redaction<'_>,
        _cx: &mut MaskContext<'_>,
    ) -> Result<(), MaskFailure> {
        redact_value(self, redaction);
        Ok(())
    }

    fn redacted_text(&self, redaction: &Redaction<'_>) -> Option<String> {
        let mut copy = self.clone();
        redact_value(&mut copy, redaction);
        match copy {
            Value::Null => None,
            Value::String(text) => Some(text),
            other => Some(other.to_string()),
        }
    }

    fn as_text(&self) -> Option<&str> {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::{
        inspect::Inspect,
        mask::Masker,
        rules::{Rule, RuleRegistry},
        strategy::{Asterisk, strategy_of},
    };

    fn payload() -> Value {
        json!({"data": {"values": [{"ak": "0001", "name": "first"}]}, "id": 7})
    }

    #[test]
    fn keys_redact_addressed_nodes_only() {
        let registry = RuleRegistry::new();
        let rule = Rule::new("payload", ["$.data.values[0].ak"], strategy_of::<Asterisk>()).unwrap();
        let mut value = payload();
        Masker::new(&registry)
            .with_context(|cx| value.redact_with(&rule.redaction(), cx))
            .unwrap();
        assert_eq!(
            value,
            json!({"data": {"values": [{"ak": "******", "name": "first"}]}, "id": 7})
        );
    }

    #[test]
    fn without_keys_the_whole_value_is_redacted() {
        let rule = Rule::simple("payload", strategy_of::<Asterisk>()).unwrap();
        assert_eq!(payload().redacted_text(&rule.redaction()).as_deref(), Some("******"));
        assert_eq!(Value::Null.redacted_text(&rule.redaction()), None);
    }
}
