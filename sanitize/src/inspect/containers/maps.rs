//! Maps. Values are rewritten, keys never are.

use std::{
    collections::{BTreeMap, HashMap},
    hash::{BuildHasher, Hash},
};

use super::own_type_key;
use crate::{
    error::MaskFailure,
    inspect::{Entries, Inspect, Shape, TypeKey},
    mask::MaskContext,
    rules::{Redaction, RuleGroup},
};

/// Masks one map entry.
///
/// A text value under a text key matched by `group` is redacted; anything
/// else is walked.
pub(crate) fn mask_entry(
    group: &RuleGroup,
    key: &dyn Inspect,
    value: &mut dyn Inspect,
    cx: &mut MaskContext<'_>,
) -> Result<(), MaskFailure> {
    let rule = match (key.as_text(), value.as_text()) {
        (Some(name), Some(_)) => group.matches(name),
        _ => None,
    };
    match rule {
        Some(rule) => value.redact_with(&rule.redaction(), cx),
        None => value.mask_with(cx),
    }
}

/// Applies a member rule to a whole map.
///
/// Without nested keys every value is redacted. With them each text-keyed
/// entry gets what the keys address in it; see [`Redaction::for_entry`].
fn redact_entries<'m, K, V>(
    entries: impl Iterator<Item = (&'m K, &'m mut V)>,
    redaction: &Redaction<'_>,
    cx: &mut MaskContext<'_>,
) -> Result<(), MaskFailure>
where
    K: Inspect,
    V: Inspect,
{
    for (key, value) in entries {
        if redaction.keys().is_empty() {
            value.redact_with(redaction, cx)?;
            continue;
        }
        let Some(name) = key.as_text() else {
            continue;
        };
        if let Some(entry) = redaction.for_entry(name, &*value)? {
            value.redact_with(&entry.redaction(), cx)?;
        }
    }
    Ok(())
}

macro_rules! impl_map {
    ($({$($generics:tt)*} $ty:ty),* $(,)?) => {
        $(
            impl<$($generics)*> Inspect for $ty {
                own_type_key!();

                fn shape(&self) -> Shape<'_> {
                    Shape::Map(Entries::of(self.len(), self.iter()))
                }

                fn mask_with(&mut self, cx: &mut MaskContext<'_>) -> Result<(), MaskFailure> {
                    if self.is_empty() {
                        return Ok(());
                    }
                    let group = cx.registry().require_group(TypeKey::map());
                    for (key, value) in self.iter_mut() {
                        mask_entry(&group, key, value, cx)?;
                    }
                    Ok(())
                }

                fn redact_with(
                    &mut self,
                    redaction: &Redaction<'_>,
                    cx: &mut MaskContext<'_>,
                ) -> Result<(), MaskFailure> {
                    redact_entries(self.iter_mut(), redaction, cx)
                }
            }
        )*
    };
}

impl_map! {
    {K: Inspect + Eq + Hash, V: Inspect, S: BuildHasher + 'static} HashMap<K, V, S>,
    {K: Inspect + Ord, V: Inspect} BTreeMap<K, V>,
}
