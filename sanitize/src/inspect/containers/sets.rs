//! Sets. Elements are masked out of the set and reinserted.

use std::{
    collections::{BTreeSet, HashSet},
    hash::{BuildHasher, Hash},
};

use super::own_type_key;
use crate::{
    error::MaskFailure,
    inspect::{Elements, Inspect, Shape},
    mask::MaskContext,
    rules::Redaction,
};

/// Takes every element out, rewrites it, and puts it back.
///
/// Elements are reinserted even when a rewrite fails so the set never loses
/// data it still owns.
fn rewrite<T, S>(
    set: &mut S,
    mut edit: impl FnMut(&mut T) -> Result<(), MaskFailure>,
) -> Result<(), MaskFailure>
where
    S: Default + IntoIterator<Item = T> + Extend<T>,
{
    let mut items: Vec<T> = std::mem::take(set).into_iter().collect();
    let outcome = items.iter_mut().try_for_each(&mut edit);
    set.extend(items);
    outcome
}

impl<T, S> Inspect for HashSet<T, S>
where
    T: Inspect + Eq + Hash,
    S: BuildHasher + Default + 'static,
{
    own_type_key!();

    fn shape(&self) -> Shape<'_> {
        Shape::Seq(Elements::of(self.len(), self.iter()))
    }

    fn mask_with(&mut self, cx: &mut MaskContext<'_>) -> Result<(), MaskFailure> {
        if T::is_primitive() || self.is_empty() {
            return Ok(());
        }
        rewrite(self, |item: &mut T| item.mask_with(cx))
    }

    fn redact_with(
        &mut self,
        redaction: &Redaction<'_>,
        cx: &mut MaskContext<'_>,
    ) -> Result<(), MaskFailure> {
        rewrite(self, |item: &mut T| item.redact_with(redaction, cx))
    }
}

impl<T> Inspect for BTreeSet<T>
where
    T: Inspect + Ord,
{
    own_type_key!();

    fn shape(&self) -> Shape<'_> {
        Shape::Seq(Elements::of(self.len(), self.iter()))
    }

    fn mask_with(&mut self, cx: &mut MaskContext<'_>) -> Result<(), MaskFailure> {
        if T::is_primitive() || self.is_empty() {
            return Ok(());
        }
        rewrite(self, |item: &mut T| item.mask_with(cx))
    }

    fn redact_with(
        &mut self,
        redaction: &Redaction<'_>,
        cx: &mut MaskContext<'_>,
    ) -> Result<(), MaskFailure> {
        rewrite(self, |item: &mut T| item.redact_with(redaction, cx))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::{
        inspect::Inspect,
        mask::Masker,
        rules::{Redaction, RuleRegistry},
        strategy::Full,
    };

    #[test]
    fn redacted_elements_collapse() {
        let registry = RuleRegistry::new();
        let mut set: BTreeSet<String> = ["a", "b", "c"].map(String::from).into();
        Masker::new(&registry)
            .with_context(|cx| set.redact_with(&Redaction::new(&Full), cx))
            .unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), ["[REDACTED]"]);
    }
}
