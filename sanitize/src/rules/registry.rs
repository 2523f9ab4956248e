//! The type → rule group cache.

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use super::{Rule, RuleGroup};
use crate::inspect::TypeKey;

static GLOBAL: LazyLock<RuleRegistry> = LazyLock::new(RuleRegistry::new);

/// Caches one [`RuleGroup`] per type.
///
/// Groups are built lazily from the type's declared rules on first lookup and
/// published whole behind an `Arc`; every mutation replaces a group instead of
/// editing it, so a reader sees either the old group or the new one.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    groups: RwLock<HashMap<TypeKey, Arc<RuleGroup>>>,
}

impl RuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by the crate-level functions.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TypeKey, Arc<RuleGroup>>> {
        self.groups.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TypeKey, Arc<RuleGroup>>> {
        self.groups.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The group governing `key`; empty when the type has no rules.
    ///
    /// An unseen type is synthesized from its declared rules and cached,
    /// including when the result is empty.
    pub fn require_group(&self, key: TypeKey) -> Arc<RuleGroup> {
        if let Some(group) = self.read().get(&key) {
            return Arc::clone(group);
        }
        let mut groups = self.write();
        let group = groups.entry(key).or_insert_with(|| {
            let group = RuleGroup::from_declarations(key, &key.declared_rules());
            tracing::debug!(target_type = key.name(), rules = group.len(), "synthesized rule group");
            Arc::new(group)
        });
        Arc::clone(group)
    }

    /// Replaces the group for its target type.
    pub fn register_group(&self, group: RuleGroup) {
        tracing::debug!(target_type = group.target().name(), rules = group.len(), "registering rule group");
        self.write().insert(group.target(), Arc::new(group));
    }

    pub fn register_groups(&self, groups: impl IntoIterator<Item = RuleGroup>) {
        for group in groups {
            self.register_group(group);
        }
    }

    /// Adds `rule` to the group for `key`, replacing a rule with the same name.
    ///
    /// The declared rules of an unseen type are kept.
    pub fn register_rule(&self, key: TypeKey, rule: Rule) {
        tracing::trace!(target_type = key.name(), rule = rule.name(), "registering rule");
        self.update(key, |group| group.insert(rule));
    }

    /// Forgets everything registered for `key`. The next lookup starts again
    /// from the declared rules.
    pub fn clear_rules(&self, key: TypeKey) {
        self.write().remove(&key);
    }

    /// Removes the rules named in `names` from the group for `key`.
    pub fn clear_members(&self, key: TypeKey, names: &[&str]) {
        self.update(key, |group| *group = group.without(names));
    }

    pub fn clear_all(&self) {
        self.write().clear();
    }

    /// Whether values of the type carry any rule, registered or declared.
    pub fn requires_masking(&self, key: TypeKey) -> bool {
        !self.require_group(key).is_empty() || !key.declared_rules().is_empty()
    }

    fn update(&self, key: TypeKey, edit: impl FnOnce(&mut RuleGroup)) {
        let mut groups = self.write();
        let mut next = match groups.get(&key) {
            Some(current) => RuleGroup::clone(current),
            None => RuleGroup::from_declarations(key, &key.declared_rules()),
        };
        edit(&mut next);
        groups.insert(key, Arc::new(next));
    }
}
