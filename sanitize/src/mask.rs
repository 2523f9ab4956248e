//! The mask execution engine.
//!
//! [`Masker`] walks a value and rewrites every member governed by a rule. The
//! walk is driven by [`Inspect::mask_with`]; records hand their members to
//! [`mask_record`], which resolves the owning type's [`RuleGroup`] once and
//! then, per member:
//!
//! - a matching rule and a non-null value: the value is rewritten with the
//!   rule's strategy ([`Inspect::redact_with`]);
//! - otherwise the member is walked, so rules declared on nested records apply.
//!
//! Masking never changes a value's type. Failures carry the path of
//! `owner.member` pairs that led to them.
//!
//! [`RuleGroup`]: crate::RuleGroup

use std::{
    any::Any,
    collections::{HashMap, HashSet},
};

use crate::{
    error::{MaskFailure, SanitizeError},
    inspect::{Inspect, Record},
    rules::RuleRegistry,
};

/// What happens to shared cells reached while masking.
///
/// Values behind `&mut` are owned exclusively and are always rewritten in
/// place; the policy only matters for `Rc<RefCell<_>>`, `Arc<Mutex<_>>` and
/// `Arc<RwLock<_>>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CopyPolicy {
    /// Rewrite shared cells in place; every holder sees the masked value.
    #[default]
    Identity,
    /// Replace each shared cell with a fresh cell holding a masked clone. The
    /// original cells, and everyone else holding them, are untouched.
    DeepCopy,
}

/// Cell masking postponed until no cell guard is held.
type Deferred = dyn FnOnce(&mut MaskContext<'_>) -> Result<(), MaskFailure>;

/// Per-call masking state.
pub struct MaskContext<'r> {
    registry: &'r RuleRegistry,
    policy: CopyPolicy,
    /// Shared cells already masked in this call.
    visited: HashSet<usize>,
    /// Original cell address → (original cell, its copy).
    copies: HashMap<usize, Box<dyn Any>>,
    /// Cell guards currently held by this call.
    guards: usize,
    deferred: Vec<Box<Deferred>>,
}

impl<'r> MaskContext<'r> {
    fn new(registry: &'r RuleRegistry, policy: CopyPolicy) -> Self {
        Self {
            registry,
            policy,
            visited: HashSet::new(),
            copies: HashMap::new(),
            guards: 0,
            deferred: Vec::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &'r RuleRegistry {
        self.registry
    }

    #[must_use]
    pub fn policy(&self) -> CopyPolicy {
        self.policy
    }

    /// Records a visit to the cell at `address`; `false` if already visited.
    pub(crate) fn enter_shared(&mut self, address: usize) -> bool {
        self.visited.insert(address)
    }

    pub(crate) fn copy_of<C: Clone + 'static>(&self, address: usize) -> Option<C> {
        self.copies
            .get(&address)?
            .downcast_ref::<(C, C)>()
            .map(|(_, copy)| copy.clone())
    }

    /// Remembers the copy made for `original`, keeping the original alive so
    /// its address is not reused during the call.
    pub(crate) fn remember_copy<C: 'static>(&mut self, address: usize, original: C, copy: C) {
        self.copies.insert(address, Box::new((original, copy)));
    }

    /// Runs `edit` while counting it as holding a cell guard.
    pub(crate) fn guarded<R>(&mut self, edit: impl FnOnce(&mut Self) -> R) -> R {
        self.guards += 1;
        let outcome = edit(self);
        self.guards -= 1;
        outcome
    }

    pub(crate) fn holds_guard(&self) -> bool {
        self.guards > 0
    }

    /// Queues `task` until the outermost cell guard is released.
    pub(crate) fn defer(&mut self, task: Box<Deferred>) {
        self.deferred.push(task);
    }

    /// Runs queued cell masking, including whatever the queued tasks queue.
    pub(crate) fn run_deferred(&mut self) -> Result<(), MaskFailure> {
        while let Some(task) = self.deferred.pop() {
            task(self)?;
        }
        Ok(())
    }
}

/// Masks the members of a record.
///
/// This is what `#[derive(Sanitize)]` generates `Inspect::mask_with` from.
///
/// # Errors
///
/// Returns the first member failure, wrapped with the record and member name.
pub fn mask_record<R: Record>(record: &mut R, cx: &mut MaskContext<'_>) -> Result<(), MaskFailure> {
    let group = cx.registry().require_group(record.type_key());
    let owner = record.record_name();
    for (member, value) in record.members_mut() {
        let outcome = match group.matches(member) {
            Some(rule) if !value.is_null() => value.redact_with(&rule.redaction(), cx),
            _ => value.mask_with(cx),
        };
        outcome.map_err(|failure| failure.in_member(owner, member))?;
    }
    Ok(())
}

/// Masks values against a registry.
///
/// ```
/// use sanitize::{Masker, Rule, RuleRegistry, Sanitize, strategy_of, Asterisk, TypeKey};
///
/// #[derive(Clone, Sanitize)]
/// struct Login {
///     user: String,
///     password: String,
/// }
///
/// let registry = RuleRegistry::new();
/// registry.register_rule(
///     TypeKey::of::<Login>(),
///     Rule::simple("password", strategy_of::<Asterisk>()).unwrap(),
/// );
///
/// let mut login = Login { user: "ada".into(), password: "hunter2".into() };
/// Masker::new(&registry).mask(&mut login).unwrap();
/// assert_eq!(login.password, "******");
/// assert_eq!(login.user, "ada");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Masker<'r> {
    registry: &'r RuleRegistry,
    policy: CopyPolicy,
}

impl<'r> Masker<'r> {
    #[must_use]
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self {
            registry,
            policy: CopyPolicy::Identity,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: CopyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs `run` with a fresh per-call context.
    ///
    /// # Errors
    ///
    /// Returns [`SanitizeError::Masking`] with whatever `run` failed with.
    pub fn with_context<R>(
        &self,
        run: impl FnOnce(&mut MaskContext<'r>) -> Result<R, MaskFailure>,
    ) -> Result<R, SanitizeError> {
        let mut cx = MaskContext::new(self.registry, self.policy);
        Ok(run(&mut cx)?)
    }

    /// Masks `value` in place.
    ///
    /// # Errors
    ///
    /// Returns [`SanitizeError::Masking`] when a member cannot be rewritten
    /// (a rule on a record, a busy `RefCell`, a poisoned lock).
    pub fn mask<T: Inspect>(&self, value: &mut T) -> Result<(), SanitizeError> {
        self.with_context(|cx| value.mask_with(cx))
    }

    /// Masks a clone of `value`, leaving `value` and every cell it shares
    /// untouched.
    ///
    /// # Errors
    ///
    /// See [`Masker::mask`].
    pub fn mask_copy<T: Inspect + Clone>(&self, value: &T) -> Result<T, SanitizeError> {
        let mut copy = value.clone();
        self.with_policy(CopyPolicy::DeepCopy).mask(&mut copy)?;
        Ok(copy)
    }
}
