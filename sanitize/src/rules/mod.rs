//! Rules, rule groups and declarations.
//!
//! A [`Rule`] binds a member name (or a name pattern) to a
//! [`RedactionStrategy`]. A [`RuleGroup`] holds the rules for one type and
//! answers "which rule governs member `n`?" with first-match-wins lookup in
//! insertion order.
//!
//! # Name matching
//!
//! A name containing any of `* $ ^ +` is a *pattern* and is compiled once as a
//! case-insensitive regular expression that must match the whole candidate.
//! Any other name matches a candidate that equals it, or ends with it ignoring
//! case: the rule `ak` governs `ak`, `secretAk` and `AK`.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};

use crate::{error::SanitizeError, inspect::TypeKey, strategy::RedactionStrategy};

mod entries;
mod registry;

pub use entries::EntryRedaction;
pub(crate) use entries::is_path;
pub use registry::RuleRegistry;

const PATTERN_CHARS: [char; 4] = ['*', '$', '^', '+'];

// =============================================================================
// NameMatcher
// =============================================================================

/// Compiled matching semantics for one rule name.
#[derive(Clone, Debug)]
pub struct NameMatcher {
    kind: MatchKind,
}

#[derive(Clone, Debug)]
enum MatchKind {
    Plain { exact: String, lowered: String },
    Pattern(Regex),
}

impl NameMatcher {
    /// Compiles `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SanitizeError::InvalidArgument`] for an empty name or a
    /// pattern that is not a valid regular expression.
    pub fn new(name: &str) -> Result<Self, SanitizeError> {
        if name.is_empty() {
            return Err(SanitizeError::invalid("rule name must not be empty"));
        }
        let kind = if Self::is_pattern(name) {
            let regex = RegexBuilder::new(&format!("^(?:{name})$"))
                .case_insensitive(true)
                .build()
                .map_err(|err| SanitizeError::invalid(format!("invalid pattern `{name}`: {err}")))?;
            MatchKind::Pattern(regex)
        } else {
            MatchKind::Plain {
                exact: name.to_string(),
                lowered: name.to_lowercase(),
            }
        };
        Ok(Self { kind })
    }

    #[must_use]
    pub fn is_pattern(name: &str) -> bool {
        name.contains(PATTERN_CHARS)
    }

    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        match &self.kind {
            MatchKind::Plain { exact, lowered } => {
                candidate == exact || candidate.to_lowercase().ends_with(lowered.as_str())
            }
            MatchKind::Pattern(regex) => regex.is_match(candidate),
        }
    }
}

// =============================================================================
// Rule
// =============================================================================

/// An immutable binding of a member name to a redaction strategy.
#[derive(Clone)]
pub struct Rule {
    name: String,
    keys: Arc<[String]>,
    strategy: Arc<dyn RedactionStrategy>,
    matcher: NameMatcher,
    /// One rule per key, matched against map keys.
    derived: Option<Arc<RuleGroup>>,
}

impl Rule {
    /// Builds a rule.
    ///
    /// `keys` address nested nodes when the governed value is map shaped or a
    /// structured text payload: `$.data.values[0].ak` (JSONPath), `/data/ak`
    /// (JSON Pointer) or a plain key name.
    ///
    /// # Errors
    ///
    /// Returns [`SanitizeError::InvalidArgument`] for an empty name or key, an
    /// invalid pattern, or an unparsable JSONPath key.
    pub fn new<I, K>(
        name: impl Into<String>,
        keys: I,
        strategy: Arc<dyn RedactionStrategy>,
    ) -> Result<Self, SanitizeError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let name = name.into();
        let matcher = NameMatcher::new(&name)?;
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        for key in &keys {
            validate_key(key)?;
        }
        let derived = (!keys.is_empty()).then(|| Arc::new(RuleGroup::derived(&keys, &strategy)));
        Ok(Self {
            name,
            keys: keys.into(),
            strategy,
            matcher,
            derived,
        })
    }

    /// A rule without nested keys.
    ///
    /// # Errors
    ///
    /// See [`Rule::new`].
    pub fn simple(
        name: impl Into<String>,
        strategy: Arc<dyn RedactionStrategy>,
    ) -> Result<Self, SanitizeError> {
        Self::new(name, std::iter::empty::<String>(), strategy)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    #[must_use]
    pub fn strategy(&self) -> &dyn RedactionStrategy {
        self.strategy.as_ref()
    }

    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.matcher.matches(candidate)
    }

    /// The view handed to a matched value.
    ///
    /// Keys and the derived group are dropped when the strategy does not
    /// accept keys.
    #[must_use]
    pub fn redaction(&self) -> Redaction<'_> {
        let strategy = self.strategy.as_ref();
        if strategy.accepts_keys() {
            Redaction {
                strategy,
                keys: &self.keys,
                nested: self.derived.as_deref(),
            }
        } else {
            Redaction::new(strategy)
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

fn validate_key(key: &str) -> Result<(), SanitizeError> {
    if key.is_empty() {
        return Err(SanitizeError::invalid("nested key must not be empty"));
    }
    #[cfg(feature = "json")]
    if key.starts_with('$') {
        serde_json_path::JsonPath::parse(key)
            .map_err(|err| SanitizeError::invalid(format!("invalid JSONPath `{key}`: {err}")))?;
    }
    Ok(())
}

// =============================================================================
// Redaction
// =============================================================================

/// What a matched value receives: the strategy, the rule's nested keys and
/// the group derived from them.
#[derive(Clone, Copy, Debug)]
pub struct Redaction<'a> {
    strategy: &'a dyn RedactionStrategy,
    keys: &'a [String],
    nested: Option<&'a RuleGroup>,
}

impl<'a> Redaction<'a> {
    /// A redaction with no nested keys.
    #[must_use]
    pub fn new(strategy: &'a dyn RedactionStrategy) -> Self {
        Self {
            strategy,
            keys: &[],
            nested: None,
        }
    }

    #[must_use]
    pub fn strategy(&self) -> &'a dyn RedactionStrategy {
        self.strategy
    }

    #[must_use]
    pub fn keys(&self) -> &'a [String] {
        self.keys
    }

    /// Rules derived from the plain-name keys, for map-shaped values.
    #[must_use]
    pub fn nested(&self) -> Option<&'a RuleGroup> {
        self.nested
    }

    /// Redacts a text value, honouring nested keys.
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        if self.keys.is_empty() {
            self.strategy.redact(text)
        } else {
            self.strategy.redact_keys(text, self.keys)
        }
    }
}

// =============================================================================
// RuleGroup
// =============================================================================

/// The rules governing one type, or the map pseudo-type.
///
/// Insertion ordered; inserting a rule whose name is already present replaces
/// it in place.
#[derive(Clone, Debug)]
pub struct RuleGroup {
    target: TypeKey,
    rules: IndexMap<String, Rule>,
}

impl RuleGroup {
    #[must_use]
    pub fn new(target: TypeKey) -> Self {
        Self {
            target,
            rules: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_rules(target: TypeKey, rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut group = Self::new(target);
        for rule in rules {
            group.insert(rule);
        }
        group
    }

    pub fn insert(&mut self, rule: Rule) {
        self.rules.insert(rule.name.clone(), rule);
    }

    #[must_use]
    pub fn target(&self) -> TypeKey {
        self.target
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule, in insertion order, governing `name`.
    #[must_use]
    pub fn matches(&self, name: &str) -> Option<&Rule> {
        self.rules.values().find(|rule| rule.matches(name))
    }

    /// A copy of the group without the rules named in `names`.
    #[must_use]
    pub fn without(&self, names: &[&str]) -> Self {
        let mut group = self.clone();
        for name in names {
            group.rules.shift_remove(*name);
        }
        group
    }

    /// One rule per plain-name key, sharing `strategy`.
    ///
    /// JSONPath and JSON Pointer keys are resolved per entry instead.
    fn derived(keys: &[String], strategy: &Arc<dyn RedactionStrategy>) -> Self {
        Self::with_rules(
            TypeKey::map(),
            keys.iter().filter(|key| !is_path(key)).filter_map(|key| {
                NameMatcher::new(key).ok().map(|matcher| Rule {
                    name: key.clone(),
                    keys: Vec::new().into(),
                    strategy: Arc::clone(strategy),
                    matcher,
                    derived: None,
                })
            }),
        )
    }

    /// Synthesizes a group from declared rules, logging and skipping the
    /// invalid ones.
    pub(crate) fn from_declarations(target: TypeKey, declarations: &[RuleDeclaration]) -> Self {
        let mut group = Self::new(target);
        for declaration in declarations {
            let strategy = (declaration.strategy)();
            let names: Vec<&str> = match declaration.member {
                Some(member) => vec![member],
                None => declaration.patterns.to_vec(),
            };
            for name in names {
                match Rule::new(name, declaration.keys.iter().copied(), Arc::clone(&strategy)) {
                    Ok(rule) => group.insert(rule),
                    Err(err) => {
                        tracing::error!(target_type = target.name(), rule = name, %err, "skipping invalid declared rule");
                    }
                }
            }
        }
        group
    }
}

// =============================================================================
// RuleDeclaration
// =============================================================================

/// A rule declared on a type, as produced by `#[derive(Sanitize)]`.
///
/// A declaration names either a single member, or a set of name patterns
/// applying to every member they match.
#[derive(Clone, Copy)]
pub struct RuleDeclaration {
    pub member: Option<&'static str>,
    pub patterns: &'static [&'static str],
    pub keys: &'static [&'static str],
    pub strategy: fn() -> Arc<dyn RedactionStrategy>,
}

impl RuleDeclaration {
    #[must_use]
    pub fn member(name: &'static str, strategy: fn() -> Arc<dyn RedactionStrategy>) -> Self {
        Self {
            member: Some(name),
            patterns: &[],
            keys: &[],
            strategy,
        }
    }

    #[must_use]
    pub fn patterns(
        patterns: &'static [&'static str],
        strategy: fn() -> Arc<dyn RedactionStrategy>,
    ) -> Self {
        Self {
            member: None,
            patterns,
            keys: &[],
            strategy,
        }
    }

    #[must_use]
    pub fn with_keys(mut self, keys: &'static [&'static str]) -> Self {
        self.keys = keys;
        self
    }
}

impl fmt::Debug for RuleDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDeclaration")
            .field("member", &self.member)
            .field("patterns", &self.patterns)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{Asterisk, Token, strategy_of};

    fn rule(name: &str) -> Rule {
        Rule::simple(name, strategy_of::<Asterisk>()).unwrap()
    }

    #[test]
    fn plain_names_match_exactly_or_as_suffix() {
        let ak = rule("ak");
        assert!(ak.matches("ak"));
        assert!(ak.matches("secretAk"));
        assert!(ak.matches("AK"));
        assert!(!ak.matches("akey"));
    }

    #[test]
    fn patterns_match_whole_names_ignoring_case() {
        let anchored = rule("^ak$");
        assert!(anchored.matches("ak"));
        assert!(anchored.matches("AK"));
        assert!(!anchored.matches("secretAk"));

        let prefixed = rule("pass.*");
        assert!(prefixed.matches("password"));
        assert!(!prefixed.matches("bypass"));
    }

    #[test]
    fn pattern_detection() {
        assert!(NameMatcher::is_pattern("^ak$"));
        assert!(NameMatcher::is_pattern("a+"));
        assert!(NameMatcher::is_pattern("pass.*"));
        assert!(!NameMatcher::is_pattern("password"));
        assert!(!NameMatcher::is_pattern("pass.word"));
    }

    #[test]
    fn construction_rejects_bad_input() {
        let strategy = strategy_of::<Asterisk>();
        assert!(matches!(
            Rule::simple("", Arc::clone(&strategy)),
            Err(SanitizeError::InvalidArgument(_))
        ));
        assert!(Rule::simple("(unclosed*", Arc::clone(&strategy)).is_err());
        assert!(Rule::new("payload", [""], Arc::clone(&strategy)).is_err());
    }

    #[cfg(feature = "json")]
    #[test]
    fn construction_rejects_invalid_json_path() {
        let result = Rule::new("payload", ["$.data[?("], strategy_of::<Asterisk>());
        assert!(matches!(result, Err(SanitizeError::InvalidArgument(_))));
    }

    #[test]
    fn group_lookup_is_first_match_in_insertion_order() {
        let group = RuleGroup::with_rules(
            TypeKey::map(),
            [
                Rule::simple("token", strategy_of::<Token>()).unwrap(),
                Rule::simple(".*token", strategy_of::<Asterisk>()).unwrap(),
            ],
        );
        let found = group.matches("accessToken").unwrap();
        assert_eq!(found.name(), "token");
        assert!(group.matches("name").is_none());
    }

    #[test]
    fn group_upsert_keeps_position() {
        let mut group = RuleGroup::with_rules(TypeKey::map(), [rule("a"), rule("b")]);
        group.insert(Rule::new("a", ["k"], strategy_of::<Asterisk>()).unwrap());
        let names: Vec<&str> = group.rules().map(Rule::name).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(group.matches("a").unwrap().keys(), ["k".to_string()]);
    }

    #[test]
    fn without_drops_named_rules() {
        let group = RuleGroup::with_rules(TypeKey::map(), [rule("a"), rule("b"), rule("c")]);
        let trimmed = group.without(&["b"]);
        let names: Vec<&str> = trimmed.rules().map(Rule::name).collect();
        assert_eq!(names, ["a", "c"]);
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn keys_derive_a_map_group() {
        let rule = Rule::new("headers", ["authorization", "$.a.b"], strategy_of::<Asterisk>()).unwrap();
        let redaction = rule.redaction();
        let nested = redaction.nested().unwrap();
        assert!(nested.target().is_map());
        assert!(nested.matches("Authorization").is_some());
        assert_eq!(nested.len(), 1);
        assert_eq!(redaction.keys().len(), 2);
    }

    #[test]
    fn declarations_skip_invalid_entries() {
        let declarations = [
            RuleDeclaration::member("password", strategy_of::<Asterisk>),
            RuleDeclaration::member("", strategy_of::<Asterisk>),
            RuleDeclaration::patterns(&["^secret.*", "token"], strategy_of::<Token>),
        ];
        let group = RuleGroup::from_declarations(TypeKey::map(), &declarations);
        let names: Vec<&str> = group.rules().map(Rule::name).collect();
        assert_eq!(names, ["password", "^secret.*", "token"]);
    }
}
