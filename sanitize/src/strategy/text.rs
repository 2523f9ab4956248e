//! Character-level text strategies.
//!
//! [`TextStrategy`] is a pure `&str -> String` transformation over Unicode
//! scalar values. It knows nothing about records or rules; the engine decides
//! what to pass in.

use std::borrow::Cow;

use super::RedactionStrategy;

/// Placeholder emitted for full redaction and for empty inputs.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

/// Character used to hide individual characters.
pub const MASK_CHAR: char = '*';

/// Leading and trailing character counts shared by the keep and mask configs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Span {
    head: usize,
    tail: usize,
}

impl Span {
    fn covers(self, total: usize) -> bool {
        self.head.saturating_add(self.tail) >= total
    }
}

/// Replaces every char of `chars[range]` with `mask_char`.
fn hide(chars: &mut [char], range: std::ops::Range<usize>, mask_char: char) {
    chars[range].fill(mask_char);
}

/// Keeps `head` leading and `tail` trailing characters, hiding the middle.
///
/// When the visible spans cover the whole value it is returned unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeepConfig {
    span: Span,
    mask_char: char,
}

impl KeepConfig {
    #[must_use]
    pub fn first(head: usize) -> Self {
        Self::both(head, 0)
    }

    #[must_use]
    pub fn last(tail: usize) -> Self {
        Self::both(0, tail)
    }

    #[must_use]
    pub fn both(head: usize, tail: usize) -> Self {
        Self {
            span: Span { head, tail },
            mask_char: MASK_CHAR,
        }
    }

    #[must_use]
    pub fn with_mask_char(mut self, mask_char: char) -> Self {
        self.mask_char = mask_char;
        self
    }

    fn apply(&self, mut chars: Vec<char>) -> String {
        let total = chars.len();
        if !self.span.covers(total) {
            hide(&mut chars, self.span.head..total - self.span.tail, self.mask_char);
        }
        chars.into_iter().collect()
    }
}

/// Hides `head` leading and `tail` trailing characters, keeping the middle.
///
/// When the hidden spans cover the whole value everything is hidden.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskConfig {
    span: Span,
    mask_char: char,
}

impl MaskConfig {
    #[must_use]
    pub fn first(head: usize) -> Self {
        Self::both(head, 0)
    }

    #[must_use]
    pub fn last(tail: usize) -> Self {
        Self::both(0, tail)
    }

    #[must_use]
    pub fn both(head: usize, tail: usize) -> Self {
        Self {
            span: Span { head, tail },
            mask_char: MASK_CHAR,
        }
    }

    #[must_use]
    pub fn with_mask_char(mut self, mask_char: char) -> Self {
        self.mask_char = mask_char;
        self
    }

    fn apply(&self, mut chars: Vec<char>) -> String {
        let total = chars.len();
        if self.span.covers(total) {
            hide(&mut chars, 0..total, self.mask_char);
        } else {
            hide(&mut chars, 0..self.span.head, self.mask_char);
            hide(&mut chars, total - self.span.tail..total, self.mask_char);
        }
        chars.into_iter().collect()
    }
}

/// Hides the local part of an email address after `head` characters and keeps
/// the domain. Values without `@` are treated as a bare local part.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmailConfig {
    head: usize,
    mask_char: char,
}

impl EmailConfig {
    #[must_use]
    pub fn new(head: usize) -> Self {
        Self {
            head,
            mask_char: MASK_CHAR,
        }
    }

    #[must_use]
    pub fn with_mask_char(mut self, mask_char: char) -> Self {
        self.mask_char = mask_char;
        self
    }

    fn apply(&self, value: &str) -> String {
        let (local, domain) = value.split_at(value.find('@').unwrap_or(value.len()));
        let keep = KeepConfig::first(self.head).with_mask_char(self.mask_char);
        let mut out = keep.apply(local.chars().collect());
        out.push_str(domain);
        out
    }
}

/// A text redaction strategy.
///
/// Every variant returns [`REDACTED_PLACEHOLDER`] for an empty input except
/// `Full`, which always returns its own placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextStrategy {
    /// Replace the whole value with a fixed placeholder.
    Full { placeholder: Cow<'static, str> },
    Keep(KeepConfig),
    Mask(MaskConfig),
    Email(EmailConfig),
}

impl Default for TextStrategy {
    fn default() -> Self {
        Self::full_with(REDACTED_PLACEHOLDER)
    }
}

impl TextStrategy {
    #[must_use]
    pub fn full_with<P>(placeholder: P) -> Self
    where
        P: Into<Cow<'static, str>>,
    {
        Self::Full {
            placeholder: placeholder.into(),
        }
    }

    #[must_use]
    pub fn keep_first(head: usize) -> Self {
        Self::Keep(KeepConfig::first(head))
    }

    #[must_use]
    pub fn keep_last(tail: usize) -> Self {
        Self::Keep(KeepConfig::last(tail))
    }

    #[must_use]
    pub fn mask_first(head: usize) -> Self {
        Self::Mask(MaskConfig::first(head))
    }

    #[must_use]
    pub fn mask_last(tail: usize) -> Self {
        Self::Mask(MaskConfig::last(tail))
    }

    /// Keeps the first `head` characters of the local part.
    ///
    /// ```
    /// use sanitize::TextStrategy;
    ///
    /// assert_eq!(TextStrategy::email_local(2).apply_to("alice@example.com"), "al***@example.com");
    /// ```
    #[must_use]
    pub fn email_local(head: usize) -> Self {
        Self::Email(EmailConfig::new(head))
    }

    /// Overrides the mask character. Has no effect on `Full`.
    #[must_use]
    pub fn with_mask_char(self, mask_char: char) -> Self {
        match self {
            Self::Full { .. } => self,
            Self::Keep(config) => Self::Keep(config.with_mask_char(mask_char)),
            Self::Mask(config) => Self::Mask(config.with_mask_char(mask_char)),
            Self::Email(config) => Self::Email(config.with_mask_char(mask_char)),
        }
    }

    /// Applies the strategy. Total: never fails.
    #[must_use]
    pub fn apply_to(&self, value: &str) -> String {
        match self {
            Self::Full { placeholder } => placeholder.clone().into_owned(),
            _ if value.is_empty() => REDACTED_PLACEHOLDER.to_string(),
            Self::Keep(config) => config.apply(value.chars().collect()),
            Self::Mask(config) => config.apply(value.chars().collect()),
            Self::Email(config) => config.apply(value),
        }
    }
}

impl RedactionStrategy for TextStrategy {
    fn redact(&self, value: &str) -> String {
        self.apply_to(value)
    }
}
