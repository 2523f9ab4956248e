//! Scalars and text.

use std::borrow::Cow;

use super::own_type_key;
use crate::{
    error::MaskFailure,
    inspect::{Inspect, Shape},
    mask::MaskContext,
    rules::Redaction,
};

// =============================================================================
// Scalars
// =============================================================================

macro_rules! impl_scalar {
    ($($ty:ty => $neutral:expr),* $(,)?) => {
        $(
            impl Inspect for $ty {
                own_type_key!();

                fn shape(&self) -> Shape<'_> {
                    Shape::display(self)
                }

                fn redact_with(
                    &mut self,
                    _redaction: &Redaction<'_>,
                    _cx: &mut MaskContext<'_>,
                ) -> Result<(), MaskFailure> {
                    *self = $neutral;
                    Ok(())
                }

                fn redacted_text(&self, redaction: &Redaction<'_>) -> Option<String> {
                    Some(redaction.strategy().redact(&self.to_string()))
                }

                fn is_primitive() -> bool {
                    true
                }
            }
        )*
    };
}

impl_scalar! {
    bool => false,
    char => '*',
    i8 => 0,
    i16 => 0,
    i32 => 0,
    i64 => 0,
    i128 => 0,
    isize => 0,
    u8 => 0,
    u16 => 0,
    u32 => 0,
    u64 => 0,
    u128 => 0,
    usize => 0,
    f32 => 0.0,
    f64 => 0.0,
}

// =============================================================================
// Text
// =============================================================================

impl Inspect for String {
    own_type_key!();

    fn shape(&self) -> Shape<'_> {
        Shape::display(self)
    }

    fn redact_with(
        &mut self,
        redaction: &Redaction<'_>,
        _cx: &mut MaskContext<'_>,
    ) -> Result<(), MaskFailure> {
        *self = redaction.apply(self);
        Ok(())
    }

    fn redacted_text(&self, redaction: &Redaction<'_>) -> Option<String> {
        Some(redaction.apply(self))
    }

    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

/// Borrowed literals cannot be rewritten: masking one under a rule fails with
/// [`MaskFailure::Unsupported`]. Printing redacts normally.
impl Inspect for &'static str {
    own_type_key!();

    fn shape(&self) -> Shape<'_> {
        Shape::display(self)
    }

    fn redacted_text(&self, redaction: &Redaction<'_>) -> Option<String> {
        Some(redaction.apply(self))
    }

    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl Inspect for Cow<'static, str> {
    own_type_key!();

    fn shape(&self) -> Shape<'_> {
        Shape::display(self)
    }

    fn redact_with(
        &mut self,
        redaction: &Redaction<'_>,
        _cx: &mut MaskContext<'_>,
    ) -> Result<(), MaskFailure> {
        *self = Cow::Owned(redaction.apply(self));
        Ok(())
    }

    fn redacted_text(&self, redaction: &Redaction<'_>) -> Option<String> {
        Some(redaction.apply(self))
    }

    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl Inspect for Box<str> {
    own_type_key!();

    fn shape(&self) -> Shape<'_> {
        Shape::display(self)
    }

    fn redact_with(
        &mut self,
        redaction: &Redaction<'_>,
        _cx: &mut MaskContext<'_>,
    ) -> Result<(), MaskFailure> {
        *self = redaction.apply(self).into_boxed_str();
        Ok(())
    }

    fn redacted_text(&self, redaction: &Redaction<'_>) -> Option<String> {
        Some(redaction.apply(self))
    }

    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        inspect::Inspect,
        mask::Masker,
        rules::{Redaction, RuleRegistry},
        strategy::{Asterisk, Token},
    };

    #[test]
    fn scalars_reset_to_neutral_values() {
        let registry = RuleRegistry::new();
        let masker = Masker::new(&registry);
        let redaction = Redaction::new(&Asterisk);

        let mut age = 42_u32;
        let mut flag = true;
        let mut initial = 'x';
        let mut ratio = 0.5_f64;
        masker
            .with_context(|cx| {
                age.redact_with(&redaction, cx)?;
                flag.redact_with(&redaction, cx)?;
                initial.redact_with(&redaction, cx)?;
                ratio.redact_with(&redaction, cx)
            })
            .unwrap();
        assert_eq!((age, flag, initial, ratio), (0, false, '*', 0.0));
    }

    #[test]
    fn scalars_print_through_the_strategy() {
        assert_eq!(
            30_u8.redacted_text(&Redaction::new(&Asterisk)).as_deref(),
            Some("******")
        );
    }

    #[test]
    fn text_is_rewritten_by_the_strategy() {
        let registry = RuleRegistry::new();
        let masker = Masker::new(&registry);
        let redaction = Redaction::new(&Token);
        let mut owned = "sk_live_abc123".to_string();
        let mut cow: std::borrow::Cow<'static, str> = "sk_live_abc123".into();
        masker
            .with_context(|cx| {
                owned.redact_with(&redaction, cx)?;
                cow.redact_with(&redaction, cx)
            })
            .unwrap();
        assert_eq!(owned, "**********c123");
        assert_eq!(cow, "**********c123");
    }

    #[test]
    fn static_text_cannot_be_masked() {
        let registry = RuleRegistry::new();
        let mut literal: &'static str = "secret";
        let result = Masker::new(&registry)
            .with_context(|cx| literal.redact_with(&Redaction::new(&Asterisk), cx));
        assert!(result.is_err());
        assert_eq!(
            literal.redacted_text(&Redaction::new(&Asterisk)).as_deref(),
            Some("******")
        );
    }
}
