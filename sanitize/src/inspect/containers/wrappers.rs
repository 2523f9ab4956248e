//! Transparent wrappers: `Option`, `Box`, `Rc`, `Arc`, and the unit-like types.
//!
//! Wrappers delegate to the wrapped value. `Rc` and `Arc` without a cell are
//! copy-on-write: masking goes through `make_mut`, so a value still shared
//! with other holders is cloned before it is rewritten.

use std::{marker::PhantomData, rc::Rc, sync::Arc};

use super::own_type_key;
use crate::{
    error::MaskFailure,
    inspect::{Inspect, Shape},
    mask::MaskContext,
    rules::Redaction,
};

impl<T: Inspect> Inspect for Option<T> {
    own_type_key!();

    fn shape(&self) -> Shape<'_> {
        match self {
            Some(value) => value.shape(),
            None => Shape::Null,
        }
    }

    fn mask_with(&mut self, cx: &mut MaskContext<'_>) -> Result<(), MaskFailure> {
        match self {
            Some(value) => value.mask_with(cx),
            None => Ok(()),
        }
    }

    fn redact_with(
        &mut self,
        redaction: &Redaction<'_>,
        cx: &mut MaskContext<'_>,
    ) -> Result<(), MaskFailure> {
        match self {
            Some(value) => value.redact_with(redaction, cx),
            None => Ok(()),
        }
    }

    fn redacted_text(&self, redaction: &Redaction<'_>) -> Option<String> {
        self.as_ref()?.redacted_text(redaction)
    }

    fn as_text(&self) -> Option<&str> {
        self.as_ref()?.as_text()
    }
}

impl<T: Inspect + ?Sized> Inspect for Box<T> {
    own_type_key!();

    fn shape(&self) -> Shape<'_> {
        (**self).shape()
    }

    fn mask_with(&mut self, cx: &mut MaskContext<'_>) -> Result<(), MaskFailure> {
        (**self).mask_with(cx)
    }

    fn redact_with(
        &mut self,
        redaction: &Redaction<'_>,
        cx: &mut MaskContext<'_>,
    ) -> Result<(), MaskFailure> {
        (**self).redact_with(redaction, cx)
    }

    fn redacted_text(&self, redaction: &Redaction<'_>) -> Option<String> {
        (**self).redacted_text(redaction)
    }

    fn as_text(&self) -> Option<&str> {
        (**self).as_text()
    }
}

macro_rules! impl_shared_pointer {
    ($($ptr:ident),*) => {
        $(
            impl<T: Inspect + Clone> Inspect for $ptr<T> {
                own_type_key!();

                fn shape(&self) -> Shape<'_> {
                    (**self).shape()
                }

                fn mask_with(&mut self, cx: &mut MaskContext<'_>) -> Result<(), MaskFailure> {
                    $ptr::make_mut(self).mask_with(cx)
                }

                fn redact_with(
                    &mut self,
                    redaction: &Redaction<'_>,
                    cx: &mut MaskContext<'_>,
                ) -> Result<(), MaskFailure> {
                    $ptr::make_mut(self).redact_with(redaction, cx)
                }

                fn redacted_text(&self, redaction: &Redaction<'_>) -> Option<String> {
                    (**self).redacted_text(redaction)
                }

                fn as_text(&self) -> Option<&str> {
                    (**self).as_text()
                }
            }
        )*
    };
}

impl_shared_pointer!(Rc, Arc);

impl<T: 'static> Inspect for PhantomData<T> {
    own_type_key!();

    fn shape(&self) -> Shape<'_> {
        Shape::Null
    }
}

impl Inspect for () {
    own_type_key!();

    fn shape(&self) -> Shape<'_> {
        Shape::Null
    }
}
