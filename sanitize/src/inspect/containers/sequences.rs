//! Ordered sequences: `Vec`, `VecDeque` and arrays.

use std::collections::VecDeque;

use super::own_type_key;
use crate::{
    error::MaskFailure,
    inspect::{Elements, Inspect, Shape},
    mask::MaskContext,
    rules::Redaction,
};

macro_rules! impl_sequence {
    ($({$($generics:tt)*} $ty:ty),* $(,)?) => {
        $(
            impl<$($generics)*> Inspect for $ty {
                own_type_key!();

                fn shape(&self) -> Shape<'_> {
                    Shape::Seq(Elements::of(self.len(), self.iter()))
                }

                fn mask_with(&mut self, cx: &mut MaskContext<'_>) -> Result<(), MaskFailure> {
                    if T::is_primitive() || self.is_empty() {
                        return Ok(());
                    }
                    self.iter_mut().try_for_each(|item| item.mask_with(cx))
                }

                fn redact_with(
                    &mut self,
                    redaction: &Redaction<'_>,
                    cx: &mut MaskContext<'_>,
                ) -> Result<(), MaskFailure> {
                    self.iter_mut().try_for_each(|item| item.redact_with(redaction, cx))
                }
            }
        )*
    };
}

impl_sequence! {
    {T: Inspect} Vec<T>,
    {T: Inspect} VecDeque<T>,
    {T: Inspect, const N: usize} [T; N],
}
