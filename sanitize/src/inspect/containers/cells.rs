//! Shared cells: `Rc<RefCell<T>>`, `Arc<Mutex<T>>` and `Arc<RwLock<T>>`.
//!
//! These are the only std values that can form cycles, so they carry an
//! identity (the address of the shared allocation).
//!
//! Masking takes the cell's write side (`borrow_mut`, `lock`, `write`) and
//! visits each cell once per call. Under [`CopyPolicy::Identity`] a call holds
//! at most one guard: cells reached while a guard is held are queued and
//! masked after it is released, so two calls entering the same graph from
//! different cells never wait on each other. Under [`CopyPolicy::DeepCopy`]
//! each cell is replaced by a fresh one holding a masked clone; the copy is
//! memoised by the original address so every edge into the same cell,
//! including back edges, ends up pointing at the same copy.
//!
//! Printing only uses the non-blocking read side (`try_borrow`, `try_lock`,
//! `try_read`) and reports a busy cell as unavailable.

use std::{
    any::type_name,
    cell::RefCell,
    rc::Rc,
    sync::{Arc, Mutex, RwLock, TryLockError},
};

use super::own_type_key;
use crate::{
    error::MaskFailure,
    inspect::{Inspect, Shape, SharedCell, TypeKey},
    mask::{CopyPolicy, MaskContext},
    rules::Redaction,
};

type Edit<'e, T> = dyn FnMut(&mut T) -> Result<(), MaskFailure> + 'e;

/// Uniform access to the three cell flavours.
trait CellAccess: Clone + 'static {
    type Inner: Inspect + Clone;

    fn address(&self) -> usize;

    fn fresh(inner: Self::Inner) -> Self;

    fn read_clone(&self) -> Result<Self::Inner, MaskFailure>;

    fn write_with(&self, edit: &mut Edit<'_, Self::Inner>) -> Result<(), MaskFailure>;

    fn try_read_with(&self, visit: &mut dyn FnMut(&dyn Inspect)) -> bool;
}

impl<T: Inspect + Clone> CellAccess for Rc<RefCell<T>> {
    type Inner = T;

    fn address(&self) -> usize {
        Rc::as_ptr(self).cast::<()>() as usize
    }

    fn fresh(inner: T) -> Self {
        Rc::new(RefCell::new(inner))
    }

    fn read_clone(&self) -> Result<T, MaskFailure> {
        self.try_borrow()
            .map(|inner| T::clone(&inner))
            .map_err(|_| MaskFailure::Busy {
                type_name: type_name::<Self>(),
            })
    }

    fn write_with(&self, edit: &mut Edit<'_, T>) -> Result<(), MaskFailure> {
        let mut inner = self.try_borrow_mut().map_err(|_| MaskFailure::Busy {
            type_name: type_name::<Self>(),
        })?;
        edit(&mut *inner)
    }

    fn try_read_with(&self, visit: &mut dyn FnMut(&dyn Inspect)) -> bool {
        match self.try_borrow() {
            Ok(inner) => {
                visit(&*inner);
                true
            }
            Err(_) => false,
        }
    }
}

impl<T: Inspect + Clone> CellAccess for Arc<Mutex<T>> {
    type Inner = T;

    fn address(&self) -> usize {
        Arc::as_ptr(self).cast::<()>() as usize
    }

    fn fresh(inner: T) -> Self {
        Arc::new(Mutex::new(inner))
    }

    fn read_clone(&self) -> Result<T, MaskFailure> {
        self.lock()
            .map(|inner| T::clone(&inner))
            .map_err(|_| MaskFailure::Poisoned {
                type_name: type_name::<Self>(),
            })
    }

    fn write_with(&self, edit: &mut Edit<'_, T>) -> Result<(), MaskFailure> {
        let mut inner = self.lock().map_err(|_| MaskFailure::Poisoned {
            type_name: type_name::<Self>(),
        })?;
        edit(&mut *inner)
    }

    fn try_read_with(&self, visit: &mut dyn FnMut(&dyn Inspect)) -> bool {
        match self.try_lock() {
            Ok(inner) => visit(&*inner),
            Err(TryLockError::Poisoned(poisoned)) => visit(&*poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => return false,
        }
        true
    }
}

impl<T: Inspect + Clone> CellAccess for Arc<RwLock<T>> {
    type Inner = T;

    fn address(&self) -> usize {
        Arc::as_ptr(self).cast::<()>() as usize
    }

    fn fresh(inner: T) -> Self {
        Arc::new(RwLock::new(inner))
    }

    fn read_clone(&self) -> Result<T, MaskFailure> {
        self.read()
            .map(|inner| T::clone(&inner))
            .map_err(|_| MaskFailure::Poisoned {
                type_name: type_name::<Self>(),
            })
    }

    fn write_with(&self, edit: &mut Edit<'_, T>) -> Result<(), MaskFailure> {
        let mut inner = self.write().map_err(|_| MaskFailure::Poisoned {
            type_name: type_name::<Self>(),
        })?;
        edit(&mut *inner)
    }

    fn try_read_with(&self, visit: &mut dyn FnMut(&dyn Inspect)) -> bool {
        match self.try_read() {
            Ok(inner) => visit(&*inner),
            Err(TryLockError::Poisoned(poisoned)) => visit(&*poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => return false,
        }
        true
    }
}

/// Runs `edit` on the cell's inner value under the context's copy policy.
fn edit_cell<C: CellAccess>(
    cell: &mut C,
    cx: &mut MaskContext<'_>,
    mut edit: impl FnMut(&mut C::Inner, &mut MaskContext<'_>) -> Result<(), MaskFailure>,
) -> Result<(), MaskFailure> {
    let address = cell.address();
    match cx.policy() {
        CopyPolicy::Identity => {
            if !cx.enter_shared(address) {
                return Ok(());
            }
            cx.guarded(|cx| cell.write_with(&mut |inner| edit(inner, cx)))?;
            if cx.holds_guard() {
                return Ok(());
            }
            cx.run_deferred()
        }
        CopyPolicy::DeepCopy => {
            if let Some(copy) = cx.copy_of::<C>(address) {
                *cell = copy;
                return Ok(());
            }
            let fresh = C::fresh(cell.read_clone()?);
            let original = std::mem::replace(cell, fresh.clone());
            cx.remember_copy(address, original, fresh);
            cell.write_with(&mut |inner| edit(inner, cx))
        }
    }
}

/// Queues identity masking of a cell reached under another cell's guard.
fn defer_mask<C: CellAccess>(cell: &C, cx: &mut MaskContext<'_>) -> Result<(), MaskFailure> {
    if !cx.enter_shared(cell.address()) {
        return Ok(());
    }
    let cell = cell.clone();
    cx.defer(Box::new(move |cx: &mut MaskContext<'_>| {
        cx.guarded(|cx| cell.write_with(&mut |inner: &mut C::Inner| inner.mask_with(cx)))
    }));
    Ok(())
}

macro_rules! impl_cell {
    ($($cell:ty),*) => {
        $(
            impl<T: Inspect + Clone> SharedCell for $cell {
                fn address(&self) -> usize {
                    CellAccess::address(self)
                }

                fn inner_key(&self) -> TypeKey {
                    TypeKey::of::<T>()
                }

                fn with_inner(&self, visit: &mut dyn FnMut(&dyn Inspect)) -> bool {
                    self.try_read_with(visit)
                }
            }

            impl<T: Inspect + Clone> Inspect for $cell {
                own_type_key!();

                fn shape(&self) -> Shape<'_> {
                    Shape::Shared(self)
                }

                fn mask_with(&mut self, cx: &mut MaskContext<'_>) -> Result<(), MaskFailure> {
                    if cx.policy() == CopyPolicy::Identity && cx.holds_guard() {
                        return defer_mask(self, cx);
                    }
                    edit_cell(self, cx, |inner, cx| inner.mask_with(cx))
                }

                fn redact_with(
                    &mut self,
                    redaction: &Redaction<'_>,
                    cx: &mut MaskContext<'_>,
                ) -> Result<(), MaskFailure> {
                    edit_cell(self, cx, |inner, cx| inner.redact_with(redaction, cx))
                }
            }
        )*
    };
}

impl_cell!(Rc<RefCell<T>>, Arc<Mutex<T>>, Arc<RwLock<T>>);
