/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::cell::UnsafeCell;
use std::error::Error;
use std::ptr::NonNull;
use std::sync::Mutex;

use crate::borrow_state::BorrowState;
use crate::guards::{InaccessibleGuard, MutGuard, RefGuard};

/// A cell which can hand out new `&mut` references to its value even when one already exists,
/// as long as any such pre-existing reference has been handed back to the cell first and no
/// shared references exist.
///
/// The inner allocation is boxed so the value pointer stays stable when the cell moves. The
/// cell itself is **not** thread-safe; the mutex around the state only exists to keep the
/// guards free of `unsafe` state access.
pub struct BindCell<T> {
    inner: Box<CellInner<T>>,
}

struct CellInner<T> {
    /// The mutable bookkeeping of this cell.
    state: Mutex<CellState<T>>,
    /// The actual value we hand out references to; `UnsafeCell` since `&mut` references to its
    /// contents are produced from a `&` reference to the cell.
    value: UnsafeCell<T>,
}

impl<T> BindCell<T> {
    /// Creates a new cell storing `value`.
    pub fn new(value: T) -> Self {
        let inner = Box::new(CellInner {
            state: Mutex::new(CellState::unlinked()),
            value: UnsafeCell::new(value),
        });

        // The value lives on the heap, so its address survives moves of `BindCell`.
        let value_ptr = NonNull::new(inner.value.get()).unwrap();
        inner.state.lock().unwrap().link(value_ptr);

        Self { inner }
    }

    /// Returns a new shared reference to the contents of the cell.
    ///
    /// Fails if an accessible mutable reference exists.
    pub fn borrow(&self) -> Result<RefGuard<'_, T>, Box<dyn Error>> {
        let mut state = self.inner.state.lock().unwrap();
        state.borrow_state.increment_shared()?;
        let value = state.get_ptr();
        drop(state);

        // SAFETY: `increment_shared` succeeded, therefore no accessible mutable reference
        // exists, and none can be created while the guard lives.
        unsafe { Ok(RefGuard::new(&self.inner.state, value)) }
    }

    /// Returns a new mutable reference to the contents of the cell.
    ///
    /// Fails if an accessible mutable reference or any shared reference exists.
    pub fn borrow_mut(&self) -> Result<MutGuard<'_, T>, Box<dyn Error>> {
        let mut state = self.inner.state.lock().unwrap();
        state.borrow_state.increment_mut()?;
        let count = state.borrow_state.mut_count();
        let value = state.get_ptr();
        drop(state);

        // SAFETY: `increment_mut` succeeded, therefore any existing mutable references are
        // inaccessible and `value` is derived from the most recent of them. New references can
        // only appear after this guard is dropped or made inaccessible.
        unsafe { Ok(MutGuard::new(&self.inner.state, count, value)) }
    }

    /// Parks the current mutable borrow, freeing the value up to be reborrowed.
    ///
    /// Errors if there is no accessible mutable borrow, shared references exist, or
    /// `current_ref` is not the reference most recently handed out by this cell.
    pub fn make_inaccessible<'cell, 'val>(
        &'cell self,
        current_ref: &'val mut T,
    ) -> Result<InaccessibleGuard<'val, T>, Box<dyn Error>>
    where
        'cell: 'val,
    {
        InaccessibleGuard::new(&self.inner.state, current_ref)
    }

    /// Returns `true` if any mutable or shared references are tracked, regardless of whether
    /// the mutable references are accessible.
    ///
    /// When this returns `false` it is safe to destroy the cell and the value within.
    pub fn is_currently_bound(&self) -> bool {
        let state = self.inner.state.lock().unwrap();
        state.borrow_state.shared_count() > 0 || state.borrow_state.mut_count() > 0
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Mutable bookkeeping of a [`BindCell`].
#[derive(Debug)]
pub(crate) struct CellState<T> {
    pub(crate) borrow_state: BorrowState,

    /// Current pointer to the value; always derived from the most recent `&mut` reference, so
    /// new borrows never alias a parked one. Dangling only before [`link()`](Self::link).
    ptr: NonNull<T>,

    /// How many pointers have been pushed; detects out-of-order inaccessible-guard drops.
    pub(crate) stack_depth: usize,
}

impl<T> CellState<T> {
    /// State not yet linked to its value; [`link()`](Self::link) must be called before any
    /// borrow.
    pub(crate) fn unlinked() -> Self {
        Self {
            borrow_state: BorrowState::new(),
            ptr: NonNull::dangling(),
            stack_depth: 0,
        }
    }

    pub(crate) fn link(&mut self, value: NonNull<T>) {
        self.ptr = value;
    }

    pub(crate) fn get_ptr(&self) -> NonNull<T> {
        self.ptr
    }

    /// Push a pointer, making it the source for future borrows.
    pub(crate) fn push_ptr(&mut self, new_ptr: NonNull<T>) -> usize {
        self.ptr = new_ptr;
        self.stack_depth += 1;
        self.stack_depth
    }

    /// Pop a pointer, restoring the previous borrow source.
    pub(crate) fn pop_ptr(&mut self, old_ptr: NonNull<T>) -> usize {
        self.ptr = old_ptr;
        self.stack_depth -= 1;
        self.stack_depth
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn prevent_mut_mut() {
        const VAL: i32 = -451431556;
        let cell = BindCell::new(VAL);
        let guard1 = cell.borrow_mut().unwrap();

        assert_eq!(*guard1, VAL);
        assert!(cell.borrow_mut().is_err());
        drop(guard1);
    }

    #[test]
    fn prevent_mut_shared() {
        const VAL: i32 = 13512;
        let cell = BindCell::new(VAL);
        let guard1 = cell.borrow_mut().unwrap();

        assert_eq!(*guard1, VAL);
        assert!(cell.borrow().is_err());
        drop(guard1);
    }

    #[test]
    fn prevent_shared_mut() {
        const VAL: i32 = 99;
        let cell = BindCell::new(VAL);
        let guard1 = cell.borrow().unwrap();

        assert_eq!(*guard1, VAL);
        assert!(cell.borrow_mut().is_err());
        drop(guard1);
    }

    #[test]
    fn allow_shared_shared() {
        const VAL: i32 = 10;
        let cell = BindCell::new(VAL);
        let guard1 = cell.borrow().unwrap();
        let guard2 = cell.borrow().unwrap();

        assert_eq!(*guard1, VAL);
        assert_eq!(*guard2, VAL);
    }

    #[test]
    fn allow_inaccessible_mut_mut() {
        const VAL: i32 = 23456;
        let cell = BindCell::new(VAL);

        let mut guard1 = cell.borrow_mut().unwrap();
        let mut1 = &mut *guard1;
        assert_eq!(*mut1, VAL);
        *mut1 = VAL + 50;

        let inaccessible_guard = cell.make_inaccessible(mut1).unwrap();

        let mut guard2 = cell.borrow_mut().unwrap();
        let mut2 = &mut *guard2;
        assert_eq!(*mut2, VAL + 50);
        *mut2 = VAL - 30;
        drop(guard2);

        drop(inaccessible_guard);

        assert_eq!(*mut1, VAL - 30);
        *mut1 = VAL - 5;

        drop(guard1);

        let guard3 = cell.borrow().unwrap();
        assert_eq!(*guard3, VAL - 5);
    }

    #[test]
    fn reject_foreign_reference() {
        const VAL1: i32 = 23456;
        const VAL2: i32 = 11111;
        let cell1 = BindCell::new(VAL1);
        let cell2 = BindCell::new(VAL2);

        let mut guard1 = cell1.borrow_mut().unwrap();
        let _mut1 = &mut *guard1;

        let mut guard2 = cell2.borrow_mut().unwrap();
        let mut2 = &mut *guard2;

        cell1
            .make_inaccessible(mut2)
            .expect_err("should not allow references from other cells");

        drop(guard1);
        drop(guard2);
    }

    #[test]
    fn bound_status_tracks_guards() {
        let cell = BindCell::new(0u8);
        assert!(!cell.is_currently_bound());

        let guard = cell.borrow().unwrap();
        assert!(cell.is_currently_bound());
        drop(guard);

        assert!(!cell.is_currently_bound());
    }
}
