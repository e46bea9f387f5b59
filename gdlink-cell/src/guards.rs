/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::sync::{Mutex, MutexGuard};

use crate::cell::CellState;

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Wraps a shared borrowed value of type `T`.
///
/// No mutable borrows to the same value can be created while this guard exists.
#[derive(Debug)]
pub struct RefGuard<'a, T> {
    state: &'a Mutex<CellState<T>>,
    value: NonNull<T>,
}

impl<'a, T> RefGuard<'a, T> {
    /// # Safety
    ///
    /// While the returned guard exists, the caller must ensure that:
    /// - reading through `value` is valid;
    /// - no new mutable references to the same value are created;
    /// - if other mutable references exist, `value` is derived from them and they stay unused.
    pub(crate) unsafe fn new(state: &'a Mutex<CellState<T>>, value: NonNull<T>) -> Self {
        Self { state, value }
    }
}

impl<'a, T> Deref for RefGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: upheld by the invariants of `new`.
        unsafe { self.value.as_ref() }
    }
}

impl<'a, T> Drop for RefGuard<'a, T> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap()
            .borrow_state
            .decrement_shared()
            .unwrap();
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Wraps a mutably borrowed value of type `T`.
///
/// Prevents all other borrows of the value while this guard is accessible. To park this guard
/// and allow reborrowing, pass a `&mut` reference handed out by it to
/// [`BindCell::make_inaccessible()`](crate::BindCell::make_inaccessible).
#[derive(Debug)]
pub struct MutGuard<'a, T> {
    state: &'a Mutex<CellState<T>>,
    count: usize,
    value: NonNull<T>,
}

impl<'a, T> MutGuard<'a, T> {
    /// # Safety
    ///
    /// While the returned guard exists and is accessible, the caller must ensure that:
    /// - reading/writing through `value` is valid;
    /// - no new references to the value are created, unless this guard is first made
    ///   inaccessible through [`BindCell::make_inaccessible()`](crate::BindCell::make_inaccessible);
    /// - if other mutable references exist, `value` is derived from them and they stay unused.
    pub(crate) unsafe fn new(
        state: &'a Mutex<CellState<T>>,
        count: usize,
        value: NonNull<T>,
    ) -> Self {
        Self {
            state,
            count,
            value,
        }
    }

    // Best-effort sanity check; should never trigger.
    fn assert_is_current(&self) {
        let count = self.state.lock().unwrap().borrow_state.mut_count();
        assert_eq!(
            self.count,
            count,
            "attempted to access a non-current mutable borrow of type `{}`; \
             this is a bug, please report it",
            std::any::type_name::<T>()
        );
    }
}

impl<'a, T> Deref for MutGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.assert_is_current();

        // SAFETY: upheld by the invariants of `new`.
        unsafe { self.value.as_ref() }
    }
}

impl<'a, T> DerefMut for MutGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.assert_is_current();

        // SAFETY: upheld by the invariants of `new`.
        unsafe { self.value.as_mut() }
    }
}

impl<'a, T> Drop for MutGuard<'a, T> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap()
            .borrow_state
            .decrement_mut()
            .unwrap();
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Keeps a mutable reference inaccessible until dropped.
///
/// On creation, the cell's value pointer is replaced with the reference passed in, so any new
/// borrows are derived from the most recent `&mut`. On drop, the previous pointer is restored,
/// as if this guard never existed.
#[derive(Debug)]
pub struct InaccessibleGuard<'a, T> {
    state: &'a Mutex<CellState<T>>,
    stack_depth: usize,
    prev_ptr: NonNull<T>,
}

impl<'a, T> InaccessibleGuard<'a, T> {
    /// Errors if there is no accessible mutable borrow, shared references exist, or `new_ref`
    /// is not the reference most recently handed out by the cell.
    pub(crate) fn new<'b>(
        state: &'a Mutex<CellState<T>>,
        new_ref: &'b mut T,
    ) -> Result<Self, Box<dyn std::error::Error>>
    where
        'a: 'b,
    {
        let mut guard = state.lock().unwrap();

        let current_ptr = guard.get_ptr();
        let new_ptr = NonNull::from(new_ref);

        if current_ptr != new_ptr {
            // Likely not unsound, but unexpected.
            return Err("wrong reference passed in".into());
        }

        guard.borrow_state.set_inaccessible()?;
        let prev_ptr = guard.get_ptr();
        let stack_depth = guard.push_ptr(new_ptr);

        Ok(Self {
            state,
            stack_depth,
            prev_ptr,
        })
    }

    fn perform_drop(
        mut state: MutexGuard<'_, CellState<T>>,
        prev_ptr: NonNull<T>,
        stack_depth: usize,
    ) {
        if state.stack_depth != stack_depth {
            state
                .borrow_state
                .poison("cannot drop inaccessible guards in the wrong order")
                .unwrap();
        }
        state.borrow_state.unset_inaccessible().unwrap();
        state.pop_ptr(prev_ptr);
    }
}

impl<'a, T> Drop for InaccessibleGuard<'a, T> {
    fn drop(&mut self) {
        let state = self.state.lock().unwrap();
        Self::perform_drop(state, self.prev_ptr, self.stack_depth);
    }
}
