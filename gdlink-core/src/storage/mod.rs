/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Library-side storage for user-class instances.
//!
//! Each host object of a user class carries an opaque instance pointer, which on this side is
//! a leaked `Box<InstanceStorage<T>>`. The storage owns the user struct behind a re-entrant
//! borrow cell, the handle to the base object, and the mirrored host ref-count.

use std::cell::Cell;
use std::error::Error;

use gdlink_cell::{BindCell, InaccessibleGuard, MutGuard, RefGuard};

use crate::obj::{Base, GodotClass, UserClass};
use crate::registry::handle_table;
use crate::{godot_error, out, sys};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Lifecycle {
    Alive,
    Destroying,
}

pub struct InstanceStorage<T: GodotClass> {
    user_instance: BindCell<T>,
    base: Base<T::Base>,

    lifecycle: Cell<Lifecycle>,

    /// Mirror of the host-side reference count, for diagnostics.
    godot_ref_count: Cell<u32>,
}

impl<T: GodotClass> InstanceStorage<T> {
    pub(crate) fn construct(user_instance: T, base: Base<T::Base>) -> Self {
        out!("    Storage::construct  <{}>", T::CLASS_NAME);

        Self {
            user_instance: BindCell::new(user_instance),
            base,
            lifecycle: Cell::new(Lifecycle::Alive),
            godot_ref_count: Cell::new(1),
        }
    }

    /// Leaks the storage; the result is attached to the host object and travels back through
    /// the class callbacks until [`destroy_storage`] reclaims it.
    pub(crate) fn into_raw(self) -> sys::InstancePtr {
        Box::into_raw(Box::new(self)) as sys::InstancePtr
    }

    /// Whether a `bind()` or `bind_mut()` guard currently exists.
    pub fn is_bound(&self) -> bool {
        self.user_instance.is_currently_bound()
    }

    pub fn get(&self) -> RefGuard<'_, T> {
        self.assert_alive();
        self.user_instance.borrow().unwrap_or_else(|err| {
            panic!(
                "Gd<T>::bind() failed, already bound; T = {}.\n  \
                 Make sure to use `self.base().to_gd()` rather than a fresh bind.\n  \
                 Details: {err}.",
                T::CLASS_NAME
            )
        })
    }

    pub fn get_mut(&self) -> MutGuard<'_, T> {
        self.assert_alive();
        self.user_instance.borrow_mut().unwrap_or_else(|err| {
            panic!(
                "Gd<T>::bind_mut() failed, already bound; T = {}.\n  \
                 Make sure to use `self.base_mut()` rather than a fresh bind_mut.\n  \
                 Details: {err}.",
                T::CLASS_NAME
            )
        })
    }

    /// Handle to the base object this storage is attached to.
    pub fn base(&self) -> &Base<T::Base> {
        &self.base
    }

    /// Parks the mutable borrow behind `current_ref`, so a nested host call can re-bind this
    /// instance. The reference becomes usable again once the returned guard is dropped.
    ///
    /// `current_ref` must be the reference handed out by the innermost live
    /// [`get_mut()`][Self::get_mut] guard, otherwise an error is returned and nothing is
    /// parked.
    pub fn make_inaccessible<'a>(
        &'a self,
        current_ref: &'a mut T,
    ) -> Result<InaccessibleGuard<'a, T>, Box<dyn Error>> {
        self.user_instance.make_inaccessible(current_ref)
    }

    pub(crate) fn on_inc_ref(&self) {
        self.godot_ref_count.set(self.godot_ref_count.get() + 1);
        out!(
            "    Storage::on_inc_ref (rc={})  <{}>",
            self.godot_ref_count(),
            T::CLASS_NAME
        );
    }

    pub(crate) fn on_dec_ref(&self) {
        self.godot_ref_count.set(self.godot_ref_count.get() - 1);
        out!(
            "  | Storage::on_dec_ref (rc={})  <{}>",
            self.godot_ref_count(),
            T::CLASS_NAME
        );
    }

    pub(crate) fn godot_ref_count(&self) -> u32 {
        self.godot_ref_count.get()
    }

    fn assert_alive(&self) {
        assert_eq!(
            self.lifecycle.get(),
            Lifecycle::Alive,
            "accessed instance of class {} during destruction",
            T::CLASS_NAME
        );
    }
}

/// Interprets the opaque instance pointer attached to a host object.
///
/// # Safety
/// `instance_ptr` must have been produced by `InstanceStorage::<T>::into_raw()` with the same
/// `T`, and [`destroy_storage`] must not have reclaimed it yet.
pub(crate) unsafe fn as_storage<'u, T: GodotClass>(
    instance_ptr: sys::InstancePtr,
) -> &'u InstanceStorage<T> {
    &*(instance_ptr as *mut InstanceStorage<T>)
}

/// Storage attached to the live object behind `base`.
///
/// This is how a user method reaches its own storage from inside a call, e.g. to park its
/// `&mut self` borrow through [`make_inaccessible`][InstanceStorage::make_inaccessible]
/// before performing a host call that may re-enter the instance.
///
/// # Panics
/// If the object behind `base` is dead, or carries no attached instance.
///
/// # Safety
/// `T` must be the user class whose instance is attached to the object behind `base`, and the
/// returned reference must not outlive that object.
pub unsafe fn storage_for<'u, T: UserClass>(base: &Base<T::Base>) -> &'u InstanceStorage<T> {
    let object_ptr = base
        .object_ptr()
        .unwrap_or_else(|err| panic!("cannot access storage of class {}: {err}", T::CLASS_NAME));

    let instance_ptr = sys::interface_fn!(object_get_instance)(object_ptr);
    assert!(
        !instance_ptr.is_null(),
        "object of class {} carries no attached instance",
        T::CLASS_NAME
    );

    as_storage::<T>(instance_ptr)
}

/// Reclaims the storage behind `instance_ptr`.
///
/// If a bind guard still exists, dropping the user struct would invalidate a live reference;
/// the storage is leaked instead and an error is reported.
///
/// # Safety
/// Same contract as [`as_storage`]; afterwards the pointer must no longer be used.
pub(crate) unsafe fn destroy_storage<T: GodotClass>(instance_ptr: sys::InstancePtr) {
    let storage = Box::from_raw(instance_ptr as *mut InstanceStorage<T>);

    // Host-initiated destruction reaches this library only through this callback; sweep the
    // table now so every outstanding handle to the object turns stale.
    if let Some(instance_id) = storage.base().cached_instance_id() {
        handle_table::invalidate_object(instance_id);
    }

    if storage.is_bound() {
        storage.lifecycle.set(Lifecycle::Destroying);
        godot_error!(
            "destroyed an object of class {} while a bind was active; instance leaked",
            (T::CLASS_NAME)
        );
        Box::leak(storage);
    }
}
