/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::marker::PhantomData;

use crate::obj::{Gd, GodotClass, InstanceId, RawHandle};
use crate::registry::handle_table::{HandleError, Ownership};
use crate::sys;

/// Restricted version of `Gd`, to hold the base instance inside a user's `GodotClass`.
///
/// Behaves similarly to [`Gd`][crate::obj::Gd], but is more constrained: it references the
/// base object of the instance that contains it, so it must never keep that object alive --
/// otherwise the object could not die. Its table entry is tagged `Borrowed`, and handles
/// minted from it via [`to_gd()`][Self::to_gd] are bound to this entry's lifetime.
pub struct Base<T: GodotClass> {
    raw: RawHandle,
    _marker: PhantomData<*const T>,
}

impl<T: GodotClass> Base<T> {
    /// Registers a non-owning entry for the base object behind `object_ptr`.
    ///
    /// # Safety
    /// `object_ptr` must be a live, non-null pointer obtained from the host, pointing at an
    /// object whose class is `T` or derived.
    pub(crate) unsafe fn from_object_ptr(object_ptr: sys::ObjectPtr) -> Self {
        let raw = RawHandle::from_object_ptr(object_ptr, Ownership::Borrowed)
            .expect("base object must be live during construction");

        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Returns a full smart pointer to this base object.
    ///
    /// The result is tagged as bound to this `Base`: it does not keep the object alive, and
    /// becomes invalid as soon as the surrounding instance is destroyed.
    pub fn to_gd(&self) -> Gd<T> {
        let raw = self
            .raw
            .duplicate(Ownership::BoundTo(self.raw.handle()))
            .unwrap_or_else(|err| panic!("base of class {} is dead: {err}", T::CLASS_NAME));

        Gd::from_raw(raw)
    }

    pub fn instance_id(&self) -> InstanceId {
        self.raw
            .instance_id()
            .unwrap_or_else(|err| panic!("base of class {} is dead: {err}", T::CLASS_NAME))
    }

    /// Instance ID as recorded in the table, without consulting the host. `None` once the
    /// entry is swept. Usable mid-destruction, unlike [`instance_id()`][Self::instance_id].
    pub(crate) fn cached_instance_id(&self) -> Option<InstanceId> {
        self.raw.cached_instance_id().ok()
    }

    pub(crate) fn object_ptr(&self) -> Result<sys::ObjectPtr, HandleError> {
        self.raw.object_ptr()
    }
}

impl<T: GodotClass> fmt::Debug for Base<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.raw.instance_id() {
            Ok(id) => write!(f, "Base<{}> {{ id: {id} }}", T::CLASS_NAME),
            Err(_) => write!(f, "Base<{}> {{ dead }}", T::CLASS_NAME),
        }
    }
}
