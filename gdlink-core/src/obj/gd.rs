/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::marker::PhantomData;

use gdlink_cell::{MutGuard, RefGuard};

use crate::meta;
use crate::obj::bounds::{DeclEngine, DynMemory, MemManual, MemRefCounted};
use crate::obj::{Base, GodotClass, Inherits, InstanceId, RawHandle, UserClass};
use crate::registry::callbacks;
use crate::registry::handle_table::{self, Ownership};
use crate::storage::{as_storage, InstanceStorage};
use crate::{out, sys};

/// Smart pointer to an object managed by the host.
///
/// Internally this is a generation-checked handle, not a raw pointer: every access looks the
/// object up in the process-wide handle table, so a `Gd` outliving its object panics with a
/// descriptive message rather than touching freed memory. [`is_instance_valid()`]
/// [Self::is_instance_valid] checks without panicking.
///
/// Cloning mints an independent handle to the same object; for ref-counted classes it also
/// increments the host's count. When the object is destroyed, **all** handles to it (clones
/// included) become invalid at once.
pub struct Gd<T: GodotClass> {
    raw: RawHandle,

    // `*const T` to keep `Gd` !Send/!Sync; single-threaded use only.
    _marker: PhantomData<*const T>,
}

impl<T: GodotClass> Gd<T> {
    pub(crate) fn from_raw(raw: RawHandle) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Wraps a host object pointer with the given ownership tag. `None` if `object_ptr` is
    /// null or the object has no instance ID.
    ///
    /// # Safety
    /// `object_ptr` must be null or a live pointer obtained from the host, and `ownership`
    /// must reflect the actual transfer: `Owned` only if the caller holds a count or is
    /// responsible for freeing.
    #[doc(hidden)]
    pub unsafe fn from_object_ptr(
        object_ptr: sys::ObjectPtr,
        ownership: Ownership,
    ) -> Option<Self> {
        RawHandle::from_object_ptr(object_ptr, ownership).map(Self::from_raw)
    }

    /// ⚠️ Returns the instance ID of this object, or panics if the object is dead.
    pub fn instance_id(&self) -> InstanceId {
        self.instance_id_or_none().unwrap_or_else(|| {
            panic!(
                "failed to call instance_id() on destroyed object; \
                 use instance_id_or_none() or check with is_instance_valid()"
            )
        })
    }

    /// Returns the instance ID of this object, or `None` if no longer alive.
    pub fn instance_id_or_none(&self) -> Option<InstanceId> {
        self.raw.instance_id().ok()
    }

    /// Checks if this smart pointer points to a live object.
    ///
    /// Stale handles (freed object, released owner) report `false`.
    pub fn is_instance_valid(&self) -> bool {
        self.raw.is_live()
    }

    /// **Upcast:** convert into a smart pointer to a base class. Always succeeds.
    ///
    /// Moves this smart pointer; the handle and ownership tag carry over unchanged.
    pub fn upcast<U>(self) -> Gd<U>
    where
        U: GodotClass,
        T: Inherits<U>,
    {
        // Same table entry, only the static type changes.
        let raw = unsafe { std::ptr::read(&self.raw) };
        std::mem::forget(self);

        Gd::from_raw(raw)
    }

    /// ⚠️ Destroys the object and invalidates every handle pointing at it, this one included.
    ///
    /// # Panics
    /// If the object is already dead, or if it is ref-counted (those are destroyed by
    /// dropping the last handle instead).
    pub fn free(self) {
        let instance_id = self
            .raw
            .instance_id()
            .unwrap_or_else(|err| panic!("free() failed for class {}: {err}", T::CLASS_NAME));

        assert!(
            !instance_id.is_ref_counted(),
            "free() called on ref-counted object of class {}; drop the last handle instead",
            T::CLASS_NAME
        );

        let object_ptr = self
            .raw
            .object_ptr()
            .unwrap_or_else(|err| panic!("free() failed for class {}: {err}", T::CLASS_NAME));

        // SAFETY: validated above; the sweep below turns all remaining handles stale before
        // anyone can observe the dangling pointer.
        unsafe { sys::interface_fn!(object_destroy)(object_ptr) };
        handle_table::invalidate_object(instance_id);

        // Entry already swept; the regular drop logic must not run.
        std::mem::forget(self);
    }

    /// Outbound pointer call of a method declared on `T`'s class.
    ///
    /// # Safety
    /// `frame` must be encoded for the method's signature and `R` must match its return type.
    #[doc(hidden)]
    pub unsafe fn engine_ptrcall<const N: usize, R: sys::FrameFfi>(
        &self,
        method: &'static str,
        frame: &mut sys::CallFrame<N>,
    ) -> R {
        self.raw
            .ptrcall(T::CLASS_NAME, method, frame)
            .unwrap_or_else(|err| panic!("cannot call {}::{method}(): {err}", T::CLASS_NAME))
    }
}

/// Construction of engine classes without reference counting.
impl<T> Gd<T>
where
    T: GodotClass<Mem = MemManual, Declarer = DeclEngine>,
{
    /// Creates a new manually-managed instance of `T`.
    ///
    /// The result must eventually be passed to [`free()`][Self::free], otherwise the host
    /// object leaks.
    pub fn new_alloc() -> Self {
        let raw = unsafe {
            let class_name = meta::class_name_cstr(T::CLASS_NAME);
            let object_ptr = sys::interface_fn!(object_construct)(class_name);
            RawHandle::from_object_ptr(object_ptr, Ownership::Owned)
        };

        let raw =
            raw.unwrap_or_else(|| panic!("failed to construct object of class {}", T::CLASS_NAME));
        Self::from_raw(raw)
    }
}

/// Construction of engine classes with reference counting.
impl<T> Gd<T>
where
    T: GodotClass<Mem = MemRefCounted, Declarer = DeclEngine>,
{
    /// Creates a new ref-counted instance of `T`, with this handle holding the first count.
    pub fn new_gd() -> Self {
        let raw = unsafe {
            let class_name = meta::class_name_cstr(T::CLASS_NAME);
            let object_ptr = sys::interface_fn!(object_construct)(class_name);
            RawHandle::from_object_ptr(object_ptr, Ownership::Owned)
        };

        let raw =
            raw.unwrap_or_else(|| panic!("failed to construct object of class {}", T::CLASS_NAME));
        T::Mem::maybe_init_ref(&raw);
        Self::from_raw(raw)
    }
}

/// Construction of and access to user classes.
impl<T: UserClass> Gd<T> {
    /// Creates an instance of `T`, constructing the user struct with `init_fn`.
    ///
    /// The closure receives the handle to the underlying base object, which can be stored in
    /// the struct for self-access later (see [`Base`]).
    pub fn from_init_fn<F>(init_fn: F) -> Self
    where
        F: FnOnce(Base<T::Base>) -> T,
    {
        let object_ptr = callbacks::create_custom::<T, F>(init_fn);

        // SAFETY: freshly constructed by the host; ownership transfers to this handle.
        let raw = unsafe { RawHandle::from_object_ptr(object_ptr, Ownership::Owned) }
            .unwrap_or_else(|| panic!("failed to construct object of class {}", T::CLASS_NAME));

        T::Mem::maybe_init_ref(&raw);
        Self::from_raw(raw)
    }

    /// Creates an instance of `T` through its [`init`][UserClass::init] constructor.
    pub fn new_user() -> Self {
        Self::from_init_fn(T::init)
    }

    /// Hands out a shared reference to the user instance.
    ///
    /// # Panics
    /// If the object is dead, or an accessible mutable binding exists.
    pub fn bind(&self) -> RefGuard<'_, T> {
        self.storage().get()
    }

    /// Hands out an exclusive reference to the user instance.
    ///
    /// # Panics
    /// If the object is dead, or any other binding exists.
    pub fn bind_mut(&mut self) -> MutGuard<'_, T> {
        self.storage().get_mut()
    }

    fn storage(&self) -> &InstanceStorage<T> {
        let object_ptr = self.raw.object_ptr().unwrap_or_else(|err| {
            panic!("cannot access destroyed object of class {}: {err}", T::CLASS_NAME)
        });

        // SAFETY: live object of a registered user class, so the attached instance pointer
        // was produced by `InstanceStorage::<T>::into_raw()`. The returned reference is bound
        // to `&self`, and the storage outlives the object.
        unsafe {
            let instance_ptr = sys::interface_fn!(object_get_instance)(object_ptr);
            assert!(
                !instance_ptr.is_null(),
                "object of class {} has no attached instance",
                T::CLASS_NAME
            );
            as_storage::<T>(instance_ptr)
        }
    }
}

impl<T: GodotClass> Clone for Gd<T> {
    fn clone(&self) -> Self {
        out!("Gd::clone  <{}>", T::CLASS_NAME);

        let ownership = self
            .raw
            .ownership()
            .unwrap_or_else(|err| panic!("clone failed for class {}: {err}", T::CLASS_NAME));

        // Owned clones own too (and take their own count); Borrowed/BoundTo tags carry over.
        let raw = self
            .raw
            .duplicate(ownership)
            .unwrap_or_else(|err| panic!("clone failed for class {}: {err}", T::CLASS_NAME));

        if matches!(ownership, Ownership::Owned) {
            T::Mem::maybe_inc_ref(&raw);
        }

        Self::from_raw(raw)
    }
}

impl<T: GodotClass> Drop for Gd<T> {
    fn drop(&mut self) {
        out!("Gd::drop   <{}>", T::CLASS_NAME);

        let Ok(ownership) = self.raw.ownership() else {
            // Entry already swept by free()/destruction; nothing left to release.
            return;
        };

        if !matches!(ownership, Ownership::Owned) {
            let _ = self.raw.release();
            return;
        }

        // SAFETY: the count held by this handle is given up exactly once, here.
        let is_last = unsafe { T::Mem::maybe_dec_ref(&self.raw) };

        if is_last {
            if let (Ok(instance_id), Ok(object_ptr)) =
                (self.raw.instance_id(), self.raw.object_ptr())
            {
                // SAFETY: last count dropped, no user bindings can exist anymore.
                unsafe { sys::interface_fn!(object_destroy)(object_ptr) };
                handle_table::invalidate_object(instance_id);
            }
        } else {
            let _ = self.raw.release();
        }
    }
}

impl<T: GodotClass> fmt::Debug for Gd<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.instance_id_or_none() {
            Some(id) => write!(f, "Gd<{}> {{ id: {id} }}", T::CLASS_NAME),
            None => write!(f, "Gd<{}> {{ dead }}", T::CLASS_NAME),
        }
    }
}

impl<T: GodotClass> PartialEq for Gd<T> {
    /// Two handles are equal if they point to the same live object.
    fn eq(&self, other: &Self) -> bool {
        match (self.instance_id_or_none(), other.instance_id_or_none()) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        }
    }
}
