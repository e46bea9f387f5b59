/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::obj::InstanceId;
use crate::registry::handle_table::{self, HandleError, ObjectHandle, Ownership};
use crate::sys;

/// Untyped, validated reference to a host object.
///
/// Wraps an [`ObjectHandle`] into the process-wide handle table; the raw host pointer is
/// re-fetched (and thereby validated) from the table on **every** access, so use after free
/// surfaces as a [`HandleError`] instead of undefined behavior.
///
/// Not `Clone`: copies must go through [`duplicate()`](Self::duplicate) so each carries its own
/// table entry and ownership tag.
#[derive(Debug)]
pub struct RawHandle {
    handle: ObjectHandle,
}

impl RawHandle {
    pub(crate) fn from_handle(handle: ObjectHandle) -> Self {
        Self { handle }
    }

    /// Registers a table entry for the object behind `object_ptr`.
    ///
    /// Returns `None` for null pointers or objects without an instance ID.
    ///
    /// # Safety
    /// `object_ptr` must be null or a live pointer obtained from the host.
    pub(crate) unsafe fn from_object_ptr(
        object_ptr: sys::ObjectPtr,
        ownership: Ownership,
    ) -> Option<Self> {
        if object_ptr.is_null() {
            return None;
        }

        let raw_id = sys::interface_fn!(object_get_instance_id)(object_ptr);
        let instance_id = InstanceId::try_from_u64(raw_id)?;

        Some(Self {
            handle: handle_table::insert(object_ptr, instance_id, ownership),
        })
    }

    pub(crate) fn handle(&self) -> ObjectHandle {
        self.handle
    }

    /// Host pointer behind this handle, re-validated against the table and confirmed with the
    /// host.
    ///
    /// Confirmation matters for manual objects: the host can destroy those on its own, without
    /// any callback reaching this library, and the table alone cannot observe that.
    pub(crate) fn object_ptr(&self) -> Result<sys::ObjectPtr, HandleError> {
        let (object_ptr, instance_id) =
            handle_table::access(self.handle, |entry| (entry.object_ptr, entry.instance_id))?;
        self.confirm_live(instance_id)?;

        Ok(object_ptr)
    }

    pub fn instance_id(&self) -> Result<InstanceId, HandleError> {
        let instance_id = self.cached_instance_id()?;
        self.confirm_live(instance_id)?;

        Ok(instance_id)
    }

    /// Instance ID as recorded in the table, without consulting the host. Used while the host
    /// is mid-destruction and can no longer resolve the ID.
    pub(crate) fn cached_instance_id(&self) -> Result<InstanceId, HandleError> {
        handle_table::access(self.handle, |entry| entry.instance_id)
    }

    pub fn ownership(&self) -> Result<Ownership, HandleError> {
        handle_table::access(self.handle, |entry| entry.ownership)
    }

    pub fn is_live(&self) -> bool {
        self.instance_id().is_ok()
    }

    /// Round-trips `instance_id` through the host. If the host no longer resolves it, the
    /// object is gone; the table is swept so every other handle to it turns stale as well.
    fn confirm_live(&self, instance_id: InstanceId) -> Result<(), HandleError> {
        // SAFETY: the interface is initialized before any handle can exist.
        let resolved = unsafe { sys::interface_fn!(object_from_instance_id)(instance_id.to_u64()) };

        if resolved.is_null() {
            handle_table::invalidate_object(instance_id);
            return Err(HandleError::HostFreed {
                handle: self.handle,
                instance_id,
            });
        }

        Ok(())
    }

    /// Mints an independent handle to the same object, with its own ownership tag.
    pub(crate) fn duplicate(&self, ownership: Ownership) -> Result<Self, HandleError> {
        handle_table::duplicate(self.handle, ownership).map(Self::from_handle)
    }

    /// Gives up this handle's table entry. The object itself is not touched.
    pub(crate) fn release(&self) -> Result<(), HandleError> {
        handle_table::release(self.handle).map(|_entry| ())
    }

    /// Performs an outbound pointer call of `class::method` on this object.
    ///
    /// The handle is validated first; the method bind is resolved through the process-wide
    /// cache.
    ///
    /// # Safety
    /// `frame`'s argument slots must be encoded for the method's signature, and `R` must match
    /// its return type.
    pub(crate) unsafe fn ptrcall<const N: usize, R: sys::FrameFfi>(
        &self,
        class: &'static str,
        method: &'static str,
        frame: &mut sys::CallFrame<N>,
    ) -> Result<R, HandleError> {
        let object_ptr = self.object_ptr()?;
        let bind = sys::class_method_bind(class, method);

        let mut err = sys::default_call_error();
        let args = frame.arg_ptrs();
        sys::interface_fn!(method_bind_ptrcall)(
            bind.0,
            object_ptr,
            args.as_ptr(),
            frame.ret_ptr(),
            &mut err,
        );

        if err.error != sys::CALL_OK {
            sys::panic_call_error(&err, &format!("{class}::{method}"), frame.arg_kinds());
        }

        Ok(frame.ret::<R>())
    }
}
