/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Callbacks that are passed as function pointers to the host upon class registration.
//!
//! Re-exported to `crate::registry` in the future; for now, also used in `Gd::from_init_fn()`.

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};

use crate::meta::{self, CallContext, ParamTuple};
use crate::obj::{Base, GodotClass, UserClass};
use crate::storage::{as_storage, destroy_storage, InstanceStorage};
use crate::sys::FrameFfi;
use crate::{out, sys};

/// `create_instance` callback: the host asks for a new instance of a registered class.
pub unsafe extern "C" fn create<T: UserClass>(_class_userdata: *mut c_void) -> sys::ObjectPtr {
    create_custom::<T, _>(T::init)
}

/// Constructs a base object, runs `make_user_instance` and attaches the resulting storage.
///
/// Returns the host pointer of the base object; ownership of the fresh instance lies with the
/// caller (the host for `create`, `Gd::from_init_fn()` on the library side).
pub(crate) fn create_custom<T, F>(make_user_instance: F) -> sys::ObjectPtr
where
    T: UserClass,
    F: FnOnce(Base<T::Base>) -> T,
{
    out!("  Callbacks::create_custom  <{}>", T::CLASS_NAME);

    let base_class_name = meta::class_name_cstr(T::Base::CLASS_NAME);

    // SAFETY: the interface is initialized before any class can be registered or instantiated.
    unsafe {
        let base_ptr = sys::interface_fn!(object_construct)(base_class_name);
        assert!(
            !base_ptr.is_null(),
            "failed to construct base object of class {}",
            T::Base::CLASS_NAME
        );

        // Two independent non-owning entries: one handed to the user's constructor, one kept
        // in the storage. Both are swept when the object dies.
        let base_for_init = Base::from_object_ptr(base_ptr);
        let base_for_storage = Base::from_object_ptr(base_ptr);

        let user_instance = make_user_instance(base_for_init);
        let instance_ptr = InstanceStorage::<T>::construct(user_instance, base_for_storage).into_raw();

        sys::interface_fn!(object_set_instance)(
            base_ptr,
            meta::class_name_cstr(T::CLASS_NAME),
            instance_ptr,
        );

        base_ptr
    }
}

/// `free_instance` callback: the host destroys an instance of a registered class.
pub unsafe extern "C" fn free<T: UserClass>(
    _class_userdata: *mut c_void,
    instance: sys::InstancePtr,
) {
    out!("  Callbacks::free  <{}>", T::CLASS_NAME);
    destroy_storage::<T>(instance);
}

/// `reference` callback: the host's ref-count for the object went up.
pub unsafe extern "C" fn reference<T: UserClass>(instance: sys::InstancePtr) {
    as_storage::<T>(instance).on_inc_ref();
}

/// `unreference` callback: the host's ref-count for the object went down.
pub unsafe extern "C" fn unreference<T: UserClass>(instance: sys::InstancePtr) {
    as_storage::<T>(instance).on_dec_ref();
}

/// `get_virtual` callback: resolves an overridden virtual method by name.
pub unsafe extern "C" fn get_virtual<T: UserClass>(
    _class_userdata: *mut c_void,
    name: *const c_char,
) -> Option<sys::VirtualCallFn> {
    if name.is_null() {
        return None;
    }

    let name = CStr::from_ptr(name).to_str().ok()?;
    T::virtual_dispatch(name)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Virtual dispatch

/// One overridden virtual method of `T`, linking its parameter/return signature to the Rust
/// implementation.
///
/// Implemented on zero-sized marker types; each marker monomorphizes [`virtual_entry`] into a
/// dedicated `extern "C"` trampoline that [`UserClass::virtual_dispatch`] hands to the host.
pub trait VirtualMethod<T: UserClass> {
    type Params: ParamTuple;
    type Ret: sys::FrameFfi;

    /// Diagnostic location reported if dispatch of this method panics.
    const CONTEXT: CallContext;

    fn invoke(instance: &mut T, params: Self::Params) -> Self::Ret;
}

/// Trampoline the host jumps into when dispatching an overridden virtual method.
///
/// Decodes the argument array, binds the instance mutably for the duration of the call, and
/// moves the result into the return slot.
///
/// # Safety
/// `instance` must be the storage pointer of a live `T` instance, and `args`/`ret` must match
/// `M`'s signature in the host's virtual-call encoding.
pub unsafe extern "C" fn virtual_entry<T, M>(
    instance: sys::InstancePtr,
    args: *const sys::ConstTypePtr,
    ret: sys::TypePtr,
) where
    T: UserClass,
    M: VirtualMethod<T>,
{
    out!("  Callbacks::virtual_entry  <{}>", M::CONTEXT);

    let storage = as_storage::<T>(instance);
    let params = M::Params::from_arg_ptrs(args, sys::PtrcallType::Virtual);

    let mut guard = storage.get_mut();
    let result = M::invoke(&mut guard, params);
    drop(guard);

    result.move_return_ptr(ret, sys::PtrcallType::Virtual);
}
