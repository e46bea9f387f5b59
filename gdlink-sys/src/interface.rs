/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The host ABI: pointer type aliases, the function-pointer table handed over at init time,
//! and the class-callback block registered into the host's ClassDB.

use std::os::raw::{c_char, c_void};

use crate::CallError;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Pointer aliases

/// Opaque pointer to a host-owned object. Never dereferenced on this side of the boundary.
pub type ObjectPtr = *mut c_void;

/// Opaque pointer to the library-side instance stored inside a host object.
pub type InstancePtr = *mut c_void;

/// Resolved function pointer for a specific class method; looked up once and cached.
pub type MethodBindPtr = *mut c_void;

/// Token identifying this extension library towards the host.
pub type ClassLibraryPtr = *mut c_void;

/// Pointer to a single value slot in a call frame (mutable side).
pub type TypePtr = *mut c_void;

/// Pointer to a single value slot in a call frame (const side).
pub type ConstTypePtr = *const c_void;

/// Entry point the host invokes to dispatch an overridden virtual method.
///
/// `args` points to an array of per-argument slot pointers, `ret` to the return slot.
pub type VirtualCallFn =
    unsafe extern "C" fn(instance: InstancePtr, args: *const ConstTypePtr, ret: TypePtr);

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Host interface

/// Function-pointer table provided by the host at process start.
///
/// This is the only channel through which the library reaches the native engine. All entries
/// are `Option` so a partially-filled table fails loudly instead of jumping to garbage; use
/// [`interface_fn!`][crate::interface_fn] after initialization for unchecked access.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct HostInterface {
    /// Nul-terminated version string, for the init handshake log.
    pub version_string: *const c_char,

    pub object_construct: Option<unsafe extern "C" fn(class_name: *const c_char) -> ObjectPtr>,
    pub object_destroy: Option<unsafe extern "C" fn(object: ObjectPtr)>,
    pub object_get_instance_id: Option<unsafe extern "C" fn(object: ObjectPtr) -> u64>,
    pub object_from_instance_id: Option<unsafe extern "C" fn(id: u64) -> ObjectPtr>,

    /// Attaches a library-side instance to a host object of a registered class.
    pub object_set_instance: Option<
        unsafe extern "C" fn(object: ObjectPtr, class_name: *const c_char, instance: InstancePtr),
    >,
    pub object_get_instance: Option<unsafe extern "C" fn(object: ObjectPtr) -> InstancePtr>,

    pub method_bind_get: Option<
        unsafe extern "C" fn(class_name: *const c_char, method_name: *const c_char) -> MethodBindPtr,
    >,
    /// Writes the call status into `err`; on anything but [`CALL_OK`][crate::CALL_OK] the
    /// return slot is left untouched.
    pub method_bind_ptrcall: Option<
        unsafe extern "C" fn(
            bind: MethodBindPtr,
            object: ObjectPtr,
            args: *const ConstTypePtr,
            ret: TypePtr,
            err: *mut CallError,
        ),
    >,

    pub classdb_register_class: Option<
        unsafe extern "C" fn(
            library: ClassLibraryPtr,
            class_name: *const c_char,
            parent_class_name: *const c_char,
            info: *const ClassCreationInfo,
        ),
    >,

    pub print: Option<unsafe extern "C" fn(message: *const c_char)>,
    pub print_warning: Option<
        unsafe extern "C" fn(
            description: *const c_char,
            function: *const c_char,
            file: *const c_char,
            line: i32,
        ),
    >,
    pub print_error: Option<
        unsafe extern "C" fn(
            description: *const c_char,
            function: *const c_char,
            file: *const c_char,
            line: i32,
        ),
    >,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Class callbacks

/// Callbacks the host invokes on a class registered through `classdb_register_class`.
///
/// `create_instance`/`free_instance` bracket the lifetime of the library-side instance;
/// `reference`/`unreference` mirror the host's refcount for ref-counted classes;
/// `get_virtual` resolves an overridden virtual method by name, or null if not overridden.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ClassCreationInfo {
    pub class_userdata: *mut c_void,

    pub create_instance:
        Option<unsafe extern "C" fn(class_userdata: *mut c_void) -> ObjectPtr>,
    pub free_instance:
        Option<unsafe extern "C" fn(class_userdata: *mut c_void, instance: InstancePtr)>,
    pub reference: Option<unsafe extern "C" fn(instance: InstancePtr)>,
    pub unreference: Option<unsafe extern "C" fn(instance: InstancePtr)>,
    pub get_virtual: Option<
        unsafe extern "C" fn(
            class_userdata: *mut c_void,
            name: *const c_char,
        ) -> Option<VirtualCallFn>,
    >,
}
