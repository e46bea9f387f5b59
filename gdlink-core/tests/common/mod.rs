/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! In-process stand-in for the native host, backing the integration tests.
//!
//! Implements the full [`HostInterface`] function table over a registry of fake objects, so
//! the object model can be exercised end to end (construction, ptrcalls, class registration,
//! virtual dispatch, destruction) without an engine process.

#![allow(dead_code)] // not every test binary uses every helper

use std::collections::HashMap;
use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::sync::{Mutex, Once, OnceLock};

use gdlink_core::sys;

const REF_COUNTED_BIT: u64 = 1 << 63;

struct HostObject {
    class: String,
    refcount: Option<u32>,
    /// Attached library-side instance: (instance pointer, registered class name).
    instance: Option<(usize, String)>,
    process_priority: i64,
    position: [f32; 2],
    children: Vec<u64>,
    in_tree: bool,
}

struct RegisteredClass {
    parent: String,
    info: sys::ClassCreationInfo,
}

struct HostState {
    objects: HashMap<u64, HostObject>,
    next_id: u64,
    class_bases: HashMap<&'static str, &'static str>,
    registered: HashMap<String, RegisteredClass>,
    printed: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
}

// SAFETY: the function pointers inside ClassCreationInfo are plain code addresses.
unsafe impl Send for HostState {}

impl HostState {
    fn new() -> Self {
        let class_bases = HashMap::from([
            ("Object", ""),
            ("RefCounted", "Object"),
            ("Node", "Object"),
            ("Node2D", "Node"),
        ]);

        Self {
            objects: HashMap::new(),
            next_id: 1,
            class_bases,
            registered: HashMap::new(),
            printed: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn is_ref_counted_class(&self, class: &str) -> bool {
        let mut current = class.to_string();
        loop {
            if current == "RefCounted" {
                return true;
            }
            let parent = self
                .class_bases
                .get(current.as_str())
                .map(|p| p.to_string())
                .or_else(|| self.registered.get(&current).map(|r| r.parent.clone()));

            match parent {
                Some(p) if !p.is_empty() => current = p,
                _ => return false,
            }
        }
    }
}

fn state() -> &'static Mutex<HostState> {
    static STATE: OnceLock<Mutex<HostState>> = OnceLock::new();
    STATE.get_or_init(|| Mutex::new(HostState::new()))
}

fn lock() -> std::sync::MutexGuard<'static, HostState> {
    state().lock().expect("host state poisoned")
}

unsafe fn cstr_arg(ptr: *const c_char) -> String {
    CStr::from_ptr(ptr).to_str().expect("non-UTF8 name").to_string()
}

fn ptr_to_id(object: sys::ObjectPtr) -> u64 {
    object as usize as u64
}

fn id_to_ptr(id: u64) -> sys::ObjectPtr {
    id as usize as sys::ObjectPtr
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface functions

unsafe extern "C" fn object_construct(class_name: *const c_char) -> sys::ObjectPtr {
    let class = cstr_arg(class_name);
    let mut st = lock();

    let ref_counted = st.is_ref_counted_class(&class);
    let mut id = st.next_id;
    st.next_id += 1;
    if ref_counted {
        id |= REF_COUNTED_BIT;
    }

    st.objects.insert(
        id,
        HostObject {
            class,
            refcount: ref_counted.then_some(0),
            instance: None,
            process_priority: 0,
            position: [0.0; 2],
            children: Vec::new(),
            in_tree: false,
        },
    );

    id_to_ptr(id)
}

unsafe extern "C" fn object_destroy(object: sys::ObjectPtr) {
    let id = ptr_to_id(object);

    let free_callback = {
        let mut st = lock();
        let removed = st.objects.remove(&id).expect("destroying unknown object");

        removed.instance.and_then(|(instance_ptr, class)| {
            let info = &st.registered.get(&class).expect("unregistered instance").info;
            info.free_instance
                .map(|callback| (callback, info.class_userdata, instance_ptr))
        })
    };

    // Invoked unlocked: the callback may report errors through the print functions.
    if let Some((callback, userdata, instance_ptr)) = free_callback {
        callback(userdata, instance_ptr as sys::InstancePtr);
    }
}

unsafe extern "C" fn object_get_instance_id(object: sys::ObjectPtr) -> u64 {
    let id = ptr_to_id(object);
    if lock().objects.contains_key(&id) {
        id
    } else {
        0
    }
}

unsafe extern "C" fn object_from_instance_id(id: u64) -> sys::ObjectPtr {
    if lock().objects.contains_key(&id) {
        id_to_ptr(id)
    } else {
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn object_set_instance(
    object: sys::ObjectPtr,
    class_name: *const c_char,
    instance: sys::InstancePtr,
) {
    let class = cstr_arg(class_name);
    let id = ptr_to_id(object);
    let mut st = lock();
    let object = st.objects.get_mut(&id).expect("unknown object");
    object.instance = Some((instance as usize, class));
}

unsafe extern "C" fn object_get_instance(object: sys::ObjectPtr) -> sys::InstancePtr {
    let id = ptr_to_id(object);
    let st = lock();
    st.objects
        .get(&id)
        .and_then(|o| o.instance.as_ref())
        .map(|(ptr, _)| *ptr as sys::InstancePtr)
        .unwrap_or(std::ptr::null_mut())
}

const KNOWN_METHODS: &[(&str, &str)] = &[
    ("Object", "get_instance_id"),
    ("RefCounted", "init_ref"),
    ("RefCounted", "reference"),
    ("RefCounted", "unreference"),
    ("RefCounted", "get_reference_count"),
    ("Node", "get_child_count"),
    ("Node", "set_process_priority"),
    ("Node", "get_process_priority"),
    ("Node", "is_inside_tree"),
    ("Node2D", "set_position"),
    ("Node2D", "get_position"),
];

unsafe extern "C" fn method_bind_get(
    class_name: *const c_char,
    method_name: *const c_char,
) -> sys::MethodBindPtr {
    let class = cstr_arg(class_name);
    let method = cstr_arg(method_name);

    match KNOWN_METHODS
        .iter()
        .position(|(c, m)| *c == class && *m == method)
    {
        Some(index) => (index + 1) as sys::MethodBindPtr,
        None => std::ptr::null_mut(),
    }
}

unsafe extern "C" fn method_bind_ptrcall(
    bind: sys::MethodBindPtr,
    object: sys::ObjectPtr,
    args: *const sys::ConstTypePtr,
    ret: sys::TypePtr,
    err: *mut sys::CallError,
) {
    let (_, method) = KNOWN_METHODS[(bind as usize) - 1];
    let id = ptr_to_id(object);

    std::ptr::write(err, sys::default_call_error());

    // Ref-count transitions may have to notify the attached instance; collected under the
    // lock, invoked after releasing it.
    let mut notify: Option<(unsafe extern "C" fn(sys::InstancePtr), usize)> = None;

    {
        let mut st = lock();

        if !st.objects.contains_key(&id) {
            std::ptr::write(
                err,
                sys::CallError {
                    error: sys::CALL_ERROR_INSTANCE_IS_NULL,
                    argument: -1,
                    expected: -1,
                },
            );
            return;
        }

        // Borrow dance: instance notification needs the registry, so look it up first.
        let instance_callback = |st: &HostState, id: u64, unref: bool| {
            let object = &st.objects[&id];
            let (instance_ptr, class) = object.instance.as_ref()?;
            let info = &st.registered.get(class)?.info;
            let callback = if unref { info.unreference } else { info.reference };
            callback.map(|cb| (cb, *instance_ptr))
        };

        match method {
            "get_instance_id" => std::ptr::write(ret as *mut i64, id as i64),
            "init_ref" | "reference" => {
                let rc_after = {
                    let object = st.objects.get_mut(&id).expect("ptrcall on unknown object");
                    let rc = object.refcount.as_mut().expect("not ref-counted");
                    *rc += 1;
                    *rc
                };
                if rc_after >= 2 {
                    notify = instance_callback(&*st, id, false);
                }
                std::ptr::write(ret as *mut bool, true);
            }
            "unreference" => {
                let rc_before = {
                    let object = st.objects.get_mut(&id).expect("ptrcall on unknown object");
                    *object.refcount.as_ref().expect("not ref-counted")
                };
                if rc_before >= 2 {
                    notify = instance_callback(&*st, id, true);
                }
                let object = st.objects.get_mut(&id).unwrap();
                let rc = object.refcount.as_mut().unwrap();
                *rc -= 1;
                std::ptr::write(ret as *mut bool, *rc == 0);
            }
            "get_reference_count" => {
                let rc = *st.objects[&id].refcount.as_ref().expect("not ref-counted");
                std::ptr::write(ret as *mut i64, rc as i64);
            }
            "get_child_count" => {
                std::ptr::write(ret as *mut i64, st.objects[&id].children.len() as i64);
            }
            "set_process_priority" => {
                let priority = std::ptr::read(*args as *const i64);
                st.objects.get_mut(&id).unwrap().process_priority = priority;
            }
            "get_process_priority" => {
                std::ptr::write(ret as *mut i64, st.objects[&id].process_priority);
            }
            "is_inside_tree" => {
                std::ptr::write(ret as *mut bool, st.objects[&id].in_tree);
            }
            "set_position" => {
                let position = std::ptr::read(*args as *const [f32; 2]);
                st.objects.get_mut(&id).unwrap().position = position;
            }
            "get_position" => {
                std::ptr::write(ret as *mut [f32; 2], st.objects[&id].position);
            }
            other => panic!("unexpected ptrcall: {other}"),
        }
    }

    if let Some((callback, instance_ptr)) = notify {
        callback(instance_ptr as sys::InstancePtr);
    }
}

unsafe extern "C" fn classdb_register_class(
    _library: sys::ClassLibraryPtr,
    class_name: *const c_char,
    parent_class_name: *const c_char,
    info: *const sys::ClassCreationInfo,
) {
    let class = cstr_arg(class_name);
    let parent = cstr_arg(parent_class_name);
    let info = *info;

    lock().registered.insert(class, RegisteredClass { parent, info });
}

unsafe extern "C" fn print(message: *const c_char) {
    lock().printed.push(cstr_arg(message));
}

unsafe extern "C" fn print_warning(
    description: *const c_char,
    _function: *const c_char,
    _file: *const c_char,
    _line: i32,
) {
    lock().warnings.push(cstr_arg(description));
}

unsafe extern "C" fn print_error(
    description: *const c_char,
    _function: *const c_char,
    _file: *const c_char,
    _line: i32,
) {
    lock().errors.push(cstr_arg(description));
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Test-facing API

/// Installs the stub host and binds the interface, once per test binary.
pub fn ensure_host() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let interface = Box::leak(Box::new(sys::HostInterface {
            version_string: b"StubHost 4.x\0".as_ptr() as *const c_char,
            object_construct: Some(object_construct),
            object_destroy: Some(object_destroy),
            object_get_instance_id: Some(object_get_instance_id),
            object_from_instance_id: Some(object_from_instance_id),
            object_set_instance: Some(object_set_instance),
            object_get_instance: Some(object_get_instance),
            method_bind_get: Some(method_bind_get),
            method_bind_ptrcall: Some(method_bind_ptrcall),
            classdb_register_class: Some(classdb_register_class),
            print: Some(print),
            print_warning: Some(print_warning),
            print_error: Some(print_error),
        }));

        // SAFETY: table fully populated, called once before any other host access.
        unsafe { sys::initialize(interface, 0x1 as sys::ClassLibraryPtr) };
    });
}

/// Simulates the host destroying an object on its own, without any library involvement.
pub fn host_destroy(raw_id: u64) {
    unsafe { object_destroy(id_to_ptr(raw_id)) };
}

/// Whether the host still tracks an object with this raw instance ID.
pub fn object_exists(raw_id: u64) -> bool {
    lock().objects.contains_key(&raw_id)
}

/// Host-side reference count of an object, `None` if not ref-counted or gone.
pub fn refcount_of(raw_id: u64) -> Option<u32> {
    lock().objects.get(&raw_id).and_then(|o| o.refcount)
}

/// Simulates the host instantiating a registered class (e.g. a scene load).
pub fn instantiate_registered(class: &str) -> sys::ObjectPtr {
    let (callback, userdata) = {
        let st = lock();
        let registered = st
            .registered
            .get(class)
            .unwrap_or_else(|| panic!("class not registered: {class}"));
        (
            registered.info.create_instance.expect("no create callback"),
            registered.info.class_userdata,
        )
    };

    // Unlocked: construction calls back into the host.
    unsafe { callback(userdata) }
}

/// Simulates the host dispatching a virtual method on an object of a registered class.
///
/// Returns `false` if the class does not override `method`.
///
/// # Safety
/// `args` and `ret` must match the method's signature in virtual-call encoding.
pub unsafe fn call_virtual(
    object: sys::ObjectPtr,
    method: &str,
    args: *const sys::ConstTypePtr,
    ret: sys::TypePtr,
) -> bool {
    let (get_virtual, userdata, instance_ptr) = {
        let st = lock();
        let host_object = st
            .objects
            .get(&ptr_to_id(object))
            .expect("virtual call on unknown object");
        let (instance_ptr, class) = host_object.instance.as_ref().expect("no attached instance");
        let info = &st.registered.get(class).expect("unregistered class").info;
        (
            info.get_virtual.expect("no get_virtual callback"),
            info.class_userdata,
            *instance_ptr,
        )
    };

    let method_name = std::ffi::CString::new(method).unwrap();
    let Some(entry) = get_virtual(userdata, method_name.as_ptr()) else {
        return false;
    };

    entry(instance_ptr as sys::InstancePtr, args, ret);
    true
}

/// Warnings reported through the host so far.
pub fn warnings() -> Vec<String> {
    lock().warnings.clone()
}

/// Errors reported through the host so far.
pub fn errors() -> Vec<String> {
    lock().errors.clone()
}
