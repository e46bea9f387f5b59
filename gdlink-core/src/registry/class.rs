/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashSet;
use std::ptr;
use std::sync::Mutex;

use crate::meta;
use crate::obj::{GodotClass, UserClass};
use crate::registry::callbacks;
use crate::{godot_warn, out, sys};

static REGISTERED_CLASSES: Mutex<Option<HashSet<&'static str>>> = Mutex::new(None);

/// Registers the user class `T` with the host's ClassDB.
///
/// Afterwards the host can instantiate `T` by name, will call the class callbacks for its
/// lifecycle, and dispatches overridden virtual methods through
/// [`UserClass::virtual_dispatch`].
///
/// Registering the same class name twice is ignored with a warning.
pub fn register_class<T: UserClass>() {
    let mut guard = REGISTERED_CLASSES
        .lock()
        .expect("class registry poisoned");
    let registered = guard.get_or_insert_with(HashSet::new);

    if !registered.insert(T::CLASS_NAME) {
        godot_warn!("class {} already registered; skipping", (T::CLASS_NAME));
        return;
    }
    drop(guard);

    out!("Registry::register_class  <{}>", T::CLASS_NAME);

    let info = sys::ClassCreationInfo {
        class_userdata: ptr::null_mut(),
        create_instance: Some(callbacks::create::<T>),
        free_instance: Some(callbacks::free::<T>),
        reference: Some(callbacks::reference::<T>),
        unreference: Some(callbacks::unreference::<T>),
        get_virtual: Some(callbacks::get_virtual::<T>),
    };

    // SAFETY: name pointers are cached for the process lifetime; `info` is copied by the host
    // during the call.
    unsafe {
        sys::interface_fn!(classdb_register_class)(
            sys::get_library(),
            meta::class_name_cstr(T::CLASS_NAME),
            meta::class_name_cstr(T::Base::CLASS_NAME),
            &info,
        );
    }
}

/// Whether a class of this name has been registered by this library.
pub fn is_class_registered(name: &str) -> bool {
    REGISTERED_CLASSES
        .lock()
        .expect("class registry poisoned")
        .as_ref()
        .is_some_and(|set| set.contains(name))
}
