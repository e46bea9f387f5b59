/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;
use std::ffi::CString;
use std::os::raw::c_char;
use std::sync::{Mutex, OnceLock};

use crate::interface::MethodBindPtr;

/// Caches nul-terminated name strings handed to the host.
///
/// The host may hold on to name pointers past the call (e.g. for registered class names), so
/// entries are never evicted; only the cache's owner decides when they die.
pub struct StringCache {
    // CString stores its buffer on the heap, so pointers stay valid when the map rehashes.
    instances_by_str: HashMap<&'static str, CString>,
}

impl StringCache {
    pub fn new() -> Self {
        Self {
            instances_by_str: HashMap::new(),
        }
    }

    /// Get a stable `*const c_char` for `key`. Reuses cached instances.
    ///
    /// # Panics
    /// If `key` contains an interior nul byte or non-ASCII characters.
    pub fn fetch(&mut self, key: &'static str) -> *const c_char {
        assert!(key.is_ascii(), "string is not ASCII: {key}");

        self.instances_by_str
            .entry(key)
            .or_insert_with(|| CString::new(key).expect("string contains nul byte"))
            .as_ptr()
    }
}

impl Default for StringCache {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Method binds

/// A resolved function pointer for a specific class method.
///
/// Looked up once by class/method name and cached for the lifetime of the process.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct MethodBind(pub MethodBindPtr);

// SAFETY: an opaque token minted by the host; never dereferenced on this side, only passed
// back through `method_bind_ptrcall`.
unsafe impl Send for MethodBind {}
unsafe impl Sync for MethodBind {}

struct MethodBindCache {
    binds: HashMap<(&'static str, &'static str), MethodBind>,
    names: StringCache,
}

static METHOD_BINDS: OnceLock<Mutex<MethodBindCache>> = OnceLock::new();

/// Resolves the method bind for `class::method`, memoizing the result.
///
/// # Panics
/// If the host does not know the method. Callers are generated/glue code whose method names
/// are fixed at compile time, so a missing bind is an API mismatch, not a recoverable error.
pub fn class_method_bind(class: &'static str, method: &'static str) -> MethodBind {
    let cache = METHOD_BINDS.get_or_init(|| {
        Mutex::new(MethodBindCache {
            binds: HashMap::new(),
            names: StringCache::new(),
        })
    });

    let mut cache = cache.lock().expect("method-bind cache poisoned");

    if let Some(bind) = cache.binds.get(&(class, method)) {
        return *bind;
    }

    let class_ptr = cache.names.fetch(class);
    let method_ptr = cache.names.fetch(method);

    // SAFETY: both name pointers are valid nul-terminated strings; the interface has been
    // initialized before any glue code runs.
    let raw = unsafe { crate::interface_fn!(method_bind_get)(class_ptr, method_ptr) };
    assert!(!raw.is_null(), "method bind not found: {class}::{method}");

    let bind = MethodBind(raw);
    cache.binds.insert((class, method), bind);
    bind
}
