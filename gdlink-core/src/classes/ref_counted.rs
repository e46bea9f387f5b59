/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::classes::Object;
use crate::obj::bounds::{DeclEngine, MemRefCounted};
use crate::obj::{Gd, GodotClass, Inherits, RawHandle};
use crate::registry::HandleError;
use crate::sys;

/// Base class for all objects whose lifetime is managed by the host's reference counter.
pub struct RefCounted {
    _no_construct: (),
}

impl GodotClass for RefCounted {
    type Base = Object;
    type Declarer = DeclEngine;
    type Mem = MemRefCounted;
    const CLASS_NAME: &'static str = "RefCounted";
}

impl Inherits<Object> for RefCounted {}

impl Gd<RefCounted> {
    pub fn get_reference_count(&self) -> i64 {
        let mut frame = sys::CallFrame::<0>::new();
        // SAFETY: nullary method returning an integer.
        unsafe { self.engine_ptrcall("get_reference_count", &mut frame) }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Untyped ref-count plumbing, for the memory-strategy impls in `obj::bounds`.
//
// These operate on raw handles because the dynamic strategy applies them to handles of any
// static type (e.g. `Gd<Object>` pointing at a ref-counted instance).

pub(crate) fn init_ref(raw: &RawHandle) -> Result<bool, HandleError> {
    nullary_bool(raw, "init_ref")
}

pub(crate) fn reference(raw: &RawHandle) -> Result<bool, HandleError> {
    nullary_bool(raw, "reference")
}

/// Returns `true` if the count hit zero and the object should be destroyed.
pub(crate) fn unreference(raw: &RawHandle) -> Result<bool, HandleError> {
    nullary_bool(raw, "unreference")
}

fn nullary_bool(raw: &RawHandle, method: &'static str) -> Result<bool, HandleError> {
    let mut frame = sys::CallFrame::<0>::new();
    // SAFETY: nullary methods returning a boolean.
    unsafe { raw.ptrcall(RefCounted::CLASS_NAME, method, &mut frame) }
}
