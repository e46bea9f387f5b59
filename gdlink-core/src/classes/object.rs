/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::obj::bounds::{DeclEngine, MemDynamic};
use crate::obj::{Gd, GodotClass};
use crate::sys;

/// Root of the host's class hierarchy.
///
/// `Gd<Object>` can point to an instance of any class, so its memory strategy is determined
/// at runtime from the instance ID.
pub struct Object {
    // Host-side state only; never constructed on this side.
    _no_construct: (),
}

impl GodotClass for Object {
    type Base = ();
    type Declarer = DeclEngine;
    type Mem = MemDynamic;
    const CLASS_NAME: &'static str = "Object";
}

impl Gd<Object> {
    /// Queries the instance ID through the host, as opposed to
    /// [`instance_id()`][Gd::instance_id] which reads it from the handle table.
    pub fn get_instance_id(&self) -> i64 {
        let mut frame = sys::CallFrame::<0>::new();
        // SAFETY: nullary method returning an integer.
        unsafe { self.engine_ptrcall("get_instance_id", &mut frame) }
    }
}
