/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::builtin::Vector2;
use crate::classes::Object;
use crate::obj::bounds::{DeclEngine, MemManual};
use crate::obj::{Gd, GodotClass, Inherits};
use crate::sys;

/// Base class for scene-tree elements. Manually managed.
pub struct Node {
    _no_construct: (),
}

impl GodotClass for Node {
    type Base = Object;
    type Declarer = DeclEngine;
    type Mem = MemManual;
    const CLASS_NAME: &'static str = "Node";
}

impl Inherits<Object> for Node {}

impl Gd<Node> {
    pub fn get_child_count(&self) -> i64 {
        let mut frame = sys::CallFrame::<0>::new();
        // SAFETY: signatures below mirror the host's method declarations.
        unsafe { self.engine_ptrcall("get_child_count", &mut frame) }
    }

    pub fn set_process_priority(&mut self, priority: i64) {
        let mut frame = sys::CallFrame::<1>::new();
        frame.arg(0, priority);
        unsafe { self.engine_ptrcall::<1, ()>("set_process_priority", &mut frame) }
    }

    pub fn get_process_priority(&self) -> i64 {
        let mut frame = sys::CallFrame::<0>::new();
        unsafe { self.engine_ptrcall("get_process_priority", &mut frame) }
    }

    pub fn is_inside_tree(&self) -> bool {
        let mut frame = sys::CallFrame::<0>::new();
        unsafe { self.engine_ptrcall("is_inside_tree", &mut frame) }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// 2D scene-tree element with a transform.
pub struct Node2D {
    _no_construct: (),
}

impl GodotClass for Node2D {
    type Base = Node;
    type Declarer = DeclEngine;
    type Mem = MemManual;
    const CLASS_NAME: &'static str = "Node2D";
}

impl Inherits<Node> for Node2D {}
impl Inherits<Object> for Node2D {}

impl Gd<Node2D> {
    pub fn set_position(&mut self, position: Vector2) {
        let mut frame = sys::CallFrame::<1>::new();
        frame.arg(0, position);
        // SAFETY: signatures mirror the host's method declarations.
        unsafe { self.engine_ptrcall::<1, ()>("set_position", &mut frame) }
    }

    pub fn get_position(&self) -> Vector2 {
        let mut frame = sys::CallFrame::<0>::new();
        unsafe { self.engine_ptrcall("get_position", &mut frame) }
    }
}
