/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! # gdlink
//!
//! Rust bindings for host-managed game objects, connected through a C function-table ABI.
//!
//! Objects living on the host side are accessed through [`Gd<T>`][obj::Gd] smart pointers
//! backed by a generation-checked handle table: a handle outliving its object fails loudly on
//! access instead of dereferencing freed memory. User classes declared in Rust are registered
//! with the host's ClassDB and receive lifecycle and virtual-method callbacks.
//!
//! This crate is the facade; the heavy lifting happens in `gdlink-core` (object model) and
//! `gdlink-sys` (ABI layer).

/// Built-in value types marshaled by value.
pub mod builtin {
    pub use gdlink_core::builtin::*;
}

/// Wrappers for host-provided classes.
pub mod classes {
    pub use gdlink_core::classes::*;
}

/// Extension entry point and init levels.
pub mod init {
    pub use gdlink_core::init::*;
}

/// Object handles, class traits and bounds.
pub mod obj {
    pub use gdlink_core::obj::*;
}

/// Class registration, callbacks and the handle table's public surface.
pub mod registry {
    pub use gdlink_core::registry::callbacks::{virtual_entry, VirtualMethod};
    pub use gdlink_core::registry::{
        is_class_registered, register_class, HandleError, ObjectHandle, Ownership,
    };
}

/// Meta-information about classes and calls.
pub mod meta {
    pub use gdlink_core::meta::*;
}

/// Instance storage of user classes, including the re-entrancy escape hatch.
pub mod storage {
    pub use gdlink_core::storage::{storage_for, InstanceStorage};
}

pub use gdlink_core::{godot_error, godot_print, godot_warn};

#[doc(hidden)]
pub use gdlink_core::sys;

/// Often-imported symbols, in one place.
pub mod prelude {
    pub use super::builtin::{Vector2, Vector3};
    pub use super::classes::{Node, Node2D, Object, RefCounted};
    pub use super::init::{ExtensionLibrary, InitLevel};
    pub use super::obj::{Base, Gd, GodotClass, Inherits, UserClass};
    pub use super::registry::{register_class, virtual_entry, VirtualMethod};
    pub use super::{godot_error, godot_print, godot_warn};
}
