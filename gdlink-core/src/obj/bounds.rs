/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Different ways how bounds of a `GodotClass` can be checked.
//!
//! Two axes are expressed as sealed traits:
//!
//! 1. [`Declarer`] tells you whether the class is provided by the engine or user-defined.
//!    - [`DeclEngine`] is used for all classes provided by the engine (e.g. `Node`).
//!    - [`DeclUser`] is used for all classes declared on the library side.
//!
//! 2. [`DynMemory`] is used to check the memory strategy of the **dynamic** type.
//!    - [`MemRefCounted`] is used for `RefCounted` classes and derived. These are **always**
//!      reference-counted.
//!    - [`MemManual`] is used for instances inheriting `Object` which are not `RefCounted`
//!      (e.g. `Node`). These are **always** manually managed.
//!    - [`MemDynamic`] is used for `Object` itself. A handle typed `Object` can point to an
//!      instance of any class, so the strategy is read from the instance ID at runtime.

use crate::classes::ref_counted;
use crate::obj::RawHandle;
use crate::out;
use private::Sealed;

pub(super) mod private {
    pub trait Sealed {}
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Memory bounds

/// Specifies the memory strategy of the dynamic type.
pub trait DynMemory: Sealed {
    /// Initialize reference counter.
    #[doc(hidden)]
    fn maybe_init_ref(raw: &RawHandle);

    /// If ref-counted, then increment count.
    #[doc(hidden)]
    fn maybe_inc_ref(raw: &RawHandle);

    /// If ref-counted, then decrement count. Returns `true` if the count hit 0 and the object
    /// can be safely freed.
    ///
    /// # Safety
    /// If the object is ref-counted, the count must either be incremented again before it hits
    /// 0, or all remaining handles to the object must no longer be used.
    #[doc(hidden)]
    unsafe fn maybe_dec_ref(raw: &RawHandle) -> bool;

    /// Check if ref-counted, return `None` if the information is not available (dynamic
    /// strategy and the handle is dead).
    #[doc(hidden)]
    fn is_ref_counted(raw: &RawHandle) -> Option<bool>;
}

/// Memory managed through the host's reference counter (always present).
/// This is used for `RefCounted` classes and derived.
pub struct MemRefCounted {}
impl Sealed for MemRefCounted {}
impl DynMemory for MemRefCounted {
    fn maybe_init_ref(raw: &RawHandle) {
        out!("  Stat::init  <{raw:?}>");
        if let Ok(success) = ref_counted::init_ref(raw) {
            assert!(success, "init_ref() failed");
        }
    }

    fn maybe_inc_ref(raw: &RawHandle) {
        out!("  Stat::inc   <{raw:?}>");
        if let Ok(success) = ref_counted::reference(raw) {
            assert!(success, "reference() failed");
        }
    }

    unsafe fn maybe_dec_ref(raw: &RawHandle) -> bool {
        out!("  Stat::dec   <{raw:?}>");
        ref_counted::unreference(raw).unwrap_or(false)
    }

    fn is_ref_counted(_raw: &RawHandle) -> Option<bool> {
        Some(true)
    }
}

/// Memory managed through the host's reference counter, if present; otherwise manual.
/// This is used only for `Object` itself.
pub struct MemDynamic {}
impl Sealed for MemDynamic {}
impl DynMemory for MemDynamic {
    fn maybe_init_ref(raw: &RawHandle) {
        out!("  Dyn::init  <{raw:?}>");
        if dyn_is_ref_counted(raw) {
            MemRefCounted::maybe_init_ref(raw);
        }
    }

    fn maybe_inc_ref(raw: &RawHandle) {
        out!("  Dyn::inc   <{raw:?}>");
        if dyn_is_ref_counted(raw) {
            MemRefCounted::maybe_inc_ref(raw);
        }
    }

    unsafe fn maybe_dec_ref(raw: &RawHandle) -> bool {
        out!("  Dyn::dec   <{raw:?}>");
        if dyn_is_ref_counted(raw) {
            MemRefCounted::maybe_dec_ref(raw)
        } else {
            false
        }
    }

    fn is_ref_counted(raw: &RawHandle) -> Option<bool> {
        // `None` if the handle is dead.
        raw.instance_id().ok().map(|id| id.is_ref_counted())
    }
}

fn dyn_is_ref_counted(raw: &RawHandle) -> bool {
    raw.instance_id()
        .map(|id| id.is_ref_counted())
        .unwrap_or(false)
}

/// No memory management, user responsible for not leaking.
/// This is used for all `Object` derivates which are not `RefCounted` (e.g. `Node`).
pub struct MemManual {}
impl Sealed for MemManual {}
impl DynMemory for MemManual {
    fn maybe_init_ref(_raw: &RawHandle) {}
    fn maybe_inc_ref(_raw: &RawHandle) {}
    unsafe fn maybe_dec_ref(_raw: &RawHandle) -> bool {
        false
    }
    fn is_ref_counted(_raw: &RawHandle) -> Option<bool> {
        Some(false)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Declarer bounds

/// Trait that specifies who declares a given `GodotClass`.
pub trait Declarer: Sealed {}

/// Expresses that a class is declared by the engine.
pub enum DeclEngine {}
impl Sealed for DeclEngine {}
impl Declarer for DeclEngine {}

/// Expresses that a class is declared by the user.
pub enum DeclUser {}
impl Sealed for DeclUser {}
impl Declarer for DeclUser {}
