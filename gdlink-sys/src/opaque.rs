/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::interface::{ConstTypePtr, TypePtr};

/// Fixed-size opaque storage with very restricted operations.
///
/// Holds `N` bytes that the host reads and writes through type pointers; the library never
/// interprets them itself. Due to `align(4)` / `align(8)` and not `packed` repr, this type may
/// be bigger than `N` bytes, which is fine as long as the host can read/write those `N` bytes
/// reliably.
#[cfg_attr(target_pointer_width = "32", repr(C, align(4)))]
#[cfg_attr(target_pointer_width = "64", repr(C, align(8)))]
#[derive(Copy, Clone)]
pub struct Opaque<const N: usize> {
    storage: [u8; N],
    marker: std::marker::PhantomData<*const u8>, // disable Send/Sync
}

impl<const N: usize> Opaque<N> {
    pub const fn zeroed() -> Self {
        Self {
            storage: [0u8; N],
            marker: std::marker::PhantomData,
        }
    }

    /// Pointer to the storage, in the host's _type ptr_ convention.
    pub fn type_ptr(&mut self) -> TypePtr {
        std::ptr::addr_of_mut!(self.storage) as TypePtr
    }

    pub fn const_type_ptr(&self) -> ConstTypePtr {
        std::ptr::addr_of!(self.storage) as ConstTypePtr
    }
}
