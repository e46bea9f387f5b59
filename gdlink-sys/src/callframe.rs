/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Fixed-layout buffers for passing arguments to and receiving results from native calls.

use crate::ffi::{FrameFfi, ValueKind};
use crate::interface::{ConstTypePtr, TypePtr};
use crate::opaque::Opaque;

/// Size of a single value slot, in bytes.
///
/// Large enough for every by-value type marshaled through frames (the widest is a
/// double-precision 3-component vector). Types that don't fit go through handles.
pub const SLOT_SIZE: usize = 24;

type Slot = Opaque<SLOT_SIZE>;

/// A call frame with `N` argument slots and one return slot.
///
/// Outbound calls encode each argument with [`arg()`][Self::arg], pass
/// [`arg_ptrs()`][Self::arg_ptrs] and [`ret_ptr()`][Self::ret_ptr] to the host, then decode
/// the result with [`ret()`][Self::ret]. The frame lives on the caller's stack; slot pointers
/// must not outlive it.
pub struct CallFrame<const N: usize> {
    args: [Slot; N],
    kinds: [ValueKind; N],
    ret: Slot,
}

impl<const N: usize> CallFrame<N> {
    pub fn new() -> Self {
        Self {
            args: [Slot::zeroed(); N],
            kinds: [ValueKind::Nil; N],
            ret: Slot::zeroed(),
        }
    }

    /// Encode `value` into argument slot `index`.
    ///
    /// # Panics
    /// If `index` is out of bounds.
    pub fn arg<T: FrameFfi>(&mut self, index: usize, value: T) {
        const {
            assert!(
                std::mem::size_of::<T>() <= SLOT_SIZE,
                "value type exceeds frame slot size"
            );
        }

        self.kinds[index] = T::value_kind();

        // SAFETY: the slot is live, properly aligned and large enough (checked above).
        unsafe { value.write_frame(self.args[index].type_ptr()) }
    }

    /// Kinds of the encoded arguments, in slot order. Unset slots report `Nil`.
    pub fn arg_kinds(&self) -> &[ValueKind] {
        &self.kinds
    }

    /// Pointer array in the host's argument-passing convention.
    ///
    /// The returned pointers are valid until the frame is moved or dropped.
    pub fn arg_ptrs(&mut self) -> [ConstTypePtr; N] {
        std::array::from_fn(|i| self.args[i].const_type_ptr())
    }

    /// Pointer to the return slot, to be filled by the host.
    pub fn ret_ptr(&mut self) -> TypePtr {
        self.ret.type_ptr()
    }

    /// Decode the return slot after the host call completed.
    ///
    /// # Safety
    /// The host must have written a value of type `T` into the return slot.
    pub unsafe fn ret<T: FrameFfi>(&self) -> T {
        const {
            assert!(
                std::mem::size_of::<T>() <= SLOT_SIZE,
                "return type exceeds frame slot size"
            );
        }

        T::from_frame(self.ret.const_type_ptr())
    }
}

impl<const N: usize> Default for CallFrame<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip() {
        let mut frame = CallFrame::<3>::new();
        frame.arg(0, 42i64);
        frame.arg(1, true);
        frame.arg(2, -2.5f64);

        let ptrs = frame.arg_ptrs();
        unsafe {
            assert_eq!(i64::from_frame(ptrs[0]), 42);
            assert!(bool::from_frame(ptrs[1]));
            assert_eq!(f64::from_frame(ptrs[2]), -2.5);
        }

        assert_eq!(
            frame.arg_kinds(),
            &[ValueKind::Int, ValueKind::Bool, ValueKind::Float]
        );
    }

    #[test]
    fn ret_slot_round_trip() {
        let mut frame = CallFrame::<0>::new();

        // Simulate the host writing into the return slot.
        unsafe {
            7_000_000_000i64.write_frame(frame.ret_ptr());
            assert_eq!(frame.ret::<i64>(), 7_000_000_000);
        }
    }

    #[test]
    fn zeroed_slots_decode_as_defaults() {
        let frame = CallFrame::<0>::new();
        unsafe {
            assert_eq!(frame.ret::<i64>(), 0);
            assert_eq!(frame.ret::<f64>(), 0.0);
            assert!(!frame.ret::<bool>());
        }
    }

    #[test]
    fn overwriting_arg_replaces_value() {
        let mut frame = CallFrame::<1>::new();
        frame.arg(0, 1i64);
        frame.arg(0, 2i64);

        let ptrs = frame.arg_ptrs();
        unsafe {
            assert_eq!(i64::from_frame(ptrs[0]), 2);
        }
    }
}
