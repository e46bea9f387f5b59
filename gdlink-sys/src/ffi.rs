/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::interface::{ConstTypePtr, TypePtr};

/// Coarse value classification used in call-error diagnostics and method registration.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ValueKind {
    Nil,
    Bool,
    Int,
    Float,
    Vector2,
    Vector3,
    Object,
}

/// An indication of what type of pointer call is being made.
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug)]
pub enum PtrcallType {
    /// Standard pointer call: every argument slot holds the value directly, and the return
    /// value is moved into the return slot.
    #[default]
    Standard,

    /// Virtual pointer call, i.e. the host calling into an overridden method.
    ///
    /// Behaves like [`PtrcallType::Standard`] except for object arguments, whose slots hold
    /// a pointer to the host-side object handle rather than the handle itself.
    Virtual,
}

/// Types that can directly and fully represent a value in a call-frame slot.
///
/// # Safety
///
/// Implementations must read and write slot memory following the host's encoding for the
/// type, and [`from_arg_ptr`](FrameFfi::from_arg_ptr)/[`move_return_ptr`](FrameFfi::move_return_ptr)
/// must honor the given [`PtrcallType`]'s argument/return encoding, including any ownership
/// transfer it implies.
pub unsafe trait FrameFfi: Sized {
    fn value_kind() -> ValueKind;

    /// Read a value out of an initialized slot.
    ///
    /// # Safety
    /// `ptr` must point to a slot holding a value of `Self` in the host's encoding.
    unsafe fn from_frame(ptr: ConstTypePtr) -> Self;

    /// Move `self` into a slot, overwriting previous contents.
    ///
    /// # Safety
    /// `dst` must point to a slot large enough for `Self`.
    unsafe fn write_frame(self, dst: TypePtr);

    /// Construct from a pointer to an argument in an incoming call.
    ///
    /// # Safety
    /// `ptr` must encode `Self` according to `call_type`'s argument encoding.
    unsafe fn from_arg_ptr(ptr: ConstTypePtr, call_type: PtrcallType) -> Self {
        let _ = call_type;
        Self::from_frame(ptr)
    }

    /// Move `self` into the return slot of an incoming call.
    ///
    /// # Safety
    /// `dst` must accept `Self` according to `call_type`'s return encoding.
    unsafe fn move_return_ptr(self, dst: TypePtr, call_type: PtrcallType) {
        let _ = call_type;
        self.write_frame(dst)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Scalar impls (here due to orphan rule)

/// Implements [`FrameFfi`] for types the host represents as `Self`, so slots are read and
/// written as `*mut Self`.
#[macro_export]
macro_rules! impl_frame_ffi_as_self {
    ($T:ty, $kind:ident) => {
        // SAFETY: the host represents this type as `Self`, so plain reads/writes are sound.
        unsafe impl $crate::FrameFfi for $T {
            fn value_kind() -> $crate::ValueKind {
                $crate::ValueKind::$kind
            }

            unsafe fn from_frame(ptr: $crate::ConstTypePtr) -> Self {
                std::ptr::read(ptr as *const Self)
            }

            unsafe fn write_frame(self, dst: $crate::TypePtr) {
                std::ptr::write(dst as *mut Self, self);
            }
        }
    };
}

impl_frame_ffi_as_self!(bool, Bool);
impl_frame_ffi_as_self!(i64, Int);
impl_frame_ffi_as_self!(f64, Float);

// SAFETY: nothing is read or written for the unit return type.
unsafe impl FrameFfi for () {
    fn value_kind() -> ValueKind {
        ValueKind::Nil
    }

    unsafe fn from_frame(_ptr: ConstTypePtr) -> Self {}

    unsafe fn write_frame(self, _dst: TypePtr) {}
}
