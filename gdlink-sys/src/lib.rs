/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Low-level layer over the host's C interface: pointer aliases, the late-init function
//! table, call frames and the method-bind cache.

mod callframe;
mod ffi;
mod interface;
mod method_table;
mod opaque;

pub use callframe::{CallFrame, SLOT_SIZE};
pub use ffi::{FrameFfi, PtrcallType, ValueKind};
pub use interface::*;
pub use method_table::{class_method_bind, MethodBind, StringCache};
pub use opaque::Opaque;

use std::sync::OnceLock;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Late-init globals

struct HostBinding {
    interface: HostInterface,
    library: ClassLibraryPtr,
}

// SAFETY: written once during single-threaded init; the contained pointers are opaque tokens
// that are only ever passed back to the host.
unsafe impl Sync for HostBinding {}
unsafe impl Send for HostBinding {}

static BINDING: OnceLock<HostBinding> = OnceLock::new();

/// # Safety
///
/// - `interface` must be a valid pointer to a fully-populated [`HostInterface`] table.
/// - `library` must be the token given by the host at initialization.
/// - Must be called before any other function of this crate, from a single thread.
pub unsafe fn initialize(interface: *const HostInterface, library: ClassLibraryPtr) {
    let interface = *interface;

    if !interface.version_string.is_null() {
        let version = std::ffi::CStr::from_ptr(interface.version_string);
        println!(
            "Initialize host interface for Rust: {}",
            version.to_string_lossy()
        );
    }

    let result = BINDING.set(HostBinding { interface, library });
    assert!(result.is_ok(), "host interface initialized twice");
}

pub fn is_initialized() -> bool {
    BINDING.get().is_some()
}

/// # Safety
///
/// The interface must have been initialized with [`initialize`] before calling this function.
#[inline(always)]
pub unsafe fn get_interface() -> &'static HostInterface {
    &unwrap_ref_unchecked(BINDING.get()).interface
}

/// # Safety
///
/// The library must have been initialized with [`initialize`] before calling this function.
#[inline(always)]
pub unsafe fn get_library() -> ClassLibraryPtr {
    unwrap_ref_unchecked(BINDING.get()).library
}

/// Makes sure the host is available, or panics. Debug mode only!
macro_rules! debug_assert_host {
    ($expr:expr) => {
        debug_assert!(
            $expr,
            "host interface not available; make sure you do not call it from unit/doc tests"
        );
    };
}

// Combination of `unwrap_unchecked()` without the case differentiation in release mode.
unsafe fn unwrap_ref_unchecked<T>(opt: Option<&T>) -> &T {
    debug_assert_host!(opt.is_some());

    match opt {
        Some(val) => val,
        None => std::hint::unreachable_unchecked(),
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Macros

/// Unchecked access to an initialized [`HostInterface`] function pointer.
#[macro_export]
#[doc(hidden)]
macro_rules! interface_fn {
    ($name:ident) => {{
        unsafe { $crate::get_interface().$name.unwrap_unchecked() }
    }};
}

/// Verifies a condition at compile time.
#[macro_export]
macro_rules! static_assert {
    ($cond:expr) => {
        const _: () = assert!($cond);
    };
    ($cond:expr, $msg:literal) => {
        const _: () = assert!($cond, $msg);
    };
}

/// Verifies at compile time that two types `T` and `U` have the same size.
#[macro_export]
macro_rules! static_assert_eq_size {
    ($T:ty, $U:ty) => {
        $crate::static_assert!(std::mem::size_of::<$T>() == std::mem::size_of::<$U>());
    };
    ($T:ty, $U:ty, $msg:literal) => {
        $crate::static_assert!(std::mem::size_of::<$T>() == std::mem::size_of::<$U>(), $msg);
    };
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Call errors

pub const CALL_OK: i32 = 0;
pub const CALL_ERROR_INVALID_METHOD: i32 = 1;
pub const CALL_ERROR_INVALID_ARGUMENT: i32 = 2;
pub const CALL_ERROR_TOO_MANY_ARGUMENTS: i32 = 3;
pub const CALL_ERROR_TOO_FEW_ARGUMENTS: i32 = 4;
pub const CALL_ERROR_INSTANCE_IS_NULL: i32 = 5;
pub const CALL_ERROR_METHOD_NOT_CONST: i32 = 6;

/// Host-side call error, passed through unchanged.
#[repr(C)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CallError {
    pub error: i32,
    pub argument: i32,
    pub expected: i32,
}

#[doc(hidden)]
#[inline]
pub fn default_call_error() -> CallError {
    CallError {
        error: CALL_OK,
        argument: -1,
        expected: -1,
    }
}

#[doc(hidden)]
#[inline]
#[track_caller] // panic message points to call site
pub fn panic_call_error(err: &CallError, function_name: &str, arg_kinds: &[ValueKind]) -> ! {
    debug_assert_ne!(err.error, CALL_OK); // already checked outside

    let CallError {
        error,
        argument,
        expected,
    } = *err;

    let argc = arg_kinds.len();
    let reason = match error {
        CALL_ERROR_INVALID_METHOD => "method not found".to_string(),
        CALL_ERROR_INVALID_ARGUMENT => {
            let from = arg_kinds.get(argument as usize);
            let i = argument + 1;

            match from {
                Some(from) => format!("cannot convert argument #{i} from {from:?} (expected kind ordinal {expected})"),
                None => format!("cannot convert argument #{i}"),
            }
        }
        CALL_ERROR_TOO_MANY_ARGUMENTS => {
            format!("too many arguments; expected {argument}, but called with {argc}")
        }
        CALL_ERROR_TOO_FEW_ARGUMENTS => {
            format!("too few arguments; expected {argument}, but called with {argc}")
        }
        CALL_ERROR_INSTANCE_IS_NULL => "instance is null".to_string(),
        CALL_ERROR_METHOD_NOT_CONST => "method is not const".to_string(),
        _ => format!("unknown reason (error code {error})"),
    };

    panic!("Function call failed:  {function_name} -- {reason}.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_call_error_is_ok() {
        let err = default_call_error();
        assert_eq!(err.error, CALL_OK);
        assert_eq!(err.argument, -1);
        assert_eq!(err.expected, -1);
    }

    #[test]
    #[should_panic(expected = "too few arguments")]
    fn panic_call_error_formats_reason() {
        let err = CallError {
            error: CALL_ERROR_TOO_FEW_ARGUMENTS,
            argument: 2,
            expected: -1,
        };
        panic_call_error(&err, "Node::add_child", &[ValueKind::Object]);
    }
}
