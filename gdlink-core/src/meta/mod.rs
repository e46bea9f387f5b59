/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Meta-information about classes and calls: cached class-name strings, call diagnostics and
//! the argument-tuple abstraction for inbound calls.

use std::fmt;
use std::os::raw::c_char;
use std::sync::{Mutex, OnceLock};

use crate::sys;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Class names

static CLASS_NAMES: OnceLock<Mutex<sys::StringCache>> = OnceLock::new();

/// Stable nul-terminated pointer for a class name, shared process-wide.
///
/// The host may keep registered class-name pointers indefinitely, hence the cache never
/// evicts.
pub fn class_name_cstr(name: &'static str) -> *const c_char {
    let cache = CLASS_NAMES.get_or_init(|| Mutex::new(sys::StringCache::new()));
    cache.lock().expect("class-name cache poisoned").fetch(name)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Call diagnostics

/// Location information for diagnostics of inbound calls.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CallContext {
    pub class_name: &'static str,
    pub function_name: &'static str,
}

impl CallContext {
    pub const fn new(class_name: &'static str, function_name: &'static str) -> Self {
        Self {
            class_name,
            function_name,
        }
    }
}

impl fmt::Display for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class_name, self.function_name)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Param tuples

/// Tuple of method parameters decodable from a host-provided argument array.
pub trait ParamTuple: Sized {
    const LEN: usize;

    /// Decodes `Self::LEN` arguments from the host's pointer array.
    ///
    /// # Safety
    /// `args` must point to at least `Self::LEN` slot pointers, each encoded per `call_type`
    /// for the corresponding tuple element.
    unsafe fn from_arg_ptrs(args: *const sys::ConstTypePtr, call_type: sys::PtrcallType) -> Self;
}

macro_rules! impl_param_tuple {
    ($len:literal; $($p:ident : $n:tt),*) => {
        impl<$($p: sys::FrameFfi),*> ParamTuple for ($($p,)*) {
            const LEN: usize = $len;

            #[allow(unused_variables, clippy::unused_unit)]
            unsafe fn from_arg_ptrs(
                args: *const sys::ConstTypePtr,
                call_type: sys::PtrcallType,
            ) -> Self {
                ($($p::from_arg_ptr(*args.add($n), call_type),)*)
            }
        }
    };
}

impl_param_tuple!(0;);
impl_param_tuple!(1; P0: 0);
impl_param_tuple!(2; P0: 0, P1: 1);
impl_param_tuple!(3; P0: 0, P1: 1, P2: 2);
impl_param_tuple!(4; P0: 0, P1: 1, P2: 2, P3: 3);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::FrameFfi;

    #[test]
    fn call_context_display() {
        let ctx = CallContext::new("Node", "_process");
        assert_eq!(ctx.to_string(), "Node::_process");
    }

    #[test]
    fn param_tuple_decodes_in_order() {
        let mut frame = sys::CallFrame::<3>::new();
        frame.arg(0, 11i64);
        frame.arg(1, false);
        frame.arg(2, 0.5f64);

        let ptrs = frame.arg_ptrs();
        let (a, b, c) = unsafe {
            <(i64, bool, f64)>::from_arg_ptrs(ptrs.as_ptr(), sys::PtrcallType::Standard)
        };

        assert_eq!(a, 11);
        assert!(!b);
        assert_eq!(c, 0.5);
    }

    #[test]
    fn empty_param_tuple_reads_nothing() {
        let decoded =
            unsafe { <()>::from_arg_ptrs(std::ptr::null(), sys::PtrcallType::Standard) };
        let () = decoded;
        assert_eq!(<() as ParamTuple>::LEN, 0);

        // Sanity: unit return writes nothing either.
        unsafe { ().write_frame(std::ptr::null_mut()) };
    }
}
