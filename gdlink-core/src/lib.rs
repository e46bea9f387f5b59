/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! # Internal crate of **gdlink**
//!
//! Object model, class registration and marshaling glue on top of `gdlink-sys`:
//! the handle table with ownership tags, the `Gd<T>` smart pointer, instance storage for
//! user classes, virtual-dispatch trampolines and the root engine-class wrappers.

pub mod builtin;
pub mod classes;
pub mod init;
pub mod meta;
pub mod obj;
pub mod registry;
pub mod storage;

mod log;

#[doc(hidden)]
pub use gdlink_sys as sys;
