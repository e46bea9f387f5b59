/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Everything related to making classes and object handles known to the rest of the process:
//! the handle table, class registration into the host's ClassDB, and the `extern "C"`
//! callbacks and trampolines the host invokes.

pub mod callbacks;
pub mod class;
pub mod handle_table;

pub use class::{is_class_registered, register_class};
pub use handle_table::{HandleError, ObjectHandle, Ownership};
