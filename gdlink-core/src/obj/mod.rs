/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Types and traits related to objects: class traits, memory/declarer bounds, the validated
//! raw handle and the `Gd` smart pointer on top of it.

mod base;
pub mod bounds;
mod gd;
mod instance_id;
mod raw;
mod traits;

pub use base::Base;
pub use bounds::{DeclEngine, DeclUser, Declarer, DynMemory, MemDynamic, MemManual, MemRefCounted};
pub use gd::Gd;
pub use instance_id::InstanceId;
pub use raw::RawHandle;
pub use traits::{GodotClass, Inherits, UserClass};
