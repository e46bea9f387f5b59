/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Wrappers for the host-provided base classes.
//!
//! Engine classes are opaque marker types; their state lives entirely on the host side and is
//! reached through `Gd<Class>` method blocks, which marshal every call through a pointer-call
//! frame. Only the small set of root classes needed as bases is wrapped by hand.

mod node;
mod object;
pub(crate) mod ref_counted;

pub use node::{Node, Node2D};
pub use object::Object;
pub use ref_counted::RefCounted;
