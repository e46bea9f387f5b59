/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Built-in value types marshaled by value through call-frame slots.

mod vector2;
mod vector3;

pub use vector2::Vector2;
pub use vector3::Vector3;
