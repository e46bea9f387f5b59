/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Extension entry point: binding the host interface and running staged init callbacks.

use crate::sys;

/// Stage of the host's initialization process.
///
/// Stages are entered in declaration order and left in reverse order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub enum InitLevel {
    /// First level loaded by the host. Builtin types are available, classes are not.
    Core,

    /// Servers are up; most extensions register their classes here at the earliest.
    Servers,

    /// All classes are available; the usual level for class registration.
    Scene,

    /// Only loaded inside the editor.
    Editor,
}

impl InitLevel {
    pub const fn all() -> [InitLevel; 4] {
        [Self::Core, Self::Servers, Self::Scene, Self::Editor]
    }
}

/// Defines the entry point of an extension library.
///
/// Register classes in [`on_level_init`][Self::on_level_init], typically at
/// [`InitLevel::Scene`].
pub trait ExtensionLibrary {
    fn on_level_init(_level: InitLevel) {}

    fn on_level_deinit(_level: InitLevel) {}
}

/// Binds the host interface and walks `E` through all init levels.
///
/// Hosts driving levels individually can call [`sys::initialize`] and
/// [`ExtensionLibrary::on_level_init`] themselves instead.
///
/// # Safety
/// Same contract as [`sys::initialize`]: valid interface table, host-issued library token,
/// called once before anything else, from a single thread.
pub unsafe fn initialize_extension<E: ExtensionLibrary>(
    interface: *const sys::HostInterface,
    library: sys::ClassLibraryPtr,
) {
    sys::initialize(interface, library);

    for level in InitLevel::all() {
        E::on_level_init(level);
    }
}

/// Walks `E` through all deinit levels, in reverse order.
pub fn deinitialize_extension<E: ExtensionLibrary>() {
    for level in InitLevel::all().into_iter().rev() {
        E::on_level_deinit(level);
    }
}
