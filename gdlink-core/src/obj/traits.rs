/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::obj::bounds::{DeclEngine, Declarer, DynMemory, MemManual};
use crate::obj::Base;
use crate::sys;

/// Makes `T` eligible to be managed by the host and stored in [`Gd<T>`][crate::obj::Gd]
/// pointers.
///
/// Implemented for engine-provided wrapper types in [`classes`][crate::classes] and for
/// user-declared classes (through [`UserClass`]).
pub trait GodotClass: 'static {
    /// The immediate superclass of `T`. This is always a host-provided class.
    type Base: GodotClass;

    /// Whether this class is provided by the engine or declared by the user.
    type Declarer: Declarer;

    /// Defines the memory strategy of instances.
    type Mem: DynMemory;

    /// The name under which the host knows this class. ASCII, stable for the process lifetime.
    const CLASS_NAME: &'static str;
}

/// Unit impl only exists to represent "no base", and is used for `Object` itself. It should
/// never be used itself.
impl GodotClass for () {
    type Base = ();
    type Declarer = DeclEngine;
    type Mem = MemManual;
    const CLASS_NAME: &'static str = "(no base)";
}

/// Derived `GodotClass` with a base class.
///
/// Relates a class to its direct and transitive superclasses, enabling
/// [`Gd::upcast()`][crate::obj::Gd::upcast]. Every class trivially inherits itself.
pub trait Inherits<U: GodotClass>: GodotClass {}

impl<T: GodotClass> Inherits<T> for T {}

/// Class declared on the library side, with its state stored behind the host object.
///
/// The host creates and destroys instances through the callbacks registered via
/// [`register_class`][crate::registry::register_class], and dispatches overridden virtual
/// methods through [`virtual_dispatch`][Self::virtual_dispatch].
pub trait UserClass: GodotClass<Declarer = crate::obj::bounds::DeclUser> + Sized {
    /// Constructs an instance from its base-class handle, when the host instantiates the class.
    fn init(base: Base<Self::Base>) -> Self;

    /// Resolves an overridden virtual method by its host-side name.
    ///
    /// Return a trampoline minted by
    /// [`virtual_entry`][crate::registry::callbacks::virtual_entry] for each overridden
    /// method, or `None` to fall through to the base class.
    fn virtual_dispatch(name: &str) -> Option<sys::VirtualCallFn> {
        let _ = name;
        None
    }
}
