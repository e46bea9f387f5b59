/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Virtual-method dispatch from the (stub) host into user classes.

mod common;

use std::sync::Once;

use gdlink_core::classes::Node;
use gdlink_core::meta::CallContext;
use gdlink_core::obj::bounds::{DeclUser, MemManual};
use gdlink_core::obj::{Base, Gd, GodotClass, UserClass};
use gdlink_core::registry::callbacks::{virtual_entry, VirtualMethod};
use gdlink_core::registry::register_class;
use gdlink_core::storage::storage_for;
use gdlink_core::sys;

struct Enemy {
    base: Base<Node>,
    health: i64,
    speed: f64,
}

impl GodotClass for Enemy {
    type Base = Node;
    type Declarer = DeclUser;
    type Mem = MemManual;
    const CLASS_NAME: &'static str = "Enemy";
}

impl UserClass for Enemy {
    fn init(base: Base<Node>) -> Self {
        Self {
            base,
            health: 100,
            speed: 4.0,
        }
    }

    fn virtual_dispatch(name: &str) -> Option<sys::VirtualCallFn> {
        match name {
            "_process" => Some(virtual_entry::<Enemy, ProcessVirtual>),
            "_damage" => Some(virtual_entry::<Enemy, DamageVirtual>),
            "_reload" => Some(virtual_entry::<Enemy, ReloadVirtual>),
            _ => None,
        }
    }
}

/// `_process(delta: float)`: drains health proportionally to elapsed time.
struct ProcessVirtual;

impl VirtualMethod<Enemy> for ProcessVirtual {
    type Params = (f64,);
    type Ret = ();
    const CONTEXT: CallContext = CallContext::new("Enemy", "_process");

    fn invoke(instance: &mut Enemy, (delta,): (f64,)) {
        instance.health -= (delta * instance.speed) as i64;
    }
}

/// `_damage(amount: int) -> int`: applies damage, returns remaining health.
struct DamageVirtual;

impl VirtualMethod<Enemy> for DamageVirtual {
    type Params = (i64,);
    type Ret = i64;
    const CONTEXT: CallContext = CallContext::new("Enemy", "_damage");

    fn invoke(instance: &mut Enemy, (amount,): (i64,)) -> i64 {
        instance.health -= amount;
        instance.health
    }
}

/// `_reload()`: parks its own borrow and performs a nested `_damage(5)` dispatch, the way an
/// engine call from inside a virtual method can re-enter the instance.
struct ReloadVirtual;

impl VirtualMethod<Enemy> for ReloadVirtual {
    type Params = ();
    type Ret = ();
    const CONTEXT: CallContext = CallContext::new("Enemy", "_reload");

    fn invoke(instance: &mut Enemy, _params: ()) {
        let object_ptr = instance.base.instance_id().to_i64() as usize as sys::ObjectPtr;

        let storage = unsafe { storage_for::<Enemy>(&instance.base) };
        let parked = storage
            .make_inaccessible(&mut *instance)
            .expect("outer borrow can be parked");

        let mut frame = sys::CallFrame::<1>::new();
        frame.arg(0, 5i64);
        let args = frame.arg_ptrs();
        let dispatched =
            unsafe { common::call_virtual(object_ptr, "_damage", args.as_ptr(), frame.ret_ptr()) };
        assert!(dispatched);

        drop(parked);
        instance.health -= 1;
    }
}

fn setup() {
    common::ensure_host();

    static REGISTER: Once = Once::new();
    REGISTER.call_once(register_class::<Enemy>);
}

#[test]
fn host_instantiates_and_dispatches() {
    setup();

    let object_ptr = common::instantiate_registered("Enemy");
    let mut enemy = unsafe {
        Gd::<Enemy>::from_object_ptr(object_ptr, gdlink_core::registry::Ownership::Owned)
    }
    .expect("instantiation returns live object");

    assert_eq!(enemy.bind().health, 100);

    // _process(2.0) drains 2.0 * 4.0 = 8 health.
    let mut frame = sys::CallFrame::<1>::new();
    frame.arg(0, 2.0f64);
    let args = frame.arg_ptrs();
    let dispatched =
        unsafe { common::call_virtual(object_ptr, "_process", args.as_ptr(), std::ptr::null_mut()) };

    assert!(dispatched);
    assert_eq!(enemy.bind().health, 92);

    // _damage(30) returns the remaining health through the return slot.
    let mut frame = sys::CallFrame::<1>::new();
    frame.arg(0, 30i64);
    let args = frame.arg_ptrs();
    let dispatched =
        unsafe { common::call_virtual(object_ptr, "_damage", args.as_ptr(), frame.ret_ptr()) };

    assert!(dispatched);
    assert_eq!(unsafe { frame.ret::<i64>() }, 62);
    assert_eq!(enemy.bind().health, 62);

    enemy.free();
}

#[test]
fn unknown_virtual_falls_through() {
    setup();

    let object_ptr = common::instantiate_registered("Enemy");
    let dispatched = unsafe {
        common::call_virtual(object_ptr, "_ready", std::ptr::null(), std::ptr::null_mut())
    };
    assert!(!dispatched);

    let enemy = unsafe {
        Gd::<Enemy>::from_object_ptr(object_ptr, gdlink_core::registry::Ownership::Owned)
    }
    .unwrap();
    enemy.free();
}

#[test]
fn bind_mut_state_survives_dispatch() {
    setup();

    let mut enemy = Gd::<Enemy>::from_init_fn(|base| Enemy {
        base,
        health: 10,
        speed: 1.0,
    });
    let object_ptr_id = enemy.instance_id().to_i64() as u64;

    enemy.bind_mut().speed = 2.0;

    let mut frame = sys::CallFrame::<1>::new();
    frame.arg(0, 3.0f64);
    let args = frame.arg_ptrs();
    let object_ptr = object_ptr_id as usize as sys::ObjectPtr;
    let dispatched =
        unsafe { common::call_virtual(object_ptr, "_process", args.as_ptr(), std::ptr::null_mut()) };

    assert!(dispatched);
    assert_eq!(enemy.bind().health, 10 - 6);

    enemy.free();
}

#[test]
fn virtual_call_reenters_through_parked_borrow() {
    setup();

    let enemy = Gd::<Enemy>::from_init_fn(|base| Enemy {
        base,
        health: 20,
        speed: 0.0,
    });
    let object_ptr = enemy.instance_id().to_i64() as usize as sys::ObjectPtr;

    let dispatched = unsafe {
        common::call_virtual(object_ptr, "_reload", std::ptr::null(), std::ptr::null_mut())
    };
    assert!(dispatched);

    // _reload parked its own borrow, the nested _damage(5) ran, then _reload took one more.
    assert_eq!(enemy.bind().health, 20 - 5 - 1);

    enemy.free();
}

#[test]
fn host_destruction_sweeps_instance_handles() {
    setup();

    let object_ptr = common::instantiate_registered("Enemy");
    let enemy = unsafe {
        Gd::<Enemy>::from_object_ptr(object_ptr, gdlink_core::registry::Ownership::Owned)
    }
    .unwrap();
    let self_ref: Gd<Node> = enemy.bind().base.to_gd();
    let raw_id = enemy.instance_id().to_i64() as u64;

    // The host tears the object down itself; the free-instance callback sweeps the table.
    common::host_destroy(raw_id);

    assert!(!enemy.is_instance_valid());
    assert!(!self_ref.is_instance_valid());
    assert!(!common::object_exists(raw_id));
}

#[test]
fn base_handle_dies_with_instance() {
    setup();

    let enemy = Gd::<Enemy>::from_init_fn(|base| Enemy {
        base,
        health: 5,
        speed: 0.0,
    });

    let self_ref: Gd<Node> = enemy.bind().base.to_gd();
    assert_eq!(self_ref.instance_id(), enemy.instance_id());

    // The self-reference is bound to the instance: it never keeps the object alive, and
    // freeing the object turns it stale immediately.
    enemy.free();
    assert!(!self_ref.is_instance_valid());
}
