/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Class registration and the lifecycle of ref-counted user classes.

mod common;

use std::sync::Once;

use gdlink_core::classes::RefCounted;
use gdlink_core::obj::bounds::{DeclUser, MemRefCounted};
use gdlink_core::obj::{Base, Gd, GodotClass, UserClass};
use gdlink_core::registry::{is_class_registered, register_class};

struct Scoreboard {
    base: Base<RefCounted>,
    score: i64,
}

impl GodotClass for Scoreboard {
    type Base = RefCounted;
    type Declarer = DeclUser;
    type Mem = MemRefCounted;
    const CLASS_NAME: &'static str = "Scoreboard";
}

impl UserClass for Scoreboard {
    fn init(base: Base<RefCounted>) -> Self {
        Self { base, score: 0 }
    }
}

fn setup() {
    common::ensure_host();

    static REGISTER: Once = Once::new();
    REGISTER.call_once(register_class::<Scoreboard>);
}

#[test]
fn registration_is_tracked_and_idempotent() {
    setup();

    assert!(is_class_registered("Scoreboard"));
    assert!(!is_class_registered("Leaderboard"));

    // Second registration is skipped with a warning through the host.
    register_class::<Scoreboard>();
    assert!(common::warnings()
        .iter()
        .any(|w| w.contains("Scoreboard") && w.contains("already registered")));
}

#[test]
fn ref_counted_user_class_lifecycle() {
    setup();

    let mut board = Gd::<Scoreboard>::new_user();
    let id = board.instance_id();
    assert!(id.is_ref_counted());

    let raw_id = id.to_i64() as u64;
    assert_eq!(common::refcount_of(raw_id), Some(1));

    board.bind_mut().score = 42;

    let clone = board.clone();
    assert_eq!(common::refcount_of(raw_id), Some(2));
    assert_eq!(clone.bind().score, 42);

    drop(clone);
    assert_eq!(common::refcount_of(raw_id), Some(1));

    // Last count gone: the host object and the stored instance die together.
    drop(board);
    assert!(!common::object_exists(raw_id));
}

#[test]
fn init_constructor_runs_through_from_init_fn() {
    setup();

    let board = Gd::<Scoreboard>::from_init_fn(|base| Scoreboard { base, score: 7 });
    assert_eq!(board.bind().score, 7);

    let board_default = Gd::<Scoreboard>::new_user();
    assert_eq!(board_default.bind().score, 0);
}
