/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! # Internal crate of **gdlink**
//!
//! Do not depend on this crate directly, instead use the `gdlink` crate.
//! No SemVer or other guarantees are provided.
//!
//! # Contributor docs
//!
//! A re-entrant cell implementation which allows `&mut` references to be reborrowed even while
//! `&mut` references still exist — as long as the pre-existing reference has been handed back
//! to the cell first, making it *inaccessible*.
//!
//! This emulates Rust's system for function calls: `my_func(&mut borrowed)` creates a second
//! `&mut` reference inside the function, derived from the outer one, which stays unused until
//! the call returns. Virtual dispatch from the host has the same shape, except the "call" goes
//! through the native boundary and comes back in as a new borrow of the same instance.

mod borrow_state;
mod cell;
mod guards;

pub use borrow_state::{BorrowState, BorrowStateErr};
pub use cell::BindCell;
pub use guards::{InaccessibleGuard, MutGuard, RefGuard};
