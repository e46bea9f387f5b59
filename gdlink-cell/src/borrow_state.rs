/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Tracks the borrows handed out by a [`BindCell`](crate::BindCell).
///
/// Upholds these invariants:
/// - A shared borrow can only be taken when no accessible mutable borrow exists.
/// - A mutable borrow can only be taken when neither an accessible mutable borrow nor any
///   shared borrow exists.
/// - A mutable borrow can only be set inaccessible when an accessible one exists.
/// - A mutable borrow can only be unset inaccessible when no accessible mutable borrow and no
///   shared borrows exist.
///
/// If the state ever becomes inconsistent it is poisoned; that would be an implementation bug,
/// the poison flag only exists so such a bug cannot silently hand out aliasing references.
#[derive(Clone, PartialEq, Debug)]
pub struct BorrowState {
    /// Number of tracked `&T` references.
    shared_count: usize,
    /// Number of tracked `&mut T` references, accessible or not.
    mut_count: usize,
    /// Number of tracked `&mut T` references that are inaccessible.
    inaccessible_count: usize,
    poisoned: bool,
}

impl BorrowState {
    pub fn new() -> Self {
        Self {
            shared_count: 0,
            mut_count: 0,
            inaccessible_count: 0,
            poisoned: false,
        }
    }

    /// Returns `true` if an accessible mutable reference is currently tracked.
    pub fn has_accessible_mut(&self) -> bool {
        let count = self.mut_count - self.inaccessible_count;

        assert!(
            count <= 1,
            "there should never be more than 1 accessible mutable reference"
        );

        count == 1
    }

    pub fn shared_count(&self) -> usize {
        self.shared_count
    }

    pub fn mut_count(&self) -> usize {
        self.mut_count
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Mark the state as unreliable. Always returns [`BorrowStateErr::Poisoned`].
    pub(crate) fn poison(&mut self, why: impl Into<String>) -> Result<(), BorrowStateErr> {
        self.poisoned = true;

        Err(BorrowStateErr::Poisoned(why.into()))
    }

    fn ensure_not_poisoned(&self) -> Result<(), BorrowStateErr> {
        if self.poisoned {
            return Err(BorrowStateErr::IsPoisoned);
        }

        Ok(())
    }

    /// Track a new shared reference, returning the new shared total.
    ///
    /// Fails when an accessible mutable reference exists.
    pub fn increment_shared(&mut self) -> Result<usize, BorrowStateErr> {
        self.ensure_not_poisoned()?;

        if self.has_accessible_mut() {
            return Err("cannot borrow while accessible mutable borrow exists".into());
        }

        self.shared_count = self
            .shared_count
            .checked_add(1)
            .ok_or("could not increment shared count")?;

        Ok(self.shared_count)
    }

    /// Untrack an existing shared reference, returning the new shared total.
    pub fn decrement_shared(&mut self) -> Result<usize, BorrowStateErr> {
        self.ensure_not_poisoned()?;

        if self.shared_count == 0 {
            return Err("cannot decrement shared counter when no shared reference exists".into());
        }

        if self.has_accessible_mut() {
            self.poison("shared reference tracked while accessible mutable reference exists")?;
        }

        self.shared_count -= 1;

        Ok(self.shared_count)
    }

    /// Track a new mutable reference, returning the new mutable total.
    ///
    /// Fails when an accessible mutable reference or any shared reference exists.
    pub fn increment_mut(&mut self) -> Result<usize, BorrowStateErr> {
        self.ensure_not_poisoned()?;

        if self.has_accessible_mut() {
            return Err("cannot borrow while accessible mutable borrow exists".into());
        }

        if self.shared_count != 0 {
            return Err("cannot borrow mutable while shared borrow exists".into());
        }

        self.mut_count = self
            .mut_count
            .checked_add(1)
            .ok_or("could not increment mut count")?;

        Ok(self.mut_count)
    }

    /// Untrack the current accessible mutable reference, returning the new mutable total.
    pub fn decrement_mut(&mut self) -> Result<usize, BorrowStateErr> {
        self.ensure_not_poisoned()?;

        if self.mut_count == 0 {
            return Err("cannot decrement mutable counter when no mutable reference exists".into());
        }

        if self.mut_count == self.inaccessible_count {
            return Err(
                "cannot decrement mutable counter when current mutable reference is inaccessible"
                    .into(),
            );
        }

        if self.mut_count - 1 != self.inaccessible_count {
            self.poison("`inaccessible_count` does not fit its invariant")?;
        }

        self.mut_count -= 1;

        Ok(self.mut_count)
    }

    /// Set the current mutable reference as inaccessible, returning the new inaccessible total.
    pub fn set_inaccessible(&mut self) -> Result<usize, BorrowStateErr> {
        if !self.has_accessible_mut() {
            return Err(
                "cannot set current reference as inaccessible when no accessible reference exists"
                    .into(),
            );
        }

        self.inaccessible_count = self
            .inaccessible_count
            .checked_add(1)
            .ok_or("could not increment inaccessible count")?;

        Ok(self.inaccessible_count)
    }

    /// Re-activate the most recent inaccessible mutable reference, returning the new
    /// inaccessible total.
    pub fn unset_inaccessible(&mut self) -> Result<usize, BorrowStateErr> {
        if self.has_accessible_mut() {
            return Err(
                "cannot reactivate reference while an accessible mutable reference exists".into(),
            );
        }

        if self.shared_count > 0 {
            return Err("cannot reactivate reference while a shared reference exists".into());
        }

        if self.inaccessible_count == 0 {
            return Err("no inaccessible reference to reactivate".into());
        }

        self.inaccessible_count -= 1;

        Ok(self.inaccessible_count)
    }
}

impl Default for BorrowState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum BorrowStateErr {
    Poisoned(String),
    IsPoisoned,
    Custom(String),
}

impl std::fmt::Display for BorrowStateErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BorrowStateErr::Poisoned(why) => write!(f, "the borrow state was poisoned: {why}"),
            BorrowStateErr::IsPoisoned => write!(f, "the borrow state is poisoned"),
            BorrowStateErr::Custom(why) => f.write_str(why),
        }
    }
}

impl std::error::Error for BorrowStateErr {}

impl<'a> From<&'a str> for BorrowStateErr {
    fn from(value: &'a str) -> Self {
        Self::Custom(value.into())
    }
}

impl From<String> for BorrowStateErr {
    fn from(value: String) -> Self {
        Self::Custom(value)
    }
}
