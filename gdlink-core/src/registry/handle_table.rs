/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Process-wide table mapping handles to host objects.
//!
//! Raw host pointers never travel through user-facing types. Instead, each live reference to a
//! host object occupies a slot in this table, addressed by an [`ObjectHandle`] (index plus
//! generation). Freeing an object bumps the generation of its slots, so every outstanding
//! handle to it turns stale at once and any later access reports an error instead of touching
//! freed memory.

use std::error::Error;
use std::fmt;
use std::sync::Mutex;

use crate::obj::InstanceId;
use crate::sys;

/// Index of a table slot plus the generation it was minted at.
///
/// A handle is valid while its slot's generation matches; releasing the slot bumps the
/// generation, invalidating all copies of the handle in one step.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ObjectHandle {
    index: u32,
    generation: u32,
}

impl ObjectHandle {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// How a table entry relates to the lifetime of the host object it points at.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Ownership {
    /// This entry participates in keeping the object alive (manual objects: responsible for
    /// `free()`; ref-counted objects: holds one count).
    Owned,

    /// Host-owned object the library merely observes. The entry does not affect the object's
    /// lifetime and may outlive it; accesses after destruction fail via generation checks.
    Borrowed,

    /// Valid only while the entry behind the contained handle is. Used for self-references
    /// handed to user instances, which must not keep their own object alive.
    BoundTo(ObjectHandle),
}

/// Payload of a live slot.
pub(crate) struct Entry {
    pub object_ptr: sys::ObjectPtr,
    pub instance_id: InstanceId,
    pub ownership: Ownership,
}

// SAFETY: the object pointer is an opaque host token; it is only dereferenced by the host
// itself when passed back through the interface.
unsafe impl Send for Entry {}

struct TableSlot {
    generation: u32,
    entry: Option<Entry>,
}

/// Why a handle access failed. Every variant means the handle must no longer be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// The slot index was never allocated. Indicates a corrupted handle.
    Dead { index: u32 },

    /// The slot has been released (and possibly reused) since the handle was minted.
    Stale {
        index: u32,
        expected: u32,
        actual: u32,
    },

    /// The handle is bound to an owner whose entry is gone.
    OwnerDead {
        handle: ObjectHandle,
        owner: ObjectHandle,
    },

    /// The entry was valid, but the host reports the object itself as destroyed. Raised when
    /// the host tears an object down without any callback reaching this library.
    HostFreed {
        handle: ObjectHandle,
        instance_id: InstanceId,
    },
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dead { index } => {
                write!(f, "handle refers to unallocated slot {index}")
            }
            Self::Stale {
                index,
                expected,
                actual,
            } => write!(
                f,
                "stale handle: slot {index} is at generation {actual}, handle was minted at {expected}; \
                 the object has been freed"
            ),
            Self::OwnerDead { handle, owner } => write!(
                f,
                "handle {handle} is bound to owner {owner}, which has been freed"
            ),
            Self::HostFreed {
                handle,
                instance_id,
            } => write!(
                f,
                "handle {handle} points at object {instance_id}, which the host has destroyed"
            ),
        }
    }
}

impl Error for HandleError {}

// ----------------------------------------------------------------------------------------------------------------------------------------------

struct HandleTable {
    slots: Vec<TableSlot>,
    free_indices: Vec<u32>,
}

impl HandleTable {
    const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_indices: Vec::new(),
        }
    }

    fn insert(&mut self, entry: Entry) -> ObjectHandle {
        if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.entry.is_none());
            slot.entry = Some(entry);

            return ObjectHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = u32::try_from(self.slots.len()).expect("handle table exceeds u32 indices");
        self.slots.push(TableSlot {
            generation: 0,
            entry: Some(entry),
        });

        ObjectHandle {
            index,
            generation: 0,
        }
    }

    fn entry(&self, handle: ObjectHandle) -> Result<&Entry, HandleError> {
        let slot = self
            .slots
            .get(handle.index as usize)
            .ok_or(HandleError::Dead {
                index: handle.index,
            })?;

        if slot.generation != handle.generation {
            return Err(HandleError::Stale {
                index: handle.index,
                expected: handle.generation,
                actual: slot.generation,
            });
        }

        slot.entry.as_ref().ok_or(HandleError::Dead {
            index: handle.index,
        })
    }

    /// Like [`entry()`](Self::entry), but additionally walks the `BoundTo` owner chain.
    ///
    /// Owners are always inserted before their dependents and ownership never changes after
    /// insertion, so the chain cannot cycle.
    fn validated_entry(&self, handle: ObjectHandle) -> Result<&Entry, HandleError> {
        let entry = self.entry(handle)?;

        let mut dependent = handle;
        let mut current = entry;
        while let Ownership::BoundTo(owner) = current.ownership {
            current = self.entry(owner).map_err(|_| HandleError::OwnerDead {
                handle: dependent,
                owner,
            })?;
            dependent = owner;
        }

        Ok(entry)
    }

    fn release(&mut self, handle: ObjectHandle) -> Result<Entry, HandleError> {
        // Validate first, so releasing a stale handle reports rather than corrupts.
        self.entry(handle)?;

        let slot = &mut self.slots[handle.index as usize];
        let entry = slot.entry.take().expect("validated entry vanished");
        slot.generation = slot.generation.wrapping_add(1);
        self.free_indices.push(handle.index);

        Ok(entry)
    }

    fn release_all_for(&mut self, instance_id: InstanceId) -> usize {
        let mut released = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let matches = slot
                .entry
                .as_ref()
                .is_some_and(|entry| entry.instance_id == instance_id);

            if matches {
                slot.entry = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free_indices.push(index as u32);
                released += 1;
            }
        }
        released
    }
}

static TABLE: Mutex<HandleTable> = Mutex::new(HandleTable::new());

fn with_table<R>(f: impl FnOnce(&mut HandleTable) -> R) -> R {
    let mut table = TABLE.lock().expect("handle table poisoned");
    f(&mut table)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Crate-facing API

/// Mints a handle for a new entry.
pub(crate) fn insert(
    object_ptr: sys::ObjectPtr,
    instance_id: InstanceId,
    ownership: Ownership,
) -> ObjectHandle {
    with_table(|table| {
        table.insert(Entry {
            object_ptr,
            instance_id,
            ownership,
        })
    })
}

/// Runs `f` on the entry behind `handle`, after validating the handle and its owner chain.
pub(crate) fn access<R>(
    handle: ObjectHandle,
    f: impl FnOnce(&Entry) -> R,
) -> Result<R, HandleError> {
    with_table(|table| table.validated_entry(handle).map(f))
}

/// Atomically copies an entry into a fresh slot, with `ownership` for the copy.
pub(crate) fn duplicate(
    handle: ObjectHandle,
    ownership: Ownership,
) -> Result<ObjectHandle, HandleError> {
    with_table(|table| {
        let entry = table.validated_entry(handle)?;
        let copy = Entry {
            object_ptr: entry.object_ptr,
            instance_id: entry.instance_id,
            ownership,
        };
        Ok(table.insert(copy))
    })
}

/// Releases a single entry, invalidating all copies of this specific handle.
pub(crate) fn release(handle: ObjectHandle) -> Result<Entry, HandleError> {
    with_table(|table| table.release(handle))
}

/// Releases every entry pointing at the object with `instance_id`.
///
/// Called when an object is destroyed: all handles to it, including clones the table owner
/// never saw, go stale in one sweep. Returns how many entries were released.
pub(crate) fn invalidate_object(instance_id: InstanceId) -> usize {
    with_table(|table| table.release_all_for(instance_id))
}

/// Whether `handle` currently resolves to a live entry (owner chain included).
pub(crate) fn is_live(handle: ObjectHandle) -> bool {
    with_table(|table| table.validated_entry(handle).is_ok())
}
