/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::num::NonZeroU64;

use crate::sys;

/// Represents a non-zero instance ID.
///
/// This is its own type for type safety and to deal with the inconsistent representation in the
/// host as both `u64` (native) and `i64` (scripting). You can usually treat this as an opaque
/// value; there are conversion methods however.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct InstanceId {
    // Note: in the public API, signed i64 is the canonical representation.
    //
    // Methods converting to/from u64 exist only because the host ABI tends to work with u64.
    // Not having two public representations avoids confusion about negative values.
    value: NonZeroU64,
}

impl InstanceId {
    /// Constructs an instance ID from an integer, or `None` if the integer is zero.
    ///
    /// This does *not* check if the instance is valid.
    pub fn try_from_i64(id: i64) -> Option<Self> {
        Self::try_from_u64(id as u64)
    }

    /// ⚠️ Constructs an instance ID from a non-zero integer, or panics.
    ///
    /// This does *not* check if the instance is valid.
    ///
    /// # Panics
    /// If `id` is zero.
    pub fn from_nonzero(id: i64) -> Self {
        Self::try_from_i64(id).expect("expected non-zero instance ID")
    }

    // Private: see rationale above
    pub(crate) fn try_from_u64(id: u64) -> Option<Self> {
        NonZeroU64::new(id).map(|value| Self { value })
    }

    pub fn to_i64(self) -> i64 {
        self.to_u64() as i64
    }

    /// Returns if the object being referred-to is inheriting `RefCounted`.
    ///
    /// This is a very fast operation and involves no host round-trip, as the information is
    /// encoded in the ID itself.
    pub fn is_ref_counted(self) -> bool {
        self.to_u64() & (1u64 << 63) != 0
    }

    // Private: see rationale above
    pub(crate) fn to_u64(self) -> u64 {
        self.value.get()
    }
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_i64())
    }
}

impl Debug for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "InstanceId({})", self.to_i64())
    }
}

// Serialized in the canonical signed form, matching `Display`.
#[cfg(feature = "serde")]
mod serde_support {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::InstanceId;

    impl Serialize for InstanceId {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_i64(self.to_i64())
        }
    }

    impl<'de> Deserialize<'de> for InstanceId {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let id = i64::deserialize(deserializer)?;
            Self::try_from_i64(id).ok_or_else(|| serde::de::Error::custom("zero instance ID"))
        }
    }
}

// SAFETY: the host represents instance IDs as 64-bit integers in frame slots.
unsafe impl sys::FrameFfi for InstanceId {
    fn value_kind() -> sys::ValueKind {
        sys::ValueKind::Int
    }

    unsafe fn from_frame(ptr: sys::ConstTypePtr) -> Self {
        let raw = std::ptr::read(ptr as *const u64);
        Self::try_from_u64(raw).expect("zero instance ID in frame slot")
    }

    unsafe fn write_frame(self, dst: sys::TypePtr) {
        std::ptr::write(dst as *mut i64, self.to_i64());
    }
}
