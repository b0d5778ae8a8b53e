//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  Resource, type, and activity IDs
//! are dense indices into the model's arenas (`id.index()`); work-item and
//! zone IDs come from monotonically increasing counters and are only ever
//! used as keys.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// An entity flowing through the process model (patient, part, order).
    /// Owned by the flow layer; the core only uses it as a label.
    pub struct ElementId(u32);
}

typed_id! {
    /// Index of a resource in the model's resource arena.
    pub struct ResourceId(u32);
}

typed_id! {
    /// Index of a resource type (role) in the model's type arena.
    pub struct ResourceTypeId(u16);
}

typed_id! {
    /// Index of an activity in the model's activity arena.
    pub struct ActivityId(u16);
}

typed_id! {
    /// Position of an activity work group inside its activity's table
    /// (insertion order, before priority sorting).
    pub struct WorkGroupId(u16);
}

typed_id! {
    /// One element's attempt at one activity.  Allocated from a counter, so
    /// ordering by id is arrival order.
    pub struct WorkItemId(u64);
}

typed_id! {
    /// Conflict-zone identifier.  Allocated from a monotonically increasing
    /// creation counter; the numeric order is the canonical merge order.
    pub struct ZoneId(u64);
}

typed_id! {
    /// Index of a scheduling group (one event queue over a disjoint subset
    /// of resource types).
    pub struct GroupId(u16);
}
