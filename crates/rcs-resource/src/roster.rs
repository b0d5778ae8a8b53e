//! `Roster` — the resources currently playing one role, in id order.
//!
//! The matcher walks rosters front to back, so keeping them sorted by
//! `ResourceId` makes both candidate order and lock order canonical.

use rcs_core::ResourceId;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Roster {
    members: Vec<ResourceId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id`.  Returns `false` if it was already present.
    pub fn insert(&mut self, id: ResourceId) -> bool {
        match self.members.binary_search(&id) {
            Ok(_) => false,
            Err(pos) => {
                self.members.insert(pos, id);
                true
            }
        }
    }

    /// Remove `id`.  Returns `false` if it was absent.
    pub fn remove(&mut self, id: ResourceId) -> bool {
        match self.members.binary_search(&id) {
            Ok(pos) => {
                self.members.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.members.binary_search(&id).is_ok()
    }

    #[inline]
    pub fn as_slice(&self) -> &[ResourceId] {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.members.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
