//! `ResourceType` — a role a resource can play ("Surgeon", "OR", "Nurse").

use std::fmt;

use rcs_core::ResourceTypeId;

use crate::hook::{NoHook, RoleHook};

/// A role definition.
///
/// The set of resources currently playing the role is not stored here; it
/// is a [`Roster`](crate::Roster) owned by the scheduling group that
/// manages the type.
pub struct ResourceType {
    pub id:          ResourceTypeId,
    pub description: String,
    pub hook:        Box<dyn RoleHook>,
}

impl ResourceType {
    pub fn new(id: ResourceTypeId, description: impl Into<String>) -> Self {
        Self { id, description: description.into(), hook: Box::new(NoHook) }
    }

    pub fn with_hook(mut self, hook: impl RoleHook + 'static) -> Self {
        self.hook = Box::new(hook);
        self
    }
}

impl fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceType")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
