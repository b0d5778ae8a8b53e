//! `ResourceStore` — arena of resource types and resources.
//!
//! Both arenas are dense: `ResourceTypeId(i)` and `ResourceId(i)` index
//! position `i`.  The store is immutable after construction apart from the
//! per-resource `Mutex<ResourceState>`, so it is shared between scheduling
//! groups behind an `Arc`.

use rcs_core::{ResourceId, ResourceTypeId};

use crate::{Resource, ResourceError, ResourceResult, ResourceType};

#[derive(Debug)]
pub struct ResourceStore {
    types:     Vec<ResourceType>,
    resources: Vec<Resource>,
}

impl ResourceStore {
    pub(crate) fn new(types: Vec<ResourceType>, resources: Vec<Resource>) -> Self {
        Self { types, resources }
    }

    pub fn resource(&self, id: ResourceId) -> ResourceResult<&Resource> {
        self.resources.get(id.index()).ok_or(ResourceError::ResourceNotFound(id))
    }

    pub fn resource_type(&self, id: ResourceTypeId) -> ResourceResult<&ResourceType> {
        self.types.get(id.index()).ok_or(ResourceError::TypeNotFound(id))
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn types(&self) -> &[ResourceType] {
        &self.types
    }

    pub fn num_resources(&self) -> usize {
        self.resources.len()
    }

    pub fn num_types(&self) -> usize {
        self.types.len()
    }

    /// Resources whose timetable mentions `role`, in id order.
    pub fn players_of(&self, role: ResourceTypeId) -> Vec<ResourceId> {
        self.resources
            .iter()
            .filter(|r| r.timetable.iter().any(|e| e.role == role))
            .map(|r| r.id)
            .collect()
    }
}
