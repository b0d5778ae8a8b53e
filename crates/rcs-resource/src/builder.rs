//! Builder for [`ResourceStore`].
//!
//! # Usage
//!
//! ```rust
//! use rcs_core::TimeFunction;
//! use rcs_resource::ResourceStoreBuilder;
//! use rcs_schedule::{Cycle, CycleEnd};
//!
//! let mut b = ResourceStoreBuilder::new();
//! let surgeon = b.add_type("Surgeon");
//! let alice = b.add_resource("Alice");
//!
//! // 8 hours on, every day.
//! b.add_timetable(alice, Cycle::periodic(480, 1440, CycleEnd::Unbounded), TimeFunction::Constant(480), surgeon);
//!
//! let store = b.build().unwrap();
//! assert_eq!(store.resource(alice).unwrap().roles(), vec![surgeon]);
//! ```
//!
//! Ids are handed out as things are added, so references between types and
//! resources are plain ids.  All validation is deferred to
//! [`build`](ResourceStoreBuilder::build).

use rcs_core::{ResourceId, ResourceTypeId, TimeFunction};
use rcs_schedule::Cycle;

use crate::{
    CancelEntry, Resource, ResourceError, ResourceResult, ResourceStore, ResourceType, RoleHook,
    TimetableEntry,
};

#[derive(Default)]
pub struct ResourceStoreBuilder {
    types:     Vec<ResourceType>,
    resources: Vec<Resource>,
    /// First error seen while adding; reported by `build`.
    pending:   Option<ResourceError>,
}

impl ResourceStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, description: impl Into<String>) -> ResourceTypeId {
        let id = match ResourceTypeId::try_from(self.types.len()) {
            Ok(id) if id != ResourceTypeId::INVALID => id,
            _ => {
                self.fail(ResourceError::Capacity("resource types"));
                ResourceTypeId::INVALID
            }
        };
        self.types.push(ResourceType::new(id, description));
        id
    }

    pub fn add_type_with_hook(
        &mut self,
        description: impl Into<String>,
        hook: impl RoleHook + 'static,
    ) -> ResourceTypeId {
        let id = self.add_type(description);
        if let Some(t) = self.types.last_mut() {
            t.hook = Box::new(hook);
        }
        id
    }

    pub fn add_resource(&mut self, description: impl Into<String>) -> ResourceId {
        let id = match ResourceId::try_from(self.resources.len()) {
            Ok(id) if id != ResourceId::INVALID => id,
            _ => {
                self.fail(ResourceError::Capacity("resources"));
                ResourceId::INVALID
            }
        };
        self.resources.push(Resource::new(id, description));
        id
    }

    /// Append a timetable entry.  Unknown ids are reported by `build`.
    pub fn add_timetable(
        &mut self,
        resource: ResourceId,
        cycle: Cycle,
        duration: TimeFunction,
        role: ResourceTypeId,
    ) -> &mut Self {
        let entry = TimetableEntry { cycle, duration, role };
        match self.resources.get_mut(resource.index()) {
            Some(r) => r.timetable.push(entry),
            None => self.fail(ResourceError::ResourceNotFound(resource)),
        }
        self
    }

    pub fn add_cancellation(
        &mut self,
        resource: ResourceId,
        cycle: Cycle,
        duration: TimeFunction,
    ) -> &mut Self {
        let entry = CancelEntry { cycle, duration };
        match self.resources.get_mut(resource.index()) {
            Some(r) => r.cancellations.push(entry),
            None => self.fail(ResourceError::ResourceNotFound(resource)),
        }
        self
    }

    fn fail(&mut self, err: ResourceError) {
        if self.pending.is_none() {
            self.pending = Some(err);
        }
    }

    /// Validate every entry and freeze the store.
    pub fn build(self) -> ResourceResult<ResourceStore> {
        if let Some(err) = self.pending {
            return Err(err);
        }
        for r in &self.resources {
            for entry in &r.timetable {
                if entry.role.index() >= self.types.len() {
                    return Err(ResourceError::TypeNotFound(entry.role));
                }
                entry.cycle.validate().map_err(|source| ResourceError::Cycle { resource: r.id, source })?;
                entry
                    .duration
                    .validate()
                    .map_err(|source| ResourceError::Duration { resource: r.id, source })?;
            }
            for entry in &r.cancellations {
                entry.cycle.validate().map_err(|source| ResourceError::Cycle { resource: r.id, source })?;
                entry
                    .duration
                    .validate()
                    .map_err(|source| ResourceError::Duration { resource: r.id, source })?;
            }
        }
        Ok(ResourceStore::new(self.types, self.resources))
    }
}
