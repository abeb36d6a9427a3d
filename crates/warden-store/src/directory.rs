//! In-memory `EntityDirectory`.
//!
//! Holds the handful of host-entity attributes the ownership registry
//! needs (typically just the owner field of each ownable record).

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use warden_contracts::entity::EntityRef;
use warden_core::traits::EntityDirectory;

/// A thread-safe attribute map keyed by entity.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityDirectory {
    attributes: Arc<Mutex<HashMap<EntityRef, HashMap<String, String>>>>,
}

impl InMemoryEntityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` on `entity`, replacing any previous value.
    pub fn set(&self, entity: EntityRef, field: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut attributes) = self.attributes.lock() {
            attributes
                .entry(entity)
                .or_default()
                .insert(field.into(), value.into());
        }
    }

    /// Builder-style `set`.
    pub fn with(self, entity: EntityRef, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(entity, field, value);
        self
    }
}

impl EntityDirectory for InMemoryEntityDirectory {
    fn attribute(&self, entity: &EntityRef, field: &str) -> Option<String> {
        let attributes = self.attributes.lock().ok()?;
        attributes.get(entity)?.get(field).cloned()
    }
}
