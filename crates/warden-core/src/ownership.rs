//! Entity type registry and the registry-backed ownership predicate.
//!
//! The host registers each entity type it wants owner-gated abilities to
//! work with, naming the field on that type that holds the owner's id.
//! Unregistered types fall back to `DEFAULT_OWNER_FIELD`.

use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::debug;

use warden_contracts::entity::{EntityRef, Target};

use crate::traits::{EntityDirectory, OwnershipPredicate};

/// Owner field used for types with no explicit registration.
pub const DEFAULT_OWNER_FIELD: &str = "user_id";

/// How ownership is recognized for one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRegistration {
    /// Attribute on the target that holds the owner's id.
    pub owner_field: String,
    /// When set, only authorities of this type can be owners.
    #[serde(default)]
    pub owner_type: Option<String>,
}

impl TypeRegistration {
    pub fn new(owner_field: impl Into<String>) -> Self {
        Self {
            owner_field: owner_field.into(),
            owner_type: None,
        }
    }

    /// Restrict ownership to authorities of `owner_type`.
    pub fn owned_by_type(mut self, owner_type: impl Into<String>) -> Self {
        self.owner_type = Some(owner_type.into());
        self
    }
}

/// Maps type tags to their ownership registration.
///
/// Configured once by the host at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeRegistration>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entity_type`. Registering a type twice replaces the
    /// previous registration.
    pub fn register(&mut self, entity_type: impl Into<String>, registration: TypeRegistration) {
        self.types.insert(entity_type.into(), registration);
    }

    /// Builder-style `register`.
    pub fn with_type(mut self, entity_type: impl Into<String>, registration: TypeRegistration) -> Self {
        self.register(entity_type, registration);
        self
    }

    pub fn get(&self, entity_type: &str) -> Option<&TypeRegistration> {
        self.types.get(entity_type)
    }

    /// The owner field for `entity_type`, falling back to the default.
    pub fn owner_field(&self, entity_type: &str) -> &str {
        self.get(entity_type)
            .map(|r| r.owner_field.as_str())
            .unwrap_or(DEFAULT_OWNER_FIELD)
    }
}

/// Ownership predicate that reads the registered owner field from an
/// `EntityDirectory`.
///
/// An authority owns an instance target when the target's owner field
/// equals the authority id (and the authority type matches the registered
/// owner type, if any).  Class and simple targets are never owned.
#[derive(Clone)]
pub struct RegistryOwnership {
    registry: Arc<TypeRegistry>,
    directory: Arc<dyn EntityDirectory>,
}

impl RegistryOwnership {
    pub fn new(registry: Arc<TypeRegistry>, directory: Arc<dyn EntityDirectory>) -> Self {
        Self { registry, directory }
    }
}

impl OwnershipPredicate for RegistryOwnership {
    fn is_owned_by(&self, authority: &EntityRef, target: &Target) -> bool {
        let Target::Instance(entity) = target else {
            return false;
        };

        if let Some(owner_type) = self
            .registry
            .get(&entity.entity_type)
            .and_then(|r| r.owner_type.as_deref())
        {
            if owner_type != authority.entity_type {
                return false;
            }
        }

        let field = self.registry.owner_field(&entity.entity_type);
        let owned = self
            .directory
            .attribute(entity, field)
            .is_some_and(|owner_id| owner_id == authority.id);

        debug!(
            authority = %authority,
            target = %entity,
            owner_field = field,
            owned,
            "ownership checked"
        );
        owned
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct FixedDirectory(HashMap<(EntityRef, String), String>);

    impl EntityDirectory for FixedDirectory {
        fn attribute(&self, entity: &EntityRef, field: &str) -> Option<String> {
            self.0.get(&(entity.clone(), field.to_string())).cloned()
        }
    }

    fn ownership(registry: TypeRegistry) -> RegistryOwnership {
        let mut attrs = HashMap::new();
        attrs.insert((EntityRef::new("Post", "1"), "author_id".to_string()), "10".to_string());
        attrs.insert((EntityRef::new("Note", "1"), "user_id".to_string()), "10".to_string());
        RegistryOwnership::new(Arc::new(registry), Arc::new(FixedDirectory(attrs)))
    }

    #[test]
    fn registered_owner_field_is_compared_to_authority_id() {
        let o = ownership(TypeRegistry::new().with_type("Post", TypeRegistration::new("author_id")));
        let post = Target::instance("Post", "1");
        assert!(o.is_owned_by(&EntityRef::new("User", "10"), &post));
        assert!(!o.is_owned_by(&EntityRef::new("User", "11"), &post));
    }

    #[test]
    fn unregistered_types_use_default_owner_field() {
        let o = ownership(TypeRegistry::new());
        assert!(o.is_owned_by(&EntityRef::new("User", "10"), &Target::instance("Note", "1")));
        // Post has no `user_id` attribute.
        assert!(!o.is_owned_by(&EntityRef::new("User", "10"), &Target::instance("Post", "1")));
    }

    #[test]
    fn owner_type_must_match_when_registered() {
        let o = ownership(
            TypeRegistry::new()
                .with_type("Post", TypeRegistration::new("author_id").owned_by_type("User")),
        );
        let post = Target::instance("Post", "1");
        assert!(o.is_owned_by(&EntityRef::new("User", "10"), &post));
        assert!(!o.is_owned_by(&EntityRef::new("Team", "10"), &post));
    }

    #[test]
    fn non_instance_targets_are_never_owned() {
        let o = ownership(TypeRegistry::new().with_type("Post", TypeRegistration::new("author_id")));
        let user = EntityRef::new("User", "10");
        assert!(!o.is_owned_by(&user, &Target::class("Post")));
        assert!(!o.is_owned_by(&user, &Target::None));
    }
}
