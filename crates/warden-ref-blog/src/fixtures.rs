//! Simulated publishing-platform data for the WARDEN reference runtime.
//!
//! Everything here is fictional and in-memory.  `BLOG_SEED` is the TOML
//! fixture shared by the scenarios and the demo's `check` command.

use std::sync::Arc;

use warden_contracts::{
    entity::{EntityRef, Target},
    error::WardenResult,
};
use warden_core::{traits::CacheInvalidator, RegistryOwnership, Resolver};
use warden_roles::{GrantManager, RoleAssignmentManager};
use warden_store::{SeedConfig, SeededWorld};

pub const BLOG_SEED: &str = include_str!("../seeds/blog.toml");

/// Build a fresh world from `BLOG_SEED`.
pub fn blog_world() -> WardenResult<SeededWorld> {
    SeedConfig::from_toml_str(BLOG_SEED)?.build()
}

pub fn user(id: &str) -> EntityRef {
    EntityRef::new("User", id)
}

pub fn post(id: &str) -> Target {
    Target::instance("Post", id)
}

/// A resolver over `world`, with ownership read from its registry and
/// directory.
pub fn resolver_for(world: &SeededWorld) -> Resolver {
    let ownership = RegistryOwnership::new(
        Arc::new(world.registry.clone()),
        Arc::new(world.directory.clone()),
    );
    Resolver::new(Arc::new(world.store.clone()), Arc::new(ownership)).with_scope(world.scope.clone())
}

/// A role assignment manager over `world` that refreshes `cache`.
pub fn manager_for(world: &SeededWorld, cache: Arc<dyn CacheInvalidator>) -> RoleAssignmentManager {
    RoleAssignmentManager::new(Arc::new(world.store.clone()), cache).with_scope(world.scope.clone())
}

/// A grant manager over `world` that refreshes `cache`.
pub fn grants_for(world: &SeededWorld, cache: Arc<dyn CacheInvalidator>) -> GrantManager {
    GrantManager::new(Arc::new(world.store.clone()), cache).with_scope(world.scope.clone())
}
