//! Cache-aware grant creation.
//!
//! `GrantManager` writes allow and forbid permissions through a `GrantStore`
//! and then invalidates the cache for everyone the new row can reach: the
//! named authority for a direct grant, every authority for a role or
//! everyone grant.

use std::sync::Arc;

use tracing::info;

use warden_contracts::{
    ability::{Ability, AbilitySpec, Grantee, Permission},
    entity::Scope,
    error::WardenResult,
};
use warden_core::traits::{CacheInvalidator, GrantStore};

/// Grants and forbids abilities, keeping a cache in step.
pub struct GrantManager {
    store: Arc<dyn GrantStore>,
    cache: Arc<dyn CacheInvalidator>,
    scope: Scope,
}

impl GrantManager {
    pub fn new(store: Arc<dyn GrantStore>, cache: Arc<dyn CacheInvalidator>) -> Self {
        Self {
            store,
            cache,
            scope: Scope::default(),
        }
    }

    /// Constrain every store call to `scope`.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Allow the ability described by `spec` to `grantee`, creating the
    /// ability if needed.
    pub fn allow(&self, grantee: Grantee, spec: &AbilitySpec) -> WardenResult<Ability> {
        self.grant(grantee, spec, false).map(|(ability, _)| ability)
    }

    /// Forbid the ability described by `spec` to `grantee`.
    pub fn forbid(&self, grantee: Grantee, spec: &AbilitySpec) -> WardenResult<Ability> {
        self.grant(grantee, spec, true).map(|(ability, _)| ability)
    }

    /// Create the permission row and refresh the cache.  A failed write
    /// refreshes nothing.
    pub fn grant(
        &self,
        grantee: Grantee,
        spec: &AbilitySpec,
        forbidden: bool,
    ) -> WardenResult<(Ability, Permission)> {
        let ability = self.store.find_or_create_ability(spec, &self.scope)?;
        let permission = self
            .store
            .create_permission(ability.id, grantee, forbidden, &self.scope)?;

        match &permission.grantee {
            Grantee::Authority(authority) => self.cache.refresh_for(authority),
            Grantee::Role(_) | Grantee::Everyone => self.cache.refresh_all(),
        }
        info!(
            scope = %self.scope,
            ability_id = %ability.id,
            name = %ability.name,
            forbidden,
            "grant recorded"
        );
        Ok((ability, permission))
    }
}
