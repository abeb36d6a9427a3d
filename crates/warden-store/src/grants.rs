//! Grant-creation helpers available on every `GrantStore`.
//!
//! These write straight to the store and invalidate no cache.  Use them to
//! seed a store before any authorizer reads it; go through
//! `warden_roles::GrantManager` once a cached authorizer is serving checks.

use warden_contracts::{
    ability::{Ability, AbilitySpec, Grantee},
    entity::Scope,
    error::{WardenError, WardenResult},
    role::Role,
};
use warden_core::traits::GrantStore;

/// Allow/forbid shorthands layered over the raw store operations.
pub trait GrantStoreExt: GrantStore {
    /// Allow the ability described by `spec` to `grantee`, creating the
    /// ability if needed.
    fn allow(&self, grantee: Grantee, spec: &AbilitySpec, scope: &Scope) -> WardenResult<Ability> {
        let ability = self.find_or_create_ability(spec, scope)?;
        self.create_permission(ability.id, grantee, false, scope)?;
        Ok(ability)
    }

    /// Forbid the ability described by `spec` to `grantee`.
    fn forbid(&self, grantee: Grantee, spec: &AbilitySpec, scope: &Scope) -> WardenResult<Ability> {
        let ability = self.find_or_create_ability(spec, scope)?;
        self.create_permission(ability.id, grantee, true, scope)?;
        Ok(ability)
    }

    /// Find or create a single role by name.
    fn role(&self, name: &str, scope: &Scope) -> WardenResult<Role> {
        let mut roles = self.find_or_create_roles(&[name.to_string()], scope)?;
        roles.pop().ok_or_else(|| WardenError::Store {
            reason: format!("store returned no role for '{}'", name),
        })
    }
}

impl<T: GrantStore + ?Sized> GrantStoreExt for T {}
