//! In-memory implementation of `GrantStore`.
//!
//! `InMemoryGrantStore` is the reference implementation of the `GrantStore`
//! trait.  All rows live in `Vec`s behind one `Mutex`, so every operation,
//! including the check-then-insert of role assignments, is serialized.
//! The assignment uniqueness constraint is a `HashSet` of
//! `(Scope, AssignmentKey)`.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use tracing::debug;

use warden_contracts::{
    ability::{Ability, AbilityId, AbilitySpec, Grantee, Permission, PermissionId},
    entity::{EntityRef, Scope},
    error::{WardenError, WardenResult},
    role::{AssignmentKey, Role, RoleAssignment, RoleId},
};
use warden_core::traits::GrantStore;

// ── Internal mutable state ────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub(crate) struct InMemoryState {
    pub(crate) abilities: Vec<Ability>,
    pub(crate) roles: Vec<Role>,
    pub(crate) permissions: Vec<Permission>,
    pub(crate) assignments: Vec<RoleAssignment>,
    /// Uniqueness constraint over assignments.
    pub(crate) assignment_keys: HashSet<(Scope, AssignmentKey)>,
    next_ability: u64,
    next_role: u64,
    next_permission: u64,
}

impl InMemoryState {
    fn next_ability_id(&mut self) -> AbilityId {
        self.next_ability += 1;
        AbilityId(self.next_ability)
    }

    fn next_role_id(&mut self) -> RoleId {
        self.next_role += 1;
        RoleId(self.next_role)
    }

    fn next_permission_id(&mut self) -> PermissionId {
        self.next_permission += 1;
        PermissionId(self.next_permission)
    }
}

// ── Public store ──────────────────────────────────────────────────────────────

/// A thread-safe, in-memory grant store.
///
/// Clones share the same underlying rows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGrantStore {
    pub(crate) state: Arc<Mutex<InMemoryState>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: while unavailable, every operation returns
    /// `WardenError::Store`.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of assignment rows across all scopes.
    pub fn assignment_count(&self) -> usize {
        self.lock().map(|s| s.assignments.len()).unwrap_or_default()
    }

    /// Number of assignment rows in `scope`.
    pub fn assignment_count_in(&self, scope: &Scope) -> usize {
        self.lock()
            .map(|s| s.assignments.iter().filter(|a| scope.admits(&a.scope)).count())
            .unwrap_or_default()
    }

    /// Number of permission rows across all scopes.
    pub fn permission_count(&self) -> usize {
        self.lock().map(|s| s.permissions.len()).unwrap_or_default()
    }

    fn lock(&self) -> WardenResult<MutexGuard<'_, InMemoryState>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(WardenError::Store {
                reason: "in-memory store is marked unavailable".to_string(),
            });
        }
        self.state.lock().map_err(|e| WardenError::Store {
            reason: format!("grant store lock poisoned: {}", e),
        })
    }
}

// ── GrantStore impl ───────────────────────────────────────────────────────────

impl GrantStore for InMemoryGrantStore {
    fn find_ability(
        &self,
        name: &str,
        entity_type: Option<&str>,
        entity_id: Option<&str>,
        scope: &Scope,
    ) -> WardenResult<Option<Ability>> {
        let state = self.lock()?;
        Ok(state
            .abilities
            .iter()
            .find(|a| {
                scope.admits(&a.scope)
                    && a.name == name
                    && a.entity_type.as_deref() == entity_type
                    && a.entity_id.as_deref() == entity_id
            })
            .cloned())
    }

    fn find_or_create_ability(&self, spec: &AbilitySpec, scope: &Scope) -> WardenResult<Ability> {
        let mut state = self.lock()?;
        if let Some(existing) = state
            .abilities
            .iter()
            .find(|a| scope.admits(&a.scope) && spec.describes(a))
        {
            return Ok(existing.clone());
        }

        let ability = Ability {
            id: state.next_ability_id(),
            name: spec.name.clone(),
            entity_type: spec.entity_type.clone(),
            entity_id: spec.entity_id.clone(),
            only_owned: spec.only_owned,
            title: None,
            scope: scope.clone(),
        };
        debug!(ability_id = %ability.id, name = %ability.name, scope = %scope, "ability created");
        state.abilities.push(ability.clone());
        Ok(ability)
    }

    fn abilities_by_ids(&self, ids: &[AbilityId], scope: &Scope) -> WardenResult<Vec<Ability>> {
        let state = self.lock()?;
        Ok(state
            .abilities
            .iter()
            .filter(|a| scope.admits(&a.scope) && ids.contains(&a.id))
            .cloned()
            .collect())
    }

    fn find_or_create_roles(&self, names: &[String], scope: &Scope) -> WardenResult<Vec<Role>> {
        let mut state = self.lock()?;
        let mut roles = Vec::with_capacity(names.len());
        for name in names {
            if roles.iter().any(|r: &Role| &r.name == name) {
                continue;
            }
            let existing = state
                .roles
                .iter()
                .find(|r| scope.admits(&r.scope) && &r.name == name)
                .cloned();
            let role = match existing {
                Some(role) => role,
                None => {
                    let role = Role {
                        id: state.next_role_id(),
                        name: name.clone(),
                        title: None,
                        scope: scope.clone(),
                    };
                    debug!(role_id = %role.id, name = %role.name, scope = %scope, "role created");
                    state.roles.push(role.clone());
                    role
                }
            };
            roles.push(role);
        }
        Ok(roles)
    }

    fn roles_by_names(&self, names: &[String], scope: &Scope) -> WardenResult<Vec<Role>> {
        let state = self.lock()?;
        Ok(state
            .roles
            .iter()
            .filter(|r| scope.admits(&r.scope) && names.contains(&r.name))
            .cloned()
            .collect())
    }

    fn roles_by_ids(&self, ids: &[RoleId], scope: &Scope) -> WardenResult<Vec<Role>> {
        let state = self.lock()?;
        Ok(state
            .roles
            .iter()
            .filter(|r| scope.admits(&r.scope) && ids.contains(&r.id))
            .cloned()
            .collect())
    }

    fn retitle_role(&self, role_id: RoleId, title: Option<String>, scope: &Scope) -> WardenResult<Role> {
        let mut state = self.lock()?;
        let role = state
            .roles
            .iter_mut()
            .find(|r| r.id == role_id && scope.admits(&r.scope))
            .ok_or_else(|| WardenError::Store {
                reason: format!("role {} does not exist in scope {}", role_id, scope),
            })?;
        role.title = title;
        Ok(role.clone())
    }

    fn retitle_ability(
        &self,
        ability_id: AbilityId,
        title: Option<String>,
        scope: &Scope,
    ) -> WardenResult<Ability> {
        let mut state = self.lock()?;
        let ability = state
            .abilities
            .iter_mut()
            .find(|a| a.id == ability_id && scope.admits(&a.scope))
            .ok_or_else(|| WardenError::Store {
                reason: format!("ability {} does not exist in scope {}", ability_id, scope),
            })?;
        ability.title = title;
        Ok(ability.clone())
    }

    fn create_permission(
        &self,
        ability_id: AbilityId,
        grantee: Grantee,
        forbidden: bool,
        scope: &Scope,
    ) -> WardenResult<Permission> {
        let mut state = self.lock()?;
        if !state
            .abilities
            .iter()
            .any(|a| a.id == ability_id && scope.admits(&a.scope))
        {
            return Err(WardenError::Store {
                reason: format!("ability {} does not exist in scope {}", ability_id, scope),
            });
        }
        if let Some(existing) = state.permissions.iter().find(|p| {
            p.ability_id == ability_id
                && p.grantee == grantee
                && p.forbidden == forbidden
                && scope.admits(&p.scope)
        }) {
            return Ok(existing.clone());
        }

        let permission = Permission {
            id: state.next_permission_id(),
            ability_id,
            grantee,
            forbidden,
            scope: scope.clone(),
        };
        state.permissions.push(permission.clone());
        Ok(permission)
    }

    fn permissions_for(
        &self,
        grantees: &[Grantee],
        forbidden: bool,
        scope: &Scope,
    ) -> WardenResult<Vec<Permission>> {
        let state = self.lock()?;
        Ok(state
            .permissions
            .iter()
            .filter(|p| {
                p.forbidden == forbidden && scope.admits(&p.scope) && grantees.contains(&p.grantee)
            })
            .cloned()
            .collect())
    }

    fn assignments_for(&self, authority: &EntityRef, scope: &Scope) -> WardenResult<Vec<RoleAssignment>> {
        let state = self.lock()?;
        Ok(state
            .assignments
            .iter()
            .filter(|a| scope.admits(&a.scope) && &a.authority == authority)
            .cloned()
            .collect())
    }

    fn existing_assignments(
        &self,
        role_ids: &[RoleId],
        authority_type: &str,
        authority_ids: &[String],
        scope: &Scope,
    ) -> WardenResult<Vec<RoleAssignment>> {
        let state = self.lock()?;
        Ok(state
            .assignments
            .iter()
            .filter(|a| {
                scope.admits(&a.scope)
                    && role_ids.contains(&a.role_id)
                    && a.authority.entity_type == authority_type
                    && authority_ids.contains(&a.authority.id)
            })
            .cloned()
            .collect())
    }

    fn insert_assignments(&self, records: Vec<RoleAssignment>) -> WardenResult<usize> {
        let mut state = self.lock()?;
        let mut inserted = 0;
        for record in records {
            // A key that already exists is a conflicting insert: silently skipped.
            if state.assignment_keys.insert((record.scope.clone(), record.key())) {
                state.assignments.push(record);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn delete_assignments(&self, keys: &[AssignmentKey], scope: &Scope) -> WardenResult<usize> {
        let mut state = self.lock()?;
        let before = state.assignments.len();
        let doomed: HashSet<&AssignmentKey> = keys.iter().collect();

        let mut kept = Vec::with_capacity(before);
        let mut removed = Vec::new();
        for assignment in state.assignments.drain(..) {
            if scope.admits(&assignment.scope) && doomed.contains(&assignment.key()) {
                removed.push(assignment);
            } else {
                kept.push(assignment);
            }
        }
        state.assignments = kept;
        for assignment in &removed {
            state
                .assignment_keys
                .remove(&(assignment.scope.clone(), assignment.key()));
        }
        Ok(before - state.assignments.len())
    }
}
