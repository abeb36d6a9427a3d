//! The role assignment manager.
//!
//! Assigning is idempotent: the manager fetches the assignments that already
//! exist for the requested (role, authority) pairs, and skips every record
//! whose `AssignmentKey` is already present, including duplicates within the
//! same batch.  The store's uniqueness constraint backs this up against
//! concurrent identical calls; a record the store refuses as a conflict is
//! counted as skipped, not as a failure.
//!
//! Retracting deletes by exact key, one key per (role, authority, target)
//! combination.  Unknown role names are ignored.
//!
//! Both mutations invalidate the cache for every listed authority once the
//! store write has succeeded.

use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    sync::Arc,
};

use tracing::{debug, info};

use warden_contracts::{
    entity::{EntityRef, Scope, Target},
    error::{WardenError, WardenResult},
    role::{AssignmentKey, Role, RoleAssignment, RoleId, RoleRef},
};
use warden_core::traits::{CacheInvalidator, GrantStore};

/// Result of one `assign` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentOutcome {
    /// Records written by this call.
    pub inserted: usize,
    /// Combinations that already existed (or lost a concurrent insert race).
    pub skipped: usize,
}

/// Assigns roles to authorities and retracts them.
pub struct RoleAssignmentManager {
    store: Arc<dyn GrantStore>,
    cache: Arc<dyn CacheInvalidator>,
    scope: Scope,
}

impl RoleAssignmentManager {
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

    /// Assign every role in `roles` to every authority in `authorities`,
    /// once per target in `targets`.  An empty `targets` slice assigns the
    /// roles unrestricted.
    ///
    /// Roles referenced by name are created when missing.  Roles referenced
    /// by id must exist.
    ///
    /// # Errors
    ///
    /// `WardenError::InvalidTarget` if any target is malformed (nothing is
    /// written), `WardenError::Store` if a role id is unknown or the store
    /// fails.
    pub fn assign(
        &self,
        roles: &[RoleRef],
        authorities: &[EntityRef],
        targets: &[Target],
    ) -> WardenResult<AssignmentOutcome> {
        let targets = normalize_targets(targets)?;
        let role_ids = self.roles_for_assign(roles)?;
        if role_ids.is_empty() || authorities.is_empty() {
            return Ok(AssignmentOutcome::default());
        }

        let mut seen: HashSet<AssignmentKey> = HashSet::new();
        let mut records = Vec::new();
        let mut skipped = 0;

        for (authority_type, ids) in group_by_type(authorities) {
            let existing =
                self.store
                    .existing_assignments(&role_ids, &authority_type, &ids, &self.scope)?;
            seen.extend(existing.iter().map(RoleAssignment::key));

            for role_id in &role_ids {
                for id in &ids {
                    let authority = EntityRef::new(authority_type.clone(), id.clone());
                    for target in &targets {
                        if seen.insert(AssignmentKey::new(*role_id, &authority, target)) {
                            records.push(RoleAssignment::new(
                                *role_id,
                                authority.clone(),
                                target,
                                self.scope.clone(),
                            ));
                        } else {
                            skipped += 1;
                        }
                    }
                }
            }
        }

        let attempted = records.len();
        let inserted = if attempted == 0 {
            0
        } else {
            self.store.insert_assignments(records)?
        };
        let outcome = AssignmentOutcome {
            inserted,
            skipped: skipped + attempted.saturating_sub(inserted),
        };

        self.refresh(authorities);
        info!(
            scope = %self.scope,
            roles = role_ids.len(),
            authorities = authorities.len(),
            inserted = outcome.inserted,
            skipped = outcome.skipped,
            "roles assigned"
        );
        Ok(outcome)
    }

    /// Retract every role in `roles` from every authority in `authorities`
    /// for each target in `targets` (empty means the unrestricted
    /// assignment).  Returns the number of rows deleted.
    ///
    /// Role names that match no role are ignored; retracting something that
    /// was never assigned deletes nothing and is not an error.  The cache is
    /// refreshed for every listed authority either way.
    pub fn retract(
        &self,
        roles: &[RoleRef],
        authorities: &[EntityRef],
        targets: &[Target],
    ) -> WardenResult<usize> {
        let targets = normalize_targets(targets)?;
        let role_ids = self.roles_for_retract(roles)?;

        let mut keys = Vec::new();
        for role_id in &role_ids {
            for authority in authorities {
                for target in &targets {
                    keys.push(AssignmentKey::new(*role_id, authority, target));
                }
            }
        }

        let deleted = if keys.is_empty() {
            debug!(scope = %self.scope, "retract matched no roles; nothing to delete");
            0
        } else {
            self.store.delete_assignments(&keys, &self.scope)?
        };

        self.refresh(authorities);
        info!(
            scope = %self.scope,
            roles = role_ids.len(),
            authorities = authorities.len(),
            deleted,
            "roles retracted"
        );
        Ok(deleted)
    }

    /// The distinct roles assigned to `authority`, under any restriction,
    /// ordered by id.
    pub fn assigned_roles(&self, authority: &EntityRef) -> WardenResult<Vec<Role>> {
        let role_ids: BTreeSet<RoleId> = self
            .store
            .assignments_for(authority, &self.scope)?
            .into_iter()
            .map(|a| a.role_id)
            .collect();
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<RoleId> = role_ids.into_iter().collect();
        let mut roles = self.store.roles_by_ids(&ids, &self.scope)?;
        roles.sort_by_key(|r| r.id);
        Ok(roles)
    }

    /// True if `authority` holds any of `role_names` under exactly the
    /// restriction `target`.  `Target::None` matches only unrestricted
    /// assignments.
    pub fn is_assigned(
        &self,
        authority: &EntityRef,
        role_names: &[String],
        target: &Target,
    ) -> WardenResult<bool> {
        target.validate()?;
        let roles = self.store.roles_by_names(role_names, &self.scope)?;
        if roles.is_empty() {
            return Ok(false);
        }
        let ids: HashSet<RoleId> = roles.iter().map(|r| r.id).collect();
        Ok(self
            .store
            .assignments_for(authority, &self.scope)?
            .iter()
            .any(|a| ids.contains(&a.role_id) && &a.restriction() == target))
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn roles_for_assign(&self, roles: &[RoleRef]) -> WardenResult<Vec<RoleId>> {
        let (names, requested_ids) = split_refs(roles);
        let mut ids = BTreeSet::new();

        if !names.is_empty() {
            ids.extend(self.store.find_or_create_roles(&names, &self.scope)?.iter().map(|r| r.id));
        }
        if !requested_ids.is_empty() {
            let found: BTreeSet<RoleId> = self
                .store
                .roles_by_ids(&requested_ids, &self.scope)?
                .iter()
                .map(|r| r.id)
                .collect();
            if let Some(missing) = requested_ids.iter().find(|id| !found.contains(id)) {
                return Err(WardenError::Store {
                    reason: format!("role {} does not exist in scope {}", missing, self.scope),
                });
            }
            ids.extend(found);
        }
        Ok(ids.into_iter().collect())
    }

    fn roles_for_retract(&self, roles: &[RoleRef]) -> WardenResult<Vec<RoleId>> {
        let (names, requested_ids) = split_refs(roles);
        let mut ids: BTreeSet<RoleId> = requested_ids.into_iter().collect();
        if !names.is_empty() {
            ids.extend(self.store.roles_by_names(&names, &self.scope)?.iter().map(|r| r.id));
        }
        Ok(ids.into_iter().collect())
    }

    fn refresh(&self, authorities: &[EntityRef]) {
        let unique: BTreeSet<&EntityRef> = authorities.iter().collect();
        for authority in unique {
            self.cache.refresh_for(authority);
        }
    }
}

/// Validate `targets`, defaulting an empty list to the unrestricted marker.
fn normalize_targets(targets: &[Target]) -> WardenResult<Vec<Target>> {
    if targets.is_empty() {
        return Ok(vec![Target::None]);
    }
    for target in targets {
        target.validate()?;
    }
    Ok(targets.to_vec())
}

/// Group authority ids by type, deduplicated and sorted.
fn group_by_type(authorities: &[EntityRef]) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for authority in authorities {
        grouped
            .entry(authority.entity_type.clone())
            .or_default()
            .insert(authority.id.clone());
    }
    grouped
        .into_iter()
        .map(|(ty, ids)| (ty, ids.into_iter().collect()))
        .collect()
}

fn split_refs(roles: &[RoleRef]) -> (Vec<String>, Vec<RoleId>) {
    let mut names = Vec::new();
    let mut ids = Vec::new();
    for role in roles {
        match role {
            RoleRef::Name(name) => names.push(name.clone()),
            RoleRef::Id(id) => ids.push(*id),
        }
    }
    (names, ids)
}
