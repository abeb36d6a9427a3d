//! Grant collection across the three grant sources.
//!
//! For one authority and one request, the collector gathers candidate
//! grants of a single polarity (allow or forbid) from:
//!
//! 1. **Direct** permissions held by the authority itself.
//! 2. **Everyone** permissions.
//! 3. **Role** permissions held by roles assigned to the authority, where
//!    the assignment's restriction is compatible with the request target.
//!
//! Each source is described by a named filter struct whose predicates are
//! pure and testable on their own.  The collector only fetches rows from
//! the store and runs them through the filters.
//!
//! Role-sourced grants are reported with their entity fields replaced by
//! the assignment restriction: how a role was assigned decides which
//! target it applies to, not the ability record.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use warden_contracts::{
    ability::{Ability, AbilityId, Grantee, Permission},
    decision::GrantSource,
    entity::{EntityRef, Scope, Target},
    error::WardenResult,
    role::{RoleAssignment, RoleId},
};

use crate::{
    matcher::{self, OwnershipGate},
    traits::GrantStore,
};

/// Everything the collector needs to know about one request.
#[derive(Debug, Clone)]
pub struct GrantQuery {
    pub authority: EntityRef,
    /// Requested ability name. `None` lists every grant for the target.
    pub ability: Option<String>,
    pub target: Target,
    /// Collect forbid grants (`true`) or allow grants (`false`).
    pub forbidden: bool,
    /// Whether the authority owns the target, computed once up front.
    pub owned: bool,
}

impl GrantQuery {
    /// Coarse owner filter applied to every source: non-owners never see
    /// owner-only abilities as candidates.
    pub fn passes_owner_filter(&self, ability: &Ability) -> bool {
        self.owned || !ability.only_owned
    }

    /// Shared applicability check for an (effective) ability.
    fn applies(&self, ability: &Ability, gate: OwnershipGate) -> bool {
        if !self.passes_owner_filter(ability) {
            return false;
        }
        match (&self.ability, &self.target) {
            (None, Target::None) => true,
            (None, target) => gate.admits(ability) && matcher::matches_target(ability, target),
            (Some(name), target) => {
                (!target.is_none() || matcher::is_simple_candidate(ability))
                    && matcher::matches(ability, name, target, gate)
            }
        }
    }
}

/// One candidate grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedGrant {
    /// The ability, with entity fields substituted for role-sourced grants.
    pub ability: Ability,
    pub source: GrantSource,
}

// ── Filters ───────────────────────────────────────────────────────────────────

/// Permissions whose grantee is exactly the requesting authority.
#[derive(Debug, Clone, Copy)]
pub struct DirectGrantFilter<'q> {
    query: &'q GrantQuery,
}

impl<'q> DirectGrantFilter<'q> {
    pub fn new(query: &'q GrantQuery) -> Self {
        Self { query }
    }

    pub fn grantee(&self) -> Grantee {
        Grantee::Authority(self.query.authority.clone())
    }

    /// Direct grants honor `only_owned` through the matcher.
    pub fn admits(&self, ability: &Ability) -> bool {
        self.query.applies(ability, OwnershipGate::from_owned(self.query.owned))
    }
}

/// Permissions granted to everyone.
#[derive(Debug, Clone, Copy)]
pub struct EveryoneGrantFilter<'q> {
    query: &'q GrantQuery,
}

impl<'q> EveryoneGrantFilter<'q> {
    pub fn new(query: &'q GrantQuery) -> Self {
        Self { query }
    }

    pub fn grantee(&self) -> Grantee {
        Grantee::Everyone
    }

    pub fn admits(&self, ability: &Ability) -> bool {
        self.query.applies(ability, OwnershipGate::from_owned(self.query.owned))
    }
}

/// Permissions inherited through role assignments.
#[derive(Debug, Clone, Copy)]
pub struct RoleGrantFilter<'q> {
    query: &'q GrantQuery,
}

impl<'q> RoleGrantFilter<'q> {
    pub fn new(query: &'q GrantQuery) -> Self {
        Self { query }
    }

    /// Whether an assignment's restriction is compatible with the target.
    ///
    /// | target             | admitted assignments                              |
    /// |--------------------|---------------------------------------------------|
    /// | `Instance(T, I)`   | unrestricted, restricted to `T:I`, or to class `T` |
    /// | `Class(T)`         | unrestricted, or restricted to class `T`          |
    /// | `None`, named      | unrestricted only                                 |
    /// | `None`, unnamed    | all (listing)                                     |
    pub fn admits_assignment(&self, assignment: &RoleAssignment) -> bool {
        if assignment.is_unrestricted() {
            return true;
        }
        let restricted_type = assignment.restricted_to_type.as_deref();
        let restricted_id = assignment.restricted_to_id.as_deref();
        match &self.query.target {
            Target::Instance(entity) => {
                restricted_type == Some(entity.entity_type.as_str())
                    && restricted_id.map_or(true, |id| id == entity.id)
            }
            Target::Class(ty) => restricted_type == Some(ty.as_str()) && restricted_id.is_none(),
            Target::None => self.query.ability.is_none(),
        }
    }

    /// The ability as it applies through `assignment`.
    ///
    /// A restricted assignment replaces the ability's entity fields with the
    /// restriction.  An unrestricted assignment keeps the ability as stored,
    /// but never grants an instance-bound ability to an instance request.
    pub fn effective_ability(&self, ability: &Ability, assignment: &RoleAssignment) -> Option<Ability> {
        if assignment.restricted_to_type.is_some() {
            let mut effective = ability.clone();
            effective.entity_type = assignment.restricted_to_type.clone();
            effective.entity_id = assignment.restricted_to_id.clone();
            return Some(effective);
        }
        if matches!(self.query.target, Target::Instance(_)) && ability.entity_id.is_some() {
            return None;
        }
        Some(ability.clone())
    }

    /// Role-sourced abilities are matched with ownership ignored.
    pub fn admits(&self, effective: &Ability) -> bool {
        self.query.applies(effective, OwnershipGate::Ignored)
    }
}

// ── Collector ─────────────────────────────────────────────────────────────────

/// Reads grants for one request from a `GrantStore`.
pub struct GrantCollector<'s> {
    store: &'s dyn GrantStore,
    scope: &'s Scope,
}

impl<'s> GrantCollector<'s> {
    pub fn new(store: &'s dyn GrantStore, scope: &'s Scope) -> Self {
        Self { store, scope }
    }

    /// All matching grants from every source, in source order.
    ///
    /// No duplicate suppression: the same ability may appear once per
    /// source or per role that grants it.
    pub fn collect(&self, query: &GrantQuery) -> WardenResult<Vec<CollectedGrant>> {
        let mut grants = self.direct(query)?;
        grants.extend(self.everyone(query)?);
        grants.extend(self.through_roles(query)?);
        Ok(grants)
    }

    /// The first matching grant, querying later sources only when earlier
    /// ones produced nothing.
    pub fn first(&self, query: &GrantQuery) -> WardenResult<Option<CollectedGrant>> {
        if let Some(grant) = self.direct(query)?.into_iter().next() {
            return Ok(Some(grant));
        }
        if let Some(grant) = self.everyone(query)?.into_iter().next() {
            return Ok(Some(grant));
        }
        Ok(self.through_roles(query)?.into_iter().next())
    }

    fn direct(&self, query: &GrantQuery) -> WardenResult<Vec<CollectedGrant>> {
        let filter = DirectGrantFilter::new(query);
        let abilities = self.abilities_granted_to(&[filter.grantee()], query.forbidden)?;
        Ok(abilities
            .into_iter()
            .filter(|a| filter.admits(a))
            .map(|ability| CollectedGrant {
                ability,
                source: GrantSource::Direct,
            })
            .collect())
    }

    fn everyone(&self, query: &GrantQuery) -> WardenResult<Vec<CollectedGrant>> {
        let filter = EveryoneGrantFilter::new(query);
        let abilities = self.abilities_granted_to(&[filter.grantee()], query.forbidden)?;
        Ok(abilities
            .into_iter()
            .filter(|a| filter.admits(a))
            .map(|ability| CollectedGrant {
                ability,
                source: GrantSource::Everyone,
            })
            .collect())
    }

    fn through_roles(&self, query: &GrantQuery) -> WardenResult<Vec<CollectedGrant>> {
        let filter = RoleGrantFilter::new(query);

        let assignments: Vec<RoleAssignment> = self
            .store
            .assignments_for(&query.authority, self.scope)?
            .into_iter()
            .filter(|a| filter.admits_assignment(a))
            .collect();
        if assignments.is_empty() {
            return Ok(Vec::new());
        }

        let role_ids: BTreeSet<RoleId> = assignments.iter().map(|a| a.role_id).collect();
        let grantees: Vec<Grantee> = role_ids.iter().copied().map(Grantee::Role).collect();
        let permissions = self.store.permissions_for(&grantees, query.forbidden, self.scope)?;

        let mut by_role: BTreeMap<RoleId, Vec<AbilityId>> = BTreeMap::new();
        for permission in &permissions {
            if let Grantee::Role(role_id) = permission.grantee {
                by_role.entry(role_id).or_default().push(permission.ability_id);
            }
        }
        let abilities = self.abilities_by_id(&permissions)?;

        let mut grants = Vec::new();
        for assignment in &assignments {
            let Some(ability_ids) = by_role.get(&assignment.role_id) else {
                continue;
            };
            for ability_id in ability_ids {
                let Some(ability) = abilities.get(ability_id) else {
                    continue;
                };
                let Some(effective) = filter.effective_ability(ability, assignment) else {
                    continue;
                };
                if filter.admits(&effective) {
                    grants.push(CollectedGrant {
                        ability: effective,
                        source: GrantSource::Role,
                    });
                }
            }
        }

        debug!(
            authority = %query.authority,
            assignments = assignments.len(),
            grants = grants.len(),
            forbidden = query.forbidden,
            "collected role grants"
        );
        Ok(grants)
    }

    fn abilities_granted_to(&self, grantees: &[Grantee], forbidden: bool) -> WardenResult<Vec<Ability>> {
        let permissions = self.store.permissions_for(grantees, forbidden, self.scope)?;
        if permissions.is_empty() {
            return Ok(Vec::new());
        }
        let mut ids: Vec<AbilityId> = permissions.iter().map(|p| p.ability_id).collect();
        ids.sort();
        ids.dedup();
        self.store.abilities_by_ids(&ids, self.scope)
    }

    fn abilities_by_id(&self, permissions: &[Permission]) -> WardenResult<HashMap<AbilityId, Ability>> {
        let ids: Vec<AbilityId> = permissions
            .iter()
            .map(|p| p.ability_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(self
            .store
            .abilities_by_ids(&ids, self.scope)?
            .into_iter()
            .map(|a| (a.id, a))
            .collect())
    }
}
