//! Core trait definitions for the WARDEN engine.
//!
//! These traits are the seams between the decision logic and the host:
//!
//! - `GrantStore`        : durable abilities, permissions, roles, assignments
//! - `Authorizer`        : the resolver contract (base engine or a decorator)
//! - `CacheInvalidator`  : per-authority cache invalidation hooks
//! - `OwnershipPredicate`: "does this authority own that target?"
//! - `EntityDirectory`   : attribute lookup used by ownership registries
//!
//! Every store method takes the caller's `Scope` and must apply it as an
//! equality constraint; the engine never assumes a single-tenant store.

use warden_contracts::{
    ability::{Ability, AbilityId, AbilitySpec, Grantee, Permission},
    decision::{CheckRequest, Decision, Resolution},
    entity::{EntityRef, Scope, Target},
    error::WardenResult,
    role::{AssignmentKey, Role, RoleAssignment, RoleId},
};

/// Storage for the authorization data model.
///
/// Implementations must enforce uniqueness of `AssignmentKey` within a scope:
/// inserting a record whose key already exists is a silent no-op, so two
/// concurrent identical `assign` calls cannot both create a row.
pub trait GrantStore: Send + Sync {
    /// Look up an ability by its name and entity fields.
    fn find_ability(
        &self,
        name: &str,
        entity_type: Option<&str>,
        entity_id: Option<&str>,
        scope: &Scope,
    ) -> WardenResult<Option<Ability>>;

    /// Return the ability described by `spec`, creating it if necessary.
    fn find_or_create_ability(&self, spec: &AbilitySpec, scope: &Scope) -> WardenResult<Ability>;

    /// Fetch abilities by id. Unknown ids are skipped.
    fn abilities_by_ids(&self, ids: &[AbilityId], scope: &Scope) -> WardenResult<Vec<Ability>>;

    /// Return roles with the given names, creating any that are missing.
    fn find_or_create_roles(&self, names: &[String], scope: &Scope) -> WardenResult<Vec<Role>>;

    /// Return existing roles with the given names. Unknown names are skipped.
    fn roles_by_names(&self, names: &[String], scope: &Scope) -> WardenResult<Vec<Role>>;

    /// Return existing roles with the given ids. Unknown ids are skipped.
    fn roles_by_ids(&self, ids: &[RoleId], scope: &Scope) -> WardenResult<Vec<Role>>;

    /// Set the display title of an existing role.
    fn retitle_role(&self, role_id: RoleId, title: Option<String>, scope: &Scope) -> WardenResult<Role>;

    /// Set the display title of an existing ability.
    fn retitle_ability(
        &self,
        ability_id: AbilityId,
        title: Option<String>,
        scope: &Scope,
    ) -> WardenResult<Ability>;

    /// Record an allow (`forbidden = false`) or forbid grant.
    ///
    /// Granting an identical permission twice returns the existing record.
    fn create_permission(
        &self,
        ability_id: AbilityId,
        grantee: Grantee,
        forbidden: bool,
        scope: &Scope,
    ) -> WardenResult<Permission>;

    /// All permissions of the given polarity held by any of `grantees`.
    fn permissions_for(
        &self,
        grantees: &[Grantee],
        forbidden: bool,
        scope: &Scope,
    ) -> WardenResult<Vec<Permission>>;

    /// Every role assignment held by `authority`, restricted or not.
    fn assignments_for(&self, authority: &EntityRef, scope: &Scope) -> WardenResult<Vec<RoleAssignment>>;

    /// Assignments of any of `role_ids` to any of `authority_ids` of one type.
    fn existing_assignments(
        &self,
        role_ids: &[RoleId],
        authority_type: &str,
        authority_ids: &[String],
        scope: &Scope,
    ) -> WardenResult<Vec<RoleAssignment>>;

    /// Insert assignment records, skipping keys that already exist.
    ///
    /// Returns the number of rows actually inserted.
    fn insert_assignments(&self, records: Vec<RoleAssignment>) -> WardenResult<usize>;

    /// Delete every assignment whose key equals one of `keys` exactly.
    ///
    /// Returns the number of rows removed.
    fn delete_assignments(&self, keys: &[AssignmentKey], scope: &Scope) -> WardenResult<usize>;
}

/// The resolver contract.
///
/// Implemented by the base `Resolver` and by decorators such as a caching
/// layer; callers depend on this trait, never on a concrete engine.
pub trait Authorizer: Send + Sync {
    /// True iff at least one forbid grant matches the request.
    fn is_forbidden(&self, request: &CheckRequest) -> WardenResult<bool>;

    /// Resolve the request and report which ability granted it.
    fn resolution(&self, request: &CheckRequest) -> WardenResult<Resolution>;

    /// Resolve the request to `Allowed`, `Forbidden`, or `Unspecified`.
    fn resolve(&self, request: &CheckRequest) -> WardenResult<Decision> {
        Ok(self.resolution(request)?.decision)
    }

    /// True only for `Decision::Allowed`.
    fn is_allowed(&self, request: &CheckRequest) -> WardenResult<bool> {
        Ok(self.resolve(request)? == Decision::Allowed)
    }

    /// The id of the ability that allows the request, or `None` when the
    /// request is forbidden or unspecified.
    fn check_get_id(&self, request: &CheckRequest) -> WardenResult<Option<AbilityId>> {
        Ok(self.resolution(request)?.granted_by)
    }
}

/// Invalidation hooks for memoized decisions.
///
/// Invalidation is fire-and-forget: it cannot fail the mutation that
/// triggered it.
pub trait CacheInvalidator: Send + Sync {
    /// Drop every memoized decision for `authority`.
    fn refresh_for(&self, authority: &EntityRef);

    /// Drop every memoized decision.
    fn refresh_all(&self);
}

/// A `CacheInvalidator` for deployments without a cache.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl CacheInvalidator for NoCache {
    fn refresh_for(&self, _authority: &EntityRef) {}

    fn refresh_all(&self) {}
}

/// Decides whether an authority is the recognized owner of a target.
pub trait OwnershipPredicate: Send + Sync {
    /// Called once per request, before any grant is collected.
    fn is_owned_by(&self, authority: &EntityRef, target: &Target) -> bool;
}

/// An `OwnershipPredicate` under which nothing is ever owned.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOwnership;

impl OwnershipPredicate for NoOwnership {
    fn is_owned_by(&self, _authority: &EntityRef, _target: &Target) -> bool {
        false
    }
}

/// Read access to attributes of host entities.
pub trait EntityDirectory: Send + Sync {
    /// The value of `field` on `entity`, or `None` if either is unknown.
    fn attribute(&self, entity: &EntityRef, field: &str) -> Option<String>;
}
