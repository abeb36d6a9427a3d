//! The WARDEN resolver: reduces collected grants to a single decision.
//!
//! Resolution order for every request:
//!
//!   validate target → ownership check → forbid grants → allow grants
//!
//! 1. A malformed target is rejected before any store query.
//! 2. Ownership of the target is decided once, up front.  Non-owners never
//!    see owner-only abilities as candidates.
//! 3. Any matching forbid grant yields `Forbidden`.  Allow grants are not
//!    consulted at all in that case.
//! 4. Otherwise the first matching allow grant yields `Allowed`, reporting
//!    the granting ability; no match yields `Unspecified`.

use std::sync::Arc;

use tracing::{debug, warn};

use warden_contracts::{
    decision::{CheckRequest, Resolution},
    entity::{EntityRef, Scope, Target},
    error::WardenResult,
};

use crate::{
    collector::{CollectedGrant, GrantCollector, GrantQuery},
    traits::{Authorizer, GrantStore, OwnershipPredicate},
};

/// The base `Authorizer` implementation, reading straight from a `GrantStore`.
///
/// Holds no mutable state; clone or share freely across threads.  Every
/// store call carries the resolver's `Scope`.
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn GrantStore>,
    ownership: Arc<dyn OwnershipPredicate>,
    scope: Scope,
}

impl Resolver {
    /// Create a resolver over `store` in the unscoped partition.
    pub fn new(store: Arc<dyn GrantStore>, ownership: Arc<dyn OwnershipPredicate>) -> Self {
        Self {
            store,
            ownership,
            scope: Scope::default(),
        }
    }

    /// Constrain every store query to `scope`.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The first forbid grant matching `request`, if any.
    pub fn forbidding_grant(&self, request: &CheckRequest) -> WardenResult<Option<CollectedGrant>> {
        let owned = self.prepare(request)?;
        self.first_grant(request, owned, true)
    }

    /// The first allow grant matching `request`, if any, ignoring forbids.
    pub fn allowing_grant(&self, request: &CheckRequest) -> WardenResult<Option<CollectedGrant>> {
        let owned = self.prepare(request)?;
        self.first_grant(request, owned, false)
    }

    /// Every allow grant held by `authority`, across all sources.
    ///
    /// Listing is not a decision: owner-only abilities and role grants of
    /// every restriction are reported.
    pub fn abilities_for(&self, authority: &EntityRef) -> WardenResult<Vec<CollectedGrant>> {
        self.list(authority, false)
    }

    /// Every forbid grant held by `authority`, across all sources.
    pub fn forbidden_abilities_for(&self, authority: &EntityRef) -> WardenResult<Vec<CollectedGrant>> {
        self.list(authority, true)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Validate the request and decide ownership.
    fn prepare(&self, request: &CheckRequest) -> WardenResult<bool> {
        if let Err(e) = request.target.validate() {
            warn!(
                authority = %request.authority,
                ability = %request.ability,
                error = %e,
                "rejecting request with invalid target"
            );
            return Err(e);
        }
        Ok(self.ownership.is_owned_by(&request.authority, &request.target))
    }

    fn first_grant(
        &self,
        request: &CheckRequest,
        owned: bool,
        forbidden: bool,
    ) -> WardenResult<Option<CollectedGrant>> {
        let query = GrantQuery {
            authority: request.authority.clone(),
            ability: Some(request.ability.clone()),
            target: request.target.clone(),
            forbidden,
            owned,
        };
        GrantCollector::new(self.store.as_ref(), &self.scope).first(&query)
    }

    fn list(&self, authority: &EntityRef, forbidden: bool) -> WardenResult<Vec<CollectedGrant>> {
        let query = GrantQuery {
            authority: authority.clone(),
            ability: None,
            target: Target::None,
            forbidden,
            owned: true,
        };
        GrantCollector::new(self.store.as_ref(), &self.scope).collect(&query)
    }
}

impl Authorizer for Resolver {
    fn is_forbidden(&self, request: &CheckRequest) -> WardenResult<bool> {
        Ok(self.forbidding_grant(request)?.is_some())
    }

    fn resolution(&self, request: &CheckRequest) -> WardenResult<Resolution> {
        let owned = self.prepare(request)?;

        if let Some(grant) = self.first_grant(request, owned, true)? {
            debug!(
                authority = %request.authority,
                ability = %request.ability,
                target = %request.target,
                forbidding_ability = %grant.ability.id,
                source = ?grant.source,
                "request forbidden"
            );
            return Ok(Resolution::forbidden());
        }

        let resolution = match self.first_grant(request, owned, false)? {
            Some(grant) => Resolution::allowed(grant.ability.id),
            None => Resolution::unspecified(),
        };

        debug!(
            authority = %request.authority,
            ability = %request.ability,
            target = %request.target,
            owned,
            decision = ?resolution.decision,
            "request resolved"
        );
        Ok(resolution)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
