//! Scenario 1: Forbid Precedence
//!
//! User 1 is an author, and authors may `edit-post` any post.  User 1 is
//! also forbidden `edit-post` directly.  The forbid wins on every post,
//! while user 2, an author without the forbid, keeps the ability.
//!
//! A second sub-case forbids `ban-users` to everyone while allowing it
//! directly to user 3: the everyone-forbid still wins.

use std::sync::Arc;

use warden_contracts::{
    ability::{AbilitySpec, Grantee},
    decision::{CheckRequest, Decision},
    entity::Scope,
    error::WardenResult,
    role::RoleRef,
};
use warden_core::{
    traits::{GrantStore, NoCache, NoOwnership},
    Resolver,
};
use warden_roles::RoleAssignmentManager;
use warden_store::{GrantStoreExt, InMemoryGrantStore};

use super::{check, print_outcomes, CheckOutcome};
use crate::fixtures::{post, user};

/// A store with the grants this scenario needs.
pub fn build_store() -> WardenResult<InMemoryGrantStore> {
    let store = InMemoryGrantStore::new();
    let scope = Scope::default();
    let edit_post = AbilitySpec::on_class("edit-post", "Post");

    let author = store.role("author", &scope)?;
    store.allow(Grantee::Role(author.id), &edit_post, &scope)?;
    store.forbid(Grantee::Authority(user("1")), &edit_post, &scope)?;

    let ban = AbilitySpec::simple("ban-users");
    store.allow(Grantee::Authority(user("3")), &ban, &scope)?;
    store.forbid(Grantee::Everyone, &ban, &scope)?;

    let store_handle: Arc<dyn GrantStore> = Arc::new(store.clone());
    RoleAssignmentManager::new(store_handle, Arc::new(NoCache)).assign(
        &[RoleRef::from(&author)],
        &[user("1"), user("2")],
        &[],
    )?;
    Ok(store)
}

pub fn outcomes() -> WardenResult<Vec<CheckOutcome>> {
    let store = build_store()?;
    let resolver = Resolver::new(Arc::new(store), Arc::new(NoOwnership));

    Ok(vec![
        check(
            &resolver,
            "direct forbid beats role allow",
            CheckRequest::new(user("1"), "edit-post", post("1")),
            Decision::Forbidden,
        )?,
        check(
            &resolver,
            "forbid applies to every post",
            CheckRequest::new(user("1"), "edit-post", post("42")),
            Decision::Forbidden,
        )?,
        check(
            &resolver,
            "other author keeps the role allow",
            CheckRequest::new(user("2"), "edit-post", post("1")),
            Decision::Allowed,
        )?,
        check(
            &resolver,
            "everyone forbid beats direct allow",
            CheckRequest::simple(user("3"), "ban-users"),
            Decision::Forbidden,
        )?,
        check(
            &resolver,
            "no grant at all is unspecified",
            CheckRequest::new(user("4"), "edit-post", post("1")),
            Decision::Unspecified,
        )?,
    ])
}

pub fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 1: Forbid Precedence ===");
    println!();
    print_outcomes(&outcomes()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use warden_core::traits::Authorizer;

    use super::*;

    #[test]
    fn every_check_holds() {
        for outcome in outcomes().unwrap() {
            assert!(outcome.holds(), "{}: got {:?}", outcome.label, outcome.decision);
        }
    }

    #[test]
    fn forbidden_request_reports_no_granting_ability() {
        let resolver = Resolver::new(Arc::new(build_store().unwrap()), Arc::new(NoOwnership));
        let request = CheckRequest::new(user("1"), "edit-post", post("1"));
        assert!(resolver.is_forbidden(&request).unwrap());
        assert!(!resolver.is_allowed(&request).unwrap());
        assert_eq!(resolver.check_get_id(&request).unwrap(), None);
    }

    #[test]
    fn allowed_request_reports_the_role_ability() {
        let store = build_store().unwrap();
        let expected = store
            .find_ability("edit-post", Some("Post"), None, &Scope::default())
            .unwrap()
            .map(|a| a.id);
        let resolver = Resolver::new(Arc::new(store), Arc::new(NoOwnership));

        let request = CheckRequest::new(user("2"), "edit-post", post("1"));
        assert_eq!(resolver.check_get_id(&request).unwrap(), expected);
    }
}
