//! Scenario 2: Restricted Role Assignments
//!
//! Two sub-cases show how an assignment's restriction decides where a
//! role's grants apply:
//!
//! Sub-case A (instance restriction): role `editor` may `view-user` on any
//! `User`.  It is assigned to user 1 restricted to user 2, so user 1 may
//! view user 2 and nobody else.
//!
//! Sub-case B (class restriction): role `reviewer` holds the simple ability
//! `review`.  Assigned to user 4 restricted to the `Post` class, it lets
//! user 4 review every post, and nothing outside posts.

use std::sync::Arc;

use warden_contracts::{
    ability::{AbilitySpec, Grantee},
    decision::{CheckRequest, Decision},
    entity::{Scope, Target},
    error::WardenResult,
    role::RoleRef,
};
use warden_core::{
    traits::{NoCache, NoOwnership},
    Resolver,
};
use warden_roles::RoleAssignmentManager;
use warden_store::{GrantStoreExt, InMemoryGrantStore};

use super::{check, print_outcomes, CheckOutcome};
use crate::fixtures::{post, user};

pub fn build_store() -> WardenResult<InMemoryGrantStore> {
    let store = InMemoryGrantStore::new();
    let scope = Scope::default();

    let editor = store.role("editor", &scope)?;
    store.allow(
        Grantee::Role(editor.id),
        &AbilitySpec::on_class("view-user", "User"),
        &scope,
    )?;

    let reviewer = store.role("reviewer", &scope)?;
    store.allow(Grantee::Role(reviewer.id), &AbilitySpec::simple("review"), &scope)?;

    let manager = RoleAssignmentManager::new(Arc::new(store.clone()), Arc::new(NoCache));
    manager.assign(
        &[RoleRef::from(&editor)],
        &[user("1")],
        &[Target::instance("User", "2")],
    )?;
    manager.assign(&[RoleRef::from(&reviewer)], &[user("4")], &[Target::class("Post")])?;
    Ok(store)
}

pub fn outcomes() -> WardenResult<Vec<CheckOutcome>> {
    let resolver = Resolver::new(Arc::new(build_store()?), Arc::new(NoOwnership));

    Ok(vec![
        check(
            &resolver,
            "A: restricted target is allowed",
            CheckRequest::new(user("1"), "view-user", Target::instance("User", "2")),
            Decision::Allowed,
        )?,
        check(
            &resolver,
            "A: other instance of the type is not",
            CheckRequest::new(user("1"), "view-user", Target::instance("User", "3")),
            Decision::Unspecified,
        )?,
        check(
            &resolver,
            "A: the class as a whole is not",
            CheckRequest::new(user("1"), "view-user", Target::class("User")),
            Decision::Unspecified,
        )?,
        check(
            &resolver,
            "B: class restriction covers every post",
            CheckRequest::new(user("4"), "review", post("1")),
            Decision::Allowed,
        )?,
        check(
            &resolver,
            "B: and the class itself",
            CheckRequest::new(user("4"), "review", Target::class("Post")),
            Decision::Allowed,
        )?,
        check(
            &resolver,
            "B: but not other types",
            CheckRequest::new(user("4"), "review", Target::instance("Comment", "7")),
            Decision::Unspecified,
        )?,
        check(
            &resolver,
            "B: nor the unrestricted simple ability",
            CheckRequest::simple(user("4"), "review"),
            Decision::Unspecified,
        )?,
    ])
}

pub fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 2: Restricted Role Assignments ===");
    println!();
    print_outcomes(&outcomes()?);
    Ok(())
}
