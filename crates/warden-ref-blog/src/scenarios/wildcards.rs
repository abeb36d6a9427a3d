//! Scenario 4: Wildcard Abilities
//!
//! Administrators hold `*` with no entity type, which covers every simple
//! ability and nothing model-scoped.  Moderators hold `hide` on entity type
//! `*`, which covers every model class and instance.

use warden_contracts::{
    decision::{CheckRequest, Decision},
    entity::Target,
    error::WardenResult,
};

use super::{check, print_outcomes, CheckOutcome};
use crate::fixtures::{blog_world, post, resolver_for, user};

pub fn outcomes() -> WardenResult<Vec<CheckOutcome>> {
    let world = blog_world()?;
    let resolver = resolver_for(&world);
    let admin = user("9");
    let moderator = user("8");

    Ok(vec![
        check(
            &resolver,
            "`*` covers a known simple ability",
            CheckRequest::simple(admin.clone(), "access-dashboard"),
            Decision::Allowed,
        )?,
        check(
            &resolver,
            "`*` covers any simple ability",
            CheckRequest::simple(admin.clone(), "ban-users"),
            Decision::Allowed,
        )?,
        check(
            &resolver,
            "`*` does not reach model abilities",
            CheckRequest::new(admin, "edit", post("1")),
            Decision::Unspecified,
        )?,
        check(
            &resolver,
            "type `*` covers a post",
            CheckRequest::new(moderator.clone(), "hide", post("1")),
            Decision::Allowed,
        )?,
        check(
            &resolver,
            "type `*` covers a comment",
            CheckRequest::new(moderator.clone(), "hide", Target::instance("Comment", "7")),
            Decision::Allowed,
        )?,
        check(
            &resolver,
            "type `*` covers a class",
            CheckRequest::new(moderator.clone(), "hide", Target::class("Post")),
            Decision::Allowed,
        )?,
        check(
            &resolver,
            "type `*` keeps its name",
            CheckRequest::new(moderator, "delete", post("1")),
            Decision::Unspecified,
        )?,
    ])
}

pub fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 4: Wildcard Abilities ===");
    println!();
    print_outcomes(&outcomes()?);
    Ok(())
}
