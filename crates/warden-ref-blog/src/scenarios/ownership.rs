//! Scenario 3: Ownership Gating
//!
//! `edit` on `Post` and on `Comment` is granted to everyone, but only for
//! records the authority owns.  `Post` is registered with owner field
//! `author_id`; `Comment` with `user_id`.  Ownership is read from the
//! entity directory once per request.

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
    let comment = Target::instance("Comment", "7");

    Ok(vec![
        check(
            &resolver,
            "author edits own post",
            CheckRequest::new(user("1"), "edit", post("1")),
            Decision::Allowed,
        )?,
        check(
            &resolver,
            "non-owner cannot edit it",
            CheckRequest::new(user("2"), "edit", post("1")),
            Decision::Unspecified,
        )?,
        check(
            &resolver,
            "second author edits their own post",
            CheckRequest::new(user("2"), "edit", post("2")),
            Decision::Allowed,
        )?,
        check(
            &resolver,
            "commenter edits own comment",
            CheckRequest::new(user("3"), "edit", comment.clone()),
            Decision::Allowed,
        )?,
        check(
            &resolver,
            "author cannot edit someone's comment",
            CheckRequest::new(user("1"), "edit", comment),
            Decision::Unspecified,
        )?,
        check(
            &resolver,
            "class-level edit is never owned",
            CheckRequest::new(user("1"), "edit", Target::class("Post")),
            Decision::Unspecified,
        )?,
    ])
}

pub fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 3: Ownership Gating ===");
    println!();
    print_outcomes(&outcomes()?);
    Ok(())
}
