//! Scenario 5: Assignment Lifecycle
//!
//! A new user 5 joins as an author, behind a caching authorizer:
//!
//!   Step 1: check `access-dashboard`   → Unspecified (and cached)
//!   Step 2: assign `author` twice      → one assignment row
//!   Step 3: check again                → Allowed (the cache was refreshed)
//!   Step 4: retract `author`           → zero rows for the triple
//!   Step 5: check again                → Unspecified
//!   Step 6: forbid the dashboard to author user 1, whose Allowed is cached
//!                                      → Forbidden

use std::sync::Arc;

use warden_cache::CachedAuthorizer;
use warden_contracts::{
    ability::{AbilitySpec, Grantee},
    decision::{CheckRequest, Decision},
    entity::Target,
    error::WardenResult,
    role::RoleRef,
};

use super::{check, print_outcomes, CheckOutcome};
use crate::fixtures::{blog_world, grants_for, manager_for, resolver_for, user};

/// What the lifecycle observed.
#[derive(Debug, Clone)]
pub struct LifecycleReport {
    pub outcomes: Vec<CheckOutcome>,
    pub rows_before: usize,
    pub rows_after_assign: usize,
    pub rows_after_reassign: usize,
    pub rows_after_retract: usize,
    pub deleted: usize,
}

pub fn run_lifecycle() -> WardenResult<LifecycleReport> {
    let world = blog_world()?;
    let cached = CachedAuthorizer::new(resolver_for(&world));
    let manager = manager_for(&world, Arc::new(cached.clone()));
    let grants = grants_for(&world, Arc::new(cached.clone()));

    let newcomer = user("5");
    let author = [RoleRef::from("author")];
    let dashboard = || CheckRequest::simple(user("5"), "access-dashboard");
    let rows = || world.store.assignment_count_in(&world.scope);

    let mut outcomes = Vec::new();
    let rows_before = rows();

    outcomes.push(check(&cached, "before assignment", dashboard(), Decision::Unspecified)?);

    manager.assign(&author, &[newcomer.clone()], &[])?;
    let rows_after_assign = rows();
    manager.assign(&author, &[newcomer.clone()], &[])?;
    let rows_after_reassign = rows();

    outcomes.push(check(&cached, "after assignment", dashboard(), Decision::Allowed)?);

    let deleted = manager.retract(&author, &[newcomer], &[Target::None])?;
    let rows_after_retract = rows();

    outcomes.push(check(&cached, "after retraction", dashboard(), Decision::Unspecified)?);

    let veteran = || CheckRequest::simple(user("1"), "access-dashboard");
    outcomes.push(check(&cached, "author before forbid", veteran(), Decision::Allowed)?);
    grants.forbid(Grantee::Authority(user("1")), &AbilitySpec::simple("access-dashboard"))?;
    outcomes.push(check(&cached, "author after forbid", veteran(), Decision::Forbidden)?);

    Ok(LifecycleReport {
        outcomes,
        rows_before,
        rows_after_assign,
        rows_after_reassign,
        rows_after_retract,
        deleted,
    })
}

pub fn outcomes() -> WardenResult<Vec<CheckOutcome>> {
    Ok(run_lifecycle()?.outcomes)
}

pub fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 5: Assignment Lifecycle ===");
    println!();

    let report = run_lifecycle()?;
    println!("  Assignment rows before:          {}", report.rows_before);
    println!("  After first assign:              {}", report.rows_after_assign);
    println!("  After repeated assign:           {}", report.rows_after_reassign);
    println!(
        "  After retract:                   {} ({} deleted)",
        report.rows_after_retract, report.deleted
    );
    println!();
    print_outcomes(&report.outcomes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_check_holds() {
        for outcome in outcomes().unwrap() {
            assert!(outcome.holds(), "{}: got {:?}", outcome.label, outcome.decision);
        }
    }

    #[test]
    fn repeated_assignment_adds_one_row() {
        let report = run_lifecycle().unwrap();
        assert_eq!(report.rows_after_assign, report.rows_before + 1);
        assert_eq!(report.rows_after_reassign, report.rows_after_assign);
    }

    #[test]
    fn forbid_reaches_a_cached_allow() {
        let outcomes = outcomes().unwrap();
        let last = outcomes.last().unwrap();
        assert_eq!(last.label, "author after forbid");
        assert_eq!(last.decision, Decision::Forbidden);
    }

    #[test]
    fn retraction_restores_the_original_rows() {
        let report = run_lifecycle().unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(report.rows_after_retract, report.rows_before);
    }
}
