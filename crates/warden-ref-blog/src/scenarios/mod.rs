//! Publishing-platform reference scenarios.
//!
//! Each scenario wires real WARDEN components (in-memory store, resolver,
//! assignment manager, cache) over fictional blog data and demonstrates one
//! resolution rule.  `outcomes()` returns the checks a scenario performs so
//! they can be asserted; `run_scenario()` prints them.

pub mod assignment_lifecycle;
pub mod forbid_precedence;
pub mod ownership;
pub mod restricted_roles;
pub mod wildcards;

use warden_contracts::{
    decision::{CheckRequest, Decision},
    error::WardenResult,
};
use warden_core::traits::Authorizer;

/// One check performed by a scenario, with the decision it should produce.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub label: &'static str,
    pub request: CheckRequest,
    pub decision: Decision,
    pub expected: Decision,
}

impl CheckOutcome {
    pub fn holds(&self) -> bool {
        self.decision == self.expected
    }
}

pub(crate) fn check(
    authorizer: &dyn Authorizer,
    label: &'static str,
    request: CheckRequest,
    expected: Decision,
) -> WardenResult<CheckOutcome> {
    let decision = authorizer.resolve(&request)?;
    Ok(CheckOutcome {
        label,
        request,
        decision,
        expected,
    })
}

pub(crate) fn print_outcomes(outcomes: &[CheckOutcome]) {
    for outcome in outcomes {
        println!(
            "  {:<44} {:>7} {:<16} {:<10} → {:<11} [{}]",
            outcome.label,
            outcome.request.authority.to_string(),
            outcome.request.ability,
            outcome.request.target.to_string(),
            format!("{:?}", outcome.decision),
            if outcome.holds() { "ok" } else { "UNEXPECTED" }
        );
    }
    let failed = outcomes.iter().filter(|o| !o.holds()).count();
    if failed == 0 {
        println!("  RESULT: all {} check(s) as expected", outcomes.len());
    } else {
        println!("  RESULT: {} of {} check(s) UNEXPECTED", failed, outcomes.len());
    }
    println!();
}
