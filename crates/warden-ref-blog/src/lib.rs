//! # warden-ref-blog
//!
//! Publishing-platform reference runtime for the WARDEN authorization engine.
//!
//! Demonstrates five resolution rules over fictional blog data:
//!
//! 1. **Forbid Precedence**: a forbid grant from any source beats every
//!    allow grant.
//! 2. **Restricted Role Assignments**: a role assigned to one instance or
//!    one class grants nothing elsewhere.
//! 3. **Ownership Gating**: owner-only abilities apply to the owner alone.
//! 4. **Wildcard Abilities**: `*` names and `*` entity types.
//! 5. **Assignment Lifecycle**: idempotent assign, retract, and cache
//!    refresh.
//!
//! All data is in-memory. No external systems are contacted.

pub mod fixtures;
pub mod scenarios;

use warden_contracts::error::WardenResult;

/// Run every scenario in order.
pub fn run_all() -> WardenResult<()> {
    scenarios::forbid_precedence::run_scenario()?;
    scenarios::restricted_roles::run_scenario()?;
    scenarios::ownership::run_scenario()?;
    scenarios::wildcards::run_scenario()?;
    scenarios::assignment_lifecycle::run_scenario()?;
    Ok(())
}
