//! # warden-roles
//!
//! Role assignment for WARDEN.
//!
//! `RoleAssignmentManager` links roles to authorities, optionally restricted
//! to a class or an instance, and removes those links again.  Every mutation
//! is idempotent and ends with a cache refresh for the affected authorities.
//!
//! `GrantManager` does the same for allow and forbid permissions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_roles::RoleAssignmentManager;
//!
//! let manager = RoleAssignmentManager::new(store, cache);
//! manager.assign(&["editor".into()], &[alice.clone()], &[Target::instance("User", "2")])?;
//! manager.retract(&["editor".into()], &[alice], &[Target::instance("User", "2")])?;
//! ```

pub mod grants;
pub mod manager;

pub use grants::GrantManager;
pub use manager::{AssignmentOutcome, RoleAssignmentManager};

// ── Tests ─────────────────────────────────────────────────────────────────────
