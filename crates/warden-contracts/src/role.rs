//! Roles and role assignments.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{EntityRef, Scope, Target};

/// Store-assigned identifier of a role record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(pub u64);

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named bundle of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub scope: Scope,
}

/// How a caller refers to a role in assign/retract requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleRef {
    Id(RoleId),
    Name(String),
}

impl From<&str> for RoleRef {
    fn from(name: &str) -> Self {
        RoleRef::Name(name.to_string())
    }
}

impl From<String> for RoleRef {
    fn from(name: String) -> Self {
        RoleRef::Name(name)
    }
}

impl From<RoleId> for RoleRef {
    fn from(id: RoleId) -> Self {
        RoleRef::Id(id)
    }
}

impl From<&Role> for RoleRef {
    fn from(role: &Role) -> Self {
        RoleRef::Id(role.id)
    }
}

/// The link between a role and an authority.
///
/// With `restricted_to_type`/`restricted_to_id` set, the role's grants apply
/// to the authority only with respect to that target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role_id: RoleId,
    pub authority: EntityRef,
    pub restricted_to_type: Option<String>,
    pub restricted_to_id: Option<String>,
    #[serde(default)]
    pub scope: Scope,
    pub assigned_at: DateTime<Utc>,
}

impl RoleAssignment {
    /// Build an assignment record for `role_id` → `authority`, restricted to
    /// `target` (`Target::None` leaves it unrestricted).
    pub fn new(role_id: RoleId, authority: EntityRef, target: &Target, scope: Scope) -> Self {
        Self {
            role_id,
            authority,
            restricted_to_type: target.entity_type().map(str::to_string),
            restricted_to_id: target.entity_id().map(str::to_string),
            scope,
            assigned_at: Utc::now(),
        }
    }

    /// The uniqueness key of this record.
    pub fn key(&self) -> AssignmentKey {
        AssignmentKey {
            role_id: self.role_id,
            authority_id: self.authority.id.clone(),
            authority_type: self.authority.entity_type.clone(),
            restricted_to_id: self.restricted_to_id.clone(),
            restricted_to_type: self.restricted_to_type.clone(),
        }
    }

    /// True when the assignment carries no restriction at all.
    pub fn is_unrestricted(&self) -> bool {
        self.restricted_to_type.is_none() && self.restricted_to_id.is_none()
    }

    /// The restriction expressed as a `Target`.
    pub fn restriction(&self) -> Target {
        match (&self.restricted_to_type, &self.restricted_to_id) {
            (Some(ty), Some(id)) => Target::instance(ty.clone(), id.clone()),
            (Some(ty), None) => Target::class(ty.clone()),
            _ => Target::None,
        }
    }
}

/// The tuple that identifies an assignment: at most one record exists per
/// key within a scope.  Also used as an exact-match delete predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssignmentKey {
    pub role_id: RoleId,
    pub authority_id: String,
    pub authority_type: String,
    pub restricted_to_id: Option<String>,
    pub restricted_to_type: Option<String>,
}

impl AssignmentKey {
    /// The key for `role_id` → `authority` restricted to `target`.
    pub fn new(role_id: RoleId, authority: &EntityRef, target: &Target) -> Self {
        Self {
            role_id,
            authority_id: authority.id.clone(),
            authority_type: authority.entity_type.clone(),
            restricted_to_id: target.entity_id().map(str::to_string),
            restricted_to_type: target.entity_type().map(str::to_string),
        }
    }
}
