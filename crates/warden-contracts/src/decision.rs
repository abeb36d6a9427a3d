//! Decision and check-request types.
//!
//! The resolver consumes a `CheckRequest` and produces a `Resolution`.
//! Callers that only care about yes/no treat `Unspecified` as "not allowed".

use serde::{Deserialize, Serialize};

use crate::{
    ability::AbilityId,
    entity::{EntityRef, Target},
};

/// The outcome of resolving one ability request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    /// At least one allow grant matched and no forbid grant did.
    Allowed,
    /// At least one forbid grant matched. Always wins over allow grants.
    Forbidden,
    /// Nothing matched.
    Unspecified,
}

/// A decision plus the ability record that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub decision: Decision,
    /// The granting ability. Set only when `decision` is `Allowed`.
    pub granted_by: Option<AbilityId>,
}

impl Resolution {
    pub fn allowed(by: AbilityId) -> Self {
        Self {
            decision: Decision::Allowed,
            granted_by: Some(by),
        }
    }

    pub fn forbidden() -> Self {
        Self {
            decision: Decision::Forbidden,
            granted_by: None,
        }
    }

    pub fn unspecified() -> Self {
        Self {
            decision: Decision::Unspecified,
            granted_by: None,
        }
    }
}

/// Where a collected grant came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrantSource {
    /// Granted to the authority itself.
    Direct,
    /// Granted to everyone.
    Everyone,
    /// Inherited through a role assigned to the authority.
    Role,
}

/// "Can `authority` do `ability` on `target`?"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckRequest {
    pub authority: EntityRef,
    pub ability: String,
    #[serde(default)]
    pub target: Target,
}

impl CheckRequest {
    pub fn new(authority: EntityRef, ability: impl Into<String>, target: Target) -> Self {
        Self {
            authority,
            ability: ability.into(),
            target,
        }
    }

    /// A request for a simple (non-model) ability.
    pub fn simple(authority: EntityRef, ability: impl Into<String>) -> Self {
        Self::new(authority, ability, Target::None)
    }
}
