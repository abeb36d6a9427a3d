//! Ability matching.
//!
//! Decides whether one stored `Ability` applies to a requested ability name
//! and target.  Pure functions only; the collector decides which abilities
//! are candidates in the first place.

use warden_contracts::{
    ability::Ability,
    entity::{Target, WILDCARD},
};

/// How `only_owned` abilities are treated for a candidate grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipGate {
    /// The authority owns the target; owner-only abilities may match.
    Owned,
    /// The authority does not own the target; owner-only abilities never match.
    NotOwned,
    /// Ownership is not consulted. Used for role-sourced grants.
    Ignored,
}

impl OwnershipGate {
    /// Gate for the direct and everyone sources, given the resolver's
    /// ownership check.
    pub fn from_owned(owned: bool) -> Self {
        if owned {
            OwnershipGate::Owned
        } else {
            OwnershipGate::NotOwned
        }
    }

    /// False only for an owner-only ability under `NotOwned`.
    pub fn admits(self, ability: &Ability) -> bool {
        !(ability.only_owned && self == OwnershipGate::NotOwned)
    }
}

/// True when the ability's name is `requested` or `"*"`.
pub fn matches_name(ability: &Ability, requested: &str) -> bool {
    ability.name == requested || ability.is_wildcard_name()
}

/// True when the ability's entity fields cover `target`.
///
/// - `None`: the ability must be simple or global.
/// - `Class(T)`: global, or type `T` with no instance id.
/// - `Instance(T, I)`: global, or type `T` with id `I` or no id.
pub fn matches_target(ability: &Ability, target: &Target) -> bool {
    if ability.is_global() {
        return true;
    }
    match target {
        Target::None => ability.entity_type.is_none(),
        Target::Class(ty) => {
            ability.entity_type.as_deref() == Some(ty.as_str()) && ability.entity_id.is_none()
        }
        Target::Instance(entity) => {
            ability.entity_type.as_deref() == Some(entity.entity_type.as_str())
                && ability
                    .entity_id
                    .as_deref()
                    .map_or(true, |id| id == entity.id)
        }
    }
}

/// The full match: name, target, and ownership gate.
pub fn matches(ability: &Ability, requested: &str, target: &Target, gate: OwnershipGate) -> bool {
    gate.admits(ability) && matches_name(ability, requested) && matches_target(ability, target)
}

/// True for abilities allowed to answer a no-target request.
///
/// Applied to every source whenever the request has no target, so that a
/// model-scoped ability never leaks into a simple-ability check.
pub fn is_simple_candidate(ability: &Ability) -> bool {
    matches!(ability.entity_type.as_deref(), None | Some(WILDCARD))
}
