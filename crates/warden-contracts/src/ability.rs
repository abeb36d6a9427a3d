//! Abilities, grantees, and permissions.
//!
//! An `Ability` names something that can be done, optionally tied to a
//! model type or instance.  A `Permission` grants (or forbids) one ability
//! to one grantee.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    entity::{EntityRef, Scope, WILDCARD},
    role::RoleId,
};

/// Store-assigned identifier of an ability record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbilityId(pub u64);

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named permission target.
///
/// Entity fields combine as follows:
///
/// | `entity_type` | `entity_id` | meaning                               |
/// |---------------|-------------|---------------------------------------|
/// | `None`        | `None`      | simple ability, no model involved     |
/// | `Some("*")`   | any         | the ability on every model type       |
/// | `Some(T)`     | `None`      | the ability on every instance of `T`  |
/// | `Some(T)`     | `Some(I)`   | the ability on instance `I` of `T`    |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub id: AbilityId,
    /// Ability name, or `"*"` for every name.
    pub name: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    /// When set, the ability only applies to targets the authority owns.
    #[serde(default)]
    pub only_owned: bool,
    /// Optional display title for admin tooling.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub scope: Scope,
}

impl Ability {
    /// True when the name is the `"*"` wildcard.
    pub fn is_wildcard_name(&self) -> bool {
        self.name == WILDCARD
    }

    /// True when the entity type is the `"*"` wildcard.
    pub fn is_global(&self) -> bool {
        self.entity_type.as_deref() == Some(WILDCARD)
    }

    /// True for a non-model ability: no entity type and no entity id.
    pub fn is_simple(&self) -> bool {
        self.entity_type.is_none() && self.entity_id.is_none()
    }
}

/// Attributes needed to look up or create an ability.
///
/// Identity is `(name, entity_type, entity_id, only_owned)` within a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AbilitySpec {
    pub name: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub only_owned: bool,
}

impl AbilitySpec {
    /// A simple ability with no model.
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The ability on every instance of `entity_type`.
    pub fn on_class(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_type: Some(entity_type.into()),
            ..Self::default()
        }
    }

    /// The ability on one instance.
    pub fn on_instance(name: impl Into<String>, entity: &EntityRef) -> Self {
        Self {
            name: name.into(),
            entity_type: Some(entity.entity_type.clone()),
            entity_id: Some(entity.id.clone()),
            ..Self::default()
        }
    }

    /// The ability on every model of every type.
    pub fn everywhere(name: impl Into<String>) -> Self {
        Self::on_class(name, WILDCARD)
    }

    /// Restrict the ability to owned targets.
    pub fn owned(mut self) -> Self {
        self.only_owned = true;
        self
    }

    /// Return true if `ability` has exactly these attributes.
    pub fn describes(&self, ability: &Ability) -> bool {
        self.name == ability.name
            && self.entity_type == ability.entity_type
            && self.entity_id == ability.entity_id
            && self.only_owned == ability.only_owned
    }
}

/// Who a permission is granted to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Grantee {
    /// One specific authority instance.
    Authority(EntityRef),
    /// A role; the grant reaches every authority the role is assigned to.
    Role(RoleId),
    /// Every authority.
    Everyone,
}

/// Store-assigned identifier of a permission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionId(pub u64);

/// An allow or forbid grant of one ability to one grantee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub ability_id: AbilityId,
    pub grantee: Grantee,
    /// `true` for a forbid grant, `false` for an allow grant.
    pub forbidden: bool,
    #[serde(default)]
    pub scope: Scope,
}
