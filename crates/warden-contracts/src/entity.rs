//! Entity references, request targets, and store scopes.
//!
//! Authorities and targets are both addressed by a `(type, id)` pair.  The
//! engine never interprets the type tag beyond equality and the `"*"`
//! wildcard; hosts map tags to concrete models through the type registry.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{WardenError, WardenResult};

/// The wildcard value accepted in ability names and ability entity types.
pub const WILDCARD: &str = "*";

/// A polymorphic reference to one entity instance.
///
/// Used uniformly for authorities (the principal asking) and for targets
/// (the entity acted upon).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    /// Type tag, e.g. `"User"` or `"Post"`.
    pub entity_type: String,
    /// Identifier within the type, e.g. `"42"`.
    pub id: String,
}

impl EntityRef {
    /// Construct a reference from any string-like type tag and id.
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Parse the `Type:id` notation used by seed files and the CLI.
    ///
    /// Returns `WardenError::InvalidTarget` when either half is missing.
    pub fn parse(s: &str) -> WardenResult<Self> {
        match s.split_once(':') {
            Some((ty, id)) if !ty.is_empty() && !id.is_empty() => Ok(Self::new(ty, id)),
            _ => Err(WardenError::InvalidTarget {
                reason: format!("expected 'Type:id', got '{}'", s),
            }),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}

/// What an ability request is aimed at.
///
/// ```text
/// None              → a simple (non-model) ability, e.g. "access-dashboard"
/// Class("Post")     → the Post model as a whole, e.g. "create" posts
/// Instance(Post:5)  → one specific post
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    #[default]
    None,
    Class(String),
    Instance(EntityRef),
}

impl Target {
    /// Shorthand for `Target::Class`.
    pub fn class(entity_type: impl Into<String>) -> Self {
        Target::Class(entity_type.into())
    }

    /// Shorthand for `Target::Instance`.
    pub fn instance(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Target::Instance(EntityRef::new(entity_type, id))
    }

    /// Build a target from loosely-typed parts, as they arrive from an
    /// outer surface.
    ///
    /// Both absent yields `Target::None`, both present yields
    /// `Target::Instance`.  Exactly one present is malformed.
    pub fn from_parts(entity_type: Option<&str>, entity_id: Option<&str>) -> WardenResult<Self> {
        let target = match (entity_type, entity_id) {
            (None, None) => Target::None,
            (Some(ty), Some(id)) => Target::instance(ty, id),
            (Some(ty), None) => {
                return Err(WardenError::InvalidTarget {
                    reason: format!("target type '{}' given without an id", ty),
                })
            }
            (None, Some(id)) => {
                return Err(WardenError::InvalidTarget {
                    reason: format!("target id '{}' given without a type", id),
                })
            }
        };
        target.validate()?;
        Ok(target)
    }

    /// Parse CLI notation: empty → `None`, `Type` → `Class`, `Type:id` → `Instance`.
    pub fn parse(s: &str) -> WardenResult<Self> {
        if s.is_empty() {
            return Ok(Target::None);
        }
        let target = if s.contains(':') {
            Target::Instance(EntityRef::parse(s)?)
        } else {
            Target::class(s)
        };
        target.validate()?;
        Ok(target)
    }

    /// Reject targets with empty or wildcard components.
    ///
    /// Called by the resolver and the assignment manager before any store
    /// query is issued.
    pub fn validate(&self) -> WardenResult<()> {
        let (ty, id) = match self {
            Target::None => return Ok(()),
            Target::Class(ty) => (ty.as_str(), None),
            Target::Instance(e) => (e.entity_type.as_str(), Some(e.id.as_str())),
        };
        if ty.is_empty() || ty == WILDCARD {
            return Err(WardenError::InvalidTarget {
                reason: format!("target type must be a concrete type tag, got '{}'", ty),
            });
        }
        if id.is_some_and(str::is_empty) {
            return Err(WardenError::InvalidTarget {
                reason: format!("target of type '{}' has an empty id", ty),
            });
        }
        Ok(())
    }

    /// The target's type tag, if it has one.
    pub fn entity_type(&self) -> Option<&str> {
        match self {
            Target::None => None,
            Target::Class(ty) => Some(ty),
            Target::Instance(e) => Some(&e.entity_type),
        }
    }

    /// The target's instance id, if it names an instance.
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            Target::Instance(e) => Some(&e.id),
            _ => None,
        }
    }

    /// True for `Target::None`.
    pub fn is_none(&self) -> bool {
        matches!(self, Target::None)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::None => f.write_str("-"),
            Target::Class(ty) => f.write_str(ty),
            Target::Instance(e) => e.fmt(f),
        }
    }
}

impl From<EntityRef> for Target {
    fn from(entity: EntityRef) -> Self {
        Target::Instance(entity)
    }
}

/// An opaque tenant/partition tag applied to every store read and write.
///
/// The engine threads it through unmodified.  `Scope::default()` is the
/// unscoped partition; records written there are invisible to any tenant
/// scope and vice versa.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Scope(pub Option<String>);

impl Scope {
    /// A scope restricted to the named tenant.
    pub fn tenant(name: impl Into<String>) -> Self {
        Self(Some(name.into()))
    }

    /// Return true if a record written under `record_scope` is visible here.
    pub fn admits(&self, record_scope: &Scope) -> bool {
        self == record_scope
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(tenant) => f.write_str(tenant),
            None => f.write_str("<unscoped>"),
        }
    }
}
