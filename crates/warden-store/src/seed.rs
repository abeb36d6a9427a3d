//! TOML seed files.
//!
//! A `SeedConfig` describes a complete authorization fixture: entity type
//! registrations, the entity attributes ownership needs, roles, abilities,
//! permissions, and role assignments.  Seeds are used by the demo CLI and
//! by tests; production deployments write through a real `GrantStore`.
//!
//! Example:
//! ```toml
//! scope = "acme"
//!
//! [[types]]
//! name = "Post"
//! owner_field = "author_id"
//!
//! [[entities]]
//! entity = "Post:5"
//! attributes = { author_id = "1" }
//!
//! [[abilities]]
//! key = "edit-own-posts"
//! name = "edit"
//! entity_type = "Post"
//! only_owned = true
//!
//! [[permissions]]
//! ability = "edit-own-posts"
//! grantee = "role:author"
//! verdict = "allow"
//!
//! [[assignments]]
//! role = "author"
//! authority = "User:1"
//! restricted_to = "Post:5"   # optional; `Type` alone restricts to a class
//! ```

use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::info;

use warden_contracts::{
    ability::{Ability, AbilitySpec, Grantee},
    entity::{EntityRef, Scope, Target},
    error::{WardenError, WardenResult},
    role::RoleAssignment,
};
use warden_core::{
    ownership::{TypeRegistration, TypeRegistry},
    traits::GrantStore,
};

use crate::{directory::InMemoryEntityDirectory, grants::GrantStoreExt, memory::InMemoryGrantStore};

/// Whether a seeded permission allows or forbids its ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeedVerdict {
    #[default]
    Allow,
    Forbid,
}

/// An entity type registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedType {
    pub name: String,
    pub owner_field: String,
    #[serde(default)]
    pub owner_type: Option<String>,
}

/// Attributes of one host entity, in `Type:id` notation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedEntity {
    pub entity: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRole {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// An ability, addressed elsewhere in the seed by `key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAbility {
    /// Seed-local handle. Defaults to `name` when omitted.
    #[serde(default)]
    pub key: Option<String>,
    pub name: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub only_owned: bool,
    #[serde(default)]
    pub title: Option<String>,
}

impl SeedAbility {
    fn handle(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }

    fn spec(&self) -> AbilitySpec {
        AbilitySpec {
            name: self.name.clone(),
            entity_type: self.entity_type.clone(),
            entity_id: self.entity_id.clone(),
            only_owned: self.only_owned,
        }
    }
}

/// A permission. `grantee` is `"everyone"`, `"role:<name>"`, or `"Type:id"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPermission {
    pub ability: String,
    pub grantee: String,
    #[serde(default)]
    pub verdict: SeedVerdict,
}

/// A role assignment. `restricted_to` uses `Target::parse` notation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAssignment {
    pub role: String,
    pub authority: String,
    #[serde(default)]
    pub restricted_to: Option<String>,
}

/// The top-level structure deserialized from a TOML seed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Tenant scope every seeded row is written under.
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub types: Vec<SeedType>,
    #[serde(default)]
    pub entities: Vec<SeedEntity>,
    #[serde(default)]
    pub roles: Vec<SeedRole>,
    #[serde(default)]
    pub abilities: Vec<SeedAbility>,
    #[serde(default)]
    pub permissions: Vec<SeedPermission>,
    #[serde(default)]
    pub assignments: Vec<SeedAssignment>,
}

/// Counts of rows written by `SeedConfig::apply`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub abilities: usize,
    pub permissions: usize,
    pub assignments: usize,
}

/// A fully seeded in-memory world, ready to hand to a resolver.
#[derive(Debug)]
pub struct SeededWorld {
    pub store: InMemoryGrantStore,
    pub directory: InMemoryEntityDirectory,
    pub registry: TypeRegistry,
    pub scope: Scope,
    pub summary: SeedSummary,
}

impl SeedConfig {
    /// Parse `s` as a TOML seed.
    ///
    /// Returns `WardenError::Config` if the TOML is malformed or does not
    /// match the `SeedConfig` schema.
    pub fn from_toml_str(s: &str) -> WardenResult<Self> {
        toml::from_str(s).map_err(|e| WardenError::Config {
            reason: format!("failed to parse seed TOML: {}", e),
        })
    }

    /// Read the file at `path` and parse it as a TOML seed.
    pub fn from_file(path: &Path) -> WardenResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| WardenError::Config {
            reason: format!("failed to read seed file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The scope seeded rows are written under.
    pub fn scope(&self) -> Scope {
        Scope(self.scope.clone())
    }

    /// Register every seeded type in `registry`.
    pub fn register_types(&self, registry: &mut TypeRegistry) {
        for ty in &self.types {
            let mut registration = TypeRegistration::new(ty.owner_field.clone());
            registration.owner_type = ty.owner_type.clone();
            registry.register(ty.name.clone(), registration);
        }
    }

    /// Write seeded attributes into `directory`.
    pub fn load_entities(&self, directory: &InMemoryEntityDirectory) -> WardenResult<()> {
        for seeded in &self.entities {
            let entity = parse_entity(&seeded.entity)?;
            for (field, value) in &seeded.attributes {
                directory.set(entity.clone(), field.clone(), value.clone());
            }
        }
        Ok(())
    }

    /// Write roles, abilities, permissions, and assignments into `store`.
    ///
    /// Every reference is resolved before anything is written, so a seed
    /// that names an undeclared ability or a malformed entity fails without
    /// side effects.
    pub fn apply(&self, store: &dyn GrantStore) -> WardenResult<SeedSummary> {
        let scope = self.scope();

        let mut handles: HashMap<&str, &SeedAbility> = HashMap::new();
        for ability in &self.abilities {
            if handles.insert(ability.handle(), ability).is_some() {
                return Err(WardenError::Config {
                    reason: format!("duplicate ability key '{}'", ability.handle()),
                });
            }
        }

        let mut permissions = Vec::with_capacity(self.permissions.len());
        for p in &self.permissions {
            let ability = handles.get(p.ability.as_str()).ok_or_else(|| WardenError::Config {
                reason: format!("permission references unknown ability '{}'", p.ability),
            })?;
            permissions.push((*ability, parse_grantee(&p.grantee)?, p.verdict));
        }

        let mut assignments = Vec::with_capacity(self.assignments.len());
        for a in &self.assignments {
            let authority = parse_entity(&a.authority)?;
            let target = match &a.restricted_to {
                Some(t) => Target::parse(t).map_err(config_error)?,
                None => Target::None,
            };
            assignments.push((a.role.as_str(), authority, target));
        }

        let role_names: Vec<String> = self.roles.iter().map(|r| r.name.clone()).collect();
        let roles = store.find_or_create_roles(&role_names, &scope)?;
        for seeded in self.roles.iter().filter(|r| r.title.is_some()) {
            if let Some(role) = roles.iter().find(|r| r.name == seeded.name) {
                store.retitle_role(role.id, seeded.title.clone(), &scope)?;
            }
        }

        let mut created: HashMap<&str, Ability> = HashMap::new();
        for ability in &self.abilities {
            let mut stored = store.find_or_create_ability(&ability.spec(), &scope)?;
            if ability.title.is_some() {
                stored = store.retitle_ability(stored.id, ability.title.clone(), &scope)?;
            }
            created.insert(ability.handle(), stored);
        }

        for (ability, grantee, verdict) in &permissions {
            let grantee = match grantee {
                ParsedGrantee::Role(name) => Grantee::Role(store.role(name, &scope)?.id),
                ParsedGrantee::Authority(entity) => Grantee::Authority(entity.clone()),
                ParsedGrantee::Everyone => Grantee::Everyone,
            };
            match verdict {
                SeedVerdict::Allow => store.allow(grantee, &ability.spec(), &scope)?,
                SeedVerdict::Forbid => store.forbid(grantee, &ability.spec(), &scope)?,
            };
        }

        let mut records = Vec::with_capacity(assignments.len());
        for (role, authority, target) in assignments {
            let role = store.role(role, &scope)?;
            records.push(RoleAssignment::new(role.id, authority, &target, scope.clone()));
        }
        let inserted = store.insert_assignments(records)?;

        let summary = SeedSummary {
            abilities: created.len(),
            permissions: permissions.len(),
            assignments: inserted,
        };
        info!(
            scope = %scope,
            abilities = summary.abilities,
            permissions = summary.permissions,
            assignments = summary.assignments,
            "seed applied"
        );
        Ok(summary)
    }

    /// Build a fresh in-memory world from this seed.
    pub fn build(&self) -> WardenResult<SeededWorld> {
        let store = InMemoryGrantStore::new();
        let directory = InMemoryEntityDirectory::new();
        let mut registry = TypeRegistry::new();

        self.register_types(&mut registry);
        self.load_entities(&directory)?;
        let summary = self.apply(&store)?;

        Ok(SeededWorld {
            store,
            directory,
            registry,
            scope: self.scope(),
            summary,
        })
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

enum ParsedGrantee {
    Everyone,
    Role(String),
    Authority(EntityRef),
}

fn parse_grantee(s: &str) -> WardenResult<ParsedGrantee> {
    if s == "everyone" {
        return Ok(ParsedGrantee::Everyone);
    }
    if let Some(name) = s.strip_prefix("role:") {
        if name.is_empty() {
            return Err(WardenError::Config {
                reason: "grantee 'role:' is missing a role name".to_string(),
            });
        }
        return Ok(ParsedGrantee::Role(name.to_string()));
    }
    parse_entity(s).map(ParsedGrantee::Authority)
}

fn parse_entity(s: &str) -> WardenResult<EntityRef> {
    EntityRef::parse(s).map_err(config_error)
}

fn config_error(e: WardenError) -> WardenError {
    WardenError::Config {
        reason: e.to_string(),
    }
}
