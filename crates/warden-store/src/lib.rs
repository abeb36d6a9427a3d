//! # warden-store
//!
//! In-memory persistence for WARDEN.
//!
//! ## Overview
//!
//! `InMemoryGrantStore` implements `GrantStore` over plain vectors behind a
//! single mutex, enforcing the role-assignment uniqueness key on insert.
//! `InMemoryEntityDirectory` holds the entity attributes the ownership
//! registry reads.  `SeedConfig` loads complete fixtures from TOML.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_store::SeedConfig;
//!
//! let world = SeedConfig::from_file(Path::new("blog.toml"))?.build()?;
//! let resolver = Resolver::new(Arc::new(world.store.clone()), ownership)
//!     .with_scope(world.scope.clone());
//! ```

pub mod directory;
pub mod grants;
pub mod memory;
pub mod seed;

pub use directory::InMemoryEntityDirectory;
pub use grants::GrantStoreExt;
pub use memory::InMemoryGrantStore;
pub use seed::{SeedConfig, SeedSummary, SeededWorld};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use warden_contracts::{
        ability::{AbilitySpec, Grantee},
        decision::{CheckRequest, Decision},
        entity::{EntityRef, Scope, Target},
        error::WardenError,
        role::{AssignmentKey, RoleAssignment},
    };
    use warden_core::{
        traits::{Authorizer, EntityDirectory, GrantStore},
        RegistryOwnership, Resolver,
    };

    use super::{GrantStoreExt, InMemoryEntityDirectory, InMemoryGrantStore, SeedConfig};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn user(id: &str) -> EntityRef {
        EntityRef::new("User", id)
    }

    const BLOG_SEED: &str = r#"
scope = "acme"

[[types]]
name = "Post"
owner_field = "author_id"

[[entities]]
entity = "Post:5"
attributes = { author_id = "1" }

[[roles]]
name = "author"
title = "Author"

[[abilities]]
key = "edit-own-posts"
name = "edit"
entity_type = "Post"
only_owned = true
title = "Edit own posts"

[[abilities]]
name = "publish"
entity_type = "Post"

[[permissions]]
ability = "edit-own-posts"
grantee = "role:author"

[[permissions]]
ability = "publish"
grantee = "User:2"
verdict = "forbid"

[[assignments]]
role = "author"
authority = "User:1"

[[assignments]]
role = "author"
authority = "User:2"
"#;

    // ── InMemoryGrantStore ────────────────────────────────────────────────────

    #[test]
    fn find_or_create_ability_is_idempotent_within_a_scope() {
        let store = InMemoryGrantStore::new();
        let scope = Scope::default();
        let spec = AbilitySpec::on_class("edit", "Post");

        let first = store.find_or_create_ability(&spec, &scope).unwrap();
        let second = store.find_or_create_ability(&spec, &scope).unwrap();
        assert_eq!(first.id, second.id);

        let found = store.find_ability("edit", Some("Post"), None, &scope).unwrap();
        assert_eq!(found.map(|a| a.id), Some(first.id));
        assert!(store.find_ability("edit", None, None, &scope).unwrap().is_none());
    }

    #[test]
    fn scopes_partition_abilities_and_roles() {
        let store = InMemoryGrantStore::new();
        let acme = Scope::tenant("acme");
        let globex = Scope::tenant("globex");

        let a = store.find_or_create_ability(&AbilitySpec::simple("ban"), &acme).unwrap();
        let b = store.find_or_create_ability(&AbilitySpec::simple("ban"), &globex).unwrap();
        assert_ne!(a.id, b.id);

        store.role("editor", &acme).unwrap();
        assert!(store.roles_by_names(&["editor".to_string()], &globex).unwrap().is_empty());
    }

    #[test]
    fn find_or_create_roles_collapses_repeated_names() {
        let store = InMemoryGrantStore::new();
        let names = vec!["editor".to_string(), "editor".to_string(), "admin".to_string()];
        let roles = store.find_or_create_roles(&names, &Scope::default()).unwrap();
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn create_permission_requires_an_existing_ability() {
        let store = InMemoryGrantStore::new();
        let err = store
            .create_permission(
                warden_contracts::ability::AbilityId(99),
                Grantee::Everyone,
                false,
                &Scope::default(),
            )
            .unwrap_err();
        assert!(matches!(err, WardenError::Store { .. }));
    }

    #[test]
    fn repeated_allow_does_not_duplicate_the_permission() {
        let store = InMemoryGrantStore::new();
        let spec = AbilitySpec::simple("ban-users");
        store.allow(Grantee::Authority(user("1")), &spec, &Scope::default()).unwrap();
        store.allow(Grantee::Authority(user("1")), &spec, &Scope::default()).unwrap();
        assert_eq!(store.permission_count(), 1);

        store.forbid(Grantee::Authority(user("1")), &spec, &Scope::default()).unwrap();
        assert_eq!(store.permission_count(), 2);
    }

    #[test]
    fn insert_assignments_skips_existing_keys() {
        let store = InMemoryGrantStore::new();
        let scope = Scope::default();
        let role = store.role("editor", &scope).unwrap();
        let target = Target::instance("User", "2");

        let record = RoleAssignment::new(role.id, user("1"), &target, scope.clone());
        assert_eq!(store.insert_assignments(vec![record.clone(), record.clone()]).unwrap(), 1);
        assert_eq!(store.insert_assignments(vec![record]).unwrap(), 0);
        assert_eq!(store.assignment_count(), 1);
    }

    #[test]
    fn delete_assignments_matches_exact_keys_only() {
        let store = InMemoryGrantStore::new();
        let scope = Scope::default();
        let role = store.role("editor", &scope).unwrap();

        store
            .insert_assignments(vec![
                RoleAssignment::new(role.id, user("1"), &Target::None, scope.clone()),
                RoleAssignment::new(role.id, user("1"), &Target::instance("User", "2"), scope.clone()),
            ])
            .unwrap();

        let unrestricted = AssignmentKey::new(role.id, &user("1"), &Target::None);
        assert_eq!(store.delete_assignments(&[unrestricted.clone()], &scope).unwrap(), 1);
        assert_eq!(store.delete_assignments(&[unrestricted], &scope).unwrap(), 0);

        let remaining = store.assignments_for(&user("1"), &scope).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].restriction(), Target::instance("User", "2"));
    }

    #[test]
    fn deleted_assignments_can_be_inserted_again() {
        let store = InMemoryGrantStore::new();
        let scope = Scope::default();
        let role = store.role("editor", &scope).unwrap();
        let record = RoleAssignment::new(role.id, user("1"), &Target::None, scope.clone());

        store.insert_assignments(vec![record.clone()]).unwrap();
        store.delete_assignments(&[record.key()], &scope).unwrap();
        assert_eq!(store.insert_assignments(vec![record]).unwrap(), 1);
    }

    #[test]
    fn existing_assignments_filters_by_role_type_and_ids() {
        let store = InMemoryGrantStore::new();
        let scope = Scope::default();
        let role = store.role("editor", &scope).unwrap();
        store
            .insert_assignments(vec![
                RoleAssignment::new(role.id, user("1"), &Target::None, scope.clone()),
                RoleAssignment::new(role.id, EntityRef::new("Team", "1"), &Target::None, scope.clone()),
            ])
            .unwrap();

        let found = store
            .existing_assignments(&[role.id], "User", &["1".to_string(), "7".to_string()], &scope)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].authority, user("1"));
    }

    #[test]
    fn unavailable_store_reports_store_errors() {
        let store = InMemoryGrantStore::new();
        store.set_available(false);
        let err = store.assignments_for(&user("1"), &Scope::default()).unwrap_err();
        assert!(matches!(err, WardenError::Store { .. }));

        store.set_available(true);
        assert!(store.assignments_for(&user("1"), &Scope::default()).is_ok());
    }

    // ── InMemoryEntityDirectory ───────────────────────────────────────────────

    #[test]
    fn directory_returns_set_attributes() {
        let post = EntityRef::new("Post", "5");
        let directory = InMemoryEntityDirectory::new().with(post.clone(), "author_id", "1");
        assert_eq!(directory.attribute(&post, "author_id").as_deref(), Some("1"));
        assert!(directory.attribute(&post, "editor_id").is_none());
        assert!(directory.attribute(&EntityRef::new("Post", "6"), "author_id").is_none());
    }

    // ── SeedConfig ────────────────────────────────────────────────────────────

    #[test]
    fn seed_parses_and_builds_a_world() {
        let world = SeedConfig::from_toml_str(BLOG_SEED).unwrap().build().unwrap();
        assert_eq!(world.scope, Scope::tenant("acme"));
        assert_eq!(world.summary.abilities, 2);
        assert_eq!(world.summary.permissions, 2);
        assert_eq!(world.summary.assignments, 2);
        assert_eq!(world.registry.owner_field("Post"), "author_id");
        assert_eq!(world.store.assignment_count_in(&Scope::tenant("acme")), 2);
        assert_eq!(world.store.assignment_count_in(&Scope::default()), 0);
    }

    #[test]
    fn seeded_titles_reach_the_store() {
        let world = SeedConfig::from_toml_str(BLOG_SEED).unwrap().build().unwrap();
        let author = world.store.role("author", &world.scope).unwrap();
        assert_eq!(author.title.as_deref(), Some("Author"));

        let edit = world
            .store
            .find_ability("edit", Some("Post"), None, &world.scope)
            .unwrap()
            .unwrap();
        assert_eq!(edit.title.as_deref(), Some("Edit own posts"));
        let publish = world
            .store
            .find_ability("publish", Some("Post"), None, &world.scope)
            .unwrap()
            .unwrap();
        assert_eq!(publish.title, None);
    }

    #[test]
    fn retitling_requires_a_row_in_scope() {
        let store = InMemoryGrantStore::new();
        let acme = Scope::tenant("acme");
        let role = store.role("editor", &acme).unwrap();

        let renamed = store.retitle_role(role.id, Some("Editor".to_string()), &acme).unwrap();
        assert_eq!(renamed.title.as_deref(), Some("Editor"));
        assert_eq!(store.role("editor", &acme).unwrap().title.as_deref(), Some("Editor"));

        let err = store
            .retitle_role(role.id, None, &Scope::tenant("globex"))
            .unwrap_err();
        assert!(matches!(err, WardenError::Store { .. }));
    }

    #[test]
    fn seeded_world_resolves_owner_only_role_grants() {
        let world = SeedConfig::from_toml_str(BLOG_SEED).unwrap().build().unwrap();
        let ownership = RegistryOwnership::new(
            Arc::new(world.registry.clone()),
            Arc::new(world.directory.clone()),
        );
        let resolver = Resolver::new(Arc::new(world.store.clone()), Arc::new(ownership))
            .with_scope(world.scope.clone());

        let edit = |id: &str| CheckRequest::new(user(id), "edit", Target::instance("Post", "5"));
        assert_eq!(resolver.resolve(&edit("1")).unwrap(), Decision::Allowed);
        assert_eq!(resolver.resolve(&edit("2")).unwrap(), Decision::Unspecified);

        let publish = CheckRequest::new(user("2"), "publish", Target::instance("Post", "5"));
        assert_eq!(resolver.resolve(&publish).unwrap(), Decision::Forbidden);
    }

    #[test]
    fn seeded_rows_are_invisible_to_other_scopes() {
        let world = SeedConfig::from_toml_str(BLOG_SEED).unwrap().build().unwrap();
        let ownership = RegistryOwnership::new(
            Arc::new(world.registry.clone()),
            Arc::new(world.directory.clone()),
        );
        let resolver = Resolver::new(Arc::new(world.store.clone()), Arc::new(ownership))
            .with_scope(Scope::tenant("globex"));

        let publish = CheckRequest::new(user("2"), "publish", Target::instance("Post", "5"));
        assert_eq!(resolver.resolve(&publish).unwrap(), Decision::Unspecified);
    }

    #[test]
    fn seed_rejects_unknown_ability_references() {
        let seed = r#"
[[permissions]]
ability = "missing"
grantee = "everyone"
"#;
        let config = SeedConfig::from_toml_str(seed).unwrap();
        let store = InMemoryGrantStore::new();
        let err = config.apply(&store).unwrap_err();
        assert!(matches!(err, WardenError::Config { .. }));
        assert_eq!(store.permission_count(), 0);
    }

    #[test]
    fn seed_rejects_malformed_entities() {
        let seed = r#"
[[roles]]
name = "editor"

[[assignments]]
role = "editor"
authority = "nobody"
"#;
        let err = SeedConfig::from_toml_str(seed).unwrap().build().unwrap_err();
        assert!(matches!(err, WardenError::Config { .. }));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = SeedConfig::from_toml_str("[[roles]\nname = 1").unwrap_err();
        assert!(matches!(err, WardenError::Config { .. }));
    }

    #[test]
    fn missing_seed_file_is_a_config_error() {
        let err = SeedConfig::from_file(std::path::Path::new("/nonexistent/seed.toml")).unwrap_err();
        assert!(matches!(err, WardenError::Config { .. }));
    }
}
