//! # warden-cache
//!
//! A caching decorator for any `Authorizer`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_cache::{CacheConfig, CachedAuthorizer};
//!
//! let cached = CachedAuthorizer::with_config(resolver, CacheConfig::with_ttl_seconds(300));
//! let manager = RoleAssignmentManager::new(store, Arc::new(cached.clone()));
//! cached.is_allowed(&request)?;
//! ```

pub mod cached;

pub use cached::{CacheConfig, CachedAuthorizer};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{
        sync::{mpsc, Arc, Mutex},
        thread,
    };

    use warden_contracts::{
        ability::{AbilityId, AbilitySpec, Grantee},
        decision::{CheckRequest, Decision, Resolution},
        entity::{EntityRef, Scope, Target},
        error::{WardenError, WardenResult},
        role::RoleRef,
    };
    use warden_core::{
        traits::{Authorizer, CacheInvalidator, NoOwnership},
        Resolver,
    };
    use warden_roles::{GrantManager, RoleAssignmentManager};
    use warden_store::{GrantStoreExt, InMemoryGrantStore};

    use super::{CacheConfig, CachedAuthorizer};

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// Answers with a fixed resolution and counts calls.
    struct CountingAuthorizer {
        answer: Resolution,
        calls: Arc<Mutex<u32>>,
        fail: bool,
    }

    impl CountingAuthorizer {
        fn new(answer: Resolution) -> Self {
            Self {
                answer,
                calls: Arc::new(Mutex::new(0)),
                fail: false,
            }
        }

        fn counter(&self) -> Arc<Mutex<u32>> {
            Arc::clone(&self.calls)
        }
    }

    /// Wrap a `CountingAuthorizer` and keep a handle on its call count.
    fn counting(answer: Resolution, config: CacheConfig) -> (CachedAuthorizer<CountingAuthorizer>, impl Fn() -> u32) {
        let inner = CountingAuthorizer::new(answer);
        let counter = inner.counter();
        (
            CachedAuthorizer::with_config(inner, config),
            move || *counter.lock().unwrap(),
        )
    }

    /// Signals when a resolution starts, then waits to be released.
    struct PausingAuthorizer {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl Authorizer for PausingAuthorizer {
        fn is_forbidden(&self, request: &CheckRequest) -> WardenResult<bool> {
            Ok(self.resolution(request)?.decision == Decision::Forbidden)
        }

        fn resolution(&self, _request: &CheckRequest) -> WardenResult<Resolution> {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            Ok(Resolution::unspecified())
        }
    }

    impl Authorizer for CountingAuthorizer {
        fn is_forbidden(&self, request: &CheckRequest) -> WardenResult<bool> {
            Ok(self.resolution(request)?.decision == Decision::Forbidden)
        }

        fn resolution(&self, _request: &CheckRequest) -> WardenResult<Resolution> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(WardenError::Store {
                    reason: "down".to_string(),
                });
            }
            Ok(self.answer)
        }
    }

    fn user(id: &str) -> EntityRef {
        EntityRef::new("User", id)
    }

    fn request(id: &str) -> CheckRequest {
        CheckRequest::new(user(id), "edit", Target::instance("Post", "5"))
    }

    // ── Memoisation ──────────────────────────────────────────────────────────

    #[test]
    fn repeated_checks_hit_the_cache() {
        let (cached, calls) = counting(Resolution::allowed(AbilityId(3)), CacheConfig::default());

        assert!(cached.is_allowed(&request("1")).unwrap());
        assert!(cached.is_allowed(&request("1")).unwrap());
        assert_eq!(cached.check_get_id(&request("1")).unwrap(), Some(AbilityId(3)));
        assert_eq!(calls(), 1);
        assert_eq!(cached.cached_for(&user("1")), 1);
    }

    #[test]
    fn distinct_targets_are_cached_separately() {
        let (cached, calls) = counting(Resolution::unspecified(), CacheConfig::default());
        cached.resolve(&request("1")).unwrap();
        cached
            .resolve(&CheckRequest::new(user("1"), "edit", Target::class("Post")))
            .unwrap();
        assert_eq!(calls(), 2);
        assert_eq!(cached.cached_for(&user("1")), 2);
    }

    #[test]
    fn is_forbidden_uses_the_cached_resolution() {
        let (cached, calls) = counting(Resolution::forbidden(), CacheConfig::default());
        assert!(cached.is_forbidden(&request("1")).unwrap());
        assert_eq!(cached.resolve(&request("1")).unwrap(), Decision::Forbidden);
        assert_eq!(calls(), 1);
    }

    #[test]
    fn errors_are_not_cached() {
        let mut inner = CountingAuthorizer::new(Resolution::unspecified());
        inner.fail = true;
        let counter = inner.counter();
        let cached = CachedAuthorizer::new(inner);

        assert!(cached.resolve(&request("1")).is_err());
        assert!(cached.resolve(&request("1")).is_err());
        assert_eq!(*counter.lock().unwrap(), 2);
        assert_eq!(cached.cached_for(&user("1")), 0);
    }

    // ── Invalidation ─────────────────────────────────────────────────────────

    #[test]
    fn refresh_for_drops_only_that_authority() {
        let (cached, calls) = counting(Resolution::unspecified(), CacheConfig::default());
        cached.resolve(&request("1")).unwrap();
        cached.resolve(&request("2")).unwrap();

        cached.refresh_for(&user("1"));
        assert_eq!(cached.cached_for(&user("1")), 0);
        assert_eq!(cached.cached_for(&user("2")), 1);

        cached.resolve(&request("1")).unwrap();
        assert_eq!(calls(), 3);
    }

    #[test]
    fn refresh_all_clears_everything() {
        let (cached, _) = counting(Resolution::unspecified(), CacheConfig::default());
        cached.resolve(&request("1")).unwrap();
        cached.resolve(&request("2")).unwrap();
        cached.refresh_all();
        assert_eq!(cached.cached_for(&user("1")), 0);
        assert_eq!(cached.cached_for(&user("2")), 0);
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let (cached, calls) = counting(Resolution::unspecified(), CacheConfig::with_ttl_seconds(0));
        cached.resolve(&request("1")).unwrap();
        cached.resolve(&request("1")).unwrap();
        assert_eq!(calls(), 2);
    }

    #[test]
    fn storing_sweeps_expired_entries_of_other_authorities() {
        let (cached, _) = counting(Resolution::unspecified(), CacheConfig::with_ttl_seconds(0));
        cached.resolve(&request("1")).unwrap();
        cached.resolve(&request("2")).unwrap();
        cached.resolve(&request("3")).unwrap();

        assert_eq!(cached.cached_for(&user("1")), 0);
        assert_eq!(cached.cached_for(&user("2")), 0);
        assert_eq!(cached.cached_for(&user("3")), 1);
        assert_eq!(cached.len(), 1);
    }

    #[test]
    fn long_ttl_keeps_entries() {
        let (cached, calls) = counting(Resolution::unspecified(), CacheConfig::with_ttl_seconds(3600));
        cached.resolve(&request("1")).unwrap();
        cached.resolve(&request("1")).unwrap();
        cached.resolve(&request("2")).unwrap();
        assert_eq!(calls(), 2);
        assert_eq!(cached.len(), 2);
    }

    #[test]
    fn clones_share_entries() {
        let (cached, _) = counting(Resolution::unspecified(), CacheConfig::default());
        let invalidator = cached.clone();
        cached.resolve(&request("1")).unwrap();
        invalidator.refresh_for(&user("1"));
        assert_eq!(cached.cached_for(&user("1")), 0);
    }

    fn paused_cache() -> (CachedAuthorizer<PausingAuthorizer>, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let inner = PausingAuthorizer {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        (CachedAuthorizer::new(inner), entered_rx, release_tx)
    }

    #[test]
    fn refresh_for_during_resolution_discards_the_answer() {
        let (cached, entered, release) = paused_cache();
        let checker = cached.clone();
        let handle = thread::spawn(move || checker.resolve(&request("1")));

        entered.recv().unwrap();
        cached.refresh_for(&user("1"));
        release.send(()).unwrap();

        assert_eq!(handle.join().unwrap().unwrap(), Decision::Unspecified);
        assert_eq!(cached.cached_for(&user("1")), 0);
    }

    #[test]
    fn refresh_all_during_resolution_discards_the_answer() {
        let (cached, entered, release) = paused_cache();
        let checker = cached.clone();
        let handle = thread::spawn(move || checker.resolve(&request("1")));

        entered.recv().unwrap();
        cached.refresh_all();
        release.send(()).unwrap();

        handle.join().unwrap().unwrap();
        assert!(cached.is_empty());
    }

    #[test]
    fn refreshing_another_authority_keeps_the_answer() {
        let (cached, entered, release) = paused_cache();
        let checker = cached.clone();
        let handle = thread::spawn(move || checker.resolve(&request("1")));

        entered.recv().unwrap();
        cached.refresh_for(&user("2"));
        release.send(()).unwrap();

        handle.join().unwrap().unwrap();
        assert_eq!(cached.cached_for(&user("1")), 1);
    }

    // ── With the role assignment manager ─────────────────────────────────────

    #[test]
    fn assignment_invalidates_stale_decisions() {
        let store = InMemoryGrantStore::new();
        let scope = Scope::default();
        let role = store.role("editor", &scope).unwrap();
        store
            .allow(Grantee::Role(role.id), &AbilitySpec::on_class("edit", "Post"), &scope)
            .unwrap();

        let resolver = Resolver::new(Arc::new(store.clone()), Arc::new(NoOwnership));
        let cached = CachedAuthorizer::new(resolver);
        let manager = RoleAssignmentManager::new(Arc::new(store.clone()), Arc::new(cached.clone()));

        assert_eq!(cached.resolve(&request("1")).unwrap(), Decision::Unspecified);

        manager.assign(&[RoleRef::from(&role)], &[user("1")], &[]).unwrap();
        assert_eq!(cached.resolve(&request("1")).unwrap(), Decision::Allowed);

        manager.retract(&[RoleRef::from(&role)], &[user("1")], &[]).unwrap();
        assert_eq!(cached.resolve(&request("1")).unwrap(), Decision::Unspecified);
    }

    #[test]
    fn new_forbid_is_visible_through_the_cache() {
        let store = InMemoryGrantStore::new();
        let scope = Scope::default();
        store
            .allow(Grantee::Everyone, &AbilitySpec::on_class("edit", "Post"), &scope)
            .unwrap();

        let resolver = Resolver::new(Arc::new(store.clone()), Arc::new(NoOwnership));
        let cached = CachedAuthorizer::new(resolver);
        let grants = GrantManager::new(Arc::new(store.clone()), Arc::new(cached.clone()));
        let edit_class = || CheckRequest::new(user("1"), "edit", Target::class("Post"));

        assert_eq!(cached.resolve(&edit_class()).unwrap(), Decision::Allowed);

        grants
            .forbid(Grantee::Authority(user("1")), &AbilitySpec::on_class("edit", "Post"))
            .unwrap();
        assert_eq!(cached.resolve(&edit_class()).unwrap(), Decision::Forbidden);
    }

    #[test]
    fn role_grant_refreshes_every_member() {
        let store = InMemoryGrantStore::new();
        let scope = Scope::default();
        let role = store.role("editor", &scope).unwrap();

        let resolver = Resolver::new(Arc::new(store.clone()), Arc::new(NoOwnership));
        let cached = CachedAuthorizer::new(resolver);
        let manager = RoleAssignmentManager::new(Arc::new(store.clone()), Arc::new(cached.clone()));
        let grants = GrantManager::new(Arc::new(store.clone()), Arc::new(cached.clone()));

        manager.assign(&[RoleRef::from(&role)], &[user("1"), user("2")], &[]).unwrap();
        assert_eq!(cached.resolve(&request("1")).unwrap(), Decision::Unspecified);
        assert_eq!(cached.resolve(&request("2")).unwrap(), Decision::Unspecified);

        grants
            .allow(Grantee::Role(role.id), &AbilitySpec::on_class("edit", "Post"))
            .unwrap();
        assert_eq!(cached.resolve(&request("1")).unwrap(), Decision::Allowed);
        assert_eq!(cached.resolve(&request("2")).unwrap(), Decision::Allowed);
    }
}
