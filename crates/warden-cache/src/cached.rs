//! The caching decorator.
//!
//! `CachedAuthorizer` wraps any `Authorizer` and satisfies the same trait,
//! memoising one `Resolution` per (authority, ability, target).  Entries are
//! dropped per authority by `refresh_for`, wholesale by `refresh_all`, and,
//! when a TTL is configured, once they expire: on lookup, and in a sweep
//! whenever a fresh entry is stored.
//!
//! Errors from the inner authorizer are never cached.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use warden_contracts::{
    decision::{CheckRequest, Decision, Resolution},
    entity::{EntityRef, Target},
    error::WardenResult,
};
use warden_core::traits::{Authorizer, CacheInvalidator};

/// Cache settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds an entry stays valid. `None` keeps entries until refreshed.
    #[serde(default)]
    pub ttl_seconds: Option<i64>,
}

impl CacheConfig {
    pub fn with_ttl_seconds(seconds: i64) -> Self {
        Self {
            ttl_seconds: Some(seconds),
        }
    }

    fn ttl(&self) -> Option<Duration> {
        self.ttl_seconds.map(Duration::seconds)
    }
}

type RequestKey = (String, Target);

struct Entry {
    resolution: Resolution,
    stored_at: DateTime<Utc>,
}

/// Memoised entries plus the invalidation counters guarding writes.
///
/// A miss records `(epoch, generation)` before asking the inner authorizer
/// and stores the answer only if neither moved meanwhile, so a refresh that
/// lands mid-resolution is never overwritten by the pre-mutation answer.
#[derive(Default)]
struct CacheState {
    entries: HashMap<EntityRef, HashMap<RequestKey, Entry>>,
    /// Bumped by `refresh_for`, per authority.
    generations: HashMap<EntityRef, u64>,
    /// Bumped by `refresh_all`.
    epoch: u64,
}

impl CacheState {
    fn stamp(&self, authority: &EntityRef) -> (u64, u64) {
        (self.epoch, self.generations.get(authority).copied().unwrap_or(0))
    }

    fn prune_expired(&mut self, ttl: Duration, now: DateTime<Utc>) {
        self.entries.retain(|_, per_authority| {
            per_authority.retain(|_, entry| now - entry.stored_at < ttl);
            !per_authority.is_empty()
        });
    }
}

/// A memoising `Authorizer`.
///
/// Clones share the same entries, so one clone can be handed to the role
/// assignment manager as its `CacheInvalidator` while another serves checks.
pub struct CachedAuthorizer<A> {
    inner: Arc<A>,
    config: CacheConfig,
    state: Arc<Mutex<CacheState>>,
}

impl<A> Clone for CachedAuthorizer<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config,
            state: Arc::clone(&self.state),
        }
    }
}

impl<A: Authorizer> CachedAuthorizer<A> {
    /// Wrap `inner` with entries that never expire.
    pub fn new(inner: A) -> Self {
        Self::with_config(inner, CacheConfig::default())
    }

    pub fn with_config(inner: A, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(inner),
            config,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Number of memoised entries for `authority`.
    pub fn cached_for(&self, authority: &EntityRef) -> usize {
        self.lock()
            .and_then(|state| state.entries.get(authority).map(HashMap::len))
            .unwrap_or(0)
    }

    /// Number of memoised entries across all authorities.
    pub fn len(&self) -> usize {
        self.lock()
            .map(|state| state.entries.values().map(HashMap::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Option<MutexGuard<'_, CacheState>> {
        // A poisoned cache degrades to pass-through.
        self.state.lock().ok()
    }

    /// A cached resolution, or the stamp a later `store` must match.
    fn lookup(&self, request: &CheckRequest) -> Result<Resolution, Option<(u64, u64)>> {
        let mut state = self.lock().ok_or(None)?;
        let stamp = state.stamp(&request.authority);
        let key = (request.ability.clone(), request.target.clone());
        let Some(per_authority) = state.entries.get_mut(&request.authority) else {
            return Err(Some(stamp));
        };
        let Some((resolution, stored_at)) = per_authority
            .get(&key)
            .map(|entry| (entry.resolution, entry.stored_at))
        else {
            return Err(Some(stamp));
        };

        if let Some(ttl) = self.config.ttl() {
            if Utc::now() - stored_at >= ttl {
                per_authority.remove(&key);
                trace!(authority = %request.authority, ability = %request.ability, "cache entry expired");
                return Err(Some(stamp));
            }
        }
        Ok(resolution)
    }

    fn store(&self, request: &CheckRequest, resolution: Resolution, stamp: (u64, u64)) {
        let Some(mut state) = self.lock() else {
            return;
        };
        if state.stamp(&request.authority) != stamp {
            trace!(authority = %request.authority, ability = %request.ability, "refreshed during resolution; not cached");
            return;
        }
        let now = Utc::now();
        if let Some(ttl) = self.config.ttl() {
            state.prune_expired(ttl, now);
        }
        state.entries.entry(request.authority.clone()).or_default().insert(
            (request.ability.clone(), request.target.clone()),
            Entry {
                resolution,
                stored_at: now,
            },
        );
    }
}

impl<A: Authorizer> Authorizer for CachedAuthorizer<A> {
    fn is_forbidden(&self, request: &CheckRequest) -> WardenResult<bool> {
        Ok(self.resolution(request)?.decision == Decision::Forbidden)
    }

    fn resolution(&self, request: &CheckRequest) -> WardenResult<Resolution> {
        let stamp = match self.lookup(request) {
            Ok(hit) => {
                trace!(authority = %request.authority, ability = %request.ability, "cache hit");
                return Ok(hit);
            }
            Err(stamp) => stamp,
        };
        let resolution = self.inner.resolution(request)?;
        if let Some(stamp) = stamp {
            self.store(request, resolution, stamp);
        }
        Ok(resolution)
    }
}

impl<A: Authorizer> CacheInvalidator for CachedAuthorizer<A> {
    fn refresh_for(&self, authority: &EntityRef) {
        if let Some(mut state) = self.lock() {
            *state.generations.entry(authority.clone()).or_default() += 1;
            if state.entries.remove(authority).is_some() {
                debug!(authority = %authority, "cached decisions refreshed");
            }
        }
    }

    fn refresh_all(&self) {
        if let Some(mut state) = self.lock() {
            state.epoch += 1;
            state.entries.clear();
            debug!("all cached decisions refreshed");
        }
    }
}
