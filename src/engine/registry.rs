use std::mem;
use std::rc::Rc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::backend::{AttachmentId, PoolBackend};
use crate::clock::{Clock, MonotonicClock};
use crate::common::CommonPool;
use crate::config::PoolConfig;
use crate::engine::release::{ReleaseId, ReleaseQueue};
use crate::engine::stats::PoolStats;
use crate::engine::subpool::SubPool;
use crate::policy::{IdlePolicy, SharedPolicy};
use crate::types::{LoadSource, PoolKey};

/// Keyed registry of [`SubPool`]s over one backend.
///
/// All instance traffic flows through here: `get` hands out warm or
/// freshly spawned instances, `dispose` returns them, and `tick` drives
/// both eviction levels plus the delayed-release timers. Single-threaded
/// by contract; embed it in whatever update loop owns the backend.
pub struct ObjectPool<B: PoolBackend> {
    backend: B,
    clock: Rc<dyn Clock>,
    common: CommonPool,
    pools: FxHashMap<PoolKey, SubPool<B>>,
    /// Per-key policy overrides. Kept across `clear_all` so retuned
    /// deadlines survive pool recreation.
    policies: FxHashMap<PoolKey, SharedPolicy>,
    default_policy: SharedPolicy,
    release: ReleaseQueue<B::Handle>,
    /// Scratch for keys expired during a sweep; removal is deferred so
    /// the sweep never mutates the map it iterates.
    expired: SmallVec<[PoolKey; 8]>,
    stats: PoolStats,
}

impl<B: PoolBackend> ObjectPool<B> {
    pub fn new(backend: B, config: PoolConfig) -> Self {
        Self::with_clock(backend, config, Rc::new(MonotonicClock::new()))
    }

    /// Build against an explicit clock. Tests inject a manual clock here.
    pub fn with_clock(backend: B, config: PoolConfig, clock: Rc<dyn Clock>) -> Self {
        let mut common = CommonPool::with_clock(config.common_policy(), Rc::clone(&clock));
        // Attachment buffers must come back empty when borrowed again.
        common.set_dispose_hook::<Vec<AttachmentId>>(|buf| buf.clear());
        Self {
            backend,
            clock,
            common,
            pools: FxHashMap::default(),
            policies: FxHashMap::default(),
            default_policy: SharedPolicy::new(config.default_policy()),
            release: ReleaseQueue::new(),
            expired: SmallVec::new(),
            stats: PoolStats::default(),
        }
    }

    /// Take an instance for `key`, reusing an idle one when possible.
    ///
    /// Returns `None` when the tag is not poolable, the key names an
    /// unregistered custom pool, or the template cannot produce an
    /// instance. All failure paths log and degrade; none panic.
    pub fn get(&mut self, key: &PoolKey) -> Option<B::Handle> {
        if !self.backend.validate_tag(key.type_tag()) {
            warn!(key = %key, "get ignored: tag is not poolable");
            return None;
        }
        if key.source() == LoadSource::Custom && !self.pools.contains_key(key) {
            warn!(key = %key, "get ignored: custom pool not registered");
            return None;
        }
        self.ensure_pool(key);
        let now = self.clock.now();
        let pool = self.pools.get_mut(key)?;
        pool.get(&mut self.backend, &mut self.common, &mut self.stats, now)
    }

    /// Return an instance to its pool.
    ///
    /// An origin key recorded on the instance overrides `key`; a caller
    /// passing the wrong key cannot misfile an instance that knows where
    /// it came from. Returning the same instance twice is a no-op.
    pub fn dispose(&mut self, handle: B::Handle, key: &PoolKey) {
        let key = match self.backend.origin_key(&handle) {
            Some(origin) => origin,
            None => key.clone(),
        };
        if !self.backend.validate_tag(key.type_tag()) {
            warn!(key = %key, "dispose ignored: tag is not poolable");
            return;
        }
        if key.source() == LoadSource::Custom && !self.pools.contains_key(&key) {
            warn!(key = %key, "dispose to unregistered custom pool, destroying instance");
            self.backend.destroy(handle);
            return;
        }
        self.ensure_pool(&key);
        let now = self.clock.now();
        if let Some(pool) = self.pools.get_mut(&key) {
            pool.dispose(
                &mut self.backend,
                &mut self.common,
                &mut self.stats,
                handle,
                now,
            );
        }
    }

    /// Register a caller-supplied template under a custom key.
    ///
    /// Re-registering with a different template clears the idle set so no
    /// stale instances of the old template get handed out.
    pub fn register_custom(&mut self, key: PoolKey, template: B::Template)
    where
        B::Template: PartialEq,
    {
        if !self.backend.validate_tag(key.type_tag()) {
            warn!(key = %key, "register ignored: tag is not poolable");
            return;
        }
        if key.source() != LoadSource::Custom {
            warn!(key = %key, "register ignored: key is not a custom source");
            return;
        }
        if let Some(pool) = self.pools.get_mut(&key) {
            if pool.template() != Some(&template) {
                pool.clear(&mut self.backend);
                pool.set_template(template);
            }
            return;
        }
        let policy = self.policy_for(&key);
        let now = self.clock.now();
        self.pools
            .insert(key.clone(), SubPool::new(key, Some(template), policy, now));
    }

    /// Schedule `handle` to be disposed back to `key` after `delay`.
    pub fn release_after(&mut self, handle: B::Handle, key: PoolKey, delay: Duration) -> ReleaseId {
        let due = self.clock.now() + delay;
        self.release.schedule(handle, key, due)
    }

    /// Cancel a pending delayed release, reclaiming the instance.
    pub fn cancel_release(&mut self, id: ReleaseId) -> Option<B::Handle> {
        self.release.cancel(id).map(|(handle, _)| handle)
    }

    /// Set both idle thresholds for one key.
    ///
    /// Takes effect on the live sub-pool immediately and persists for
    /// pools created under this key later.
    pub fn set_idle_times(&mut self, key: &PoolKey, policy: IdlePolicy) {
        if let Some(shared) = self.policies.get(key) {
            shared.set(policy);
            return;
        }
        let shared = SharedPolicy::new(policy);
        self.policies.insert(key.clone(), shared.clone());
        if let Some(pool) = self.pools.get_mut(key) {
            pool.set_policy(shared);
        }
    }

    /// Set only the per-item threshold; the pool threshold keeps its
    /// current override or falls back to the default.
    pub fn set_item_idle(&mut self, key: &PoolKey, item_idle: Option<Duration>) {
        if let Some(shared) = self.policies.get(key) {
            shared.set_item_idle(item_idle);
            return;
        }
        let mut policy = self.default_policy.get();
        policy.item_idle = item_idle;
        self.set_idle_times(key, policy);
    }

    /// Counterpart of [`set_item_idle`](Self::set_item_idle) for the
    /// empty-pool threshold.
    pub fn set_pool_idle(&mut self, key: &PoolKey, pool_idle: Option<Duration>) {
        if let Some(shared) = self.policies.get(key) {
            shared.set_pool_idle(pool_idle);
            return;
        }
        let mut policy = self.default_policy.get();
        policy.pool_idle = pool_idle;
        self.set_idle_times(key, policy);
    }

    /// The policy override for `key`, if one was ever set.
    pub fn idle_times(&self, key: &PoolKey) -> Option<IdlePolicy> {
        self.policies.get(key).map(|shared| shared.get())
    }

    /// Set the idle count for `key` to exactly `size`. A size of zero
    /// removes the sub-pool entirely.
    pub fn resize(&mut self, key: &PoolKey, size: usize) {
        if !self.backend.validate_tag(key.type_tag()) {
            warn!(key = %key, "resize ignored: tag is not poolable");
            return;
        }
        if size == 0 {
            self.clear(key);
            return;
        }
        if key.source() == LoadSource::Custom && !self.pools.contains_key(key) {
            warn!(key = %key, "resize ignored: custom pool not registered");
            return;
        }
        self.ensure_pool(key);
        let now = self.clock.now();
        if let Some(pool) = self.pools.get_mut(key) {
            pool.resize(&mut self.backend, &mut self.stats, size, now);
        }
    }

    /// Destroy all idle instances under `key` and drop the sub-pool.
    /// Checked-out instances and policy overrides are unaffected.
    pub fn clear(&mut self, key: &PoolKey) {
        if let Some(mut pool) = self.pools.remove(key) {
            pool.clear(&mut self.backend);
        }
    }

    /// Drop every sub-pool, destroying all idle instances. Policy
    /// overrides and pending delayed releases survive.
    pub fn clear_all(&mut self) {
        for (_, mut pool) in mem::take(&mut self.pools) {
            pool.clear(&mut self.backend);
        }
        self.common.clear_all();
    }

    /// Idle instance count for `key`; zero when no sub-pool exists.
    pub fn item_count(&self, key: &PoolKey) -> usize {
        self.pools.get(key).map_or(0, SubPool::item_count)
    }

    #[inline]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Drive timers: fire due delayed releases, evict idle instances past
    /// their threshold, drop sub-pools empty past theirs, then sweep the
    /// plain-value pools. Call once per frame or scheduler beat.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        while let Some((handle, key)) = self.release.pop_due(now) {
            self.dispose(handle, &key);
        }
        for (key, pool) in &mut self.pools {
            if !pool.sweep(&mut self.backend, &mut self.stats, now) {
                self.expired.push(key.clone());
            }
        }
        for key in mem::take(&mut self.expired) {
            if self.pools.remove(&key).is_some() {
                self.stats.expired_pools += 1;
                debug!(key = %key, "removed idle sub-pool");
            }
        }
        self.common.tick();
    }

    #[inline]
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The plain-value pool sharing this registry's clock.
    #[inline]
    pub fn common(&mut self) -> &mut CommonPool {
        &mut self.common
    }

    fn policy_for(&self, key: &PoolKey) -> SharedPolicy {
        self.policies
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.default_policy.clone())
    }

    /// Create the sub-pool for `key` if absent, loading its template. A
    /// failed load is final: the pool exists but spawns nothing.
    fn ensure_pool(&mut self, key: &PoolKey) {
        if self.pools.contains_key(key) {
            return;
        }
        let template = match self.backend.load_template(key) {
            Ok(template) => Some(template),
            Err(e) => {
                warn!(key = %key, error = %e, "template load failed");
                None
            }
        };
        let policy = self.policy_for(key);
        let now = self.clock.now();
        self.pools
            .insert(key.clone(), SubPool::new(key.clone(), template, policy, now));
    }
}
