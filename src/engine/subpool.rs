use std::collections::VecDeque;
use std::time::Duration;

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::backend::{AttachmentId, HookKind, PoolBackend};
use crate::common::CommonPool;
use crate::engine::lifecycle;
use crate::engine::stats::PoolStats;
use crate::policy::SharedPolicy;
use crate::types::{InstanceId, PoolKey};

/// One idle instance: handle, stable identity, insertion timestamp.
struct IdleEntry<H> {
    handle: H,
    id: InstanceId,
    inserted_at: Duration,
}

/// Per-key pool of idle instances plus their eviction state.
///
/// The idle deque is ordered by insertion time: front = oldest, back =
/// newest. `get` pops from the back (recently returned instances are
/// "warm" and most likely still consistently initialized) while the
/// eviction sweep and shrinks consume from the front, so naturally idle
/// old entries drain first without extra bookkeeping. The two orders
/// intentionally diverge; unifying them would defeat warm reuse.
pub(crate) struct SubPool<B: PoolBackend> {
    key: PoolKey,
    /// Canonical resource instances are spawned from; `None` when the
    /// load failed or a custom template has not been supplied yet.
    template: Option<B::Template>,
    policy: SharedPolicy,
    idle: VecDeque<IdleEntry<B::Handle>>,
    /// Identity guard: O(1) double-return detection.
    idle_ids: FxHashSet<InstanceId>,
    /// When the idle count last reached zero; drives pool-level eviction.
    empty_since: Duration,
    /// Reusable buffer for lifecycle dispatch.
    scratch: Vec<AttachmentId>,
}

impl<B: PoolBackend> SubPool<B> {
    pub(crate) fn new(
        key: PoolKey,
        template: Option<B::Template>,
        policy: SharedPolicy,
        now: Duration,
    ) -> Self {
        Self {
            key,
            template,
            policy,
            idle: VecDeque::new(),
            idle_ids: FxHashSet::default(),
            empty_since: now,
            scratch: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn item_count(&self) -> usize {
        self.idle.len()
    }

    #[inline]
    pub(crate) fn template(&self) -> Option<&B::Template> {
        self.template.as_ref()
    }

    pub(crate) fn set_template(&mut self, template: B::Template) {
        self.template = Some(template);
    }

    /// Rewire the eviction policy; subsequent sweeps see the new cell.
    pub(crate) fn set_policy(&mut self, policy: SharedPolicy) {
        self.policy = policy;
    }

    /// Take an instance out of the pool, or spawn one from the template.
    ///
    /// Pops the most recently inserted idle instance first, skipping any
    /// that were invalidated out of band. Fires `Reactivated` hooks on the
    /// outgoing instance, whether recycled or freshly spawned.
    pub(crate) fn get(
        &mut self,
        backend: &mut B,
        common: &mut CommonPool,
        stats: &mut PoolStats,
        now: Duration,
    ) -> Option<B::Handle> {
        self.empty_since = now;
        let mut found = None;
        while let Some(entry) = self.idle.pop_back() {
            self.idle_ids.remove(&entry.id);
            if backend.is_alive(&entry.handle) {
                found = Some(entry.handle);
                break;
            }
            stats.stale_skips += 1;
            debug!(key = %self.key, id = %entry.id, "skipping invalidated idle instance");
        }
        let handle = match found {
            Some(handle) => {
                stats.hits += 1;
                handle
            }
            None => {
                let handle = self.spawn(backend)?;
                stats.spawns += 1;
                handle
            }
        };
        lifecycle::dispatch(
            backend,
            common,
            &mut self.scratch,
            &handle,
            HookKind::Reactivated,
        );
        Some(handle)
    }

    /// Return an instance to the idle set.
    ///
    /// Returning an instance that is already pooled is a no-op. Fires
    /// `Returned` hooks after the instance has been recorded.
    pub(crate) fn dispose(
        &mut self,
        backend: &mut B,
        common: &mut CommonPool,
        stats: &mut PoolStats,
        handle: B::Handle,
        now: Duration,
    ) {
        let id = backend.instance_id(&handle);
        if self.idle_ids.contains(&id) {
            stats.double_returns += 1;
            debug!(key = %self.key, id = %id, "instance already pooled, ignoring return");
            return;
        }
        self.idle_ids.insert(id);
        self.idle.push_back(IdleEntry {
            handle,
            id,
            inserted_at: now,
        });
        if let Some(entry) = self.idle.back() {
            lifecycle::dispatch(
                backend,
                common,
                &mut self.scratch,
                &entry.handle,
                HookKind::Returned,
            );
        }
    }

    /// Evict idle instances past the item threshold, oldest first, and
    /// report whether this sub-pool should stay alive.
    ///
    /// Entries sit in the deque in monotonically increasing insertion-time
    /// order, so the scan stops at the first survivor. Returns `false`
    /// once the pool has been empty longer than the pool threshold.
    pub(crate) fn sweep(&mut self, backend: &mut B, stats: &mut PoolStats, now: Duration) -> bool {
        let policy = self.policy.get();
        if policy.item_idle.is_some() && !self.idle.is_empty() {
            while self
                .idle
                .front()
                .is_some_and(|entry| policy.item_expired(entry.inserted_at, now))
            {
                if let Some(entry) = self.idle.pop_front() {
                    self.idle_ids.remove(&entry.id);
                    backend.destroy(entry.handle);
                    stats.evicted_items += 1;
                }
            }
            if self.idle.is_empty() {
                self.empty_since = now;
            }
        }
        if self.idle.is_empty() {
            policy.pool_keep_alive(self.empty_since, now)
        } else {
            true
        }
    }

    /// Set the idle count to exactly `size`.
    ///
    /// Growth spawns raw instances straight into the idle set without
    /// lifecycle dispatch; shrinking destroys the oldest-inserted
    /// instances first, matching the sweep's eviction order.
    pub(crate) fn resize(
        &mut self,
        backend: &mut B,
        stats: &mut PoolStats,
        size: usize,
        now: Duration,
    ) {
        let current = self.idle.len();
        if size > current {
            for _ in 0..size - current {
                let Some(handle) = self.spawn(backend) else {
                    break;
                };
                let id = backend.instance_id(&handle);
                self.idle_ids.insert(id);
                self.idle.push_back(IdleEntry {
                    handle,
                    id,
                    inserted_at: now,
                });
            }
        } else {
            for _ in 0..current - size {
                if let Some(entry) = self.idle.pop_front() {
                    self.idle_ids.remove(&entry.id);
                    backend.destroy(entry.handle);
                    stats.evicted_items += 1;
                }
            }
        }
    }

    /// Destroy every idle instance. Checked-out instances are untouched.
    pub(crate) fn clear(&mut self, backend: &mut B) {
        for entry in self.idle.drain(..) {
            backend.destroy(entry.handle);
        }
        self.idle_ids.clear();
        self.scratch.clear();
    }

    fn spawn(&mut self, backend: &mut B) -> Option<B::Handle> {
        let Some(template) = self.template.as_ref() else {
            warn!(key = %self.key, "cannot spawn: sub-pool has no template");
            return None;
        };
        let Some(handle) = backend.instantiate(template) else {
            warn!(key = %self.key, "instantiation failed");
            return None;
        };
        backend.bind_origin(&handle, &self.key);
        Some(handle)
    }
}
