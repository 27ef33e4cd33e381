//! Plain-value pool: a simplified registry keyed purely by value type.
//!
//! Pools non-templated containers and value objects ("spawn" means default
//! construction, not template instantiation). The object-pool registry
//! also borrows its lifecycle-dispatch scratch buffers from here to keep
//! the hot path allocation-free.

mod slot;

use std::any::{Any, TypeId};
use std::rc::Rc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::clock::{Clock, MonotonicClock};
use crate::policy::{IdlePolicy, SharedPolicy};

use slot::{CommonEntry, CommonSlot, TypeHooks};

/// Pool of reusable plain values, keyed by `TypeId`.
///
/// Mirrors the templated registry's reuse and eviction behavior: LIFO
/// reuse from the back of each idle set, oldest-first eviction from the
/// front, and two-level idle eviction driven by [`CommonPool::tick`].
pub struct CommonPool {
    clock: Rc<dyn Clock>,
    slots: FxHashMap<TypeId, CommonSlot>,
    /// Hooks outlive their slot so eviction of an empty pool never drops
    /// a registration.
    hooks: FxHashMap<TypeId, TypeHooks>,
    policies: FxHashMap<TypeId, SharedPolicy>,
    default_policy: SharedPolicy,
    /// Reused between ticks for deferred slot removal.
    expired: Vec<TypeId>,
}

impl CommonPool {
    /// Create a pool with the given default eviction policy and a
    /// wall-clock time source.
    pub fn new(default_policy: IdlePolicy) -> Self {
        Self::with_clock(default_policy, Rc::new(MonotonicClock::new()))
    }

    /// Create a pool over an explicit time source.
    pub fn with_clock(default_policy: IdlePolicy, clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            slots: FxHashMap::default(),
            hooks: FxHashMap::default(),
            policies: FxHashMap::default(),
            default_policy: SharedPolicy::new(default_policy),
            expired: Vec::new(),
        }
    }

    /// Get a pooled value, or default-construct a fresh one.
    ///
    /// Reuses the most recently returned value first; a fresh value has
    /// the type's `on_spawn` hook run once, right after construction.
    pub fn get<T: Any + Default>(&mut self) -> Box<T> {
        let tid = TypeId::of::<T>();
        let now = self.clock.now();
        let slot = self.slot_mut(tid, std::any::type_name::<T>(), now);
        slot.empty_since = now;
        if let Some(entry) = slot.idle.pop_back() {
            if let Ok(value) = entry.value.downcast::<T>() {
                return value;
            }
        }
        let mut value = Box::new(T::default());
        if let Some(on_spawn) = self.hooks.get(&tid).and_then(|h| h.on_spawn.as_ref()) {
            on_spawn(value.as_mut());
        }
        value
    }

    /// Return a value to the pool.
    ///
    /// The type's `on_dispose` hook runs first (typically to reset mutable
    /// state) before the value re-enters the idle set.
    pub fn dispose<T: Any>(&mut self, mut value: Box<T>) {
        let tid = TypeId::of::<T>();
        if let Some(on_dispose) = self.hooks.get(&tid).and_then(|h| h.on_dispose.as_ref()) {
            on_dispose(value.as_mut());
        }
        let now = self.clock.now();
        let slot = self.slot_mut(tid, std::any::type_name::<T>(), now);
        slot.idle.push_back(CommonEntry {
            value,
            inserted_at: now,
        });
    }

    /// Register the spawn hook for `T`, replacing any previous one.
    pub fn set_spawn_hook<T: Any>(&mut self, hook: impl Fn(&mut T) + 'static) {
        self.hooks.entry(TypeId::of::<T>()).or_default().on_spawn = Some(Box::new(move |any| {
            if let Some(value) = any.downcast_mut::<T>() {
                hook(value);
            }
        }));
    }

    /// Register the dispose hook for `T`, replacing any previous one.
    pub fn set_dispose_hook<T: Any>(&mut self, hook: impl Fn(&mut T) + 'static) {
        self.hooks.entry(TypeId::of::<T>()).or_default().on_dispose = Some(Box::new(move |any| {
            if let Some(value) = any.downcast_mut::<T>() {
                hook(value);
            }
        }));
    }

    /// Adjust the idle count for `T` to exactly `size`; `0` clears.
    ///
    /// Growth default-constructs values (spawn hook included); shrinking
    /// drops the oldest-inserted values first.
    pub fn resize<T: Any + Default>(&mut self, size: usize) {
        if size == 0 {
            self.clear::<T>();
            return;
        }
        let tid = TypeId::of::<T>();
        let now = self.clock.now();
        let current = self
            .slots
            .get(&tid)
            .map(|slot| slot.idle.len())
            .unwrap_or(0);
        if size > current {
            for _ in 0..size - current {
                let mut value = Box::new(T::default());
                if let Some(on_spawn) = self.hooks.get(&tid).and_then(|h| h.on_spawn.as_ref()) {
                    on_spawn(value.as_mut());
                }
                let slot = self.slot_mut(tid, std::any::type_name::<T>(), now);
                slot.idle.push_back(CommonEntry {
                    value,
                    inserted_at: now,
                });
            }
        } else if let Some(slot) = self.slots.get_mut(&tid) {
            for _ in 0..current - size {
                slot.idle.pop_front();
            }
        }
    }

    /// Drop the idle set for `T` entirely.
    pub fn clear<T: Any>(&mut self) {
        self.slots.remove(&TypeId::of::<T>());
    }

    /// Drop every idle set. Hook and policy registrations survive.
    pub fn clear_all(&mut self) {
        self.slots.clear();
        self.expired.clear();
    }

    /// Current idle count for `T`.
    pub fn item_count<T: Any>(&self) -> usize {
        self.slots
            .get(&TypeId::of::<T>())
            .map(|slot| slot.idle.len())
            .unwrap_or(0)
    }

    /// Number of live per-type idle sets.
    pub fn pool_count(&self) -> usize {
        self.slots.len()
    }

    /// Upsert the full eviction policy for `T`; a live slot sees the
    /// update immediately.
    pub fn set_idle_times<T: Any>(&mut self, policy: IdlePolicy) {
        let tid = TypeId::of::<T>();
        match self.policies.get(&tid) {
            Some(shared) => shared.set(policy),
            None => self.insert_policy(tid, policy),
        }
    }

    /// Upsert just the per-value idle threshold for `T`.
    pub fn set_item_idle<T: Any>(&mut self, item_idle: Option<Duration>) {
        let tid = TypeId::of::<T>();
        match self.policies.get(&tid) {
            Some(shared) => shared.set_item_idle(item_idle),
            None => {
                let mut policy = self.default_policy.get();
                policy.item_idle = item_idle;
                self.insert_policy(tid, policy);
            }
        }
    }

    /// Upsert just the empty-pool threshold for `T`.
    pub fn set_pool_idle<T: Any>(&mut self, pool_idle: Option<Duration>) {
        let tid = TypeId::of::<T>();
        match self.policies.get(&tid) {
            Some(shared) => shared.set_pool_idle(pool_idle),
            None => {
                let mut policy = self.default_policy.get();
                policy.pool_idle = pool_idle;
                self.insert_policy(tid, policy);
            }
        }
    }

    /// Per-type policy override, or `None` when the default applies.
    pub fn idle_times<T: Any>(&self) -> Option<IdlePolicy> {
        self.policies.get(&TypeId::of::<T>()).map(|p| p.get())
    }

    /// Sweep every idle set, evicting values past their item threshold
    /// and removing slots that have been empty past the pool threshold.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.expired.clear();
        for (tid, slot) in self.slots.iter_mut() {
            if !slot.sweep(now) {
                self.expired.push(*tid);
            }
        }
        for tid in self.expired.drain(..) {
            if let Some(slot) = self.slots.remove(&tid) {
                debug!(type_name = slot.type_name, "removing idle value pool");
            }
        }
    }

    fn insert_policy(&mut self, tid: TypeId, policy: IdlePolicy) {
        let shared = SharedPolicy::new(policy);
        if let Some(slot) = self.slots.get_mut(&tid) {
            slot.policy = shared.clone();
        }
        self.policies.insert(tid, shared);
    }

    fn slot_mut(&mut self, tid: TypeId, type_name: &'static str, now: Duration) -> &mut CommonSlot {
        let policy = self
            .policies
            .get(&tid)
            .cloned()
            .unwrap_or_else(|| self.default_policy.clone());
        self.slots
            .entry(tid)
            .or_insert_with(|| CommonSlot::new(type_name, policy, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::cell::Cell;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn manual_pool(policy: IdlePolicy) -> (CommonPool, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new());
        let pool = CommonPool::with_clock(policy, clock.clone());
        (pool, clock)
    }

    #[test]
    fn test_get_reuses_returned_value() {
        let mut pool = CommonPool::new(IdlePolicy::disabled());
        let value: Box<Vec<u8>> = pool.get();
        let ptr: *const Vec<u8> = &*value;
        pool.dispose(value);
        assert_eq!(pool.item_count::<Vec<u8>>(), 1);

        let reused: Box<Vec<u8>> = pool.get();
        assert_eq!(ptr, &*reused as *const Vec<u8>);
        assert_eq!(pool.item_count::<Vec<u8>>(), 0);
    }

    #[test]
    fn test_lifo_order() {
        let mut pool = CommonPool::new(IdlePolicy::disabled());
        pool.dispose(Box::new(vec![1u8]));
        pool.dispose(Box::new(vec![2u8]));
        pool.dispose(Box::new(vec![3u8]));

        assert_eq!(*pool.get::<Vec<u8>>(), vec![3]);
        assert_eq!(*pool.get::<Vec<u8>>(), vec![2]);
        assert_eq!(*pool.get::<Vec<u8>>(), vec![1]);
    }

    #[test]
    fn test_spawn_hook_runs_once_per_construction() {
        let mut pool = CommonPool::new(IdlePolicy::disabled());
        let spawns = Rc::new(Cell::new(0));
        let counter = spawns.clone();
        pool.set_spawn_hook::<Vec<u8>>(move |_| counter.set(counter.get() + 1));

        let value: Box<Vec<u8>> = pool.get();
        assert_eq!(spawns.get(), 1);

        // Reuse does not re-run the spawn hook.
        pool.dispose(value);
        let _reused: Box<Vec<u8>> = pool.get();
        assert_eq!(spawns.get(), 1);
    }

    #[test]
    fn test_dispose_hook_resets_state() {
        let mut pool = CommonPool::new(IdlePolicy::disabled());
        pool.set_dispose_hook::<Vec<u8>>(|v| v.clear());

        let mut value: Box<Vec<u8>> = pool.get();
        value.extend_from_slice(b"dirty");
        pool.dispose(value);

        let reused: Box<Vec<u8>> = pool.get();
        assert!(reused.is_empty());
    }

    #[test]
    fn test_hooks_survive_slot_eviction() {
        let (mut pool, clock) = manual_pool(IdlePolicy::new(Some(secs(1)), Some(secs(1))));
        pool.set_dispose_hook::<Vec<u8>>(|v| v.clear());

        pool.dispose(Box::new(b"dirty".to_vec()));
        clock.advance(secs(10));
        pool.tick(); // evicts the value
        clock.advance(secs(10));
        pool.tick(); // evicts the empty slot
        assert_eq!(pool.pool_count(), 0);

        pool.dispose(Box::new(b"dirty".to_vec()));
        let value: Box<Vec<u8>> = pool.get();
        assert!(value.is_empty(), "dispose hook must survive slot eviction");
    }

    #[test]
    fn test_resize_grow_and_shrink() {
        let mut pool = CommonPool::new(IdlePolicy::disabled());
        pool.resize::<Vec<u8>>(5);
        assert_eq!(pool.item_count::<Vec<u8>>(), 5);

        pool.resize::<Vec<u8>>(2);
        assert_eq!(pool.item_count::<Vec<u8>>(), 2);

        pool.resize::<Vec<u8>>(0);
        assert_eq!(pool.item_count::<Vec<u8>>(), 0);
        assert_eq!(pool.pool_count(), 0);
    }

    #[test]
    fn test_item_eviction_threshold() {
        let (mut pool, clock) = manual_pool(IdlePolicy::new(Some(secs(5)), None));
        pool.dispose(Box::new(vec![1u8]));

        clock.set(Duration::from_millis(4_990));
        pool.tick();
        assert_eq!(pool.item_count::<Vec<u8>>(), 1);

        clock.set(Duration::from_millis(5_010));
        pool.tick();
        assert_eq!(pool.item_count::<Vec<u8>>(), 0);
    }

    #[test]
    fn test_empty_slot_expires() {
        let (mut pool, clock) = manual_pool(IdlePolicy::new(None, Some(secs(10))));
        let value: Box<Vec<u8>> = pool.get();
        pool.dispose(value);
        let _checked_out: Box<Vec<u8>> = pool.get();
        assert_eq!(pool.pool_count(), 1);

        clock.set(Duration::from_millis(9_990));
        pool.tick();
        assert_eq!(pool.pool_count(), 1);

        clock.set(Duration::from_millis(10_010));
        pool.tick();
        assert_eq!(pool.pool_count(), 0);
    }

    #[test]
    fn test_policy_override_updates_live_slot() {
        let (mut pool, clock) = manual_pool(IdlePolicy::disabled());
        pool.dispose(Box::new(vec![1u8]));

        // No override yet: nothing evicts.
        clock.set(secs(100));
        pool.tick();
        assert_eq!(pool.item_count::<Vec<u8>>(), 1);

        pool.set_item_idle::<Vec<u8>>(Some(secs(5)));
        assert!(pool.idle_times::<Vec<u8>>().is_some());
        pool.tick();
        assert_eq!(pool.item_count::<Vec<u8>>(), 0);
    }

    #[test]
    fn test_clear_all() {
        let mut pool = CommonPool::new(IdlePolicy::disabled());
        pool.dispose(Box::new(vec![1u8]));
        pool.dispose(Box::new(String::from("x")));
        assert_eq!(pool.pool_count(), 2);

        pool.clear_all();
        assert_eq!(pool.pool_count(), 0);
        assert_eq!(pool.item_count::<Vec<u8>>(), 0);
        assert_eq!(pool.item_count::<String>(), 0);
    }
}
