use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Eviction thresholds for one pool key.
///
/// `item_idle` bounds how long an individual idle instance may sit unused
/// before it is destroyed; `pool_idle` bounds how long a fully empty
/// sub-pool may linger before the sub-pool itself is removed. `None`
/// disables that eviction dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdlePolicy {
    pub item_idle: Option<Duration>,
    pub pool_idle: Option<Duration>,
}

impl IdlePolicy {
    pub const fn new(item_idle: Option<Duration>, pool_idle: Option<Duration>) -> Self {
        Self {
            item_idle,
            pool_idle,
        }
    }

    /// Policy with both eviction dimensions disabled.
    pub const fn disabled() -> Self {
        Self::new(None, None)
    }

    /// Whether an entry inserted at `inserted_at` has outlived the item
    /// threshold at time `now`.
    #[inline]
    pub fn item_expired(&self, inserted_at: Duration, now: Duration) -> bool {
        match self.item_idle {
            Some(threshold) => now.saturating_sub(inserted_at) >= threshold,
            None => false,
        }
    }

    /// Whether a sub-pool empty since `empty_since` should stay alive at
    /// time `now`. Always true when pool-level eviction is disabled.
    #[inline]
    pub fn pool_keep_alive(&self, empty_since: Duration, now: Duration) -> bool {
        match self.pool_idle {
            Some(threshold) => now.saturating_sub(empty_since) < threshold,
            None => true,
        }
    }
}

/// A policy cell aliased between the registry's policy table and any
/// sub-pool created under it, so `set_*` updates reach the sub-pool
/// without a re-lookup. Safe because the whole registry is single-threaded
/// by contract.
#[derive(Debug, Clone)]
pub struct SharedPolicy(Rc<Cell<IdlePolicy>>);

impl SharedPolicy {
    pub fn new(policy: IdlePolicy) -> Self {
        Self(Rc::new(Cell::new(policy)))
    }

    #[inline]
    pub fn get(&self) -> IdlePolicy {
        self.0.get()
    }

    #[inline]
    pub fn set(&self, policy: IdlePolicy) {
        self.0.set(policy);
    }

    pub fn set_item_idle(&self, item_idle: Option<Duration>) {
        let mut policy = self.0.get();
        policy.item_idle = item_idle;
        self.0.set(policy);
    }

    pub fn set_pool_idle(&self, pool_idle: Option<Duration>) {
        let mut policy = self.0.get();
        policy.pool_idle = pool_idle;
        self.0.set(policy);
    }
}
