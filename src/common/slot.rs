use std::any::Any;
use std::collections::VecDeque;
use std::time::Duration;

use crate::policy::SharedPolicy;

/// One idle plain value plus its insertion timestamp.
pub(crate) struct CommonEntry {
    pub(crate) value: Box<dyn Any>,
    pub(crate) inserted_at: Duration,
}

/// Process-wide hooks for one value type. At most one pair per type;
/// registering again replaces the previous hook.
#[derive(Default)]
pub(crate) struct TypeHooks {
    /// Called once, right after default construction.
    pub(crate) on_spawn: Option<Box<dyn Fn(&mut dyn Any)>>,
    /// Called on every return, before the value re-enters the idle set.
    pub(crate) on_dispose: Option<Box<dyn Fn(&mut dyn Any)>>,
}

/// Per-type idle set of the plain-value pool.
///
/// Front of the deque is the oldest insertion, back the newest; `get`
/// reuses from the back while the sweep evicts from the front. Box
/// ownership makes double-return unrepresentable, so no identity guard is
/// needed here.
pub(crate) struct CommonSlot {
    pub(crate) type_name: &'static str,
    pub(crate) idle: VecDeque<CommonEntry>,
    pub(crate) policy: SharedPolicy,
    pub(crate) empty_since: Duration,
}

impl CommonSlot {
    pub(crate) fn new(type_name: &'static str, policy: SharedPolicy, now: Duration) -> Self {
        Self {
            type_name,
            idle: VecDeque::new(),
            policy,
            empty_since: now,
        }
    }

    /// Evict idle values past the item threshold, oldest first; report
    /// whether the slot itself should stay alive.
    pub(crate) fn sweep(&mut self, now: Duration) -> bool {
        let policy = self.policy.get();
        if policy.item_idle.is_some() && !self.idle.is_empty() {
            while self
                .idle
                .front()
                .is_some_and(|entry| policy.item_expired(entry.inserted_at, now))
            {
                self.idle.pop_front();
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
}
