use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::types::PoolKey;

/// Ticket for one scheduled release, usable to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReleaseId(u64);

/// Heap entry ordered as a min-heap on due time; ties break on the
/// schedule sequence so equal deadlines pop in FIFO order.
#[derive(Debug, PartialEq, Eq)]
struct DueEntry {
    due: Duration,
    id: ReleaseId,
}

impl Ord for DueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        Reverse(self.due)
            .cmp(&Reverse(other.due))
            .then_with(|| Reverse(self.id.0).cmp(&Reverse(other.id.0)))
    }
}

impl PartialOrd for DueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Timer queue for "return this instance to its pool after a delay".
///
/// Cancellation removes the payload from the side map and leaves the
/// heap entry behind; `pop_due` skips entries with no payload. The heap
/// therefore never needs random-access removal.
pub(crate) struct ReleaseQueue<H> {
    heap: BinaryHeap<DueEntry>,
    pending: FxHashMap<ReleaseId, (H, PoolKey)>,
    next_id: u64,
}

impl<H> ReleaseQueue<H> {
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            pending: FxHashMap::default(),
            next_id: 0,
        }
    }

    pub(crate) fn schedule(&mut self, handle: H, key: PoolKey, due: Duration) -> ReleaseId {
        let id = ReleaseId(self.next_id);
        self.next_id += 1;
        self.pending.insert(id, (handle, key));
        self.heap.push(DueEntry { due, id });
        id
    }

    /// Cancel a scheduled release, handing the instance back to the
    /// caller. Returns `None` when the release already fired or was
    /// cancelled before.
    pub(crate) fn cancel(&mut self, id: ReleaseId) -> Option<(H, PoolKey)> {
        self.pending.remove(&id)
    }

    /// Pop the next release whose deadline has passed, if any.
    pub(crate) fn pop_due(&mut self, now: Duration) -> Option<(H, PoolKey)> {
        while let Some(entry) = self.heap.peek() {
            if entry.due > now {
                return None;
            }
            let id = entry.id;
            self.heap.pop();
            if let Some(payload) = self.pending.remove(&id) {
                return Some(payload);
            }
            // Cancelled entry, keep draining.
        }
        None
    }

    #[inline]
    pub(crate) fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::stub::resource_key;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_pop_due_respects_deadlines() {
        let mut q: ReleaseQueue<u64> = ReleaseQueue::new();
        q.schedule(1, resource_key("a"), secs(5));
        q.schedule(2, resource_key("b"), secs(3));

        assert_eq!(q.pop_due(secs(2)), None);
        assert_eq!(q.pop_due(secs(4)), Some((2, resource_key("b"))));
        assert_eq!(q.pop_due(secs(4)), None);
        assert_eq!(q.pop_due(secs(5)), Some((1, resource_key("a"))));
        assert_eq!(q.pending_count(), 0);
    }

    #[test]
    fn test_equal_deadlines_pop_in_schedule_order() {
        let mut q: ReleaseQueue<u64> = ReleaseQueue::new();
        q.schedule(1, resource_key("a"), secs(3));
        q.schedule(2, resource_key("a"), secs(3));
        q.schedule(3, resource_key("a"), secs(3));

        assert_eq!(q.pop_due(secs(3)).map(|(h, _)| h), Some(1));
        assert_eq!(q.pop_due(secs(3)).map(|(h, _)| h), Some(2));
        assert_eq!(q.pop_due(secs(3)).map(|(h, _)| h), Some(3));
    }

    #[test]
    fn test_cancel_returns_payload_once() {
        let mut q: ReleaseQueue<u64> = ReleaseQueue::new();
        let id = q.schedule(7, resource_key("a"), secs(3));

        assert_eq!(q.cancel(id), Some((7, resource_key("a"))));
        assert_eq!(q.cancel(id), None);
        // The stale heap entry is skipped silently.
        assert_eq!(q.pop_due(secs(10)), None);
    }

    #[test]
    fn test_cancelled_entry_does_not_block_later_ones() {
        let mut q: ReleaseQueue<u64> = ReleaseQueue::new();
        let early = q.schedule(1, resource_key("a"), secs(1));
        q.schedule(2, resource_key("b"), secs(2));

        q.cancel(early);
        assert_eq!(q.pop_due(secs(5)), Some((2, resource_key("b"))));
    }
}
