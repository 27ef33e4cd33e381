//! Capability dispatch for composite instances.
//!
//! Collects the attachments implementing a hook into a scratch buffer and
//! invokes them in discovery order. The buffer is the sub-pool's own
//! reusable one when it is free, otherwise one borrowed from the
//! plain-value pool, so steady-state dispatch never allocates.

use tracing::error;

use crate::backend::{AttachmentId, HookKind, PoolBackend};
use crate::common::CommonPool;

/// Fire `kind` hooks on every attachment of `handle`.
///
/// The final hook runs only after the scratch buffer has been cleared and
/// (if borrowed) returned to the plain-value pool, so a hook that triggers
/// a nested buffer borrow never observes a live reference into the buffer
/// being recycled. A failing hook is logged with its attachment identity
/// and does not stop the remaining hooks.
pub(crate) fn dispatch<B: PoolBackend>(
    backend: &mut B,
    common: &mut CommonPool,
    scratch: &mut Vec<AttachmentId>,
    handle: &B::Handle,
    kind: HookKind,
) {
    let (mut buf, borrowed) = if scratch.is_empty() {
        (std::mem::take(scratch), false)
    } else {
        (*common.get::<Vec<AttachmentId>>(), true)
    };
    backend.collect_hooks(handle, kind, &mut buf);

    match buf.last().copied() {
        Some(last) => {
            for &attachment in &buf[..buf.len() - 1] {
                invoke(backend, handle, attachment, kind);
            }
            buf.clear();
            give_back(common, scratch, buf, borrowed);
            invoke(backend, handle, last, kind);
        }
        None => give_back(common, scratch, buf, borrowed),
    }
}

fn give_back(
    common: &mut CommonPool,
    scratch: &mut Vec<AttachmentId>,
    buf: Vec<AttachmentId>,
    borrowed: bool,
) {
    if borrowed {
        common.dispose(Box::new(buf));
    } else {
        *scratch = buf;
    }
}

fn invoke<B: PoolBackend>(
    backend: &mut B,
    handle: &B::Handle,
    attachment: AttachmentId,
    kind: HookKind,
) {
    if let Err(e) = backend.invoke_hook(handle, attachment, kind) {
        error!(attachment = %attachment, ?kind, error = %e, "lifecycle hook failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::stub::StubBackend;
    use crate::policy::IdlePolicy;

    fn ids(raw: &[u64]) -> Vec<AttachmentId> {
        raw.iter().map(|&id| AttachmentId::new(id)).collect()
    }

    #[test]
    fn test_hooks_run_in_discovery_order() {
        let mut backend = StubBackend::new();
        backend.attachments = vec![
            (AttachmentId::new(1), false),
            (AttachmentId::new(2), false),
            (AttachmentId::new(3), false),
        ];
        let mut common = CommonPool::new(IdlePolicy::disabled());
        let mut scratch = Vec::new();

        dispatch(&mut backend, &mut common, &mut scratch, &7, HookKind::Reactivated);

        let order: Vec<AttachmentId> = backend.invoked.iter().map(|(_, id, _)| *id).collect();
        assert_eq!(order, ids(&[1, 2, 3]));
        assert!(backend
            .invoked
            .iter()
            .all(|&(h, _, kind)| h == 7 && kind == HookKind::Reactivated));
    }

    #[test]
    fn test_failing_hook_does_not_stop_the_rest() {
        let mut backend = StubBackend::new();
        backend.attachments = vec![
            (AttachmentId::new(1), false),
            (AttachmentId::new(2), true),
            (AttachmentId::new(3), false),
        ];
        let mut common = CommonPool::new(IdlePolicy::disabled());
        let mut scratch = Vec::new();

        dispatch(&mut backend, &mut common, &mut scratch, &7, HookKind::Returned);

        let order: Vec<AttachmentId> = backend.invoked.iter().map(|(_, id, _)| *id).collect();
        assert_eq!(order, ids(&[1, 2, 3]));
    }

    #[test]
    fn test_scratch_buffer_reused_without_pool_traffic() {
        let mut backend = StubBackend::new();
        backend.attachments = vec![(AttachmentId::new(1), false)];
        let mut common = CommonPool::new(IdlePolicy::disabled());
        let mut scratch = Vec::with_capacity(8);
        let capacity = scratch.capacity();

        dispatch(&mut backend, &mut common, &mut scratch, &7, HookKind::Reactivated);

        // Scratch came back cleared with its allocation intact, and the
        // plain-value pool never saw the buffer.
        assert!(scratch.is_empty());
        assert_eq!(scratch.capacity(), capacity);
        assert_eq!(common.item_count::<Vec<AttachmentId>>(), 0);
        assert_eq!(common.pool_count(), 0);
    }

    #[test]
    fn test_busy_scratch_borrows_from_common_pool() {
        let mut backend = StubBackend::new();
        backend.attachments = vec![(AttachmentId::new(1), false)];
        let mut common = CommonPool::new(IdlePolicy::disabled());
        // Scratch already in use somewhere up the stack.
        let mut scratch = vec![AttachmentId::new(99)];

        dispatch(&mut backend, &mut common, &mut scratch, &7, HookKind::Reactivated);

        assert_eq!(scratch, ids(&[99]), "busy scratch must not be touched");
        // The borrowed buffer went back to the plain-value pool.
        assert_eq!(common.item_count::<Vec<AttachmentId>>(), 1);
        assert_eq!(backend.invoked.len(), 1);
    }

    #[test]
    fn test_no_attachments_is_a_noop() {
        let mut backend = StubBackend::new();
        let mut common = CommonPool::new(IdlePolicy::disabled());
        let mut scratch = Vec::new();

        dispatch(&mut backend, &mut common, &mut scratch, &7, HookKind::Returned);
        assert!(backend.invoked.is_empty());
    }
}
