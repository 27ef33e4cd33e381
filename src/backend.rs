//! Seam between the pooling core and the engine glue.
//!
//! The registry never touches concrete scene objects: instantiation,
//! destruction, template loading and attachment discovery all go through
//! [`PoolBackend`]. The core stays a single sub-pool implementation
//! parameterized over an opaque handle instead of one pool type per
//! concrete resource.

use std::fmt;

use crate::error::Result;
use crate::types::{InstanceId, PoolKey, TypeTag};

/// Lifecycle hook kinds dispatched on composite instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Fired when an instance leaves the pool (fresh spawn or warm reuse).
    Reactivated,
    /// Fired when an instance re-enters the idle set.
    Returned,
}

/// Stable identity of one attachment on a composite instance.
///
/// Used both to drive hook dispatch and to name the offending attachment
/// when a hook fails.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct AttachmentId(u64);

impl AttachmentId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttachmentId({})", self.0)
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Engine glue the registry is built over.
///
/// `Handle` is an opaque reference to a live instance; ownership of a
/// handle follows the instance: the pool owns handles of idle instances,
/// `get` transfers one out, `dispose` transfers it back.
pub trait PoolBackend {
    type Handle;
    type Template;

    /// Predicate: does this tag name a poolable resource type.
    fn validate_tag(&self, tag: TypeTag) -> bool;

    /// Resolve the canonical template for a key. Called once per sub-pool
    /// creation; a failure is final for that sub-pool.
    fn load_template(&mut self, key: &PoolKey) -> Result<Self::Template>;

    /// Produce a fresh live instance from a template. `None` means the
    /// instantiation primitive failed; the pool degrades to an empty
    /// result.
    fn instantiate(&mut self, template: &Self::Template) -> Option<Self::Handle>;

    /// Release an instance permanently. Must treat an already-destroyed
    /// handle as a no-op, not an error.
    fn destroy(&mut self, handle: Self::Handle);

    /// Whether an idle instance is still valid for reuse. Instances
    /// invalidated out of band are silently skipped by `get`.
    fn is_alive(&self, handle: &Self::Handle) -> bool;

    /// Stable per-instance identity, distinct from equality.
    fn instance_id(&self, handle: &Self::Handle) -> InstanceId;

    /// Record the origin key on a freshly spawned instance so it can be
    /// routed back on dispose. Default: no marker support.
    fn bind_origin(&mut self, _handle: &Self::Handle, _key: &PoolKey) {}

    /// Recorded origin key of a composite instance, if any. When present
    /// it overrides the caller-supplied key on dispose.
    fn origin_key(&self, _handle: &Self::Handle) -> Option<PoolKey> {
        None
    }

    /// Collect the attachments on `handle` implementing `kind`, in a
    /// deterministic discovery order. Default: no attachments.
    fn collect_hooks(
        &mut self,
        _handle: &Self::Handle,
        _kind: HookKind,
        _out: &mut Vec<AttachmentId>,
    ) {
    }

    /// Invoke one hook on one attachment. Errors are caught and logged by
    /// the dispatcher; they never abort remaining hooks.
    fn invoke_hook(
        &mut self,
        _handle: &Self::Handle,
        _attachment: AttachmentId,
        _kind: HookKind,
    ) -> Result<()> {
        Ok(())
    }
}
